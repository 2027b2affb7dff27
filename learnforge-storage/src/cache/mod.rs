//! TTL cache for memoized aggregates.
//!
//! The cache is strictly best-effort: an in-process implementation may be
//! empty after a restart, and callers recompute on any miss or error.

pub mod memory;
pub mod traits;

pub use memory::{InMemoryCache, DEFAULT_SWEEP_INTERVAL};
pub use traits::{CacheBackend, CacheStats};

//! Constants for the LearnForge API
//!
//! Centralizing constants makes them easy to find, modify, and test.

use std::time::Duration;

// ============================================================================
// GENERATION
// ============================================================================

/// Deadline for one generation call, retries included.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// REPORTS
// ============================================================================

/// Cache key prefix for memoized daily summaries.
pub const SUMMARY_CACHE_PREFIX: &str = "summary:";

/// How long a computed daily summary stays cached (7 days).
pub const SUMMARY_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default number of results returned by topic queries.
pub const DEFAULT_TOPIC_LIMIT: usize = 10;

/// Maximum number of results returned by topic queries.
pub const MAX_TOPIC_LIMIT: usize = 100;

// ============================================================================
// SERVER
// ============================================================================

/// Default bind host.
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default cache sweep interval in seconds.
pub const DEFAULT_CACHE_SWEEP_SECS: u64 = 60;

/// Default HTTP timeout for upstream provider calls in seconds.
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;

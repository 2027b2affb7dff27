//! Error reporting capability
//!
//! Components that must surface a failure without failing their caller take
//! an [`ErrorReporter`] at construction.

use learnforge_core::LearnforgeError;

/// Receives failures that are handled locally but still worth surfacing.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &LearnforgeError, context: &str);
}

/// Reports through `tracing` at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, error: &LearnforgeError, context: &str) {
        tracing::warn!(
            error = %error,
            kind = %error.kind(),
            context,
            "Reported error"
        );
    }
}

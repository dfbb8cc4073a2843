//! Reporting of failures that are neither propagated nor handled.

use command_tree_core::CommandError;
use tracing::error;

/// Receives failures when no exception handler is configured.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &CommandError);
}

/// Reports failures as `tracing` error events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, err: &CommandError) {
        error!(kind = ?err.kind(), offending = err.offending(), "{err}");
    }
}

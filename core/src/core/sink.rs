//! Error sink handed to the store and the reaper.
//!
//! Read-path corruption and per-item sweep failures are reported here instead
//! of being returned, so callers keep working when the data directory holds bad
//! records.

use std::error::Error;

pub trait ErrorSink: Send + Sync {
    fn report(&self, context: &str, error: &dyn Error);
}

/// Forwards reports to `tracing` at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, context: &str, error: &dyn Error) {
        tracing::error!(error = %error, "{context}");
    }
}

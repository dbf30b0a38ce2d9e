//! Top-level server error type.

use crate::store::StoreError;

/// Failures that terminate the server or a bind attempt.
///
/// Per-connection and per-command failures never surface here; they are
/// reported to the client as wire tokens and logged.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Rejected configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Socket-level failure (bind, accept).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Persistence failure during startup.
    #[error(transparent)]
    Store(#[from] StoreError),
}

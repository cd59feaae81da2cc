//! Domain error types for the TestRail synchronization core.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Network or I/O failure while talking to TestRail
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// TestRail answered with a non-success status
    #[error("TestRail returned {status}: {message}")]
    Remote { status: u16, message: String },

    /// TestRail answered 2xx but the payload did not have the expected shape
    #[error("malformed TestRail response: {0}")]
    Payload(#[from] serde_json::Error),

    /// The section graph of a suite violates the forest invariant
    #[error("suite structure error: {0}")]
    Structure(String),

    /// The backup checkpoint file could not be read or written
    #[error("checkpoint error: {0}")]
    Checkpoint(String),
}

impl SyncError {
    /// Build a `Remote` error from a response status and body.
    ///
    /// TestRail wraps its error messages as `{"error": "..."}`; fall back to
    /// the raw body when that shape is absent.
    pub fn remote(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or_else(|| body.trim().to_string());
        SyncError::Remote { status, message }
    }
}

/// Convenience type alias for Results with SyncError.
pub type SyncResult<T> = Result<T, SyncError>;

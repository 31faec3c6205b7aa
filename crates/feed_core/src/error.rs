use thiserror::Error;

/// Failure taxonomy surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The request never got a usable answer. Not retried by the core.
    #[error("network error: {0}")]
    TransientNetwork(String),
    /// The server refused a duplicate action (HTTP 409).
    #[error("conflict: {0}")]
    Conflict(String),
    /// The target no longer exists server-side; the local view is stale.
    #[error("not found: {0}")]
    NotFound(String),
    /// Rejected before any network call, or a malformed payload at the boundary.
    #[error("invalid input: {0}")]
    Validation(String),
    /// No valid session. Never retried silently.
    #[error("operation not permitted: {0}")]
    NotPermitted(String),
    /// Any other non-success status.
    #[error("rejected by server (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

impl FeedError {
    /// NotFound means the local view disagrees with the server and must be re-read.
    pub fn invalidates_view(&self) -> bool {
        matches!(self, FeedError::NotFound(_))
    }
}

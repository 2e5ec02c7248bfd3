//! Transport error types.

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that prevent a request from producing any HTTP response.
///
/// Non-2xx statuses are not errors at this layer; they come back as a
/// [`RawResponse`](super::RawResponse) for the caller to classify.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The backend could not be reached.
    #[error("failed to connect to backend at {url}: {message}")]
    ConnectionFailed { url: String, message: String },

    /// The request was sent but reading the response failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

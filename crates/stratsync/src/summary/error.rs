//! Summarization error types.

use reqwest::StatusCode;
use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::conversation::MessageId;
use crate::transport::TransportError;

/// Result type for summarization.
pub type SummaryResult<T> = Result<T, SummaryError>;

/// Errors that abort a summarization. None of them touch the conversation or
/// the currently published artifact.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// No message with this id exists.
    #[error("message {0} not found")]
    UnknownMessage(MessageId),

    /// Only assistant replies can be summarized.
    #[error("message {0} is not an assistant reply")]
    NotAssistant(MessageId),

    /// The reply matched no data.
    #[error("message {0} has nothing to summarize")]
    NothingToSummarize(MessageId),

    /// A summary for this message is already being generated.
    #[error("a summary for message {0} is already in progress")]
    InFlight(MessageId),

    /// The summary endpoint answered with a non-2xx status.
    #[error("HTTP {}: {body}", .status.as_u16())]
    Http { status: StatusCode, body: String },

    /// The summary endpoint could not be reached.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The rendered document could not be stored.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl SummaryError {
    /// Text for the blocking failure notice shown to the user.
    pub fn user_notice(&self) -> String {
        format!("Failed to generate summary: {}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_notice() {
        let err = SummaryError::Http {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        };
        assert_eq!(err.user_notice(), "Failed to generate summary: HTTP 500: boom");
    }
}

//! Wire types for the query and summary endpoints.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Path of the query processing endpoint.
pub const QUERY_PATH: &str = "/process_user_query/";

/// Path of the summary generation endpoint.
pub const SUMMARY_PATH: &str = "/generate_summary/";

/// Body of a query request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// Body of a summary request.
///
/// `data` is always a string; structured values are serialized by the caller
/// before the request is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub query: String,
    pub data: String,
}

/// Uninterpreted backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Value of the `Content-Type` header, if any.
    pub content_type: Option<String>,
    /// Full response body as text.
    pub body: String,
}

impl RawResponse {
    /// Create a response with no content type.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    /// Create a successful `application/json` response.
    pub fn json(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body).with_content_type("application/json")
    }

    /// Create a successful `text/plain` response.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body).with_content_type("text/plain; charset=utf-8")
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Whether the content type announces a JSON body.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
    }
}

//! Backend HTTP client.

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, header};
use serde::Serialize;
use std::time::Duration;

use super::error::{TransportError, TransportResult};
use super::types::*;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// The two outbound operations the chat client needs from its backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Send a free-text user query.
    async fn process_query(&self, query: &str) -> TransportResult<RawResponse>;

    /// Ask the backend to render a summary document.
    async fn generate_summary(&self, request: &SummaryRequest) -> TransportResult<RawResponse>;
}

/// Client for the query/summary HTTP backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    /// HTTP client.
    client: Client,
    /// Base URL without trailing slash (e.g., "http://127.0.0.1:8000").
    base_url: String,
}

impl BackendClient {
    /// Create a client with the default timeout.
    pub fn new(base_url: impl Into<String>) -> TransportResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with an explicit request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::ClientBuild)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body and collect the raw response.
    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> TransportResult<RawResponse> {
        let url = self.endpoint(path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        debug!("{} responded {} ({} bytes)", url, status, body.len());

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn process_query(&self, query: &str) -> TransportResult<RawResponse> {
        self.post_json(QUERY_PATH, &QueryRequest::new(query)).await
    }

    async fn generate_summary(&self, request: &SummaryRequest) -> TransportResult<RawResponse> {
        self.post_json(SUMMARY_PATH, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_trims_trailing_slash() {
        let client = BackendClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(
            client.endpoint(QUERY_PATH),
            "http://localhost:8000/process_user_query/"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_connection_failure() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let client =
            BackendClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.process_query("hello").await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionFailed { .. }));
    }
}

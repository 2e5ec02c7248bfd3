//! Summary generation for stored assistant messages.

use dashmap::DashSet;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::error::{SummaryError, SummaryResult};
use super::request::{build_summary_request, interpret_summary_response};
use crate::artifact::{ArtifactInfo, ArtifactManager};
use crate::conversation::{Message, MessageId};
use crate::transport::Backend;

/// Drives summarization and publishes the result.
///
/// Summaries for different messages may run concurrently; a second request
/// for a message that is already being summarized is rejected. Whichever
/// summary settles last becomes the active artifact.
pub struct Summarizer {
    backend: Arc<dyn Backend>,
    artifacts: Arc<Mutex<ArtifactManager>>,
    in_flight: Arc<DashSet<MessageId>>,
}

/// Busy flag for one message, cleared when dropped.
struct InFlightGuard {
    in_flight: Arc<DashSet<MessageId>>,
    message_id: MessageId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.remove(&self.message_id);
    }
}

impl Summarizer {
    pub fn new(backend: Arc<dyn Backend>, artifacts: ArtifactManager) -> Self {
        Self {
            backend,
            artifacts: Arc::new(Mutex::new(artifacts)),
            in_flight: Arc::new(DashSet::new()),
        }
    }

    /// Whether a summary for `message_id` is currently being generated.
    pub fn is_summarizing(&self, message_id: MessageId) -> bool {
        self.in_flight.contains(&message_id)
    }

    /// The active artifact, if any.
    pub async fn current_artifact(&self) -> Option<ArtifactInfo> {
        self.artifacts.lock().await.current()
    }

    /// Delete the active artifact.
    pub async fn release_artifact(&self) {
        self.artifacts.lock().await.release();
    }

    /// Summarize `message` and publish the document as the active artifact.
    ///
    /// On any error the previously active artifact is left in place.
    pub async fn summarize(&self, message: &Message) -> SummaryResult<ArtifactInfo> {
        let message_id = message.id();
        if !message.is_assistant() {
            return Err(SummaryError::NotAssistant(message_id));
        }
        if !message.can_summarize() {
            return Err(SummaryError::NothingToSummarize(message_id));
        }

        let _guard = self.claim(message_id)?;

        let result = self.run(message).await;
        if let Err(ref e) = result {
            error!("summary for message {} failed: {}", message_id, e);
        }
        result
    }

    async fn run(&self, message: &Message) -> SummaryResult<ArtifactInfo> {
        let request = build_summary_request(message)?;
        info!(
            "requesting summary for message {} ({} bytes of data)",
            message.id(),
            request.data.len()
        );

        let response = self.backend.generate_summary(&request).await?;
        let document = interpret_summary_response(&response)?;

        let mut artifacts = self.artifacts.lock().await;
        Ok(artifacts.publish(document, message.id())?)
    }

    fn claim(&self, message_id: MessageId) -> SummaryResult<InFlightGuard> {
        if !self.in_flight.insert(message_id) {
            return Err(SummaryError::InFlight(message_id));
        }
        Ok(InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{MessageIdGenerator, PayloadBundle, ResponseValue};
    use crate::transport::{RawResponse, SummaryRequest, TransportResult};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    /// Summary backend that waits for a release signal before answering.
    struct GatedBackend {
        gate: Notify,
        response: RawResponse,
    }

    #[async_trait]
    impl Backend for GatedBackend {
        async fn process_query(&self, _query: &str) -> TransportResult<RawResponse> {
            Ok(RawResponse::text(""))
        }

        async fn generate_summary(&self, _request: &SummaryRequest) -> TransportResult<RawResponse> {
            self.gate.notified().await;
            Ok(self.response.clone())
        }
    }

    fn reply(ids: &MessageIdGenerator, text: &str) -> Message {
        let payload = PayloadBundle {
            query: "q".to_string(),
            response: ResponseValue::Text(text.to_string()),
            raw: None,
        };
        Message::assistant_text(ids.next_id(), text, Some(payload))
    }

    #[tokio::test]
    async fn test_second_request_for_same_message_is_rejected() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(GatedBackend {
            gate: Notify::new(),
            response: RawResponse::text("<p>done</p>"),
        });
        let summarizer = Arc::new(Summarizer::new(
            backend.clone(),
            ArtifactManager::new(dir.path()),
        ));
        let ids = MessageIdGenerator::new();
        let message = reply(&ids, "Hi there");
        let id = message.id();

        let first = {
            let summarizer = Arc::clone(&summarizer);
            let message = message.clone();
            tokio::spawn(async move { summarizer.summarize(&message).await })
        };
        while !summarizer.is_summarizing(id) {
            tokio::task::yield_now().await;
        }

        let second = summarizer.summarize(&message).await;
        assert!(matches!(second, Err(SummaryError::InFlight(_))));

        backend.gate.notify_one();
        let artifact = first.await.unwrap().unwrap();
        assert_eq!(artifact.document, "<p>done</p>");
        assert!(!summarizer.is_summarizing(id));
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_artifact_and_clears_flag() {
        let dir = TempDir::new().unwrap();
        let ids = MessageIdGenerator::new();
        let mut artifacts = ArtifactManager::new(dir.path());
        let earlier = reply(&ids, "earlier");
        let published = artifacts.publish("<p>earlier</p>", earlier.id()).unwrap();

        let backend = Arc::new(GatedBackend {
            gate: Notify::new(),
            response: RawResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
        });
        backend.gate.notify_one();
        let summarizer = Summarizer::new(backend, artifacts);

        let message = reply(&ids, "later");
        let err = summarizer.summarize(&message).await.unwrap_err();
        assert_eq!(err.user_notice(), "Failed to generate summary: HTTP 500: boom");
        assert!(!summarizer.is_summarizing(message.id()));
        assert_eq!(summarizer.current_artifact().await, Some(published.clone()));
        assert!(published.path.exists());
    }

    #[tokio::test]
    async fn test_different_messages_last_settled_wins() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(GatedBackend {
            gate: Notify::new(),
            response: RawResponse::text("<p>doc</p>"),
        });
        let summarizer = Arc::new(Summarizer::new(
            backend.clone(),
            ArtifactManager::new(dir.path()),
        ));
        let ids = MessageIdGenerator::new();
        let a = reply(&ids, "a");
        let b = reply(&ids, "b");

        let task_a = {
            let (summarizer, a) = (Arc::clone(&summarizer), a.clone());
            tokio::spawn(async move { summarizer.summarize(&a).await })
        };
        let task_b = {
            let (summarizer, b) = (Arc::clone(&summarizer), b.clone());
            tokio::spawn(async move { summarizer.summarize(&b).await })
        };
        while !(summarizer.is_summarizing(a.id()) && summarizer.is_summarizing(b.id())) {
            tokio::task::yield_now().await;
        }

        // Both are parked on the gate; release one at a time.
        backend.gate.notify_one();
        while summarizer.is_summarizing(a.id()) && summarizer.is_summarizing(b.id()) {
            tokio::task::yield_now().await;
        }
        let a_settled_first = !summarizer.is_summarizing(a.id());
        backend.gate.notify_one();
        let result_a = task_a.await.unwrap().unwrap();
        let result_b = task_b.await.unwrap().unwrap();
        let (settled_first, settled_last) = if a_settled_first {
            (result_a, result_b)
        } else {
            (result_b, result_a)
        };

        assert!(!settled_first.path.exists());
        let current = summarizer.current_artifact().await.unwrap();
        assert_eq!(current.message_id, settled_last.message_id);
        assert_ne!(settled_first.message_id, settled_last.message_id);
    }
}

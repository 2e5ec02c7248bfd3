//! Chat session: the state a front-end drives.
//!
//! Sending a message and summarizing a reply are independent futures over the
//! same shared state. Locks are only taken between awaits, so two flows in
//! flight interleave at their network calls and nowhere else.

use log::{info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::artifact::{ArtifactInfo, ArtifactManager};
use crate::conversation::{ConversationStore, Message, MessageId, MessageIdGenerator};
use crate::normalize::{NormalizedReply, normalize};
use crate::summary::{Summarizer, SummaryError, SummaryResult};
use crate::transport::Backend;

/// Shared handle to one conversation. Cheap to clone.
#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    backend: Arc<dyn Backend>,
    store: RwLock<ConversationStore>,
    ids: MessageIdGenerator,
    pending_queries: AtomicUsize,
    summarizer: Summarizer,
}

/// Counts an outstanding query for the typing indicator until dropped.
struct PendingQuery<'a>(&'a AtomicUsize);

impl<'a> PendingQuery<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingQuery<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ChatSession {
    pub fn new(backend: Arc<dyn Backend>, artifacts: ArtifactManager) -> Self {
        let summarizer = Summarizer::new(Arc::clone(&backend), artifacts);
        Self {
            inner: Arc::new(SessionInner {
                backend,
                store: RwLock::new(ConversationStore::new()),
                ids: MessageIdGenerator::new(),
                pending_queries: AtomicUsize::new(0),
                summarizer,
            }),
        }
    }

    /// Send a user query and append the assistant reply.
    ///
    /// Blank input is ignored and returns `None`. Otherwise exactly one
    /// assistant message is appended, whether the request succeeded or not,
    /// and its id is returned.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn send_message(&self, text: &str) -> Option<MessageId> {
        if text.trim().is_empty() {
            return None;
        }

        let inner = &self.inner;
        inner
            .store
            .write()
            .await
            .append(Message::user(inner.ids.next_id(), text));

        let reply = {
            let _pending = PendingQuery::start(&inner.pending_queries);
            match inner.backend.process_query(text).await {
                Ok(raw) => normalize(text, &raw),
                Err(e) => {
                    warn!("query failed before a response arrived: {}", e);
                    NormalizedReply::from_transport_error(&e)
                }
            }
        };

        if let NormalizedReply::Error { .. } = reply {
            warn!("query reply is an error: {}", reply.display_text());
        }

        let id = inner.ids.next_id();
        inner.store.write().await.append(reply.into_message(id));
        info!("reply {} appended", id);
        Some(id)
    }

    /// Summarize the assistant message `id` and make it the active artifact.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn summarize(&self, id: MessageId) -> SummaryResult<ArtifactInfo> {
        let message = self
            .message(id)
            .await
            .ok_or(SummaryError::UnknownMessage(id))?;
        self.inner.summarizer.summarize(&message).await
    }

    /// Snapshot of the conversation in arrival order.
    pub async fn messages(&self) -> Vec<Message> {
        self.inner.store.read().await.all().to_vec()
    }

    pub async fn message(&self, id: MessageId) -> Option<Message> {
        self.inner.store.read().await.get(id).cloned()
    }

    /// Most recent assistant message id, the default summarize target.
    pub async fn last_assistant_id(&self) -> Option<MessageId> {
        self.inner.store.read().await.last_assistant().map(Message::id)
    }

    pub async fn has_user_messages(&self) -> bool {
        self.inner.store.read().await.has_user_messages()
    }

    /// Whether any query is still waiting for its reply.
    pub fn is_typing(&self) -> bool {
        self.inner.pending_queries.load(Ordering::SeqCst) > 0
    }

    pub fn is_summarizing(&self, id: MessageId) -> bool {
        self.inner.summarizer.is_summarizing(id)
    }

    pub async fn current_artifact(&self) -> Option<ArtifactInfo> {
        self.inner.summarizer.current_artifact().await
    }

    /// Delete the active artifact file. Call before exiting.
    pub async fn shutdown(&self) {
        self.inner.summarizer.release_artifact().await;
    }
}

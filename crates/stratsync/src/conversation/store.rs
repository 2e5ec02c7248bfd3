//! Append-only message store.

use log::debug;

use super::models::{Message, MessageId, Sender};

/// Ordered sequence of messages.
///
/// Order is the order in which `append` was called, which for replies is the
/// order responses arrived in, not the order the queries were sent.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message to the end of the conversation.
    pub fn append(&mut self, message: Message) {
        debug!(
            "appending {} message {} (position {})",
            message.sender(),
            message.id(),
            self.messages.len()
        );
        self.messages.push(message);
    }

    /// All messages, oldest first.
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    /// Look up a message by id.
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id() == id)
    }

    /// Most recent assistant message.
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_assistant())
    }

    /// Whether the user has said anything yet (drives the welcome screen).
    pub fn has_user_messages(&self) -> bool {
        self.messages.iter().any(|m| m.sender() == Sender::User)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::MessageIdGenerator;

    #[test]
    fn test_append_preserves_call_order_not_id_order() {
        let ids = MessageIdGenerator::new();
        let first = ids.next_id();
        let second = ids.next_id();

        let mut store = ConversationStore::new();
        store.append(Message::assistant_text(second, "second reply", None));
        store.append(Message::assistant_text(first, "first reply", None));

        let order: Vec<_> = store.all().iter().map(|m| m.id()).collect();
        assert_eq!(order, vec![second, first]);
    }

    #[test]
    fn test_lookup_and_last_assistant() {
        let ids = MessageIdGenerator::new();
        let mut store = ConversationStore::new();
        assert!(!store.has_user_messages());

        let user = ids.next_id();
        let reply = ids.next_id();
        store.append(Message::user(user, "hello"));
        store.append(Message::assistant_text(reply, "Hi there", None));

        assert!(store.has_user_messages());
        assert_eq!(store.get(user).map(|m| m.content()), Some("hello"));
        assert_eq!(store.last_assistant().map(|m| m.id()), Some(reply));
        assert_eq!(store.len(), 2);
    }
}

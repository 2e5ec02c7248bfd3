//! Conversation state.
//!
//! Messages and the append-only store that holds them in arrival order.

mod models;
mod store;

pub use models::*;
pub use store::ConversationStore;

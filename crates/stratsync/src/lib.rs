//! StratSync chat client library.
//!
//! Sends user queries to the StratSync backend, classifies replies as text or
//! tables, and turns a stored reply into a rendered summary document on demand.

pub mod artifact;
pub mod conversation;
pub mod normalize;
pub mod render;
pub mod session;
pub mod summary;
pub mod transport;

pub use artifact::{ArtifactInfo, ArtifactManager};
pub use conversation::{Message, MessageId, Sender};
pub use normalize::{NormalizedReply, normalize};
pub use session::ChatSession;
pub use summary::{SummaryError, strip_code_fences};
pub use transport::{Backend, BackendClient, RawResponse};

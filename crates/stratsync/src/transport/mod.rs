//! Backend transport.
//!
//! Issues the two outbound requests (query processing and summary generation)
//! and hands back the raw status, content type and body without interpreting
//! them.

mod client;
mod error;
mod types;

pub use client::{Backend, BackendClient};
pub use error::{TransportError, TransportResult};
pub use types::*;

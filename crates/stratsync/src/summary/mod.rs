//! Summarization of stored replies into a rendered document.

mod error;
mod orchestrator;
mod request;
mod sanitize;

pub use error::{SummaryError, SummaryResult};
pub use orchestrator::Summarizer;
pub use request::{build_summary_request, interpret_summary_response};
pub use sanitize::strip_code_fences;

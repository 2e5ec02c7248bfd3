//! Building summary requests and reading summary responses.

use log::debug;
use serde_json::Value;

use super::error::{SummaryError, SummaryResult};
use super::sanitize::strip_code_fences;
use crate::conversation::{Message, ResponseValue};
use crate::transport::{RawResponse, SummaryRequest};

/// Reconstruct the summary request for a stored assistant message.
///
/// `data` is the first non-empty of: the retained response value, the table
/// rows, the display content, the original query.
pub fn build_summary_request(message: &Message) -> SummaryResult<SummaryRequest> {
    if !message.is_assistant() {
        return Err(SummaryError::NotAssistant(message.id()));
    }

    let bundle = message.original_request_payload();
    let query = bundle
        .map(|b| b.query.clone())
        .unwrap_or_else(|| message.content().to_string());

    let data = bundle
        .map(|b| &b.response)
        .filter(|response| !response.is_empty())
        .map(ResponseValue::to_payload_string)
        .or_else(|| {
            message
                .table()
                .filter(|rows| !rows.is_empty())
                .and_then(|rows| serde_json::to_string(rows).ok())
        })
        .or_else(|| {
            let content = message.content();
            (!content.trim().is_empty()).then(|| content.to_string())
        })
        .unwrap_or_else(|| query.clone());

    Ok(SummaryRequest { query, data })
}

/// Extract the sanitized document text from a summary response.
///
/// A JSON object with a non-blank string `data` field supersedes the raw body.
pub fn interpret_summary_response(response: &RawResponse) -> SummaryResult<String> {
    if !response.is_success() {
        return Err(SummaryError::Http {
            status: response.status,
            body: response.body.clone(),
        });
    }

    let parsed = serde_json::from_str::<Value>(&response.body).ok();
    let data_field = parsed
        .as_ref()
        .and_then(|v| v.get("data"))
        .and_then(Value::as_str)
        .filter(|data| !data.trim().is_empty());

    let document = match data_field {
        Some(data) => data,
        None => {
            if let Some(msg) = parsed.as_ref().and_then(|v| v.get("msg")).and_then(Value::as_str) {
                debug!("summary response msg: {}", msg);
            }
            response.body.as_str()
        }
    };

    Ok(strip_code_fences(document))
}

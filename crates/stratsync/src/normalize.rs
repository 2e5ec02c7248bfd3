//! Classification of raw query responses.
//!
//! Backends are inconsistent about where they put their answer: some return
//! `{"reply": "..."}`, some return a JSON-encoded array of rows inside a
//! string `data` field, some return plain text. [`normalize`] applies a fixed
//! list of rules in order and never fails; anything it cannot make sense of
//! degrades to text.

use log::{debug, warn};
use reqwest::StatusCode;
use serde_json::Value;

use crate::conversation::{Message, MessageId, PayloadBundle, ResponseValue, TableRow};
use crate::transport::{RawResponse, TransportError};

/// Shown in place of a successful reply whose body is blank.
pub const EMPTY_RESPONSE_NOTICE: &str = "(empty response)";

/// Outcome of interpreting a query response.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedReply {
    /// Display text.
    Text {
        content: String,
        payload: PayloadBundle,
    },
    /// Tabular data.
    Table {
        rows: Vec<TableRow>,
        payload: PayloadBundle,
    },
    /// The request failed; no further parsing was attempted.
    Error {
        /// HTTP status, or `None` when no response was received at all.
        status: Option<StatusCode>,
        body: String,
    },
}

impl NormalizedReply {
    /// Build the error reply for a request that never produced a response.
    pub fn from_transport_error(err: &TransportError) -> Self {
        Self::Error {
            status: None,
            body: err.to_string(),
        }
    }

    /// Text shown to the user for this reply. Empty for tables.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text { content, .. } => content.clone(),
            Self::Table { .. } => String::new(),
            Self::Error {
                status: Some(status),
                body,
            } => format!("Error: HTTP {}: {}", status.as_u16(), body),
            Self::Error { status: None, body } => format!("Error: {}", body),
        }
    }

    /// Turn the reply into the assistant message appended to the conversation.
    pub fn into_message(self, id: MessageId) -> Message {
        match self {
            Self::Table { rows, payload } => Message::assistant_table(id, rows, payload),
            Self::Text { content, payload } => Message::assistant_text(id, content, Some(payload)),
            error @ Self::Error { .. } => Message::assistant_text(id, error.display_text(), None),
        }
    }
}

/// Classify a raw query response.
///
/// Rules, first match wins:
/// 1. non-2xx status: `Error` with the status and raw body
/// 2. non-JSON content type, or a body that fails to parse: `Text` with the body
/// 3. a string `data` field that itself decodes to an array of objects: `Table`
/// 4. otherwise `Text` from `reply`, then `data`, then the re-serialized object
pub fn normalize(query: &str, response: &RawResponse) -> NormalizedReply {
    if !response.is_success() {
        return NormalizedReply::Error {
            status: Some(response.status),
            body: response.body.clone(),
        };
    }

    if !response.is_json() {
        return plain_text(query, &response.body);
    }

    let parsed: Value = match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(e) => {
            warn!("JSON content type but body did not parse ({}); showing as text", e);
            return plain_text(query, &response.body);
        }
    };

    if let Some(rows) = parsed
        .get("data")
        .and_then(Value::as_str)
        .and_then(decode_table)
    {
        debug!("reply decoded as table with {} rows", rows.len());
        return NormalizedReply::Table {
            payload: PayloadBundle {
                query: query.to_string(),
                response: ResponseValue::Rows(rows.clone()),
                raw: Some(parsed),
            },
            rows,
        };
    }

    let content = parsed
        .get("reply")
        .and_then(truthy_text)
        .or_else(|| parsed.get("data").and_then(truthy_text))
        .unwrap_or_else(|| parsed.to_string());

    NormalizedReply::Text {
        payload: PayloadBundle {
            query: query.to_string(),
            response: ResponseValue::Text(content.clone()),
            raw: Some(parsed),
        },
        content,
    }
}

fn plain_text(query: &str, body: &str) -> NormalizedReply {
    let content = if body.trim().is_empty() {
        debug!("reply body is blank");
        EMPTY_RESPONSE_NOTICE.to_string()
    } else {
        body.to_string()
    };

    NormalizedReply::Text {
        content,
        payload: PayloadBundle {
            query: query.to_string(),
            response: ResponseValue::Text(body.to_string()),
            raw: None,
        },
    }
}

/// Decode a JSON-encoded array of objects. Anything else is not a table.
fn decode_table(encoded: &str) -> Option<Vec<TableRow>> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(encoded) else {
        return None;
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(row) => Some(row),
            _ => None,
        })
        .collect()
}

/// Display text for a field, treating empty and falsy values as absent.
fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

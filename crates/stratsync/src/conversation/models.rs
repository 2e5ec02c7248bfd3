//! Conversation data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// One table row: column name to scalar value.
pub type TableRow = Map<String, Value>;

/// Hint shown instead of the summarize action when a query matched nothing.
pub const NO_MATCHING_DATA_HINT: &str = "Sorry, I couldn't find any matching data. You can try asking in a different way or use another prompt.";

/// Unique message identifier, increasing in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MessageId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(MessageId)
    }
}

/// Allocates message ids for one session.
#[derive(Debug, Default)]
pub struct MessageIdGenerator {
    next: AtomicU64,
}

impl MessageIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id. Ids start at 1 and never repeat.
    pub fn next_id(&self) -> MessageId {
        MessageId(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// The normalized value a reply was reduced to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseValue {
    Text(String),
    Rows(Vec<TableRow>),
}

impl ResponseValue {
    /// Whether the value carries anything worth summarizing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Rows(rows) => rows.is_empty(),
        }
    }

    /// Serialize to the string form sent to the summary endpoint.
    pub fn to_payload_string(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Rows(rows) => serde_json::to_string(rows).unwrap_or_default(),
        }
    }
}

/// Context retained from a successful query so a summary can be requested later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadBundle {
    /// The query text the user sent.
    pub query: String,
    /// The normalized response value.
    pub response: ResponseValue,
    /// The full parsed backend payload, when the body was JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

/// A single conversation message.
///
/// Fields are private so a message cannot change after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    id: MessageId,
    content: String,
    sender: Sender,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    table: Option<Vec<TableRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_request_payload: Option<PayloadBundle>,
}

impl Message {
    /// Create a user message.
    pub fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            sender: Sender::User,
            timestamp: Utc::now(),
            table: None,
            original_request_payload: None,
        }
    }

    /// Create an assistant text message.
    pub fn assistant_text(
        id: MessageId,
        content: impl Into<String>,
        payload: Option<PayloadBundle>,
    ) -> Self {
        Self {
            id,
            content: content.into(),
            sender: Sender::Assistant,
            timestamp: Utc::now(),
            table: None,
            original_request_payload: payload,
        }
    }

    /// Create an assistant table message. Content is empty.
    pub fn assistant_table(id: MessageId, rows: Vec<TableRow>, payload: PayloadBundle) -> Self {
        Self {
            id,
            content: String::new(),
            sender: Sender::Assistant,
            timestamp: Utc::now(),
            table: Some(rows),
            original_request_payload: Some(payload),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn table(&self) -> Option<&[TableRow]> {
        self.table.as_deref()
    }

    pub fn original_request_payload(&self) -> Option<&PayloadBundle> {
        self.original_request_payload.as_ref()
    }

    pub fn is_assistant(&self) -> bool {
        self.sender == Sender::Assistant
    }

    /// Whether the summarize action should be offered.
    ///
    /// A table reply with zero rows means the query matched nothing.
    pub fn can_summarize(&self) -> bool {
        match (self.sender, &self.table) {
            (Sender::User, _) => false,
            (Sender::Assistant, Some(rows)) => !rows.is_empty(),
            (Sender::Assistant, None) => true,
        }
    }

    /// Shape handed to the rendering collaborator.
    pub fn view(&self) -> MessageView<'_> {
        match &self.table {
            Some(table) => MessageView::Table { table },
            None => MessageView::Content {
                content: &self.content,
            },
        }
    }
}

/// Either `{content}` or `{table}`, as consumed by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageView<'a> {
    Content { content: &'a str },
    Table { table: &'a [TableRow] },
}

/// Union of column names across rows, in first-seen order.
pub fn table_columns(rows: &[TableRow]) -> Vec<&str> {
    let mut columns: Vec<&str> = Vec::new();
    for key in rows.iter().flat_map(|row| row.keys()) {
        if !columns.contains(&key.as_str()) {
            columns.push(key);
        }
    }
    columns
}

//! Plain-text rendering for terminal front-ends.

use chrono::Local;
use serde_json::Value;
use std::fmt::Write;

use crate::artifact::ArtifactInfo;
use crate::conversation::{
    Message, MessageView, NO_MATCHING_DATA_HINT, Sender, TableRow, table_columns,
};

/// Text of one table cell. Missing and null values render empty.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render rows as an aligned text table.
///
/// Columns are the union of keys across rows; rows missing a column get an
/// empty cell. Returns an empty string for zero rows.
pub fn format_table(rows: &[TableRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let columns = table_columns(rows);
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| cell_text(row.get(*c))).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(col.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_row(&mut out, columns.iter().copied(), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, rule.iter().map(String::as_str), &widths);
    for row in &cells {
        push_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    out.push_str(line.join(" | ").trim_end());
    out.push('\n');
}

/// Render a message as it appears in the transcript.
pub fn format_message(message: &Message) -> String {
    let mut out = String::new();
    let who = match message.sender() {
        Sender::User => "you",
        Sender::Assistant => "assistant",
    };
    let time = message.timestamp().with_timezone(&Local).format("%H:%M");
    let _ = writeln!(out, "[{}] {} {}:", message.id(), who, time);

    match message.view() {
        MessageView::Table { table } => out.push_str(&format_table(table)),
        MessageView::Content { content } => {
            out.push_str(content);
            out.push('\n');
        }
    }

    if message.is_assistant() && !message.can_summarize() {
        let _ = writeln!(out, "({})", NO_MATCHING_DATA_HINT);
    }
    out
}

/// One-line notice for a freshly published summary.
pub fn format_artifact(artifact: &ArtifactInfo) -> String {
    format!(
        "summary for [{}] ready: {}",
        artifact.message_id,
        artifact.url()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{MessageIdGenerator, PayloadBundle, ResponseValue};
    use serde_json::json;

    fn rows(value: Value) -> Vec<TableRow> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_format_table_with_heterogeneous_rows() {
        let rows = rows(json!([
            {"name": "Acme", "value": 10},
            {"name": "Globex", "region": "EU", "value": null}
        ]));
        let table = format_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "name   | value | region");
        assert_eq!(lines[1], "------ | ----- | ------");
        assert_eq!(lines[2], "Acme   | 10    |");
        assert_eq!(lines[3], "Globex |       | EU");
    }

    #[test]
    fn test_empty_table_renders_nothing() {
        assert_eq!(format_table(&[]), "");
    }

    #[test]
    fn test_format_message_shows_hint_for_empty_table() {
        let ids = MessageIdGenerator::new();
        let payload = PayloadBundle {
            query: "q".to_string(),
            response: ResponseValue::Rows(vec![]),
            raw: None,
        };
        let msg = Message::assistant_table(ids.next_id(), vec![], payload);
        let text = format_message(&msg);
        assert!(text.starts_with("[1] assistant "));
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains(NO_MATCHING_DATA_HINT));
    }

    #[test]
    fn test_format_message_renders_content_with_time() {
        let ids = MessageIdGenerator::new();
        let msg = Message::user(ids.next_id(), "hello");
        let time = msg.timestamp().with_timezone(&Local).format("%H:%M");
        assert_eq!(format_message(&msg), format!("[1] you {time}:\nhello\n"));
    }

    #[test]
    fn test_cell_text_for_nested_values() {
        assert_eq!(cell_text(Some(&json!({"a": 1}))), r#"{"a":1}"#);
        assert_eq!(cell_text(Some(&json!(true))), "true");
        assert_eq!(cell_text(Some(&json!("x"))), "x");
    }
}

//! Raw provider rows and their mapping to [`Message`]
//!
//! Rows are loosely typed: a column may be missing, NULL, or carry a
//! different storage class than expected. Mapping never fails; a malformed
//! column falls back to an empty/zero value so one bad row cannot abort a
//! batch.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::columns::{ProviderTable, mms, part, sms};
use crate::models::{Attachment, Message, MessageId, MessageKind, MessageType, ThreadId};

/// A single column value as returned by the provider
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<i64> for ProviderValue {
    fn from(v: i64) -> Self {
        ProviderValue::Integer(v)
    }
}

impl From<i32> for ProviderValue {
    fn from(v: i32) -> Self {
        ProviderValue::Integer(i64::from(v))
    }
}

impl From<bool> for ProviderValue {
    fn from(v: bool) -> Self {
        ProviderValue::Integer(i64::from(v))
    }
}

impl From<&str> for ProviderValue {
    fn from(v: &str) -> Self {
        ProviderValue::Text(v.to_string())
    }
}

impl From<String> for ProviderValue {
    fn from(v: String) -> Self {
        ProviderValue::Text(v)
    }
}

impl From<Vec<u8>> for ProviderValue {
    fn from(v: Vec<u8>) -> Self {
        ProviderValue::Blob(v)
    }
}

impl<T: Into<ProviderValue>> From<Option<T>> for ProviderValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ProviderValue::Null, Into::into)
    }
}

/// Column/value pairs for inserts and updates
pub type ContentValues = BTreeMap<String, ProviderValue>;

/// A row returned by a provider query
///
/// MMS rows carry their parts as nested rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderRow {
    columns: BTreeMap<String, ProviderValue>,
    parts: Vec<ProviderRow>,
}

impl ProviderRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<ProviderValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<ProviderValue>) {
        self.columns.insert(column.to_string(), value.into());
    }

    pub fn push_part(&mut self, part: ProviderRow) {
        self.parts.push(part);
    }

    pub fn parts(&self) -> &[ProviderRow] {
        &self.parts
    }

    pub fn get(&self, column: &str) -> Option<&ProviderValue> {
        self.columns.get(column)
    }

    /// Column as text; integers are rendered, NULL and blobs are `None`
    pub fn text(&self, column: &str) -> Option<String> {
        match self.columns.get(column)? {
            ProviderValue::Text(s) => Some(s.clone()),
            ProviderValue::Integer(i) => Some(i.to_string()),
            ProviderValue::Real(r) => Some(r.to_string()),
            ProviderValue::Null | ProviderValue::Blob(_) => None,
        }
    }

    /// Column as an integer; numeric text is parsed
    pub fn integer(&self, column: &str) -> Option<i64> {
        match self.columns.get(column)? {
            ProviderValue::Integer(i) => Some(*i),
            ProviderValue::Real(r) => Some(*r as i64),
            ProviderValue::Text(s) => s.trim().parse().ok(),
            ProviderValue::Null | ProviderValue::Blob(_) => None,
        }
    }

    pub fn blob(&self, column: &str) -> Option<&[u8]> {
        match self.columns.get(column)? {
            ProviderValue::Blob(b) => Some(b),
            _ => None,
        }
    }
}

/// Map a provider row to a message
pub fn map_row(row: &ProviderRow, table: ProviderTable) -> Message {
    match table {
        ProviderTable::Sms => map_sms_row(row),
        ProviderTable::Mms => map_mms_row(row),
    }
}

fn map_sms_row(row: &ProviderRow) -> Message {
    Message::builder(
        MessageId::for_row(MessageKind::Sms, &row.text(sms::ID).unwrap_or_default()),
        MessageKind::Sms,
    )
    .address(row.text(sms::ADDRESS).unwrap_or_default())
    .body(row.text(sms::BODY).unwrap_or_default())
    .date(row.integer(sms::DATE).unwrap_or(0))
    .message_type(MessageType::from_code(row.integer(sms::TYPE).unwrap_or(0)))
    .read(row.integer(sms::READ).unwrap_or(0) == 1)
    .thread_id(ThreadId::new(row.text(sms::THREAD_ID).unwrap_or_default()))
    .build()
}

fn map_mms_row(row: &ProviderRow) -> Message {
    let date_seconds = row.integer(mms::DATE).unwrap_or(0);

    let mut text_parts = Vec::new();
    let mut attachments = Vec::new();
    for p in row.parts() {
        let content_type = p.text(part::CONTENT_TYPE).unwrap_or_default();
        if content_type == part::CONTENT_TYPE_TEXT {
            if let Some(text) = p.text(part::TEXT) {
                text_parts.push(text);
            }
        } else if content_type != part::CONTENT_TYPE_SMIL {
            attachments.push(map_part(p, content_type));
        }
    }

    let mut builder = Message::builder(
        MessageId::for_row(MessageKind::Mms, &row.text(mms::ID).unwrap_or_default()),
        MessageKind::Mms,
    )
    .address(row.text(mms::ADDRESS).unwrap_or_default())
    .date(date_seconds.saturating_mul(ProviderTable::Mms.date_scale()))
    .message_type(MessageType::from_code(row.integer(mms::MSG_BOX).unwrap_or(0)))
    .read(row.integer(mms::READ).unwrap_or(0) == 1)
    .thread_id(ThreadId::new(row.text(mms::THREAD_ID).unwrap_or_default()))
    .attachments(attachments);

    if !text_parts.is_empty() {
        builder = builder.body(text_parts.join("\n"));
    }
    builder.build()
}

fn map_part(p: &ProviderRow, content_type: String) -> Attachment {
    let id = p.text(part::ID).unwrap_or_default();
    let file_name = p
        .text(part::NAME)
        .or_else(|| p.text(part::CONTENT_LOCATION))
        .filter(|name| !name.is_empty());

    let (data, size) = match p.blob(part::DATA) {
        Some(bytes) => (BASE64.encode(bytes), bytes.len() as u64),
        None => {
            // Bytes live in a file; hand out a content reference instead
            let size = p.integer("size").unwrap_or(0).max(0) as u64;
            (format!("content://mms/part/{}", id), size)
        }
    };

    Attachment {
        id,
        content_type,
        file_name,
        data,
        size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sms_row() -> ProviderRow {
        ProviderRow::new()
            .with(sms::ID, 12)
            .with(sms::ADDRESS, "555")
            .with(sms::BODY, "hello")
            .with(sms::DATE, 1_700_000_000_000i64)
            .with(sms::TYPE, 2)
            .with(sms::READ, 1)
            .with(sms::THREAD_ID, 3)
    }

    #[test]
    fn test_map_sms_row() {
        let msg = map_row(&sms_row(), ProviderTable::Sms);
        assert_eq!(msg.id.as_str(), "12");
        assert_eq!(msg.kind, MessageKind::Sms);
        assert_eq!(msg.address, "555");
        assert_eq!(msg.body.as_deref(), Some("hello"));
        assert_eq!(msg.date, 1_700_000_000_000);
        assert_eq!(msg.message_type, MessageType::Sent);
        assert!(msg.read);
        assert_eq!(msg.thread_id.as_str(), "3");
    }

    #[test]
    fn test_null_text_fields_become_empty() {
        let row = sms_row()
            .with(sms::ADDRESS, ProviderValue::Null)
            .with(sms::BODY, ProviderValue::Null);
        let msg = map_row(&row, ProviderTable::Sms);
        assert_eq!(msg.address, "");
        assert_eq!(msg.body.as_deref(), Some(""));
    }

    #[test]
    fn test_missing_columns_do_not_fail() {
        let msg = map_row(&ProviderRow::new(), ProviderTable::Sms);
        assert_eq!(msg.id.as_str(), "");
        assert_eq!(msg.address, "");
        assert_eq!(msg.body.as_deref(), Some(""));
        assert_eq!(msg.date, 0);
        assert!(!msg.read);
        assert_eq!(msg.message_type, MessageType::Inbox);
    }

    #[test]
    fn test_unknown_type_code_maps_to_inbox() {
        let row = sms_row().with(sms::TYPE, 99);
        assert_eq!(map_row(&row, ProviderTable::Sms).message_type, MessageType::Inbox);
    }

    #[test]
    fn test_numeric_text_is_parsed() {
        let row = sms_row().with(sms::DATE, "1234").with(sms::READ, "1");
        let msg = map_row(&row, ProviderTable::Sms);
        assert_eq!(msg.date, 1234);
        assert!(msg.read);
    }

    #[test]
    fn test_map_mms_row_with_parts() {
        let mut row = ProviderRow::new()
            .with(mms::ID, 5)
            .with(mms::ADDRESS, "777")
            .with(mms::DATE, 1_700_000_000i64)
            .with(mms::MSG_BOX, 1)
            .with(mms::READ, 0)
            .with(mms::THREAD_ID, 8);
        row.push_part(
            ProviderRow::new()
                .with(part::ID, 1)
                .with(part::CONTENT_TYPE, part::CONTENT_TYPE_SMIL)
                .with(part::TEXT, "<smil/>"),
        );
        row.push_part(
            ProviderRow::new()
                .with(part::ID, 2)
                .with(part::CONTENT_TYPE, part::CONTENT_TYPE_TEXT)
                .with(part::TEXT, "look"),
        );
        row.push_part(
            ProviderRow::new()
                .with(part::ID, 3)
                .with(part::CONTENT_TYPE, "image/png")
                .with(part::NAME, "cat.png")
                .with(part::DATA, vec![1u8, 2, 3]),
        );
        row.push_part(
            ProviderRow::new()
                .with(part::ID, 4)
                .with(part::CONTENT_TYPE, "video/mp4")
                .with(part::DATA_PATH, "/data/parts/4"),
        );

        let msg = map_row(&row, ProviderTable::Mms);
        assert_eq!(msg.kind, MessageKind::Mms);
        assert_eq!(msg.date, 1_700_000_000_000);
        assert_eq!(msg.body.as_deref(), Some("look"));
        assert_eq!(msg.attachments.len(), 2);

        let image = &msg.attachments[0];
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.file_name.as_deref(), Some("cat.png"));
        assert_eq!(image.data, "AQID");
        assert_eq!(image.size, 3);

        let video = &msg.attachments[1];
        assert_eq!(video.data, "content://mms/part/4");
        assert_eq!(video.file_name, None);
    }

    #[test]
    fn test_mms_id_is_prefixed() {
        let row = ProviderRow::new().with(mms::ID, 12);
        let msg = map_row(&row, ProviderTable::Mms);
        assert_eq!(msg.id.as_str(), "mms:12");
        assert_ne!(msg.id, map_row(&sms_row(), ProviderTable::Sms).id);
    }

    #[test]
    fn test_mms_without_text_has_no_body() {
        let row = ProviderRow::new().with(mms::ID, 5).with(mms::MSG_BOX, 2);
        let msg = map_row(&row, ProviderTable::Mms);
        assert_eq!(msg.body, None);
        assert_eq!(msg.address, "");
        assert_eq!(msg.message_type, MessageType::Sent);
    }
}

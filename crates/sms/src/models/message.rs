//! Message model representing a single SMS or MMS in the provider store

use super::ThreadId;
use serde::{Deserialize, Serialize};

/// Row ids are only unique per table, so MMS ids carry this prefix
const MMS_ID_PREFIX: &str = "mms:";

/// Unique identifier for a message
///
/// SMS ids are the bare provider row id; MMS ids are `mms:<row id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id of a provider row in the table holding `kind` messages
    pub fn for_row(kind: MessageKind, row_id: &str) -> Self {
        match kind {
            MessageKind::Sms => Self::new(row_id),
            MessageKind::Mms => Self(format!("{}{}", MMS_ID_PREFIX, row_id)),
        }
    }

    /// The kind of message this id names and its provider row id
    pub fn row(&self) -> (MessageKind, &str) {
        match self.0.strip_prefix(MMS_ID_PREFIX) {
            Some(row_id) => (MessageKind::Mms, row_id),
            None => (MessageKind::Sms, self.0.as_str()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which provider table a message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Sms,
    Mms,
}

/// Mailbox a message lives in
///
/// Provider type codes follow the telephony contract:
/// 1 inbox, 2 sent, 3 draft, 4 outbox, 5 failed, 6 queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Inbox,
    Sent,
    Draft,
    Outbox,
    Failed,
    Queued,
}

impl MessageType {
    pub const ALL: [MessageType; 6] = [
        MessageType::Inbox,
        MessageType::Sent,
        MessageType::Draft,
        MessageType::Outbox,
        MessageType::Failed,
        MessageType::Queued,
    ];

    /// Map a provider type code to a message type
    ///
    /// Codes outside the known table map to `Inbox`; the provider's code
    /// space is larger than the six values exposed here.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => MessageType::Inbox,
            2 => MessageType::Sent,
            3 => MessageType::Draft,
            4 => MessageType::Outbox,
            5 => MessageType::Failed,
            6 => MessageType::Queued,
            _ => MessageType::Inbox,
        }
    }

    /// Provider type code for this message type
    pub fn code(self) -> i64 {
        match self {
            MessageType::Inbox => 1,
            MessageType::Sent => 2,
            MessageType::Draft => 3,
            MessageType::Outbox => 4,
            MessageType::Failed => 5,
            MessageType::Queued => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Inbox => "inbox",
            MessageType::Sent => "sent",
            MessageType::Draft => "draft",
            MessageType::Outbox => "outbox",
            MessageType::Failed => "failed",
            MessageType::Queued => "queued",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// A part of an MMS message that is not body text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Provider part id
    pub id: String,
    /// MIME type (e.g., "image/jpeg")
    pub content_type: String,
    /// Original file name, if the part carried one
    pub file_name: Option<String>,
    /// Base64 payload, or a `content://` reference when the bytes live in a file
    pub data: String,
    /// Payload size in bytes
    pub size: u64,
}

/// A single SMS or MMS message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub kind: MessageKind,
    /// Other party's address (phone number or short code)
    pub address: String,
    /// Body text; always present for SMS, optional for MMS
    pub body: Option<String>,
    /// Milliseconds since epoch
    pub date: i64,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub read: bool,
    pub thread_id: ThreadId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Create a new message builder
    pub fn builder(id: MessageId, kind: MessageKind) -> MessageBuilder {
        MessageBuilder::new(id, kind)
    }

    /// Body text, or an empty string for MMS without text parts
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }
}

/// Builder for creating Message instances
pub struct MessageBuilder {
    id: MessageId,
    kind: MessageKind,
    address: String,
    body: Option<String>,
    date: i64,
    message_type: MessageType,
    read: bool,
    thread_id: ThreadId,
    attachments: Vec<Attachment>,
}

impl MessageBuilder {
    fn new(id: MessageId, kind: MessageKind) -> Self {
        Self {
            id,
            kind,
            address: String::new(),
            body: None,
            date: 0,
            message_type: MessageType::Inbox,
            read: false,
            thread_id: ThreadId::default(),
            attachments: Vec::new(),
        }
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn date(mut self, date: i64) -> Self {
        self.date = date;
        self
    }

    pub fn message_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    pub fn read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    pub fn thread_id(mut self, thread_id: impl Into<ThreadId>) -> Self {
        self.thread_id = thread_id.into();
        self
    }

    pub fn attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn build(self) -> Message {
        // SMS rows never carry a missing body
        let body = match self.kind {
            MessageKind::Sms => Some(self.body.unwrap_or_default()),
            MessageKind::Mms => self.body,
        };
        Message {
            id: self.id,
            kind: self.kind,
            address: self.address,
            body,
            date: self.date,
            message_type: self.message_type,
            read: self.read,
            thread_id: self.thread_id,
            attachments: self.attachments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_code_round_trip() {
        for t in MessageType::ALL {
            assert_eq!(MessageType::from_code(t.code()), t);
        }
    }

    #[test]
    fn test_unknown_type_code_is_inbox() {
        assert_eq!(MessageType::from_code(0), MessageType::Inbox);
        assert_eq!(MessageType::from_code(42), MessageType::Inbox);
        assert_eq!(MessageType::from_code(-1), MessageType::Inbox);
    }

    #[test]
    fn test_parse_type() {
        assert_eq!(MessageType::parse("outbox"), Some(MessageType::Outbox));
        assert_eq!(MessageType::parse("spam"), None);
    }

    #[test]
    fn test_ids_name_their_table() {
        let sms = MessageId::for_row(MessageKind::Sms, "1");
        let mms = MessageId::for_row(MessageKind::Mms, "1");
        assert_ne!(sms, mms);
        assert_eq!(mms.as_str(), "mms:1");
        assert_eq!(sms.row(), (MessageKind::Sms, "1"));
        assert_eq!(mms.row(), (MessageKind::Mms, "1"));
    }

    #[test]
    fn test_sms_builder_defaults_body() {
        let msg = Message::builder(MessageId::new("1"), MessageKind::Sms).build();
        assert_eq!(msg.body.as_deref(), Some(""));
        assert_eq!(msg.address, "");
        assert!(!msg.read);
    }

    #[test]
    fn test_mms_builder_keeps_missing_body() {
        let msg = Message::builder(MessageId::new("1"), MessageKind::Mms).build();
        assert_eq!(msg.body, None);
        assert_eq!(msg.body_text(), "");
    }

    #[test]
    fn test_serializes_type_field() {
        let msg = Message::builder(MessageId::new("7"), MessageKind::Sms)
            .address("555")
            .message_type(MessageType::Sent)
            .thread_id("3")
            .build();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "sent");
        assert_eq!(json["threadId"], "3");
        assert!(json.get("attachments").is_none());
    }
}

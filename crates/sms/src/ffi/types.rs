//! FFI-friendly type wrappers for UniFFI export
//!
//! These types convert internal Rust types to FFI-compatible versions:
//! - `MessageId`/`ThreadId` → `String`
//! - `usize` counts → `u32`
//! - events → a flat enum with one variant per event kind

use crate::events::{EventKind, MessagingEvent, SendOutcome};
use crate::models::{
    Attachment, ConversationThread, Message, MessageFilter, MessageId, MessageKind, MessageType,
    OutgoingAttachment, OutgoingMms, OutgoingSms, PermissionState, SendResult, ThreadId,
};

// ============================================================================
// Error Types
// ============================================================================

/// FFI-friendly error type
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum SmsError {
    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Callback error: {message}")]
    Callback { message: String },
}

impl From<uniffi::UnexpectedUniFFICallbackError> for SmsError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        SmsError::Callback { message: e.reason }
    }
}

// ============================================================================
// Message Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiMessageKind {
    Sms,
    Mms,
}

impl From<MessageKind> for FfiMessageKind {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Sms => FfiMessageKind::Sms,
            MessageKind::Mms => FfiMessageKind::Mms,
        }
    }
}

impl From<FfiMessageKind> for MessageKind {
    fn from(kind: FfiMessageKind) -> Self {
        match kind {
            FfiMessageKind::Sms => MessageKind::Sms,
            FfiMessageKind::Mms => MessageKind::Mms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiMessageType {
    Inbox,
    Sent,
    Draft,
    Outbox,
    Failed,
    Queued,
}

impl From<MessageType> for FfiMessageType {
    fn from(t: MessageType) -> Self {
        match t {
            MessageType::Inbox => FfiMessageType::Inbox,
            MessageType::Sent => FfiMessageType::Sent,
            MessageType::Draft => FfiMessageType::Draft,
            MessageType::Outbox => FfiMessageType::Outbox,
            MessageType::Failed => FfiMessageType::Failed,
            MessageType::Queued => FfiMessageType::Queued,
        }
    }
}

impl From<FfiMessageType> for MessageType {
    fn from(t: FfiMessageType) -> Self {
        match t {
            FfiMessageType::Inbox => MessageType::Inbox,
            FfiMessageType::Sent => MessageType::Sent,
            FfiMessageType::Draft => MessageType::Draft,
            FfiMessageType::Outbox => MessageType::Outbox,
            FfiMessageType::Failed => MessageType::Failed,
            FfiMessageType::Queued => MessageType::Queued,
        }
    }
}

/// FFI-friendly MMS attachment
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAttachment {
    pub id: String,
    pub content_type: String,
    pub file_name: Option<String>,
    /// Base64 payload or `content://` reference
    pub data: String,
    pub size: u64,
}

impl From<Attachment> for FfiAttachment {
    fn from(a: Attachment) -> Self {
        Self {
            id: a.id,
            content_type: a.content_type,
            file_name: a.file_name,
            data: a.data,
            size: a.size,
        }
    }
}

impl From<FfiAttachment> for Attachment {
    fn from(a: FfiAttachment) -> Self {
        Self {
            id: a.id,
            content_type: a.content_type,
            file_name: a.file_name,
            data: a.data,
            size: a.size,
        }
    }
}

/// FFI-friendly message representation
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMessage {
    pub id: String,
    pub kind: FfiMessageKind,
    pub address: String,
    pub body: Option<String>,
    /// Milliseconds since epoch
    pub date: i64,
    pub message_type: FfiMessageType,
    pub read: bool,
    pub thread_id: String,
    pub attachments: Vec<FfiAttachment>,
}

impl From<Message> for FfiMessage {
    fn from(m: Message) -> Self {
        Self {
            id: m.id.0,
            kind: m.kind.into(),
            address: m.address,
            body: m.body,
            date: m.date,
            message_type: m.message_type.into(),
            read: m.read,
            thread_id: m.thread_id.0,
            attachments: m.attachments.into_iter().map(FfiAttachment::from).collect(),
        }
    }
}

impl From<FfiMessage> for Message {
    fn from(m: FfiMessage) -> Self {
        let mut builder = Message::builder(MessageId::new(m.id), m.kind.into())
            .address(m.address)
            .date(m.date)
            .message_type(m.message_type.into())
            .read(m.read)
            .thread_id(ThreadId::new(m.thread_id))
            .attachments(m.attachments.into_iter().map(Attachment::from).collect());
        if let Some(body) = m.body {
            builder = builder.body(body);
        }
        builder.build()
    }
}

// ============================================================================
// Thread Types
// ============================================================================

/// FFI-friendly conversation summary
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConversationThread {
    pub thread_id: String,
    pub address: String,
    pub message_count: u32,
    pub last_message: String,
    pub last_message_date: i64,
    pub unread_count: u32,
}

impl From<ConversationThread> for FfiConversationThread {
    fn from(t: ConversationThread) -> Self {
        Self {
            thread_id: t.thread_id.0,
            address: t.address,
            message_count: t.message_count as u32,
            last_message: t.last_message,
            last_message_date: t.last_message_date,
            unread_count: t.unread_count as u32,
        }
    }
}

// ============================================================================
// Filter
// ============================================================================

/// FFI-friendly message filter; every field is optional
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiMessageFilter {
    #[uniffi(default = None)]
    pub address: Option<String>,
    #[uniffi(default = None)]
    pub start_date: Option<i64>,
    #[uniffi(default = None)]
    pub end_date: Option<i64>,
    #[uniffi(default = None)]
    pub message_type: Option<FfiMessageType>,
    #[uniffi(default = None)]
    pub read: Option<bool>,
    #[uniffi(default = None)]
    pub thread_id: Option<String>,
    #[uniffi(default = None)]
    pub limit: Option<u32>,
    #[uniffi(default = None)]
    pub offset: Option<u32>,
}

impl From<FfiMessageFilter> for MessageFilter {
    fn from(f: FfiMessageFilter) -> Self {
        Self {
            address: f.address,
            start_date: f.start_date,
            end_date: f.end_date,
            message_type: f.message_type.map(MessageType::from),
            read: f.read,
            thread_id: f.thread_id.map(ThreadId::new),
            limit: f.limit,
            offset: f.offset,
        }
    }
}

// ============================================================================
// Send Types
// ============================================================================

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSendResult {
    pub success: bool,
    /// Correlation id echoed by the sent/delivered events
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl From<SendResult> for FfiSendResult {
    fn from(r: SendResult) -> Self {
        Self {
            success: r.success,
            message_id: r.message_id,
            error: r.error,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOutgoingAttachment {
    pub uri: String,
    pub content_type: String,
    pub name: Option<String>,
}

impl From<FfiOutgoingAttachment> for OutgoingAttachment {
    fn from(a: FfiOutgoingAttachment) -> Self {
        Self {
            uri: a.uri,
            content_type: a.content_type,
            name: a.name,
        }
    }
}

impl From<OutgoingAttachment> for FfiOutgoingAttachment {
    fn from(a: OutgoingAttachment) -> Self {
        Self {
            uri: a.uri,
            content_type: a.content_type,
            name: a.name,
        }
    }
}

/// Text message handed to the host's send API
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOutgoingSms {
    pub correlation_id: String,
    pub address: String,
    pub body: String,
    pub delivery_receipt: bool,
}

impl From<&OutgoingSms> for FfiOutgoingSms {
    fn from(s: &OutgoingSms) -> Self {
        Self {
            correlation_id: s.correlation_id.clone(),
            address: s.address.clone(),
            body: s.body.clone(),
            delivery_receipt: s.delivery_receipt,
        }
    }
}

/// Multimedia message handed to the host's send API
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOutgoingMms {
    pub correlation_id: String,
    pub address: String,
    pub body: Option<String>,
    pub attachments: Vec<FfiOutgoingAttachment>,
    pub delivery_receipt: bool,
}

impl From<&OutgoingMms> for FfiOutgoingMms {
    fn from(m: &OutgoingMms) -> Self {
        Self {
            correlation_id: m.correlation_id.clone(),
            address: m.address.clone(),
            body: m.body.clone(),
            attachments: m
                .attachments
                .iter()
                .cloned()
                .map(FfiOutgoingAttachment::from)
                .collect(),
            delivery_receipt: m.delivery_receipt,
        }
    }
}

#[derive(Debug, Clone, Copy, uniffi::Record)]
pub struct FfiPermissionState {
    pub read: bool,
    pub send: bool,
    pub receive: bool,
}

impl From<PermissionState> for FfiPermissionState {
    fn from(p: PermissionState) -> Self {
        Self {
            read: p.read,
            send: p.send,
            receive: p.receive,
        }
    }
}

// ============================================================================
// Event Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiEventKind {
    SmsReceived,
    MmsReceived,
    SmsSent,
    MmsSent,
    SmsDelivered,
    MmsDelivered,
}

impl From<FfiEventKind> for EventKind {
    fn from(k: FfiEventKind) -> Self {
        match k {
            FfiEventKind::SmsReceived => EventKind::SmsReceived,
            FfiEventKind::MmsReceived => EventKind::MmsReceived,
            FfiEventKind::SmsSent => EventKind::SmsSent,
            FfiEventKind::MmsSent => EventKind::MmsSent,
            FfiEventKind::SmsDelivered => EventKind::SmsDelivered,
            FfiEventKind::MmsDelivered => EventKind::MmsDelivered,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSendOutcome {
    pub message_id: String,
    pub success: bool,
    pub error: Option<String>,
}

impl From<SendOutcome> for FfiSendOutcome {
    fn from(o: SendOutcome) -> Self {
        Self {
            message_id: o.message_id,
            success: o.success,
            error: o.error,
        }
    }
}

impl From<FfiSendOutcome> for SendOutcome {
    fn from(o: FfiSendOutcome) -> Self {
        Self {
            message_id: o.message_id,
            success: o.success,
            error: o.error,
        }
    }
}

/// A messaging event crossing the FFI boundary in either direction
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiEvent {
    SmsReceived { message: FfiMessage },
    MmsReceived { message: FfiMessage },
    SmsSent { outcome: FfiSendOutcome },
    MmsSent { outcome: FfiSendOutcome },
    SmsDelivered { outcome: FfiSendOutcome },
    MmsDelivered { outcome: FfiSendOutcome },
}

impl From<MessagingEvent> for FfiEvent {
    fn from(e: MessagingEvent) -> Self {
        match e {
            MessagingEvent::SmsReceived(m) => FfiEvent::SmsReceived { message: m.into() },
            MessagingEvent::MmsReceived(m) => FfiEvent::MmsReceived { message: m.into() },
            MessagingEvent::SmsSent(o) => FfiEvent::SmsSent { outcome: o.into() },
            MessagingEvent::MmsSent(o) => FfiEvent::MmsSent { outcome: o.into() },
            MessagingEvent::SmsDelivered(o) => FfiEvent::SmsDelivered { outcome: o.into() },
            MessagingEvent::MmsDelivered(o) => FfiEvent::MmsDelivered { outcome: o.into() },
        }
    }
}

impl From<FfiEvent> for MessagingEvent {
    fn from(e: FfiEvent) -> Self {
        match e {
            FfiEvent::SmsReceived { message } => MessagingEvent::SmsReceived(message.into()),
            FfiEvent::MmsReceived { message } => MessagingEvent::MmsReceived(message.into()),
            FfiEvent::SmsSent { outcome } => MessagingEvent::SmsSent(outcome.into()),
            FfiEvent::MmsSent { outcome } => MessagingEvent::MmsSent(outcome.into()),
            FfiEvent::SmsDelivered { outcome } => MessagingEvent::SmsDelivered(outcome.into()),
            FfiEvent::MmsDelivered { outcome } => MessagingEvent::MmsDelivered(outcome.into()),
        }
    }
}

// ============================================================================
// Callback Traits
// ============================================================================

/// Host permission API
#[uniffi::export(callback_interface)]
pub trait FfiPermissionChecker: Send + Sync {
    /// Whether the named permission (e.g. "READ_SMS") is granted right now
    fn is_granted(&self, permission: String) -> bool;
}

/// Host send API
///
/// Implementations submit the message and return. Sent and delivery
/// reports go back through `SmsService::publish_native_event`.
#[uniffi::export(callback_interface)]
pub trait FfiTransport: Send + Sync {
    fn send_text(&self, sms: FfiOutgoingSms) -> Result<(), SmsError>;
    fn send_multimedia(&self, mms: FfiOutgoingMms) -> Result<(), SmsError>;
}

/// Host compose UI
#[uniffi::export(callback_interface)]
pub trait FfiComposePresenter: Send + Sync {
    fn can_send_text(&self) -> bool;
    fn can_send_attachments(&self) -> bool;
    fn present(
        &self,
        recipients: Vec<String>,
        body: Option<String>,
        attachments: Vec<FfiOutgoingAttachment>,
    ) -> Result<(), SmsError>;
}

/// Subscriber for messaging events
#[uniffi::export(callback_interface)]
pub trait FfiEventCallback: Send + Sync {
    fn on_event(&self, event: FfiEvent);
}

// ============================================================================
// Log Callback
// ============================================================================

/// Log level for FFI callback
#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<log::Level> for FfiLogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => FfiLogLevel::Error,
            log::Level::Warn => FfiLogLevel::Warn,
            log::Level::Info => FfiLogLevel::Info,
            log::Level::Debug => FfiLogLevel::Debug,
            log::Level::Trace => FfiLogLevel::Trace,
        }
    }
}

impl From<FfiLogLevel> for log::Level {
    fn from(level: FfiLogLevel) -> Self {
        match level {
            FfiLogLevel::Error => log::Level::Error,
            FfiLogLevel::Warn => log::Level::Warn,
            FfiLogLevel::Info => log::Level::Info,
            FfiLogLevel::Debug => log::Level::Debug,
            FfiLogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Callback interface for receiving log messages from Rust
///
/// Hosts forward these to os_log on Apple platforms or Logcat on Android.
#[uniffi::export(callback_interface)]
pub trait LogCallback: Send + Sync {
    /// * `target` - the logging target, typically the module path (e.g. "sms::manager")
    fn on_log(&self, level: FfiLogLevel, target: String, message: String);
}

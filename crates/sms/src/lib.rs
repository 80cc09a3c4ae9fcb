//! SMS crate - unified SMS/MMS messaging core
//!
//! This crate provides the platform-independent half of a messaging API:
//! - Domain models (Message, ConversationThread, MessageFilter)
//! - Filter translation and row mapping for the telephony provider
//! - A capability gate over per-platform permissions
//! - The `SmsManager` facade for sending, reading and managing messages
//! - An event bridge for received/sent/delivered notifications
//! - Platform backends for provider-style and compose-only platforms
//!
//! The `ffi` module exposes the facade to Swift/Kotlin through UniFFI.

uniffi::setup_scaffolding!();

pub mod actions;
pub mod capability;
pub mod config;
pub mod events;
pub mod ffi;
pub mod manager;
pub mod models;
pub mod platform;
pub mod provider;
pub mod query;

pub use actions::ActionHandler;
pub use capability::{CapabilityGate, Denial};
pub use config::{ManagerConfig, ProviderConfig, SwitchboardConfig};
pub use events::{
    EventBridge, EventKind, EventSink, ListenerRegistration, MessagingEvent, SendOutcome,
    Subscription,
};
pub use manager::SmsManager;
pub use models::{
    Attachment, ConversationThread, Message, MessageBuilder, MessageFilter, MessageId,
    MessageKind, MessageType, OutgoingAttachment, OutgoingMms, OutgoingSms, PermissionState,
    SendResult, ThreadId,
};
pub use platform::{
    BroadcastSource, Capabilities, ComposeBackend, ComposePresenter, ComposeRequest,
    HostBroadcastSource, OperationKind, OutboxTransport, PermissionChecker, PlatformBackend,
    PlatformError, ProviderBackend, SmsTransport, Support,
};
pub use provider::{MessageStore, ProviderQuery, Selection, SqliteMessageStore, translate, translate_for};
pub use query::aggregate_threads;

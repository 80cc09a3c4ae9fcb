//! Domain models for SMS/MMS entities

mod filter;
mod message;
mod permissions;
mod send;
mod thread;

pub use filter::MessageFilter;
pub use message::{Attachment, Message, MessageBuilder, MessageId, MessageKind, MessageType};
pub use permissions::PermissionState;
pub use send::{OutgoingAttachment, OutgoingMms, OutgoingSms, SendResult};
pub use thread::{ConversationThread, ThreadId};

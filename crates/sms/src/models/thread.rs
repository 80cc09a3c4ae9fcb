//! Conversation thread model, an aggregate over messages sharing a thread id

use serde::{Deserialize, Serialize};

/// Unique identifier for a thread (provider thread_id)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ThreadId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ThreadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A conversation, recomputed from provider messages on every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationThread {
    pub thread_id: ThreadId,
    /// Address of the most recent message
    pub address: String,
    /// Number of messages in the thread
    pub message_count: usize,
    /// Body of the most recent message
    pub last_message: String,
    /// Date of the most recent message (millis since epoch)
    pub last_message_date: i64,
    /// Number of unread messages in the thread
    pub unread_count: usize,
}

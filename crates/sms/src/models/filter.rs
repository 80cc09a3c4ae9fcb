//! Declarative message filter

use serde::{Deserialize, Serialize};

use super::{MessageType, ThreadId};

/// Filter for message queries
///
/// Every field is optional; an absent field places no constraint on that
/// dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageFilter {
    pub address: Option<String>,
    /// Inclusive lower bound, millis since epoch
    pub start_date: Option<i64>,
    /// Inclusive upper bound, millis since epoch
    pub end_date: Option<i64>,
    #[serde(rename = "type")]
    pub message_type: Option<MessageType>,
    pub read: Option<bool>,
    pub thread_id: Option<ThreadId>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl MessageFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn start_date(mut self, millis: i64) -> Self {
        self.start_date = Some(millis);
        self
    }

    pub fn end_date(mut self, millis: i64) -> Self {
        self.end_date = Some(millis);
        self
    }

    pub fn message_type(mut self, message_type: MessageType) -> Self {
        self.message_type = Some(message_type);
        self
    }

    pub fn read(mut self, read: bool) -> Self {
        self.read = Some(read);
        self
    }

    pub fn thread(mut self, thread_id: impl Into<ThreadId>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// A copy of this filter without paging, asking each source for enough
    /// rows to page a merged stream afterwards
    pub(crate) fn widened_for_merge(&self) -> Self {
        let mut widened = self.clone();
        widened.offset = None;
        widened.limit = self
            .limit
            .map(|limit| limit.saturating_add(self.offset.unwrap_or(0)));
        widened
    }
}

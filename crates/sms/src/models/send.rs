//! Outgoing message requests and send results

use serde::{Deserialize, Serialize};

/// Outcome of a send request
///
/// `message_id` is a correlation token generated for the request, never a
/// provider row id. It is echoed by the sent/delivered events of the same
/// send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendResult {
    pub fn sent(correlation_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message_id: Some(correlation_id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// A text message handed to a platform for sending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingSms {
    pub correlation_id: String,
    pub address: String,
    pub body: String,
    /// Ask the network for a delivery report
    pub delivery_receipt: bool,
}

/// An attachment referenced by URI, resolved by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingAttachment {
    pub uri: String,
    pub content_type: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A multimedia message handed to a platform for sending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMms {
    pub correlation_id: String,
    pub address: String,
    pub body: Option<String>,
    pub attachments: Vec<OutgoingAttachment>,
    pub delivery_receipt: bool,
}

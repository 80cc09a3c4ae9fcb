//! Platform backend abstraction
//!
//! A backend is the native half of the messaging API. The facade only ever
//! talks to a `dyn PlatformBackend`; which implementation it gets is decided
//! at startup. Operations a platform cannot perform keep the default
//! implementation, which reports [`PlatformError::Unsupported`].

use async_trait::async_trait;
use thiserror::Error;

use crate::events::{EventKind, EventSink, ListenerRegistration};
use crate::models::{OutgoingMms, OutgoingSms};
use crate::provider::{ContentValues, ProviderQuery, ProviderRow, ProviderTable, Selection};

/// How a platform supports one operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// Never available, whatever the OS permission state
    Unavailable,
    /// Available while the matching OS permission is granted
    Permissioned,
    /// Available without an OS permission
    Always,
}

/// Operation kinds the capability gate distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Read,
    Send,
    Receive,
    Write,
}

impl OperationKind {
    /// OS permission guarding this operation on permissioned platforms
    pub fn permission(self) -> &'static str {
        match self {
            OperationKind::Read => "READ_SMS",
            OperationKind::Send => "SEND_SMS",
            OperationKind::Receive => "RECEIVE_SMS",
            OperationKind::Write => "WRITE_SMS",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Read => "read",
            OperationKind::Send => "send",
            OperationKind::Receive => "receive",
            OperationKind::Write => "write",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static capability matrix of a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub read: Support,
    pub write: Support,
    pub receive: Support,
    pub send: Support,
    /// Whether outgoing messages may carry attachments
    pub attachments: bool,
}

impl Capabilities {
    pub fn support(&self, kind: OperationKind) -> Support {
        match kind {
            OperationKind::Read => self.read,
            OperationKind::Send => self.send,
            OperationKind::Receive => self.receive,
            OperationKind::Write => self.write,
        }
    }
}

/// Errors raised by platform backends
///
/// None of these cross the facade; each operation folds them into its
/// failure result.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    #[error("Missing {0} permission")]
    PermissionDenied(&'static str),

    #[error("Provider error: {0:#}")]
    Provider(#[from] anyhow::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Compose error: {0}")]
    Compose(String),

    #[error("Blocking task failed: {0}")]
    Runtime(String),

    #[error("Operation timed out after {0} ms")]
    Timeout(u64),
}

impl From<tokio::task::JoinError> for PlatformError {
    fn from(err: tokio::task::JoinError) -> Self {
        PlatformError::Runtime(err.to_string())
    }
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// The native half of the messaging API
#[async_trait]
pub trait PlatformBackend: Send + Sync {
    /// Short platform name for logs
    fn name(&self) -> &'static str;

    /// Capability matrix; re-read on every gate check
    fn capabilities(&self) -> Capabilities;

    /// Current OS permission state for an operation kind
    fn is_permission_granted(&self, _kind: OperationKind) -> bool {
        false
    }

    /// Whether the facade publishes sent events itself after a send
    ///
    /// Platforms without a native sent broadcast return true.
    fn echoes_sent_events(&self) -> bool {
        false
    }

    async fn query(&self, _query: ProviderQuery) -> PlatformResult<Vec<ProviderRow>> {
        Err(PlatformError::Unsupported("query"))
    }

    async fn update(
        &self,
        _table: ProviderTable,
        _values: ContentValues,
        _selection: Selection,
    ) -> PlatformResult<usize> {
        Err(PlatformError::Unsupported("update"))
    }

    async fn delete(&self, _table: ProviderTable, _selection: Selection) -> PlatformResult<usize> {
        Err(PlatformError::Unsupported("delete"))
    }

    async fn send_sms(&self, _sms: OutgoingSms) -> PlatformResult<()> {
        Err(PlatformError::Unsupported("send_sms"))
    }

    async fn send_mms(&self, _mms: OutgoingMms) -> PlatformResult<()> {
        Err(PlatformError::Unsupported("send_mms"))
    }

    /// Acquire the native listener for one event source, if the platform has
    /// one
    fn register_listener(&self, _kind: EventKind, _sink: EventSink) -> Option<ListenerRegistration> {
        None
    }
}

/// OS permission API
pub trait PermissionChecker: Send + Sync {
    fn is_granted(&self, permission: &str) -> bool;
}

/// OS send API of the provider platform
///
/// Implementations submit and return; sent and delivered reports arrive
/// later through the broadcast source.
pub trait SmsTransport: Send + Sync {
    fn send_text(&self, sms: &OutgoingSms) -> anyhow::Result<()>;
    fn send_multimedia(&self, mms: &OutgoingMms) -> anyhow::Result<()>;
}

/// Native broadcast registration of the provider platform
pub trait BroadcastSource: Send + Sync {
    fn register(&self, kind: EventKind, sink: EventSink) -> ListenerRegistration;
}

/// A request to show the system compose UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeRequest {
    pub recipients: Vec<String>,
    pub body: Option<String>,
    pub attachments: Vec<crate::models::OutgoingAttachment>,
}

/// System compose UI of the compose-only platform
pub trait ComposePresenter: Send + Sync {
    fn can_send_text(&self) -> bool;
    fn can_send_attachments(&self) -> bool;
    /// Show the compose UI; returns once it has been presented
    fn present(&self, request: ComposeRequest) -> anyhow::Result<()>;
}

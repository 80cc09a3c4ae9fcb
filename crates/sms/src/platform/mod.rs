//! Platform backends
//!
//! One trait, two implementations, picked by the host at startup:
//! [`ProviderBackend`] for platforms with a queryable message store and
//! [`ComposeBackend`] for platforms that can only present a compose UI.

mod broadcast;
mod compose;
mod outbox;
mod provider;
mod traits;

pub use broadcast::HostBroadcastSource;
pub use compose::ComposeBackend;
pub use outbox::OutboxTransport;
pub use provider::ProviderBackend;
pub use traits::{
    BroadcastSource, Capabilities, ComposePresenter, ComposeRequest, OperationKind,
    PermissionChecker, PlatformBackend, PlatformError, PlatformResult, SmsTransport, Support,
};

//! Capability gate
//!
//! Decides per operation kind whether the current platform may run an
//! operation. Capabilities and OS permissions are read from the backend on
//! every check, so a permission revoked between two calls is observed by the
//! second.

use std::sync::Arc;

use thiserror::Error;

use crate::models::PermissionState;
use crate::platform::{OperationKind, PlatformBackend, Support};

/// Why the gate refused an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("{0} is not available on this platform")]
    CapabilityUnavailable(OperationKind),

    #[error("{} permission not granted", .0.permission())]
    PermissionDenied(OperationKind),
}

impl Denial {
    pub fn kind(&self) -> OperationKind {
        match self {
            Denial::CapabilityUnavailable(kind) | Denial::PermissionDenied(kind) => *kind,
        }
    }
}

pub struct CapabilityGate {
    backend: Arc<dyn PlatformBackend>,
}

impl CapabilityGate {
    pub fn new(backend: Arc<dyn PlatformBackend>) -> Self {
        Self { backend }
    }

    /// Whether an operation of this kind may run now
    pub fn check(&self, kind: OperationKind) -> bool {
        self.evaluate(kind).is_ok()
    }

    /// Like [`check`](Self::check), reporting the reason for a refusal
    pub fn evaluate(&self, kind: OperationKind) -> Result<(), Denial> {
        match self.backend.capabilities().support(kind) {
            Support::Unavailable => Err(Denial::CapabilityUnavailable(kind)),
            Support::Always => Ok(()),
            Support::Permissioned => {
                if self.backend.is_permission_granted(kind) {
                    Ok(())
                } else {
                    Err(Denial::PermissionDenied(kind))
                }
            }
        }
    }

    pub fn attachments_supported(&self) -> bool {
        self.backend.capabilities().attachments
    }

    /// Snapshot of the read, send and receive checks
    pub fn permission_state(&self) -> PermissionState {
        PermissionState {
            read: self.check(OperationKind::Read),
            send: self.check(OperationKind::Send),
            receive: self.check(OperationKind::Receive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Capabilities;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FakeBackend {
        capabilities: Capabilities,
        granted: AtomicBool,
    }

    #[async_trait]
    impl PlatformBackend for FakeBackend {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn capabilities(&self) -> Capabilities {
            self.capabilities
        }

        fn is_permission_granted(&self, _kind: OperationKind) -> bool {
            self.granted.load(Ordering::SeqCst)
        }
    }

    fn backend(support: Support, granted: bool) -> Arc<FakeBackend> {
        Arc::new(FakeBackend {
            capabilities: Capabilities {
                read: support,
                write: support,
                receive: support,
                send: support,
                attachments: false,
            },
            granted: AtomicBool::new(granted),
        })
    }

    #[test]
    fn test_unavailable_ignores_permissions() {
        let gate = CapabilityGate::new(backend(Support::Unavailable, true));
        assert_eq!(
            gate.evaluate(OperationKind::Read),
            Err(Denial::CapabilityUnavailable(OperationKind::Read))
        );
    }

    #[test]
    fn test_always_ignores_permissions() {
        let gate = CapabilityGate::new(backend(Support::Always, false));
        assert!(gate.check(OperationKind::Send));
    }

    #[test]
    fn test_permissioned_is_read_at_call_time() {
        let fake = backend(Support::Permissioned, true);
        let gate = CapabilityGate::new(fake.clone());
        assert!(gate.check(OperationKind::Write));

        fake.granted.store(false, Ordering::SeqCst);
        assert_eq!(
            gate.evaluate(OperationKind::Write),
            Err(Denial::PermissionDenied(OperationKind::Write))
        );
    }

    #[test]
    fn test_denial_messages() {
        assert_eq!(
            Denial::PermissionDenied(OperationKind::Send).to_string(),
            "SEND_SMS permission not granted"
        );
        assert_eq!(
            Denial::CapabilityUnavailable(OperationKind::Read).to_string(),
            "read is not available on this platform"
        );
    }
}

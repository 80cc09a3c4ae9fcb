//! Permission snapshot reported to callers

use serde::{Deserialize, Serialize};

/// Which messaging operations are currently permitted
///
/// Recomputed on every request; never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionState {
    pub read: bool,
    pub send: bool,
    pub receive: bool,
}

impl PermissionState {
    pub fn all_granted(&self) -> bool {
        self.read && self.send && self.receive
    }
}

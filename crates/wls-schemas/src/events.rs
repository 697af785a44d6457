use serde::Serialize;

use crate::{CallKey, PermissionState};

/// Position of a log in chain history. Ordering is (block, log index).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LogPosition {
    pub block_number: u64,
    pub log_index: u64,
}

impl LogPosition {
    pub const fn new(block_number: u64, log_index: u64) -> Self {
        Self {
            block_number,
            log_index,
        }
    }
}

/// Decoded `SetCallAllowed(target, selector, state)` log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GuardEvent {
    pub position: LogPosition,
    pub key: CallKey,
    pub state: PermissionState,
}

/// Decoded `SetModuleCallBlocked(target, selector)` log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModuleEvent {
    pub position: LogPosition,
    pub key: CallKey,
}

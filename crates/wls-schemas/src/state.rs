use std::fmt;

use serde::{Deserialize, Serialize};

/// Guard call-allowance state.
///
/// On-chain encoding is the `uint8` 0 / 1 / 2. `PermanentlyOn` is a ratchet:
/// once set, the guard never leaves it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionState {
    Off,
    On,
    PermanentlyOn,
}

impl PermissionState {
    pub const ALL: [PermissionState; 3] = [
        PermissionState::Off,
        PermissionState::On,
        PermissionState::PermanentlyOn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionState::Off => "OFF",
            PermissionState::On => "ON",
            PermissionState::PermanentlyOn => "PERMANENTLY_ON",
        }
    }

    /// Exact, case-sensitive match on the configuration spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OFF" => Some(PermissionState::Off),
            "ON" => Some(PermissionState::On),
            "PERMANENTLY_ON" => Some(PermissionState::PermanentlyOn),
            _ => None,
        }
    }

    /// Decode the on-chain enum value. Anything outside {0,1,2} is `None`;
    /// callers must turn that into a fatal error, never coerce it.
    pub fn from_raw(value: u64) -> Option<Self> {
        match value {
            0 => Some(PermissionState::Off),
            1 => Some(PermissionState::On),
            2 => Some(PermissionState::PermanentlyOn),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            PermissionState::Off => 0,
            PermissionState::On => 1,
            PermissionState::PermanentlyOn => 2,
        }
    }

    /// `ON` and `PERMANENTLY_ON` both permit the call.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, PermissionState::Off)
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! wls-schemas
//!
//! Closed data model shared by every wls crate:
//! - canonical `Address` / `Selector` / `CallKey` primitives
//! - the three-valued guard `PermissionState`
//! - normalized allowlist (tag) records
//! - two-level state maps keyed by target then selector
//! - decoded on-chain events and diff entries
//! - the `SyncError` taxonomy
//!
//! Everything here is constructed pre-validated. Downstream crates never see
//! raw strings for addresses, selectors or states.

mod allowlist;
mod diff;
mod error;
mod events;
mod maps;
mod primitives;
mod state;

pub use allowlist::*;
pub use diff::*;
pub use error::SyncError;
pub use events::*;
pub use maps::*;
pub use primitives::*;
pub use state::PermissionState;

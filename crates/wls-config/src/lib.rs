//! wls-config
//!
//! Configuration Model & Normalizer.
//!
//! Loads per-tag YAML allowlists and the chain registry, validates every
//! address / selector / state up front and hands back the closed model from
//! `wls-schemas`. Loading is all-or-nothing: one malformed field aborts the
//! whole load with a `SyncError` carrying tag + field context.
//!
//! Also owns the only `std::env` reads in the workspace (`secrets`), repo
//! root discovery (`repo`) and snapshot verification (`verify`).

pub mod chains;
pub mod index;
pub mod repo;
pub mod secrets;
pub mod tags;
pub mod verify;

pub use chains::{load_chains, parse_chains_str, select_chains, ChainConfig};
pub use index::AllowlistIndex;
pub use repo::RepoLayout;
pub use secrets::{resolve_rpc_url, ResolvedRpc};
pub use tags::{load_all, load_allowlist, load_allowlist_file, parse_allowlist_str};
pub use verify::{compare, load_snapshot, parse_snapshot_str, SnapshotComparison};

use std::fs;
use std::path::Path;

use wls_schemas::SyncError;

pub(crate) fn read_file(path: &Path) -> Result<String, SyncError> {
    fs::read_to_string(path).map_err(|e| SyncError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

use std::path::{Path, PathBuf};

use wls_schemas::SyncError;

/// Registry file whose presence marks the repository root.
pub const REGISTRY_MARKER: &str = "allowlists/chains.yaml";

/// Fixed on-disk layout under one root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLayout {
    root: PathBuf,
}

impl RepoLayout {
    /// Use `root` as-is, without checking for the marker.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Walk up from `start` until a directory holding the marker is found.
    pub fn discover(start: &Path) -> Result<Self, SyncError> {
        let mut dir = Some(start);
        while let Some(d) = dir {
            if d.join(REGISTRY_MARKER).is_file() {
                return Ok(Self::at(d));
            }
            dir = d.parent();
        }
        Err(SyncError::RepoRootNotFound {
            start: start.display().to_string(),
            marker: REGISTRY_MARKER.to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn chains_path(&self) -> PathBuf {
        self.root.join(REGISTRY_MARKER)
    }

    pub fn tags_dir(&self) -> PathBuf {
        self.root.join("allowlists").join("tags")
    }

    pub fn default_snapshot_path(&self) -> PathBuf {
        self.root.join("tmp").join("allowlist_snapshot.jsonl")
    }
}

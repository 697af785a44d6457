//! Test support for the wls workspace.
//!
//! - `MockChain`: in-memory `ChainReader` with call instrumentation
//! - `fixtures`: compact address / selector / chain constructors
//! - `TempRepo`: an on-disk `allowlists/` layout in a temp directory

mod mock_chain;

pub use mock_chain::{CallStats, MockChain};

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod fixtures {
    use wls_config::ChainConfig;
    use wls_schemas::{Address, CallKey, Selector};

    /// Address with every byte set to `b`.
    pub fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    pub fn selector(b: u8) -> Selector {
        Selector::from_bytes([b; 4])
    }

    pub fn key(target: u8, sel: u8) -> CallKey {
        CallKey::new(addr(target), selector(sel))
    }

    /// `n` distinct non-sentinel keys on one target.
    pub fn keys_on(target: u8, n: u32) -> Vec<CallKey> {
        (1..=n)
            .map(|i| CallKey::new(addr(target), Selector::from_bytes(i.to_be_bytes())))
            .collect()
    }

    /// Guard at 0xee.., module at 0xdd.., admin safe at 0xcc...
    pub fn chain(slug: &str, tags: &[&str]) -> ChainConfig {
        ChainConfig {
            slug: slug.to_string(),
            chain_id: 1,
            rpc_env: format!("RPC_{}", slug.to_ascii_uppercase()),
            guard: addr(0xee),
            module: addr(0xdd),
            admin_safe: addr(0xcc),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            start_block: 0,
        }
    }
}

/// Temporary repository root holding `allowlists/chains.yaml` and tag files.
pub struct TempRepo {
    dir: tempfile::TempDir,
}

impl TempRepo {
    pub fn new(chains_yaml: &str) -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp repo")?;
        let tags = dir.path().join("allowlists").join("tags");
        fs::create_dir_all(&tags).with_context(|| format!("create {}", tags.display()))?;
        let repo = Self { dir };
        repo.write("allowlists/chains.yaml", chains_yaml)?;
        Ok(repo)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn add_tag(&self, file_name: &str, yaml: &str) -> Result<PathBuf> {
        self.write(&format!("allowlists/tags/{file_name}"), yaml)
    }

    /// Write `body` at `rel` under the root, creating parent directories.
    pub fn write(&self, rel: &str, body: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}

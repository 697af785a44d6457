//! Command handlers for the `wls` binary.
//!
//! Shared loading and connection helpers live here; each subcommand has
//! its own module.

pub mod diff;
pub mod state;
pub mod sync;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use wls_chain::JsonRpcReader;
use wls_config::{
    load_all, load_chains, resolve_rpc_url, select_chains, AllowlistIndex, ChainConfig,
    RepoLayout, ResolvedRpc,
};

pub fn layout(root: Option<&Path>) -> Result<RepoLayout> {
    match root {
        Some(r) => Ok(RepoLayout::at(r)),
        None => {
            let cwd = std::env::current_dir().context("read working directory")?;
            Ok(RepoLayout::discover(&cwd)?)
        }
    }
}

pub fn load_index(layout: &RepoLayout) -> Result<AllowlistIndex> {
    let index = AllowlistIndex::build(load_all(&layout.tags_dir())?)?;
    info!(tags = index.len(), dir = %layout.tags_dir().display(), "allowlists loaded");
    Ok(index)
}

/// Registry entries narrowed by a comma-separated `--chain` value.
pub fn load_selected_chains(layout: &RepoLayout, filter: Option<&str>) -> Result<Vec<ChainConfig>> {
    let chains = load_chains(&layout.chains_path())?;
    let wanted = parse_chain_filter(filter);
    Ok(select_chains(chains, wanted.as_deref())?)
}

/// `"a, b,,c"` -> `["a", "b", "c"]`. `None` when nothing is named.
pub fn parse_chain_filter(raw: Option<&str>) -> Option<Vec<String>> {
    let names: Vec<String> = raw?
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names)
    }
}

/// Resolve every chain's RPC env var before any network traffic, so a
/// missing variable aborts the run up front.
pub fn resolve_all(chains: &[ChainConfig]) -> Result<Vec<ResolvedRpc>> {
    let mut out = Vec::with_capacity(chains.len());
    for chain in chains {
        out.push(resolve_rpc_url(chain)?);
    }
    Ok(out)
}

pub async fn connect(chain: &ChainConfig, rpc: &ResolvedRpc) -> Result<JsonRpcReader> {
    let reader = JsonRpcReader::connect(rpc.url(), chain.slug.clone(), chain.chain_id)
        .await
        .with_context(|| format!("connect to {} via ${}", chain.slug, rpc.var))?;
    Ok(reader)
}

//! Chain registry (`allowlists/chains.yaml`).

use std::path::Path;

use serde::Deserialize;
use wls_schemas::{Address, SyncError};

use crate::read_file;

/// One registry entry, addresses canonicalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub slug: String,
    pub chain_id: u64,
    /// Name of the env var holding the RPC URL. Never the URL itself.
    pub rpc_env: String,
    pub guard: Address,
    pub module: Address,
    pub admin_safe: Address,
    /// Applied in order; later tags win on conflicting keys.
    pub tags: Vec<String>,
    pub start_block: u64,
}

impl ChainConfig {
    /// Case-insensitive membership test on the tag list.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

#[derive(Debug, Deserialize)]
struct RawChainsFile {
    chains: Vec<RawChain>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChain {
    slug: String,
    chain_id: u64,
    rpc_env: String,
    guard: String,
    module: String,
    admin_safe: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    start_block: u64,
}

fn chain_address(slug: &str, field: &str, raw: &str) -> Result<Address, SyncError> {
    Address::parse(raw.trim())
        .map_err(|e| SyncError::validation(format!("chains:{slug}"), field, e.to_string()))
}

fn normalize_chain(idx: usize, raw: RawChain) -> Result<ChainConfig, SyncError> {
    let slug = raw.slug.trim().to_string();
    if slug.is_empty() {
        return Err(SyncError::validation(
            "chains",
            format!("chains[{idx}].slug"),
            "missing or empty",
        ));
    }
    let rpc_env = raw.rpc_env.trim().to_string();
    if rpc_env.is_empty() {
        return Err(SyncError::validation(
            format!("chains:{slug}"),
            "rpcEnv",
            "missing or empty",
        ));
    }

    Ok(ChainConfig {
        guard: chain_address(&slug, "guard", &raw.guard)?,
        module: chain_address(&slug, "module", &raw.module)?,
        admin_safe: chain_address(&slug, "adminSafe", &raw.admin_safe)?,
        chain_id: raw.chain_id,
        rpc_env,
        tags: raw.tags.into_iter().map(|t| t.trim().to_string()).collect(),
        start_block: raw.start_block,
        slug,
    })
}

pub fn parse_chains_str(yaml: &str, source: &str) -> Result<Vec<ChainConfig>, SyncError> {
    let raw: RawChainsFile = serde_yaml::from_str(yaml).map_err(|e| SyncError::Parse {
        path: source.to_string(),
        message: e.to_string(),
    })?;

    let mut out: Vec<ChainConfig> = Vec::with_capacity(raw.chains.len());
    for (idx, chain) in raw.chains.into_iter().enumerate() {
        let chain = normalize_chain(idx, chain)?;
        if out.iter().any(|c| c.slug.eq_ignore_ascii_case(&chain.slug)) {
            return Err(SyncError::validation(
                "chains",
                format!("chains[{idx}].slug"),
                format!("duplicate chain slug '{}'", chain.slug),
            ));
        }
        out.push(chain);
    }
    Ok(out)
}

pub fn load_chains(path: &Path) -> Result<Vec<ChainConfig>, SyncError> {
    let raw = read_file(path)?;
    parse_chains_str(&raw, &path.display().to_string())
}

/// Keep only chains named in `filter` (case-insensitive). `None` or an empty
/// filter keeps everything. Naming a chain that is not registered is an error.
pub fn select_chains(
    chains: Vec<ChainConfig>,
    filter: Option<&[String]>,
) -> Result<Vec<ChainConfig>, SyncError> {
    let wanted: Vec<&str> = filter
        .unwrap_or_default()
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if wanted.is_empty() {
        return Ok(chains);
    }

    for w in &wanted {
        if !chains.iter().any(|c| c.slug.eq_ignore_ascii_case(w)) {
            return Err(SyncError::validation(
                "chains",
                "--chain",
                format!("unknown chain '{w}'"),
            ));
        }
    }

    Ok(chains
        .into_iter()
        .filter(|c| wanted.iter().any(|w| c.slug.eq_ignore_ascii_case(w)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"
chains:
  - slug: ethereum
    chainId: 1
    rpcEnv: RPC_ETHEREUM
    guard: "0x1111111111111111111111111111111111111111"
    module: "0x2222222222222222222222222222222222222222"
    adminSafe: "0x3333333333333333333333333333333333333333"
    tags: [base-tokens, lending]
    startBlock: 18000000
  - slug: Base
    chainId: 8453
    rpcEnv: RPC_BASE
    guard: "0x4444444444444444444444444444444444444444"
    module: "0x5555555555555555555555555555555555555555"
    adminSafe: "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
    tags: [base-tokens]
"#;

    #[test]
    fn registry_parses_with_defaults() {
        let chains = parse_chains_str(REGISTRY, "mem").unwrap();
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[0].start_block, 18_000_000);
        assert_eq!(chains[1].start_block, 0);
        assert_eq!(chains[1].chain_id, 8453);
        assert_eq!(
            chains[1].admin_safe.to_string(),
            "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
        );
        assert!(chains[0].has_tag("LENDING"));
        assert!(!chains[1].has_tag("lending"));
    }

    #[test]
    fn duplicate_chain_slug_rejected() {
        let doubled = format!("{REGISTRY}{}", &REGISTRY["\nchains:\n".len()..]);
        let err = parse_chains_str(&doubled, "mem").unwrap_err();
        assert!(matches!(err, SyncError::Validation { .. }), "{err}");
    }

    #[test]
    fn bad_guard_address_names_chain_and_field() {
        let yaml = REGISTRY.replace("0x1111111111111111111111111111111111111111", "0x11");
        match parse_chains_str(&yaml, "mem").unwrap_err() {
            SyncError::Validation { tag, field, .. } => {
                assert_eq!(tag, "chains:ethereum");
                assert_eq!(field, "guard");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn select_is_case_insensitive_and_rejects_unknown() {
        let chains = parse_chains_str(REGISTRY, "mem").unwrap();
        let picked = select_chains(chains.clone(), Some(&["base".to_string()])).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].slug, "Base");

        assert_eq!(select_chains(chains.clone(), None).unwrap().len(), 2);
        assert!(select_chains(chains, Some(&["polygon".to_string()])).is_err());
    }
}

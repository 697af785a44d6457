//! RPC endpoint resolution.
//!
//! The only module in the workspace that reads `std::env`. The chain registry
//! stores env var NAMES (`rpcEnv`); the URL is looked up once per chain and
//! handed to the reader constructor. URLs often embed API keys, so:
//! - `ResolvedRpc` redacts the URL in `Debug`
//! - errors name the env var, never its value

use wls_schemas::SyncError;

use crate::chains::ChainConfig;

#[derive(Clone)]
pub struct ResolvedRpc {
    pub chain: String,
    pub var: String,
    url: String,
}

impl ResolvedRpc {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for ResolvedRpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedRpc")
            .field("chain", &self.chain)
            .field("var", &self.var)
            .field("url", &"<REDACTED>")
            .finish()
    }
}

/// Resolve the chain's RPC URL from the process environment.
pub fn resolve_rpc_url(chain: &ChainConfig) -> Result<ResolvedRpc, SyncError> {
    resolve_rpc_url_with(chain, |name| std::env::var(name).ok())
}

/// Same as [`resolve_rpc_url`] with an injected lookup, for tests.
/// Blank values count as unset.
pub fn resolve_rpc_url_with<F>(chain: &ChainConfig, lookup: F) -> Result<ResolvedRpc, SyncError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(&chain.rpc_env) {
        Some(v) if !v.trim().is_empty() => Ok(ResolvedRpc {
            chain: chain.slug.clone(),
            var: chain.rpc_env.clone(),
            url: v.trim().to_string(),
        }),
        _ => Err(SyncError::MissingRpcConfig {
            var: chain.rpc_env.clone(),
            chain: chain.slug.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wls_schemas::Address;

    fn chain(var: &str) -> ChainConfig {
        ChainConfig {
            slug: "ethereum".to_string(),
            chain_id: 1,
            rpc_env: var.to_string(),
            guard: Address::ZERO,
            module: Address::ZERO,
            admin_safe: Address::ZERO,
            tags: vec![],
            start_block: 0,
        }
    }

    const SENTINEL: &str = "https://rpc.example/v2/SENTINEL_KEY_abc123";

    #[test]
    fn missing_var_error_names_var_only() {
        let err = resolve_rpc_url_with(&chain("WLS_TEST_RPC_UNSET"), |_| None).unwrap_err();
        assert_eq!(
            err,
            SyncError::MissingRpcConfig {
                var: "WLS_TEST_RPC_UNSET".to_string(),
                chain: "ethereum".to_string(),
            }
        );
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let err = resolve_rpc_url_with(&chain("X"), |_| Some("   ".to_string())).unwrap_err();
        assert!(matches!(err, SyncError::MissingRpcConfig { .. }));
    }

    #[test]
    fn debug_redacts_url() {
        let r = resolve_rpc_url_with(&chain("X"), |_| Some(SENTINEL.to_string())).unwrap();
        assert_eq!(r.url(), SENTINEL);
        let dbg = format!("{r:?}");
        assert!(!dbg.contains("SENTINEL_KEY"), "{dbg}");
        assert!(dbg.contains("<REDACTED>"));
    }

    #[test]
    fn process_env_lookup_reports_unset_sentinel_var() {
        let err = resolve_rpc_url(&chain("WLS_SECRETS_TEST_DEFINITELY_UNSET_7F3A")).unwrap_err();
        assert!(err.to_string().contains("WLS_SECRETS_TEST_DEFINITELY_UNSET_7F3A"));
    }
}

use std::fmt;

use crate::{CallKey, PermissionState};

/// Every failure the sync pipeline can raise.
///
/// All variants are fatal for the invocation: nothing retries or records
/// partial success. Messages name env vars, never their values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Malformed configuration: address / selector / state / slug shape.
    Validation {
        tag: String,
        field: String,
        detail: String,
    },
    /// A chain (or the sync command) references a tag with no file.
    UnknownTag { tag: String, chain: Option<String> },
    /// Two tag files declare the same slug.
    DuplicateTag { tag: String },
    /// On-chain guard state outside {0,1,2}.
    UnknownState { raw: String, context: String },
    /// The env var holding a chain's RPC URL is unset or blank.
    MissingRpcConfig { var: String, chain: String },
    /// Planner refused OFF -> PERMANENTLY_ON.
    IllegalEscalation {
        chain: String,
        key: CallKey,
        from: PermissionState,
        to: PermissionState,
    },
    /// Planner refused any transition away from PERMANENTLY_ON.
    IllegalDowngrade {
        chain: String,
        key: CallKey,
        from: PermissionState,
        to: PermissionState,
    },
    /// No ancestor of the working directory holds the registry marker.
    RepoRootNotFound { start: String, marker: String },
    Io { path: String, message: String },
    Parse { path: String, message: String },
    Rpc { method: String, message: String },
    Decode(String),
    ChainMismatch {
        chain: String,
        expected: u64,
        got: u64,
    },
    SnapshotMismatch { missing: usize, extra: usize },
}

impl SyncError {
    pub fn validation(
        tag: impl Into<String>,
        field: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        SyncError::Validation {
            tag: tag.into(),
            field: field.into(),
            detail: detail.into(),
        }
    }

    pub fn rpc(method: impl Into<String>, message: impl Into<String>) -> Self {
        SyncError::Rpc {
            method: method.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Validation { tag, field, detail } => {
                write!(f, "invalid allowlist '{tag}' field {field}: {detail}")
            }
            SyncError::UnknownTag {
                tag,
                chain: Some(chain),
            } => write!(f, "chain {chain} references unknown tag '{tag}'"),
            SyncError::UnknownTag { tag, chain: None } => {
                write!(f, "no allowlist found for tag '{tag}'")
            }
            SyncError::DuplicateTag { tag } => write!(f, "duplicate allowlist slug '{tag}'"),
            SyncError::UnknownState { raw, context } => {
                write!(f, "unknown guard allow state {raw} ({context})")
            }
            SyncError::MissingRpcConfig { var, chain } => write!(
                f,
                "missing RPC URL: env var '{var}' for chain {chain} is not set or empty"
            ),
            SyncError::IllegalEscalation {
                chain,
                key,
                from,
                to,
            } => write!(
                f,
                "cannot escalate {key} from {from} to {to} on {chain}; set ON first"
            ),
            SyncError::IllegalDowngrade {
                chain,
                key,
                from,
                to,
            } => write!(
                f,
                "cannot downgrade {key} from {from} to {to} on {chain}; {from} is irreversible"
            ),
            SyncError::RepoRootNotFound { start, marker } => write!(
                f,
                "could not locate repository root from {start} (missing {marker})"
            ),
            SyncError::Io { path, message } => write!(f, "io error at {path}: {message}"),
            SyncError::Parse { path, message } => write!(f, "parse error in {path}: {message}"),
            SyncError::Rpc { method, message } => write!(f, "rpc {method} failed: {message}"),
            SyncError::Decode(msg) => write!(f, "decode error: {msg}"),
            SyncError::ChainMismatch {
                chain,
                expected,
                got,
            } => write!(
                f,
                "rpc endpoint for {chain} reports chain id {got}, registry expects {expected}"
            ),
            SyncError::SnapshotMismatch { missing, extra } => write!(
                f,
                "allowlists do not match snapshot: {missing} missing, {extra} extra"
            ),
        }
    }
}

impl std::error::Error for SyncError {}

//! Normalized allowlist (tag) records.
//!
//! A tag is the unit of configuration change: a named bundle of guard and
//! module entries. Values here are produced by `wls-config` after full
//! validation and are immutable afterwards.

use serde::Serialize;

use crate::{Address, CallKey, PermissionState, Selector, APPROVE_SELECTOR, TRANSFER_SELECTOR};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GuardCall {
    pub target: Address,
    pub selector: Selector,
    pub state: PermissionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl GuardCall {
    pub fn key(&self) -> CallKey {
        CallKey::new(self.target, self.selector)
    }
}

/// Shorthand for the `transfer` and `approve` guard entries of one token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GuardToken {
    pub token: Address,
    pub transfer: PermissionState,
    pub approve: PermissionState,
}

impl GuardToken {
    /// `[(transfer key, state), (approve key, state)]`, in that order.
    pub fn halves(&self) -> [(CallKey, PermissionState); 2] {
        [
            (CallKey::new(self.token, TRANSFER_SELECTOR), self.transfer),
            (CallKey::new(self.token, APPROVE_SELECTOR), self.approve),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModuleBlock {
    pub target: Address,
    pub selector: Selector,
}

impl ModuleBlock {
    pub fn key(&self) -> CallKey {
        CallKey::new(self.target, self.selector)
    }
}

/// Shorthand for module blocks on a token's `transfer` / `approve`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModuleToken {
    pub token: Address,
    pub transfer: bool,
    pub approve: bool,
}

impl ModuleToken {
    /// Only the halves flagged for blocking.
    pub fn blocked_keys(&self) -> Vec<CallKey> {
        let mut out = Vec::with_capacity(2);
        if self.transfer {
            out.push(CallKey::new(self.token, TRANSFER_SELECTOR));
        }
        if self.approve {
            out.push(CallKey::new(self.token, APPROVE_SELECTOR));
        }
        out
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GuardSection {
    pub calls: Vec<GuardCall>,
    pub tokens: Vec<GuardToken>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModuleSection {
    pub blocks: Vec<ModuleBlock>,
    pub tokens: Vec<ModuleToken>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NormalizedAllowlist {
    pub slug: String,
    pub guard: GuardSection,
    pub module: ModuleSection,
}

impl NormalizedAllowlist {
    pub fn empty(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            guard: GuardSection::default(),
            module: ModuleSection::default(),
        }
    }

    pub fn entry_count(&self) -> usize {
        self.guard.calls.len()
            + self.guard.tokens.len()
            + self.module.blocks.len()
            + self.module.tokens.len()
    }

    /// Flat records in file order, used by snapshot verification.
    pub fn flatten(&self) -> Vec<FlattenedRecord> {
        let mut out = Vec::with_capacity(self.entry_count());
        for c in &self.guard.calls {
            out.push(FlattenedRecord::GuardCall {
                slug: self.slug.clone(),
                target: c.target,
                selector: c.selector,
                state: c.state,
            });
        }
        for t in &self.guard.tokens {
            out.push(FlattenedRecord::GuardToken {
                slug: self.slug.clone(),
                token: t.token,
                transfer: t.transfer,
                approve: t.approve,
            });
        }
        for b in &self.module.blocks {
            out.push(FlattenedRecord::ModuleCall {
                slug: self.slug.clone(),
                target: b.target,
                selector: b.selector,
            });
        }
        for t in &self.module.tokens {
            out.push(FlattenedRecord::ModuleToken {
                slug: self.slug.clone(),
                token: t.token,
                block_transfer: t.transfer,
                block_approve: t.approve,
            });
        }
        out
    }
}

/// One configuration fact, independent of file layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlattenedRecord {
    GuardCall {
        slug: String,
        target: Address,
        selector: Selector,
        state: PermissionState,
    },
    GuardToken {
        slug: String,
        token: Address,
        transfer: PermissionState,
        approve: PermissionState,
    },
    ModuleCall {
        slug: String,
        target: Address,
        selector: Selector,
    },
    ModuleToken {
        slug: String,
        token: Address,
        block_transfer: bool,
        block_approve: bool,
    },
}

impl FlattenedRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            FlattenedRecord::GuardCall { .. } => "guard.call",
            FlattenedRecord::GuardToken { .. } => "guard.token",
            FlattenedRecord::ModuleCall { .. } => "module.call",
            FlattenedRecord::ModuleToken { .. } => "module.token",
        }
    }

    /// Pipe-joined canonical line: `slug|kind|address[|selector]|fields...`.
    pub fn canonical(&self) -> String {
        match self {
            FlattenedRecord::GuardCall {
                slug,
                target,
                selector,
                state,
            } => format!("{slug}|{}|{target}|{selector}|{state}", self.kind()),
            FlattenedRecord::GuardToken {
                slug,
                token,
                transfer,
                approve,
            } => format!(
                "{slug}|{}|{token}|transfer:{transfer}|approve:{approve}",
                self.kind()
            ),
            FlattenedRecord::ModuleCall {
                slug,
                target,
                selector,
            } => format!("{slug}|{}|{target}|{selector}", self.kind()),
            FlattenedRecord::ModuleToken {
                slug,
                token,
                block_transfer,
                block_approve,
            } => format!(
                "{slug}|{}|{token}|blockTransfer:{block_transfer}|blockApprove:{block_approve}",
                self.kind()
            ),
        }
    }
}

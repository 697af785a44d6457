use serde::Serialize;

use crate::{Address, CallKey, PermissionState, Selector};

/// One guard discrepancy. `desired`/`actual` are `None` when the side
/// carries no information beyond the implicit `OFF`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GuardDiffEntry {
    pub target: Address,
    pub selector: Selector,
    pub desired: Option<PermissionState>,
    pub actual: Option<PermissionState>,
    pub signature: Option<String>,
}

impl GuardDiffEntry {
    pub fn key(&self) -> CallKey {
        CallKey::new(self.target, self.selector)
    }

    /// `target.selector (signature)` or `target.selector`.
    pub fn label(&self) -> String {
        selector_label(self.target, self.selector, self.signature.as_deref())
    }
}

/// One module discrepancy. There is no state beyond presence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModuleDiffEntry {
    pub target: Address,
    pub selector: Selector,
    pub signature: Option<String>,
}

impl ModuleDiffEntry {
    pub fn key(&self) -> CallKey {
        CallKey::new(self.target, self.selector)
    }

    pub fn label(&self) -> String {
        selector_label(self.target, self.selector, self.signature.as_deref())
    }
}

pub fn selector_label(target: Address, selector: Selector, signature: Option<&str>) -> String {
    match signature {
        Some(sig) => format!("{target}.{selector} ({sig})"),
        None => format!("{target}.{selector}"),
    }
}

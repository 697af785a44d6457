use std::collections::BTreeMap;

use serde::Serialize;
use wls_schemas::{
    CallKey, GuardDiffEntry, GuardStateMap, ModuleDiffEntry, ModuleStateMap, PermissionState,
};

/// Where one (desired, actual) guard pair lands. Exactly one per pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GuardClass {
    InSync,
    /// desired enabled, actual `OFF`
    Missing,
    /// both enabled, different
    Mismatched,
    /// actual enabled, desired `OFF`
    Extra,
}

pub fn classify(desired: PermissionState, actual: PermissionState) -> GuardClass {
    if desired == actual {
        return GuardClass::InSync;
    }
    match (desired.is_enabled(), actual.is_enabled()) {
        (true, false) => GuardClass::Missing,
        (false, true) => GuardClass::Extra,
        (true, true) => GuardClass::Mismatched,
        // Only OFF is not enabled, so desired == actual was caught above.
        (false, false) => GuardClass::InSync,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GuardDiff {
    pub missing: Vec<GuardDiffEntry>,
    pub mismatched: Vec<GuardDiffEntry>,
    pub extra: Vec<GuardDiffEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModuleDiff {
    pub missing: Vec<ModuleDiffEntry>,
    pub extra: Vec<ModuleDiffEntry>,
}

/// Two passes: every desired key against actual (absent = `OFF`), then every
/// enabled actual key that desired does not mention at all.
pub fn diff_guard(desired: &GuardStateMap, actual: &GuardStateMap) -> GuardDiff {
    let mut out = GuardDiff::default();

    for (key, want) in desired.iter() {
        let have = actual
            .get(&key)
            .map(|i| i.state)
            .unwrap_or(PermissionState::Off);
        let entry = |d: Option<PermissionState>, a: Option<PermissionState>| GuardDiffEntry {
            target: key.target,
            selector: key.selector,
            desired: d,
            actual: a,
            signature: want.signature.clone(),
        };
        match classify(want.state, have) {
            GuardClass::InSync => {}
            GuardClass::Missing => out.missing.push(entry(Some(want.state), None)),
            GuardClass::Mismatched => out.mismatched.push(entry(Some(want.state), Some(have))),
            GuardClass::Extra => out.extra.push(entry(Some(want.state), Some(have))),
        }
    }

    for (key, have) in actual.iter() {
        if !have.state.is_enabled() || desired.contains(&key) {
            continue;
        }
        out.extra.push(GuardDiffEntry {
            target: key.target,
            selector: key.selector,
            desired: Some(PermissionState::Off),
            actual: Some(have.state),
            signature: have.signature.clone(),
        });
    }

    out
}

/// Presence-only comparison in both directions.
pub fn diff_module(desired: &ModuleStateMap, actual: &ModuleStateMap) -> ModuleDiff {
    let mut out = ModuleDiff::default();

    for (key, info) in desired.iter() {
        if !actual.contains(&key) {
            out.missing.push(ModuleDiffEntry {
                target: key.target,
                selector: key.selector,
                signature: info.signature.clone(),
            });
        }
    }
    for (key, info) in actual.iter() {
        if !desired.contains(&key) {
            out.extra.push(ModuleDiffEntry {
                target: key.target,
                selector: key.selector,
                signature: info.signature.clone(),
            });
        }
    }

    out
}

trait Keyed {
    fn key(&self) -> CallKey;
    fn has_signature(&self) -> bool;
}

impl Keyed for GuardDiffEntry {
    fn key(&self) -> CallKey {
        GuardDiffEntry::key(self)
    }
    fn has_signature(&self) -> bool {
        self.signature.is_some()
    }
}

impl Keyed for ModuleDiffEntry {
    fn key(&self) -> CallKey {
        ModuleDiffEntry::key(self)
    }
    fn has_signature(&self) -> bool {
        self.signature.is_some()
    }
}

/// One entry per key, first seen wins unless a later one carries a signature
/// the kept one lacks. Output is in key order.
fn dedupe<T: Keyed>(entries: Vec<T>) -> Vec<T> {
    let mut by_key: BTreeMap<CallKey, T> = BTreeMap::new();
    for e in entries {
        let key = e.key();
        let replace = match by_key.get(&key) {
            None => true,
            Some(kept) => !kept.has_signature() && e.has_signature(),
        };
        if replace {
            by_key.insert(key, e);
        }
    }
    by_key.into_values().collect()
}

pub fn dedupe_guard_entries(entries: Vec<GuardDiffEntry>) -> Vec<GuardDiffEntry> {
    dedupe(entries)
}

pub fn dedupe_module_entries(entries: Vec<ModuleDiffEntry>) -> Vec<ModuleDiffEntry> {
    dedupe(entries)
}

/// Final per-chain report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChainDiff {
    pub guard_missing: Vec<GuardDiffEntry>,
    pub guard_mismatched: Vec<GuardDiffEntry>,
    pub guard_extra: Vec<GuardDiffEntry>,
    pub module_missing: Vec<ModuleDiffEntry>,
    pub module_extra: Vec<ModuleDiffEntry>,
}

impl ChainDiff {
    /// Merge read-path diffs with event-path extras and dedupe every list.
    pub fn assemble(
        guard: GuardDiff,
        module: ModuleDiff,
        event_guard_extra: Vec<GuardDiffEntry>,
        event_module_extra: Vec<ModuleDiffEntry>,
    ) -> Self {
        let mut guard_extra = guard.extra;
        guard_extra.extend(event_guard_extra);
        let mut module_extra = module.extra;
        module_extra.extend(event_module_extra);

        Self {
            guard_missing: dedupe(guard.missing),
            guard_mismatched: dedupe(guard.mismatched),
            guard_extra: dedupe(guard_extra),
            module_missing: dedupe(module.missing),
            module_extra: dedupe(module_extra),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.guard_missing.is_empty()
            && self.guard_mismatched.is_empty()
            && self.guard_extra.is_empty()
            && self.module_missing.is_empty()
            && self.module_extra.is_empty()
    }

    pub fn total(&self) -> usize {
        self.guard_missing.len()
            + self.guard_mismatched.len()
            + self.guard_extra.len()
            + self.module_missing.len()
            + self.module_extra.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wls_schemas::{Address, GuardStateInfo, ModuleStateInfo, Selector};

    fn key(t: u8, s: u8) -> CallKey {
        CallKey::new(Address::from_bytes([t; 20]), Selector::from_bytes([s; 4]))
    }

    #[test]
    fn classification_is_exhaustive_and_exclusive() {
        use PermissionState::*;
        let expected = [
            ((Off, Off), GuardClass::InSync),
            ((Off, On), GuardClass::Extra),
            ((Off, PermanentlyOn), GuardClass::Extra),
            ((On, Off), GuardClass::Missing),
            ((On, On), GuardClass::InSync),
            ((On, PermanentlyOn), GuardClass::Mismatched),
            ((PermanentlyOn, Off), GuardClass::Missing),
            ((PermanentlyOn, On), GuardClass::Mismatched),
            ((PermanentlyOn, PermanentlyOn), GuardClass::InSync),
        ];
        for ((d, a), class) in expected {
            assert_eq!(classify(d, a), class, "desired={d} actual={a}");
        }
    }

    #[test]
    fn each_pair_lands_in_exactly_one_list() {
        for d in PermissionState::ALL {
            for a in PermissionState::ALL {
                let mut desired = GuardStateMap::new();
                desired.insert(key(1, 1), GuardStateInfo::new(d));
                let mut actual = GuardStateMap::new();
                actual.insert(key(1, 1), GuardStateInfo::new(a));

                let diff = diff_guard(&desired, &actual);
                let hits = diff.missing.len() + diff.mismatched.len() + diff.extra.len();
                let expect = usize::from(classify(d, a) != GuardClass::InSync);
                assert_eq!(hits, expect, "desired={d} actual={a}");
            }
        }
    }

    #[test]
    fn second_pass_finds_undesired_enabled_keys_only() {
        let desired = GuardStateMap::new();
        let mut actual = GuardStateMap::new();
        actual.insert(key(2, 2), GuardStateInfo::new(PermissionState::On));
        actual.insert(key(3, 3), GuardStateInfo::new(PermissionState::Off));

        let diff = diff_guard(&desired, &actual);
        assert!(diff.missing.is_empty());
        assert_eq!(diff.extra.len(), 1);
        assert_eq!(diff.extra[0].key(), key(2, 2));
        assert_eq!(diff.extra[0].desired, Some(PermissionState::Off));
        assert_eq!(diff.extra[0].actual, Some(PermissionState::On));
    }

    #[test]
    fn explicit_off_desired_is_reported_once() {
        let mut desired = GuardStateMap::new();
        desired.insert(key(1, 1), GuardStateInfo::new(PermissionState::Off));
        let mut actual = GuardStateMap::new();
        actual.insert(key(1, 1), GuardStateInfo::new(PermissionState::PermanentlyOn));

        let diff = diff_guard(&desired, &actual);
        assert_eq!(diff.extra.len(), 1);
    }

    #[test]
    fn module_diff_is_presence_based() {
        let mut desired = ModuleStateMap::new();
        desired.insert(key(1, 1), ModuleStateInfo::default());
        desired.insert(key(2, 2), ModuleStateInfo::default());
        let mut actual = ModuleStateMap::new();
        actual.insert(key(2, 2), ModuleStateInfo::default());
        actual.insert(key(3, 3), ModuleStateInfo::default());

        let diff = diff_module(&desired, &actual);
        assert_eq!(diff.missing.iter().map(|e| e.key()).collect::<Vec<_>>(), vec![key(1, 1)]);
        assert_eq!(diff.extra.iter().map(|e| e.key()).collect::<Vec<_>>(), vec![key(3, 3)]);
    }

    #[test]
    fn dedupe_prefers_signed_entry() {
        let bare = ModuleDiffEntry {
            target: key(1, 1).target,
            selector: key(1, 1).selector,
            signature: None,
        };
        let signed = ModuleDiffEntry {
            signature: Some("foo()".to_string()),
            ..bare.clone()
        };
        let other = ModuleDiffEntry {
            signature: Some("bar()".to_string()),
            ..bare.clone()
        };

        let out = dedupe_module_entries(vec![bare.clone(), signed.clone(), other]);
        assert_eq!(out, vec![signed.clone()]);

        let out = dedupe_module_entries(vec![signed.clone(), bare]);
        assert_eq!(out, vec![signed]);
    }
}

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{Address, CallKey, PermissionState, Selector};

/// Two-level ordered map: target, then selector.
///
/// Iteration order is canonical (byte order of target, then selector) and
/// never affects correctness; only final-state lookups matter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CallMap<V> {
    inner: BTreeMap<Address, BTreeMap<Selector, V>>,
}

impl<V> Default for CallMap<V> {
    fn default() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }
}

impl<V> CallMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. Returns the previous value for the key.
    pub fn insert(&mut self, key: CallKey, value: V) -> Option<V> {
        self.inner
            .entry(key.target)
            .or_default()
            .insert(key.selector, value)
    }

    pub fn get(&self, key: &CallKey) -> Option<&V> {
        self.inner.get(&key.target)?.get(&key.selector)
    }

    pub fn contains(&self, key: &CallKey) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &CallKey) -> Option<V> {
        let selectors = self.inner.get_mut(&key.target)?;
        let out = selectors.remove(&key.selector);
        if selectors.is_empty() {
            self.inner.remove(&key.target);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.inner.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn targets(&self) -> impl Iterator<Item = &Address> + '_ {
        self.inner.keys()
    }

    pub fn selectors_for(&self, target: &Address) -> Option<&BTreeMap<Selector, V>> {
        self.inner.get(target)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CallKey, &V)> + '_ {
        self.inner.iter().flat_map(|(target, selectors)| {
            selectors
                .iter()
                .map(move |(selector, v)| (CallKey::new(*target, *selector), v))
        })
    }

    /// All keys in canonical order.
    pub fn keys(&self) -> Vec<CallKey> {
        self.iter().map(|(k, _)| k).collect()
    }
}

/// Value stored per guard key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GuardStateInfo {
    pub state: PermissionState,
    pub signature: Option<String>,
}

impl GuardStateInfo {
    pub fn new(state: PermissionState) -> Self {
        Self {
            state,
            signature: None,
        }
    }

    pub fn with_signature(state: PermissionState, signature: Option<String>) -> Self {
        Self { state, signature }
    }
}

/// Value stored per module key. Presence alone means "blocked".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModuleStateInfo {
    pub signature: Option<String>,
}

pub type GuardStateMap = CallMap<GuardStateInfo>;
pub type ModuleStateMap = CallMap<ModuleStateInfo>;

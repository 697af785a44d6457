use tracing::debug;
use wls_config::{AllowlistIndex, ChainConfig};
use wls_schemas::{
    known_signature, CallKey, CallMap, GuardStateInfo, GuardStateMap, ModuleStateInfo,
    ModuleStateMap, NormalizedAllowlist, PermissionState, SyncError, APPROVE_SIGNATURE,
    TRANSFER_SIGNATURE,
};

/// A guard key set by one tag and then overwritten by a later tag on the
/// same chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagOverride {
    pub key: CallKey,
    pub earlier_tag: String,
    pub earlier_state: PermissionState,
    pub later_tag: String,
    pub later_state: PermissionState,
}

/// Desired state for one chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledDesired {
    pub guard: GuardStateMap,
    pub module: ModuleStateMap,
    /// Cross-tag guard overwrites, in application order.
    pub overrides: Vec<TagOverride>,
}

struct GuardMerge {
    map: GuardStateMap,
    owners: CallMap<String>,
    overrides: Vec<TagOverride>,
}

impl GuardMerge {
    fn set(&mut self, tag: &str, key: CallKey, info: GuardStateInfo) {
        if key.is_sentinel() {
            debug!(tag, %key, "skipping sentinel guard key");
            return;
        }
        let later_state = info.state;
        let previous = self.map.insert(key, info);
        let previous_owner = self.owners.insert(key, tag.to_string());
        self.record(tag, key, previous, previous_owner, later_state);
    }

    /// A token half set to `OFF`: the key leaves the map, and any earlier
    /// tag's value for it is overridden.
    fn clear(&mut self, tag: &str, key: CallKey) {
        if key.is_sentinel() {
            return;
        }
        let previous = self.map.remove(&key);
        let previous_owner = self.owners.remove(&key);
        self.record(tag, key, previous, previous_owner, PermissionState::Off);
    }

    fn record(
        &mut self,
        tag: &str,
        key: CallKey,
        previous: Option<GuardStateInfo>,
        previous_owner: Option<String>,
        later_state: PermissionState,
    ) {
        if let (Some(prev), Some(owner)) = (previous, previous_owner) {
            if owner != tag {
                debug!(
                    %key,
                    earlier_tag = %owner,
                    later_tag = tag,
                    from = %prev.state,
                    to = %later_state,
                    "later tag overrides guard entry"
                );
                self.overrides.push(TagOverride {
                    key,
                    earlier_tag: owner,
                    earlier_state: prev.state,
                    later_tag: tag.to_string(),
                    later_state,
                });
            }
        }
    }
}

/// Merge tags in the given order. For the same guard key the last tag wins.
///
/// Token shortcuts expand to their `transfer` / `approve` halves; guard halves
/// whose state is `OFF` are not inserted but still clear an earlier tag's
/// value for that key. Module halves whose flag is false are not inserted.
/// Zero target / zero selector keys are dropped.
pub fn merge_tags(tags: &[&NormalizedAllowlist]) -> CompiledDesired {
    let mut guard = GuardMerge {
        map: CallMap::new(),
        owners: CallMap::new(),
        overrides: Vec::new(),
    };
    let mut module: ModuleStateMap = CallMap::new();

    for allowlist in tags {
        let tag = allowlist.slug.as_str();

        for call in &allowlist.guard.calls {
            let signature = call
                .signature
                .clone()
                .or_else(|| known_signature(call.selector).map(str::to_string));
            guard.set(tag, call.key(), GuardStateInfo::with_signature(call.state, signature));
        }

        for token in &allowlist.guard.tokens {
            let signatures = [TRANSFER_SIGNATURE, APPROVE_SIGNATURE];
            for ((key, state), sig) in token.halves().into_iter().zip(signatures) {
                if state == PermissionState::Off {
                    guard.clear(tag, key);
                    continue;
                }
                guard.set(
                    tag,
                    key,
                    GuardStateInfo::with_signature(state, Some(sig.to_string())),
                );
            }
        }

        let blocks = allowlist
            .module
            .blocks
            .iter()
            .map(|b| b.key())
            .chain(allowlist.module.tokens.iter().flat_map(|t| t.blocked_keys()));
        for key in blocks {
            if key.is_sentinel() {
                continue;
            }
            module.insert(
                key,
                ModuleStateInfo {
                    signature: known_signature(key.selector).map(str::to_string),
                },
            );
        }
    }

    CompiledDesired {
        guard: guard.map,
        module,
        overrides: guard.overrides,
    }
}

/// Resolve the chain's tag list against the index and merge it.
pub fn compile_desired(
    chain: &ChainConfig,
    index: &AllowlistIndex,
) -> Result<CompiledDesired, SyncError> {
    let mut tags = Vec::with_capacity(chain.tags.len());
    for name in &chain.tags {
        let allowlist = index.get_ignore_case(name).ok_or_else(|| SyncError::UnknownTag {
            tag: name.clone(),
            chain: Some(chain.slug.clone()),
        })?;
        tags.push(allowlist);
    }

    let compiled = merge_tags(&tags);
    debug!(
        chain = %chain.slug,
        guard_keys = compiled.guard.len(),
        module_keys = compiled.module.len(),
        overrides = compiled.overrides.len(),
        "compiled desired state"
    );
    Ok(compiled)
}

//! Event replay: fold decoded logs into state maps.

use wls_schemas::{
    known_signature, CallMap, GuardDiffEntry, GuardEvent, GuardStateInfo, GuardStateMap,
    ModuleDiffEntry, ModuleEvent, ModuleStateInfo, ModuleStateMap, PermissionState,
};

/// Sort by (block, log index) and apply in order; the last event per key
/// wins. Input order is irrelevant. Sentinel keys are skipped.
pub fn fold_guard_events(mut events: Vec<GuardEvent>) -> GuardStateMap {
    events.sort_by_key(|e| e.position);

    let mut state: GuardStateMap = CallMap::new();
    for e in events {
        if e.key.is_sentinel() {
            continue;
        }
        let signature = known_signature(e.key.selector).map(str::to_string);
        state.insert(e.key, GuardStateInfo::with_signature(e.state, signature));
    }
    state
}

/// Every key ever blocked. Blocks are only ever added, so order is irrelevant.
pub fn fold_module_events(events: Vec<ModuleEvent>) -> ModuleStateMap {
    let mut state: ModuleStateMap = CallMap::new();
    for e in events {
        if e.key.is_sentinel() {
            continue;
        }
        state.insert(
            e.key,
            ModuleStateInfo {
                signature: known_signature(e.key.selector).map(str::to_string),
            },
        );
    }
    state
}

/// Replayed keys that are enabled on-chain while desired is `OFF` or absent.
pub fn guard_event_extras(replayed: &GuardStateMap, desired: &GuardStateMap) -> Vec<GuardDiffEntry> {
    let mut out = Vec::new();
    for (key, have) in replayed.iter() {
        if key.is_sentinel() || !have.state.is_enabled() {
            continue;
        }
        let want = desired.get(&key);
        let want_state = want.map(|w| w.state).unwrap_or(PermissionState::Off);
        if want_state.is_enabled() {
            continue;
        }
        out.push(GuardDiffEntry {
            target: key.target,
            selector: key.selector,
            desired: Some(want_state),
            actual: Some(have.state),
            signature: want
                .and_then(|w| w.signature.clone())
                .or_else(|| have.signature.clone()),
        });
    }
    out
}

/// Replayed blocks that desired does not contain.
pub fn module_event_extras(
    replayed: &ModuleStateMap,
    desired: &ModuleStateMap,
) -> Vec<ModuleDiffEntry> {
    replayed
        .iter()
        .filter(|(key, _)| !key.is_sentinel() && !desired.contains(key))
        .map(|(key, info)| ModuleDiffEntry {
            target: key.target,
            selector: key.selector,
            signature: info.signature.clone(),
        })
        .collect()
}

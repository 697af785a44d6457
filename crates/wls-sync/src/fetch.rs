//! Actual on-chain state, two ways.
//!
//! Direct reads only see keys the caller asks about (the desired key set).
//! Event replay sees every key the contracts ever touched, which is how
//! out-of-band changes surface as extras.

use tracing::{debug, info};
use wls_chain::{abi, ChainReader, LogFilter, RawLog};
use wls_config::ChainConfig;
use wls_reconcile::{fold_guard_events, fold_module_events, guard_event_extras, module_event_extras};
use wls_schemas::{
    known_signature, Address, CallKey, CallMap, GuardDiffEntry, GuardStateInfo, GuardStateMap,
    ModuleDiffEntry, ModuleStateInfo, ModuleStateMap, PermissionState, SyncError,
};

use crate::window::{block_ranges, windowed};
use crate::{LOG_BLOCK_SPAN, LOG_RANGE_CONCURRENCY, READ_BATCH_SIZE};

fn decode_state(chain: &ChainConfig, key: CallKey, raw: u64) -> Result<PermissionState, SyncError> {
    PermissionState::from_raw(raw).ok_or_else(|| SyncError::UnknownState {
        raw: raw.to_string(),
        context: format!("{} guard {} allowedCalls({key})", chain.slug, chain.guard),
    })
}

/// Live guard state for one key.
pub async fn read_guard_state(
    reader: &dyn ChainReader,
    chain: &ChainConfig,
    key: CallKey,
) -> Result<PermissionState, SyncError> {
    let raw = reader.allowed_call_state(chain.guard, key).await?;
    decode_state(chain, key, raw)
}

/// `allowedCalls` for every key, `READ_BATCH_SIZE` at a time. Every read key
/// is present in the result, `OFF` included.
pub async fn fetch_actual_guard_state(
    reader: &dyn ChainReader,
    chain: &ChainConfig,
    keys: &[CallKey],
) -> Result<GuardStateMap, SyncError> {
    let states = windowed(keys, READ_BATCH_SIZE, "guard_reads", |key| {
        let key = *key;
        async move { Ok((key, read_guard_state(reader, chain, key).await?)) }
    })
    .await?;

    let mut actual: GuardStateMap = CallMap::new();
    for (key, state) in states {
        actual.insert(key, GuardStateInfo::new(state));
    }
    debug!(chain = %chain.slug, keys = keys.len(), "guard state read");
    Ok(actual)
}

/// `blockedModuleCalls` for every key. Only blocked keys are kept.
pub async fn fetch_actual_module_state(
    reader: &dyn ChainReader,
    chain: &ChainConfig,
    keys: &[CallKey],
) -> Result<ModuleStateMap, SyncError> {
    let blocked = windowed(keys, READ_BATCH_SIZE, "module_reads", |key| {
        let key = *key;
        async move {
            let b = reader.is_module_call_blocked(chain.module, key).await?;
            Ok((key, b))
        }
    })
    .await?;

    let mut actual: ModuleStateMap = CallMap::new();
    for (key, _) in blocked.into_iter().filter(|(_, b)| *b) {
        actual.insert(key, ModuleStateInfo::default());
    }
    debug!(chain = %chain.slug, keys = keys.len(), blocked = actual.len(), "module state read");
    Ok(actual)
}

/// Every log for `topic0` at `address` from `start_block` to the current
/// head, in `LOG_BLOCK_SPAN` ranges with `LOG_RANGE_CONCURRENCY` in flight.
pub async fn fetch_logs(
    reader: &dyn ChainReader,
    chain: &str,
    address: Address,
    topic0: [u8; 32],
    start_block: u64,
) -> Result<Vec<RawLog>, SyncError> {
    let latest = reader.block_number().await?;
    let ranges = block_ranges(start_block, latest, LOG_BLOCK_SPAN);
    debug!(chain, %address, start_block, latest, ranges = ranges.len(), "scanning logs");

    let segments = windowed(&ranges, LOG_RANGE_CONCURRENCY, "log_ranges", |range| {
        let (from_block, to_block) = *range;
        async move {
            let logs = reader
                .logs(LogFilter {
                    address,
                    topic0,
                    from_block,
                    to_block,
                })
                .await?;
            debug!(chain, range = %format!("{from_block}-{to_block}"), logs = logs.len(), "range fetched");
            Ok(logs)
        }
    })
    .await?;

    Ok(segments.into_iter().flatten().collect())
}

/// Replay every `SetCallAllowed` log into the current guard state.
pub async fn replay_guard_state(
    reader: &dyn ChainReader,
    chain: &ChainConfig,
) -> Result<GuardStateMap, SyncError> {
    let logs = fetch_logs(
        reader,
        &chain.slug,
        chain.guard,
        abi::guard_event_topic(),
        chain.start_block,
    )
    .await?;

    let mut events = Vec::with_capacity(logs.len());
    for log in &logs {
        if let Some(ev) = abi::decode_guard_log(log)? {
            events.push(ev);
        }
    }
    info!(chain = %chain.slug, logs = logs.len(), events = events.len(), "guard events replayed");
    Ok(fold_guard_events(events))
}

/// Replay every `SetModuleCallBlocked` log into the set of blocked keys.
pub async fn replay_module_state(
    reader: &dyn ChainReader,
    chain: &ChainConfig,
) -> Result<ModuleStateMap, SyncError> {
    let logs = fetch_logs(
        reader,
        &chain.slug,
        chain.module,
        abi::module_event_topic(),
        chain.start_block,
    )
    .await?;

    let mut events = Vec::with_capacity(logs.len());
    for log in &logs {
        if let Some(ev) = abi::decode_module_log(log)? {
            events.push(ev);
        }
    }
    info!(chain = %chain.slug, logs = logs.len(), events = events.len(), "module events replayed");
    Ok(fold_module_events(events))
}

/// Replayed guard state plus the enabled keys desired does not want.
pub async fn fetch_guard_state_from_events(
    reader: &dyn ChainReader,
    chain: &ChainConfig,
    desired: &GuardStateMap,
) -> Result<(GuardStateMap, Vec<GuardDiffEntry>), SyncError> {
    let replayed = replay_guard_state(reader, chain).await?;
    let extras = guard_event_extras(&replayed, desired);
    Ok((replayed, extras))
}

/// Replayed module blocks plus the blocks desired does not contain.
pub async fn fetch_module_state_from_events(
    reader: &dyn ChainReader,
    chain: &ChainConfig,
    desired: &ModuleStateMap,
) -> Result<(ModuleStateMap, Vec<ModuleDiffEntry>), SyncError> {
    let replayed = replay_module_state(reader, chain).await?;
    let extras = module_event_extras(&replayed, desired);
    Ok((replayed, extras))
}

/// Signature for a key when no configuration names one.
pub(crate) fn fallback_signature(key: CallKey) -> Option<String> {
    known_signature(key.selector).map(str::to_string)
}

use tracing::info;
use wls_chain::ChainReader;
use wls_config::ChainConfig;
use wls_reconcile::{diff_guard, diff_module, ChainDiff, CompiledDesired};
use wls_schemas::SyncError;

use crate::fetch::{
    fetch_actual_guard_state, fetch_actual_module_state, fetch_guard_state_from_events,
    fetch_module_state_from_events,
};

/// Full diff for one chain: direct reads of the desired keys, then event
/// replay for extras, merged and deduplicated.
pub async fn diff_chain(
    reader: &dyn ChainReader,
    chain: &ChainConfig,
    desired: &CompiledDesired,
) -> Result<ChainDiff, SyncError> {
    let guard_keys = desired.guard.keys();
    let module_keys = desired.module.keys();

    let actual_guard = fetch_actual_guard_state(reader, chain, &guard_keys).await?;
    let actual_module = fetch_actual_module_state(reader, chain, &module_keys).await?;
    let (_, guard_extra) = fetch_guard_state_from_events(reader, chain, &desired.guard).await?;
    let (_, module_extra) =
        fetch_module_state_from_events(reader, chain, &desired.module).await?;

    let diff = ChainDiff::assemble(
        diff_guard(&desired.guard, &actual_guard),
        diff_module(&desired.module, &actual_module),
        guard_extra,
        module_extra,
    );

    info!(
        chain = %chain.slug,
        guard_missing = diff.guard_missing.len(),
        guard_mismatched = diff.guard_mismatched.len(),
        guard_extra = diff.guard_extra.len(),
        module_missing = diff.module_missing.len(),
        module_extra = diff.module_extra.len(),
        "chain diff complete"
    );
    Ok(diff)
}

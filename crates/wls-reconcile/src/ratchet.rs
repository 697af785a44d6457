use wls_schemas::{CallKey, PermissionState, SyncError};

/// Refuse transitions this tool must never propose.
///
/// - `OFF -> PERMANENTLY_ON` must go through `ON` first.
/// - `PERMANENTLY_ON` is irreversible on-chain.
///
/// `from == to` is accepted; callers emit no action for it.
pub fn check_transition(
    chain: &str,
    key: CallKey,
    from: PermissionState,
    to: PermissionState,
) -> Result<(), SyncError> {
    use PermissionState::*;
    match (from, to) {
        (Off, PermanentlyOn) => Err(SyncError::IllegalEscalation {
            chain: chain.to_string(),
            key,
            from,
            to,
        }),
        (PermanentlyOn, Off) | (PermanentlyOn, On) => Err(SyncError::IllegalDowngrade {
            chain: chain.to_string(),
            key,
            from,
            to,
        }),
        _ => Ok(()),
    }
}

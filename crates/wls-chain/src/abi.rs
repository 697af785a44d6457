//! Minimal ABI codec for the guard and module contracts.
//!
//! Only static 32-byte words are involved: `address` is right-aligned,
//! `bytes4` is left-aligned, `uint8` / `bool` are right-aligned.

use wls_schemas::{
    keccak256, Address, CallKey, GuardEvent, LogPosition, ModuleEvent, PermissionState, Selector,
    SyncError,
};

use crate::RawLog;

pub const ALLOWED_CALLS_SIGNATURE: &str = "allowedCalls(address,bytes4)";
pub const BLOCKED_MODULE_CALLS_SIGNATURE: &str = "blockedModuleCalls(address,bytes4)";
pub const SET_CALL_ALLOWED_SIGNATURE: &str = "setCallAllowed(address,bytes4,uint8)";
pub const ADD_BLOCKED_MODULE_CALL_SIGNATURE: &str = "addBlockedModuleCall(address,bytes4)";

pub const GUARD_EVENT_SIGNATURE: &str = "SetCallAllowed(address,bytes4,uint8)";
pub const MODULE_EVENT_SIGNATURE: &str = "SetModuleCallBlocked(address,bytes4)";

pub fn event_topic(signature: &str) -> [u8; 32] {
    keccak256(signature.as_bytes())
}

pub fn guard_event_topic() -> [u8; 32] {
    event_topic(GUARD_EVENT_SIGNATURE)
}

pub fn module_event_topic() -> [u8; 32] {
    event_topic(MODULE_EVENT_SIGNATURE)
}

/// `0x`-prefixed lower-case hex.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn address_word(a: Address) -> [u8; 32] {
    let mut w = [0u8; 32];
    w[12..].copy_from_slice(a.as_bytes());
    w
}

fn bytes4_word(s: Selector) -> [u8; 32] {
    let mut w = [0u8; 32];
    w[..4].copy_from_slice(s.as_bytes());
    w
}

fn uint_word(v: u64) -> [u8; 32] {
    let mut w = [0u8; 32];
    w[24..].copy_from_slice(&v.to_be_bytes());
    w
}

fn call_data(signature: &str, words: &[[u8; 32]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 32 * words.len());
    out.extend_from_slice(Selector::from_signature(signature).as_bytes());
    for w in words {
        out.extend_from_slice(w);
    }
    out
}

pub fn encode_allowed_calls(key: CallKey) -> Vec<u8> {
    call_data(
        ALLOWED_CALLS_SIGNATURE,
        &[address_word(key.target), bytes4_word(key.selector)],
    )
}

pub fn encode_blocked_module_calls(key: CallKey) -> Vec<u8> {
    call_data(
        BLOCKED_MODULE_CALLS_SIGNATURE,
        &[address_word(key.target), bytes4_word(key.selector)],
    )
}

pub fn encode_set_call_allowed(key: CallKey, state: PermissionState) -> Vec<u8> {
    call_data(
        SET_CALL_ALLOWED_SIGNATURE,
        &[
            address_word(key.target),
            bytes4_word(key.selector),
            uint_word(u64::from(state.as_u8())),
        ],
    )
}

pub fn encode_add_blocked_module_call(key: CallKey) -> Vec<u8> {
    call_data(
        ADD_BLOCKED_MODULE_CALL_SIGNATURE,
        &[address_word(key.target), bytes4_word(key.selector)],
    )
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// First word of a return value / log data as an unsigned integer.
pub fn decode_uint(data: &[u8]) -> Result<u64, SyncError> {
    let word = data.get(..32).ok_or_else(|| {
        SyncError::Decode(format!("expected a 32-byte word, got {} bytes", data.len()))
    })?;
    if word[..24].iter().any(|b| *b != 0) {
        return Err(SyncError::Decode(format!(
            "integer word does not fit in u64: {}",
            to_hex(word)
        )));
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(tail))
}

/// A guard state word. Values too wide for `u64` cannot be an enum member and
/// are `UnknownState` carrying the full word; the caller rejects values above 2.
pub fn decode_state_word(
    data: &[u8],
    context: impl FnOnce() -> String,
) -> Result<u64, SyncError> {
    let word = data.get(..32).ok_or_else(|| {
        SyncError::Decode(format!("expected a 32-byte word, got {} bytes", data.len()))
    })?;
    if word[..24].iter().any(|b| *b != 0) {
        return Err(SyncError::UnknownState {
            raw: to_hex(word),
            context: context(),
        });
    }
    decode_uint(word)
}

pub fn decode_bool(data: &[u8]) -> Result<bool, SyncError> {
    match decode_uint(data)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(SyncError::Decode(format!("invalid bool word value {other}"))),
    }
}

fn indexed_key(log: &RawLog, what: &str) -> Result<CallKey, SyncError> {
    if log.topics.len() < 3 {
        return Err(SyncError::Decode(format!(
            "{what} log at block {} index {} has {} topics, expected 3",
            log.block_number,
            log.log_index,
            log.topics.len()
        )));
    }
    let mut target = [0u8; 20];
    target.copy_from_slice(&log.topics[1][12..]);
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&log.topics[2][..4]);
    Ok(CallKey::new(
        Address::from_bytes(target),
        Selector::from_bytes(selector),
    ))
}

/// Decode a guard `SetCallAllowed` log. `Ok(None)` for sentinel keys.
pub fn decode_guard_log(log: &RawLog) -> Result<Option<GuardEvent>, SyncError> {
    let key = indexed_key(log, "guard")?;
    if log.data.is_empty() {
        return Err(SyncError::Decode(format!(
            "guard log at block {} index {} has no data",
            log.block_number, log.log_index
        )));
    }
    if key.is_sentinel() {
        return Ok(None);
    }
    let context = || format!("event {key} at block {}", log.block_number);
    let raw = decode_state_word(&log.data, &context)?;
    let state = PermissionState::from_raw(raw).ok_or_else(|| SyncError::UnknownState {
        raw: raw.to_string(),
        context: context(),
    })?;
    Ok(Some(GuardEvent {
        position: LogPosition::new(log.block_number, log.log_index),
        key,
        state,
    }))
}

/// Decode a module `SetModuleCallBlocked` log. `Ok(None)` for sentinel keys.
pub fn decode_module_log(log: &RawLog) -> Result<Option<ModuleEvent>, SyncError> {
    let key = indexed_key(log, "module")?;
    if key.is_sentinel() {
        return Ok(None);
    }
    Ok(Some(ModuleEvent {
        position: LogPosition::new(log.block_number, log.log_index),
        key,
    }))
}

/// Log as the guard contract would emit it. Inverse of [`decode_guard_log`].
pub fn encode_guard_log(key: CallKey, state: PermissionState, at: LogPosition) -> RawLog {
    RawLog {
        topics: vec![
            guard_event_topic(),
            address_word(key.target),
            bytes4_word(key.selector),
        ],
        data: uint_word(u64::from(state.as_u8())).to_vec(),
        block_number: at.block_number,
        log_index: at.log_index,
    }
}

/// Log as the module contract would emit it. Inverse of [`decode_module_log`].
pub fn encode_module_log(key: CallKey, at: LogPosition) -> RawLog {
    RawLog {
        topics: vec![
            module_event_topic(),
            address_word(key.target),
            bytes4_word(key.selector),
        ],
        data: Vec::new(),
        block_number: at.block_number,
        log_index: at.log_index,
    }
}

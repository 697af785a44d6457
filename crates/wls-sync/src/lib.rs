//! wls-sync
//!
//! Everything that talks to a chain through a `ChainReader`:
//! - batched direct reads of guard / module state
//! - windowed event-log scans and replay
//! - the per-chain diff
//! - the reconciliation planner
//!
//! One chain at a time. Inside a chain, reads and log ranges go out in
//! fixed windows; no retries.

mod fetch;
mod plan;
mod report;
mod window;

/// Direct state reads issued concurrently per window.
pub const READ_BATCH_SIZE: usize = 50;
/// Blocks per `eth_getLogs` range.
pub const LOG_BLOCK_SPAN: u64 = 5_000;
/// Log ranges fetched concurrently per window.
pub const LOG_RANGE_CONCURRENCY: usize = 8;

pub use fetch::{
    fetch_actual_guard_state, fetch_actual_module_state, fetch_guard_state_from_events,
    fetch_logs, fetch_module_state_from_events, read_guard_state, replay_guard_state,
    replay_module_state,
};
pub use plan::{build_plan, Action, Plan};
pub use report::diff_chain;
pub use window::{block_ranges, windowed};

//! wls-reconcile
//!
//! Desired-state compilation and the diff engine.
//!
//! - Tags are merged in chain order; later tags overwrite earlier ones.
//! - Guard discrepancies are missing / mismatched / extra; module ones are
//!   missing / extra.
//! - Extras from direct reads and from event replay are merged per key.
//! - `PERMANENTLY_ON` is a ratchet; `OFF -> PERMANENTLY_ON` is refused.
//!
//! Deterministic, pure logic. No IO. No RPC calls.

mod compile;
mod diff;
mod events;
mod ratchet;

pub use compile::{compile_desired, merge_tags, CompiledDesired, TagOverride};
pub use diff::{
    classify, dedupe_guard_entries, dedupe_module_entries, diff_guard, diff_module, ChainDiff,
    GuardClass, GuardDiff, ModuleDiff,
};
pub use events::{fold_guard_events, fold_module_events, guard_event_extras, module_event_extras};
pub use ratchet::check_transition;

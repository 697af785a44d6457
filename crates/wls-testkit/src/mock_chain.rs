//! In-memory chain for fetcher and planner scenarios.
//!
//! Holds guard/module state and raw logs per contract address, and records
//! how calls arrive: every read or log fetch that starts while nothing else
//! is in flight opens a new "wave", so sequential windows show up as
//! separate waves with their sizes.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use wls_chain::{abi, ChainReader, LogFilter, RawLog};
use wls_schemas::{Address, CallKey, LogPosition, PermissionState, SyncError};

#[derive(Debug, Default, Clone)]
struct Gauge {
    in_flight: usize,
    peak: usize,
    waves: Vec<usize>,
    total: usize,
}

impl Gauge {
    fn enter(&mut self) {
        if self.in_flight == 0 {
            self.waves.push(0);
        }
        if let Some(last) = self.waves.last_mut() {
            *last += 1;
        }
        self.in_flight += 1;
        self.total += 1;
        self.peak = self.peak.max(self.in_flight);
    }

    fn leave(&mut self) {
        self.in_flight -= 1;
    }
}

#[derive(Default)]
struct Inner {
    guard_states: HashMap<(Address, CallKey), u64>,
    module_blocks: HashSet<(Address, CallKey)>,
    logs: Vec<(Address, RawLog)>,
    latest_block: u64,
    reads: Gauge,
    log_fetches: Gauge,
    log_filters: Vec<LogFilter>,
    fail_reads: Option<SyncError>,
}

/// Snapshot of call instrumentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStats {
    pub total: usize,
    pub peak_in_flight: usize,
    /// Sizes of consecutive groups of overlapping calls.
    pub waves: Vec<usize>,
}

impl From<&Gauge> for CallStats {
    fn from(g: &Gauge) -> Self {
        Self {
            total: g.total,
            peak_in_flight: g.peak,
            waves: g.waves.clone(),
        }
    }
}

#[derive(Default)]
pub struct MockChain {
    inner: Mutex<Inner>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut guard = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    pub fn set_guard_state(&self, guard: Address, key: CallKey, state: PermissionState) {
        self.set_guard_raw(guard, key, u64::from(state.as_u8()));
    }

    /// Store an arbitrary value, including ones outside the known enum.
    pub fn set_guard_raw(&self, guard: Address, key: CallKey, raw: u64) {
        self.with(|i| {
            i.guard_states.insert((guard, key), raw);
        });
    }

    pub fn block_module_call(&self, module: Address, key: CallKey) {
        self.with(|i| {
            i.module_blocks.insert((module, key));
        });
    }

    pub fn set_latest_block(&self, block: u64) {
        self.with(|i| i.latest_block = block);
    }

    pub fn push_log(&self, address: Address, log: RawLog) {
        self.with(|i| {
            i.latest_block = i.latest_block.max(log.block_number);
            i.logs.push((address, log));
        });
    }

    /// Set guard state and emit the matching `SetCallAllowed` log.
    pub fn record_guard_change(
        &self,
        guard: Address,
        key: CallKey,
        state: PermissionState,
        at: LogPosition,
    ) {
        self.set_guard_state(guard, key, state);
        self.push_log(guard, abi::encode_guard_log(key, state, at));
    }

    /// Block a call and emit the matching `SetModuleCallBlocked` log.
    pub fn record_module_block(&self, module: Address, key: CallKey, at: LogPosition) {
        self.block_module_call(module, key);
        self.push_log(module, abi::encode_module_log(key, at));
    }

    /// Every subsequent view call fails with `err`.
    pub fn fail_reads_with(&self, err: SyncError) {
        self.with(|i| i.fail_reads = Some(err));
    }

    pub fn read_stats(&self) -> CallStats {
        self.with(|i| CallStats::from(&i.reads))
    }

    pub fn log_stats(&self) -> CallStats {
        self.with(|i| CallStats::from(&i.log_fetches))
    }

    pub fn log_filters(&self) -> Vec<LogFilter> {
        self.with(|i| i.log_filters.clone())
    }

    async fn tracked_read<T>(
        &self,
        f: impl FnOnce(&Inner) -> Result<T, SyncError>,
    ) -> Result<T, SyncError> {
        self.with(|i| i.reads.enter());
        tokio::task::yield_now().await;
        self.with(|i| {
            i.reads.leave();
            match &i.fail_reads {
                Some(err) => Err(err.clone()),
                None => f(&*i),
            }
        })
    }
}

#[async_trait::async_trait]
impl ChainReader for MockChain {
    async fn allowed_call_state(&self, guard: Address, key: CallKey) -> Result<u64, SyncError> {
        self.tracked_read(|i| Ok(i.guard_states.get(&(guard, key)).copied().unwrap_or(0)))
            .await
    }

    async fn is_module_call_blocked(
        &self,
        module: Address,
        key: CallKey,
    ) -> Result<bool, SyncError> {
        self.tracked_read(|i| Ok(i.module_blocks.contains(&(module, key))))
            .await
    }

    async fn block_number(&self) -> Result<u64, SyncError> {
        Ok(self.with(|i| i.latest_block))
    }

    async fn logs(&self, filter: LogFilter) -> Result<Vec<RawLog>, SyncError> {
        self.with(|i| {
            i.log_fetches.enter();
            i.log_filters.push(filter);
        });
        tokio::task::yield_now().await;
        Ok(self.with(|i| {
            i.log_fetches.leave();
            i.logs
                .iter()
                .filter(|(addr, log)| {
                    *addr == filter.address
                        && log.topics.first() == Some(&filter.topic0)
                        && log.block_number >= filter.from_block
                        && log.block_number <= filter.to_block
                })
                .map(|(_, log)| log.clone())
                .collect()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{addr, key};

    #[tokio::test]
    async fn unset_state_reads_as_off() {
        let chain = MockChain::new();
        assert_eq!(chain.allowed_call_state(addr(1), key(2, 3)).await.unwrap(), 0);
        chain.set_guard_state(addr(1), key(2, 3), PermissionState::PermanentlyOn);
        assert_eq!(chain.allowed_call_state(addr(1), key(2, 3)).await.unwrap(), 2);
        assert_eq!(chain.read_stats().total, 2);
        assert_eq!(chain.read_stats().waves, vec![1, 1]);
    }

    #[tokio::test]
    async fn logs_are_filtered_by_address_topic_and_range() {
        let chain = MockChain::new();
        chain.record_guard_change(addr(1), key(2, 3), PermissionState::On, LogPosition::new(10, 0));
        chain.record_module_block(addr(9), key(2, 3), LogPosition::new(20, 0));

        let filter = LogFilter {
            address: addr(1),
            topic0: abi::guard_event_topic(),
            from_block: 0,
            to_block: 9,
        };
        assert!(chain.logs(filter).await.unwrap().is_empty());
        let filter = LogFilter {
            to_block: 10,
            ..filter
        };
        assert_eq!(chain.logs(filter).await.unwrap().len(), 1);
        assert_eq!(chain.block_number().await.unwrap(), 20);
        assert_eq!(chain.log_filters().len(), 2);
    }
}

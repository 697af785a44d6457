use wls_schemas::{Address, CallKey, SyncError};

/// `eth_getLogs` filter for one contract and one event topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Address,
    pub topic0: [u8; 32],
    /// Inclusive.
    pub from_block: u64,
    /// Inclusive.
    pub to_block: u64,
}

/// Undecoded log as delivered by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub topics: Vec<[u8; 32]>,
    pub data: Vec<u8>,
    pub block_number: u64,
    pub log_index: u64,
}

/// Read access to one chain.
///
/// Object-safe and `Send + Sync` so the fetcher can hold `&dyn ChainReader`
/// across concurrent futures.
#[async_trait::async_trait]
pub trait ChainReader: Send + Sync {
    /// Raw `allowedCalls(target, selector)` value. Callers map it to
    /// `PermissionState` and treat anything outside {0,1,2} as fatal.
    async fn allowed_call_state(&self, guard: Address, key: CallKey) -> Result<u64, SyncError>;

    /// `blockedModuleCalls(target, selector)`.
    async fn is_module_call_blocked(&self, module: Address, key: CallKey)
        -> Result<bool, SyncError>;

    async fn block_number(&self) -> Result<u64, SyncError>;

    async fn logs(&self, filter: LogFilter) -> Result<Vec<RawLog>, SyncError>;
}

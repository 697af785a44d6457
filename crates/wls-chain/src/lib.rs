//! wls-chain
//!
//! On-chain boundary for the guard and module contracts.
//!
//! - `ChainReader`: the async read contract the fetcher is written against
//! - `abi`: call-data encoding, return-word and log decoding
//! - `JsonRpcReader`: `ChainReader` over HTTP JSON-RPC
//!
//! Nothing here retries. A failed request is a fatal `SyncError`.

pub mod abi;
mod reader;
mod rpc;

pub use reader::{ChainReader, LogFilter, RawLog};
pub use rpc::JsonRpcReader;

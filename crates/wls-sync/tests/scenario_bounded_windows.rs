//! Scenario: bounded concurrency for reads and log scans
//!
//! # Invariants under test
//! 1. 120 direct reads go out as exactly three windows of 50, 50 and 20,
//!    with at most 50 in flight.
//! 2. A log scan over 100,000 blocks is split into 5,000-block ranges and
//!    fetched 8 ranges at a time.
//! 3. The scan starts at the chain's start block and ends at the head.
//! 4. A failed read aborts the fetch with the reader's error.

use wls_schemas::{PermissionState, SyncError};
use wls_sync::{
    fetch_actual_guard_state, fetch_actual_module_state, replay_guard_state, LOG_BLOCK_SPAN,
    LOG_RANGE_CONCURRENCY, READ_BATCH_SIZE,
};
use wls_testkit::fixtures::{chain, keys_on};
use wls_testkit::MockChain;

#[tokio::test]
async fn one_hundred_twenty_reads_are_three_windows() {
    assert_eq!(READ_BATCH_SIZE, 50);
    let mock = MockChain::new();
    let chain = chain("ethereum", &[]);
    let keys = keys_on(0x10, 120);
    mock.set_guard_state(chain.guard, keys[7], PermissionState::On);

    let actual = fetch_actual_guard_state(&mock, &chain, &keys).await.unwrap();

    let stats = mock.read_stats();
    assert_eq!(stats.total, 120);
    assert_eq!(stats.waves, vec![50, 50, 20]);
    assert_eq!(stats.peak_in_flight, 50);

    assert_eq!(actual.len(), 120);
    assert_eq!(
        actual.get(&keys[7]).map(|i| i.state),
        Some(PermissionState::On)
    );
    assert_eq!(
        actual.get(&keys[8]).map(|i| i.state),
        Some(PermissionState::Off)
    );
}

#[tokio::test]
async fn module_reads_keep_only_blocked_keys() {
    let mock = MockChain::new();
    let chain = chain("ethereum", &[]);
    let keys = keys_on(0x20, 60);
    mock.block_module_call(chain.module, keys[59]);

    let actual = fetch_actual_module_state(&mock, &chain, &keys).await.unwrap();
    assert_eq!(actual.len(), 1);
    assert!(actual.contains(&keys[59]));
    assert_eq!(mock.read_stats().waves, vec![50, 10]);
}

#[tokio::test]
async fn log_scan_is_ranged_and_windowed() {
    assert_eq!(LOG_BLOCK_SPAN, 5_000);
    assert_eq!(LOG_RANGE_CONCURRENCY, 8);

    let mock = MockChain::new();
    let chain = chain("ethereum", &[]);
    mock.set_latest_block(99_999);

    let replayed = replay_guard_state(&mock, &chain).await.unwrap();
    assert!(replayed.is_empty());

    let stats = mock.log_stats();
    assert_eq!(stats.total, 20);
    assert_eq!(stats.waves, vec![8, 8, 4]);
    assert_eq!(stats.peak_in_flight, 8);

    let filters = mock.log_filters();
    assert_eq!((filters[0].from_block, filters[0].to_block), (0, 4_999));
    let last = filters[filters.len() - 1];
    assert_eq!((last.from_block, last.to_block), (95_000, 99_999));
    assert!(filters.iter().all(|f| f.address == chain.guard));
}

#[tokio::test]
async fn log_scan_starts_at_start_block() {
    let mock = MockChain::new();
    let mut chain = chain("base", &[]);
    chain.start_block = 12_000;
    mock.set_latest_block(20_000);

    replay_guard_state(&mock, &chain).await.unwrap();

    let ranges: Vec<(u64, u64)> = mock
        .log_filters()
        .iter()
        .map(|f| (f.from_block, f.to_block))
        .collect();
    assert_eq!(ranges, vec![(12_000, 16_999), (17_000, 20_000)]);
}

#[tokio::test]
async fn failed_read_aborts_fetch() {
    let mock = MockChain::new();
    let chain = chain("ethereum", &[]);
    let err = SyncError::rpc("eth_call", "upstream timeout");
    mock.fail_reads_with(err.clone());

    let got = fetch_actual_guard_state(&mock, &chain, &keys_on(1, 3))
        .await
        .unwrap_err();
    assert_eq!(got, err);
}

//! Scenario: tag files verified against an exported snapshot
//!
//! # Invariants under test
//! 1. A snapshot that lists exactly the configured facts verifies clean,
//!    regardless of address case in the snapshot.
//! 2. Every missing and extra canonical record is reported, not just the first.
//! 3. A mismatch converts into `SnapshotMismatch` carrying both counts.

use std::fs;

use wls_config::{compare, load_all, load_snapshot, RepoLayout};
use wls_schemas::SyncError;

const TAG: &str = r#"
slug: core
guard:
  allow:
    - target: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
      selectors:
        - selector: "0x12345678"
          state: "ON"
module:
  block:
    - target: "0xcccccccccccccccccccccccccccccccccccccccc"
      selectors: ["0xdeadbeef"]
"#;

fn layout_with(snapshot: &str) -> (tempfile::TempDir, RepoLayout) {
    let tmp = tempfile::tempdir().unwrap();
    let layout = RepoLayout::at(tmp.path());
    fs::create_dir_all(layout.tags_dir()).unwrap();
    fs::write(layout.chains_path(), "chains: []\n").unwrap();
    fs::write(layout.tags_dir().join("core.yaml"), TAG).unwrap();
    let snap = layout.default_snapshot_path();
    fs::create_dir_all(snap.parent().unwrap()).unwrap();
    fs::write(&snap, snapshot).unwrap();
    (tmp, layout)
}

#[test]
fn exact_snapshot_verifies_clean() {
    let snapshot = concat!(
        r#"{"tag":"core","kind":"guard.protocol","target":"0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA","selector":"0x12345678","state":"ON"}"#,
        "\n",
        r#"{"tag":"core","kind":"module.protocol","target":"0xcccccccccccccccccccccccccccccccccccccccc","selector":"0xDEADBEEF"}"#,
        "\n"
    );
    let (_tmp, layout) = layout_with(snapshot);

    let snap = load_snapshot(&layout.default_snapshot_path()).unwrap();
    let tags = load_all(&layout.tags_dir()).unwrap();
    let cmp = compare(&snap, &tags);
    assert!(cmp.is_clean(), "{cmp:?}");
}

#[test]
fn all_differences_are_reported() {
    let snapshot = concat!(
        r#"{"tag":"core","kind":"guard.protocol","target":"0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa","selector":"0x12345678","state":"PERMANENTLY_ON"}"#,
        "\n",
        r#"{"tag":"core","kind":"module.token","token":"0xdddddddddddddddddddddddddddddddddddddddd","blockTransfer":"true","blockApprove":"false"}"#,
        "\n"
    );
    let (_tmp, layout) = layout_with(snapshot);

    let snap = load_snapshot(&layout.default_snapshot_path()).unwrap();
    let tags = load_all(&layout.tags_dir()).unwrap();
    let cmp = compare(&snap, &tags);

    assert_eq!(cmp.missing.len(), 2);
    assert_eq!(cmp.extra.len(), 2);
    assert!(cmp
        .extra
        .contains(&"core|module.call|0xcccccccccccccccccccccccccccccccccccccccc|0xdeadbeef".to_string()));
    assert!(cmp.missing.contains(
        &"core|module.token|0xdddddddddddddddddddddddddddddddddddddddd|blockTransfer:true|blockApprove:false"
            .to_string()
    ));

    assert_eq!(
        cmp.into_result().unwrap_err(),
        SyncError::SnapshotMismatch {
            missing: 2,
            extra: 2
        }
    );
}

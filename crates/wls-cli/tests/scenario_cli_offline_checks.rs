//! Scenario: `wls` commands that must decide before any network traffic
//!
//! # Invariants under test
//! 1. `config-hash` prints the content hash and tag count.
//! 2. `verify` exits non-zero and lists every differing record on mismatch.
//! 3. A chain whose RPC env var is unset aborts the run and names the var,
//!    not a URL.
//! 4. `sync` with an unknown tag or a tag no selected chain lists fails.
//! 5. `--chain` naming an unregistered chain fails.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use wls_testkit::TempRepo;

const CHAINS: &str = r#"
chains:
  - slug: local
    chainId: 1
    rpcEnv: WLS_TEST_RPC_OFFLINE
    guard: "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
    module: "0xdddddddddddddddddddddddddddddddddddddddd"
    adminSafe: "0xcccccccccccccccccccccccccccccccccccccccc"
    tags: ["core"]
"#;

const CORE: &str = r#"
slug: core
guard:
  allow:
    - target: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
      selectors:
        - selector: "0x12345678"
          state: "ON"
"#;

const SPARE: &str = r#"
slug: spare
guard:
  tokens:
    - token: "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"
      transfer: "ON"
      approve: "OFF"
"#;

fn repo() -> anyhow::Result<TempRepo> {
    let repo = TempRepo::new(CHAINS)?;
    repo.add_tag("core.yaml", CORE)?;
    repo.add_tag("spare.yaml", SPARE)?;
    Ok(repo)
}

fn wls(repo: &TempRepo) -> anyhow::Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin("wls")?;
    cmd.current_dir(repo.root())
        .env_remove("WLS_TEST_RPC_OFFLINE")
        .env("RUST_LOG", "warn");
    Ok(cmd)
}

#[test]
fn config_hash_prints_hash_and_count() -> anyhow::Result<()> {
    let repo = repo()?;
    wls(&repo)?
        .arg("config-hash")
        .assert()
        .success()
        .stdout(predicate::str::contains("config_hash="))
        .stdout(predicate::str::contains("tags=2"));
    Ok(())
}

#[test]
fn verify_mismatch_lists_records_and_fails() -> anyhow::Result<()> {
    let repo = repo()?;
    repo.write(
        "tmp/allowlist_snapshot.jsonl",
        concat!(
            r#"{"tag":"core","kind":"guard.protocol","target":"0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa","selector":"0x12345678","state":"ON"}"#,
            "\n",
        ),
    )?;

    wls(&repo)?
        .arg("verify")
        .assert()
        .failure()
        .stdout(predicate::str::contains("not in snapshot: spare|guard.token|0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb|transfer:ON|approve:OFF"))
        .stderr(predicate::str::contains("0 missing, 1 extra"));
    Ok(())
}

#[test]
fn verify_matching_snapshot_succeeds() -> anyhow::Result<()> {
    let repo = TempRepo::new(CHAINS)?;
    repo.add_tag("core.yaml", CORE)?;
    let snap = repo.write(
        "exports/snap.jsonl",
        concat!(
            r#"{"tag":"core","kind":"guard.protocol","target":"0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA","selector":"0x12345678","state":"ON"}"#,
            "\n",
        ),
    )?;

    wls(&repo)?
        .args(["verify", "--snapshot"])
        .arg(&snap)
        .assert()
        .success()
        .stdout(predicate::str::contains("allowlists match snapshot (1 records)"));
    Ok(())
}

#[test]
fn missing_rpc_env_names_the_variable() -> anyhow::Result<()> {
    let repo = repo()?;
    wls(&repo)?
        .arg("diff")
        .assert()
        .failure()
        .stderr(predicate::str::contains("WLS_TEST_RPC_OFFLINE"))
        .stdout(predicate::str::contains("Chain local").not());

    wls(&repo)?
        .args(["sync", "--tag", "core", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("WLS_TEST_RPC_OFFLINE"));
    Ok(())
}

#[test]
fn sync_rejects_unknown_or_unlisted_tags() -> anyhow::Result<()> {
    let repo = repo()?;
    wls(&repo)?
        .args(["sync", "--tag", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no allowlist found for tag 'nope'"));

    wls(&repo)?
        .args(["sync", "--tag", "spare"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not listed on any selected chain"));
    Ok(())
}

#[test]
fn unknown_chain_filter_fails() -> anyhow::Result<()> {
    let repo = repo()?;
    wls(&repo)?
        .args(["diff", "--chain", "local,mars"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown chain 'mars'"));
    Ok(())
}

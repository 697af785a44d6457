//! `wls verify`

use std::path::PathBuf;

use anyhow::Result;
use tracing::warn;
use wls_config::{compare, load_snapshot, RepoLayout};
use wls_schemas::NormalizedAllowlist;

use super::load_index;

pub fn run(layout: &RepoLayout, snapshot: Option<PathBuf>) -> Result<()> {
    let path = snapshot.unwrap_or_else(|| layout.default_snapshot_path());
    let records = load_snapshot(&path)?;
    let index = load_index(layout)?;
    let allowlists: Vec<NormalizedAllowlist> = index.iter().cloned().collect();

    let result = compare(&records, &allowlists);
    for line in &result.missing {
        println!("missing from tag files: {line}");
    }
    for line in &result.extra {
        println!("not in snapshot: {line}");
    }
    if !result.is_clean() {
        warn!(
            snapshot = %path.display(),
            missing = result.missing.len(),
            extra = result.extra.len(),
            "snapshot mismatch"
        );
    }
    result.into_result()?;

    println!("✓ allowlists match snapshot ({} records)", records.len());
    Ok(())
}

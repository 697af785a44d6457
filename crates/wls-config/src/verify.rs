//! Historical snapshot verification.
//!
//! A snapshot is JSON Lines, one record per configuration fact, exported from
//! the previous configuration source. Both the snapshot and the tag files are
//! flattened into `FlattenedRecord`s, rendered as canonical lines and compared
//! as sets.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use wls_schemas::{Address, FlattenedRecord, NormalizedAllowlist, PermissionState, Selector, SyncError};

use crate::read_file;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRecord {
    tag: String,
    kind: String,
    target: Option<String>,
    token: Option<String>,
    selector: Option<String>,
    state: Option<String>,
    transfer_state: Option<String>,
    approve_state: Option<String>,
    block_transfer: Option<Value>,
    block_approve: Option<Value>,
}

/// Result of comparing snapshot lines against tag-file lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotComparison {
    /// In the snapshot, absent from the tag files.
    pub missing: Vec<String>,
    /// In the tag files, absent from the snapshot.
    pub extra: Vec<String>,
}

impl SnapshotComparison {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }

    pub fn into_result(self) -> Result<(), SyncError> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(SyncError::SnapshotMismatch {
                missing: self.missing.len(),
                extra: self.extra.len(),
            })
        }
    }
}

fn required<'a>(ctx: &str, field: &str, v: &'a Option<String>) -> Result<&'a str, SyncError> {
    v.as_deref()
        .ok_or_else(|| SyncError::validation(ctx, field, "missing"))
}

fn snap_address(ctx: &str, field: &str, v: &Option<String>) -> Result<Address, SyncError> {
    Address::parse(required(ctx, field, v)?.trim())
        .map_err(|e| SyncError::validation(ctx, field, e.to_string()))
}

fn snap_selector(ctx: &str, v: &Option<String>) -> Result<Selector, SyncError> {
    Selector::parse(required(ctx, "selector", v)?.trim())
        .map_err(|e| SyncError::validation(ctx, "selector", e.to_string()))
}

/// Snapshot states are matched ignoring case.
fn snap_state(ctx: &str, field: &str, v: &Option<String>) -> Result<PermissionState, SyncError> {
    let raw = required(ctx, field, v)?;
    PermissionState::parse(&raw.trim().to_ascii_uppercase())
        .ok_or_else(|| SyncError::validation(ctx, field, format!("unknown state '{raw}'")))
}

/// `true` and `"true"` are true; anything else, including absence, is false.
fn snap_flag(v: &Option<Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

fn normalize_record(line_no: usize, rec: SnapshotRecord) -> Result<FlattenedRecord, SyncError> {
    let ctx = format!("snapshot line {line_no} ({})", rec.tag);
    let slug = rec.tag.clone();
    match rec.kind.as_str() {
        "guard.protocol" => Ok(FlattenedRecord::GuardCall {
            slug,
            target: snap_address(&ctx, "target", &rec.target)?,
            selector: snap_selector(&ctx, &rec.selector)?,
            state: snap_state(&ctx, "state", &rec.state)?,
        }),
        "guard.token" => Ok(FlattenedRecord::GuardToken {
            slug,
            token: snap_address(&ctx, "token", &rec.token)?,
            transfer: snap_state(&ctx, "transferState", &rec.transfer_state)?,
            approve: snap_state(&ctx, "approveState", &rec.approve_state)?,
        }),
        "module.protocol" => Ok(FlattenedRecord::ModuleCall {
            slug,
            target: snap_address(&ctx, "target", &rec.target)?,
            selector: snap_selector(&ctx, &rec.selector)?,
        }),
        "module.token" => Ok(FlattenedRecord::ModuleToken {
            slug,
            token: snap_address(&ctx, "token", &rec.token)?,
            block_transfer: snap_flag(&rec.block_transfer),
            block_approve: snap_flag(&rec.block_approve),
        }),
        other => Err(SyncError::validation(
            ctx,
            "kind",
            format!("unknown snapshot kind '{other}'"),
        )),
    }
}

/// Parse JSON Lines text. Blank lines are skipped.
pub fn parse_snapshot_str(text: &str, source: &str) -> Result<Vec<FlattenedRecord>, SyncError> {
    let mut out = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let rec: SnapshotRecord = serde_json::from_str(line).map_err(|e| SyncError::Parse {
            path: format!("{source}:{}", i + 1),
            message: e.to_string(),
        })?;
        out.push(normalize_record(i + 1, rec)?);
    }
    Ok(out)
}

pub fn load_snapshot(path: &Path) -> Result<Vec<FlattenedRecord>, SyncError> {
    let raw = read_file(path)?;
    parse_snapshot_str(&raw, &path.display().to_string())
}

pub fn compare(snapshot: &[FlattenedRecord], allowlists: &[NormalizedAllowlist]) -> SnapshotComparison {
    let expected: BTreeSet<String> = snapshot.iter().map(|r| r.canonical()).collect();
    let actual: BTreeSet<String> = allowlists
        .iter()
        .flat_map(|a| a.flatten())
        .map(|r| r.canonical())
        .collect();

    SnapshotComparison {
        missing: expected.difference(&actual).cloned().collect(),
        extra: actual.difference(&expected).cloned().collect(),
    }
}

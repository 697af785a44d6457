//! Safe transaction-builder batch files, one per non-empty plan.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use wls_schemas::Address;
use wls_sync::Plan;

pub const BATCH_VERSION: &str = "1.0";
pub const BATCH_NAME: &str = "Transactions Batch";
pub const TX_BUILDER_VERSION: &str = "1.10.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeBatch {
    pub version: String,
    /// Decimal string, as the transaction builder expects.
    pub chain_id: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub meta: BatchMeta,
    pub transactions: Vec<BatchTransaction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMeta {
    pub name: String,
    pub description: String,
    pub tx_builder_version: String,
    pub created_from_safe_address: Address,
    pub created_from_owner_address: String,
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTransaction {
    pub to: Address,
    pub value: String,
    pub data: String,
}

impl SafeBatch {
    pub fn from_plan(plan: &Plan, created_at: DateTime<Utc>) -> Self {
        Self {
            version: BATCH_VERSION.to_string(),
            chain_id: plan.chain.chain_id.to_string(),
            created_at: created_at.timestamp_millis(),
            meta: BatchMeta {
                name: BATCH_NAME.to_string(),
                description: format!("{} ({})", plan.tag, plan.chain.slug),
                tx_builder_version: TX_BUILDER_VERSION.to_string(),
                created_from_safe_address: plan.chain.admin_safe,
                created_from_owner_address: String::new(),
                checksum: None,
            },
            transactions: plan
                .actions
                .iter()
                .map(|a| BatchTransaction {
                    to: a.to,
                    value: "0x0".to_string(),
                    data: a.data_hex(),
                })
                .collect(),
        }
    }
}

/// `<tag>-<chain>.json`
pub fn batch_file_name(plan: &Plan) -> String {
    format!("{}-{}.json", plan.tag, plan.chain.slug)
}

/// Write the batch for `plan` under `out_dir`. Empty plans write nothing and
/// return `None`.
pub fn write_plan_batch(
    out_dir: &Path,
    plan: &Plan,
    created_at: DateTime<Utc>,
) -> Result<Option<PathBuf>> {
    if plan.is_empty() {
        info!(chain = %plan.chain.slug, tag = %plan.tag, "no actions; batch file skipped");
        return Ok(None);
    }

    fs::create_dir_all(out_dir)
        .with_context(|| format!("create batch dir failed: {}", out_dir.display()))?;

    let batch = SafeBatch::from_plan(plan, created_at);
    let path = out_dir.join(batch_file_name(plan));
    let json = serde_json::to_string_pretty(&batch).context("serialize batch failed")?;
    fs::write(&path, format!("{json}\n"))
        .with_context(|| format!("write batch failed: {}", path.display()))?;

    info!(
        chain = %plan.chain.slug,
        tag = %plan.tag,
        actions = plan.actions.len(),
        path = %path.display(),
        "batch written"
    );
    Ok(Some(path))
}

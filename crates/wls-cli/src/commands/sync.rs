//! `wls sync`

use std::path::Path;

use anyhow::{bail, Result};
use chrono::Utc;
use tracing::info;
use wls_artifacts::write_plan_batch;
use wls_config::RepoLayout;
use wls_schemas::SyncError;
use wls_sync::{build_plan, Plan};

use super::{connect, load_index, load_selected_chains, resolve_all};

pub async fn run(
    layout: &RepoLayout,
    tag: &str,
    chain_filter: Option<&str>,
    out_dir: &Path,
    dry_run: bool,
) -> Result<()> {
    let index = load_index(layout)?;
    let allowlist = index
        .get_ignore_case(tag)
        .ok_or_else(|| SyncError::UnknownTag {
            tag: tag.to_string(),
            chain: None,
        })?;

    let chains: Vec<_> = load_selected_chains(layout, chain_filter)?
        .into_iter()
        .filter(|c| c.has_tag(&allowlist.slug))
        .collect();
    if chains.is_empty() {
        bail!("tag '{}' is not listed on any selected chain", allowlist.slug);
    }
    let rpcs = resolve_all(&chains)?;
    info!(tag = %allowlist.slug, chains = chains.len(), dry_run, "sync start");

    let out = if out_dir.is_absolute() {
        out_dir.to_path_buf()
    } else {
        layout.root().join(out_dir)
    };

    // No batch is written until every chain's plan has been built.
    let mut plans: Vec<Plan> = Vec::with_capacity(chains.len());
    for (chain, rpc) in chains.iter().zip(&rpcs) {
        let reader = connect(chain, rpc).await?;
        plans.push(build_plan(chain, &allowlist.slug, allowlist, &reader).await?);
    }

    for plan in &plans {
        if dry_run {
            print!("{}", render_plan(plan));
            continue;
        }
        match write_plan_batch(&out, plan, Utc::now())? {
            Some(path) => println!("Wrote {} ({} actions)", path.display(), plan.actions.len()),
            None => println!("No actions for {}; skipping file.", plan.chain.slug),
        }
    }
    Ok(())
}

pub fn render_plan(plan: &Plan) -> String {
    let mut out = format!("Chain {} (chainId {})\n", plan.chain.slug, plan.chain.chain_id);
    if plan.is_empty() {
        out.push_str("  nothing to do\n");
    }
    for a in &plan.actions {
        out.push_str(&format!("  - {}\n", a.description));
    }
    out
}

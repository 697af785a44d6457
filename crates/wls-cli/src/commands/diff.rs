//! `wls diff`

use anyhow::Result;
use serde::Serialize;
use tracing::info;
use wls_config::RepoLayout;
use wls_reconcile::{compile_desired, ChainDiff, CompiledDesired};
use wls_schemas::{GuardDiffEntry, ModuleDiffEntry};
use wls_sync::diff_chain;

use super::{connect, load_index, load_selected_chains, resolve_all};

#[derive(Debug, Serialize)]
pub struct ChainReport {
    pub chain: String,
    pub chain_id: u64,
    #[serde(flatten)]
    pub diff: ChainDiff,
}

/// Returns `true` when every selected chain is in sync.
pub async fn run(layout: &RepoLayout, chain_filter: Option<&str>, json: bool) -> Result<bool> {
    let index = load_index(layout)?;
    let chains = load_selected_chains(layout, chain_filter)?;

    // Structural checks first: tag references and env vars.
    let desired: Vec<CompiledDesired> = chains
        .iter()
        .map(|c| compile_desired(c, &index))
        .collect::<Result<_, _>>()?;
    let rpcs = resolve_all(&chains)?;
    info!(config_hash = %index.content_hash()?, chains = chains.len(), "diff start");

    let mut reports = Vec::with_capacity(chains.len());
    for ((chain, want), rpc) in chains.iter().zip(&desired).zip(&rpcs) {
        let reader = connect(chain, rpc).await?;
        let diff = diff_chain(&reader, chain, want).await?;
        reports.push(ChainReport {
            chain: chain.slug.clone(),
            chain_id: chain.chain_id,
            diff,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print!("{}", render(&reports));
    }
    Ok(reports.iter().all(|r| r.diff.is_clean()))
}

pub fn format_guard(entry: &GuardDiffEntry) -> String {
    let base = entry.label();
    match (entry.desired, entry.actual) {
        (Some(d), Some(a)) if d != a => format!("{base} (desired={d}, actual={a})"),
        (Some(d), None) => format!("{base} (desired={d}, actual=OFF)"),
        (None, Some(a)) => format!("{base} (actual={a})"),
        _ => base,
    }
}

pub fn format_module(entry: &ModuleDiffEntry) -> String {
    entry.label()
}

fn section<T>(out: &mut String, title: &str, entries: &[T], fmt: impl Fn(&T) -> String) {
    if entries.is_empty() {
        return;
    }
    out.push_str(&format!("  {title}:\n"));
    for e in entries {
        out.push_str(&format!("    - {}\n", fmt(e)));
    }
}

pub fn render(reports: &[ChainReport]) -> String {
    let mut out = String::new();
    for r in reports {
        out.push_str(&format!("Chain {} (chainId {})\n", r.chain, r.chain_id));
        if r.diff.is_clean() {
            out.push_str("  ✓ No differences\n");
            continue;
        }
        section(&mut out, "Guard missing", &r.diff.guard_missing, format_guard);
        section(&mut out, "Guard mismatched", &r.diff.guard_mismatched, format_guard);
        section(&mut out, "Guard extra", &r.diff.guard_extra, format_guard);
        section(&mut out, "Module missing", &r.diff.module_missing, format_module);
        section(&mut out, "Module extra", &r.diff.module_extra, format_module);
    }
    out
}

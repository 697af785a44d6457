//! `wls state`: replayed guard state as CSV on stdout.

use anyhow::Result;
use wls_config::RepoLayout;
use wls_schemas::GuardStateMap;
use wls_sync::replay_guard_state;

use super::{connect, load_selected_chains, resolve_all};

pub async fn run(layout: &RepoLayout, chain: &str) -> Result<()> {
    let chains = load_selected_chains(layout, Some(chain))?;
    let rpcs = resolve_all(&chains)?;
    for (chain, rpc) in chains.iter().zip(&rpcs) {
        let reader = connect(chain, rpc).await?;
        let state = replay_guard_state(&reader, chain).await?;
        print!("{}", render_csv(&state));
    }
    Ok(())
}

/// Enabled keys only; a key switched back `OFF` is not printed.
pub fn render_csv(state: &GuardStateMap) -> String {
    let mut out = String::from("target,selector,state\n");
    for (key, info) in state.iter() {
        if info.state.is_enabled() {
            out.push_str(&format!("{},{},{}\n", key.target, key.selector, info.state));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wls_schemas::{GuardStateInfo, PermissionState};
    use wls_testkit::fixtures::key;

    #[test]
    fn csv_skips_disabled_keys() {
        let mut state = GuardStateMap::new();
        state.insert(key(0x01, 0x01), GuardStateInfo::new(PermissionState::On));
        state.insert(key(0x02, 0x02), GuardStateInfo::new(PermissionState::Off));
        state.insert(key(0x03, 0x03), GuardStateInfo::new(PermissionState::PermanentlyOn));

        let csv = render_csv(&state);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "target,selector,state");
        assert!(lines[1].ends_with(",0x01010101,ON"));
        assert!(lines[2].ends_with(",0x03030303,PERMANENTLY_ON"));
    }
}

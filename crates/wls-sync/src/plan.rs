//! Reconciliation planner for one tag on one chain.

use tracing::{debug, info};
use wls_chain::{abi, ChainReader};
use wls_config::ChainConfig;
use wls_reconcile::check_transition;
use wls_schemas::{
    selector_label, Address, CallKey, NormalizedAllowlist, PermissionState, Selector, SyncError,
    APPROVE_SELECTOR, TRANSFER_SELECTOR,
};

use crate::fetch::{fallback_signature, read_guard_state};
use crate::window::windowed;
use crate::READ_BATCH_SIZE;

/// One encoded transaction for the admin safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub to: Address,
    pub data: Vec<u8>,
    /// Shown by `--dry-run`.
    pub description: String,
}

impl Action {
    pub fn data_hex(&self) -> String {
        abi::to_hex(&self.data)
    }
}

#[derive(Debug, Clone)]
pub struct Plan {
    pub chain: ChainConfig,
    pub tag: String,
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

struct GuardTarget {
    key: CallKey,
    state: PermissionState,
    label: String,
}

struct ModuleTarget {
    key: CallKey,
    label: String,
}

fn token_half_label(token: Address, selector: Selector) -> String {
    if selector == TRANSFER_SELECTOR {
        format!("{token}.transfer")
    } else if selector == APPROVE_SELECTOR {
        format!("{token}.approve")
    } else {
        format!("{token}.{selector}")
    }
}

fn guard_targets(allowlist: &NormalizedAllowlist) -> Vec<GuardTarget> {
    let calls = allowlist.guard.calls.iter().map(|c| GuardTarget {
        key: c.key(),
        state: c.state,
        label: selector_label(c.target, c.selector, c.signature.as_deref()),
    });
    let tokens = allowlist.guard.tokens.iter().flat_map(|t| {
        t.halves().into_iter().map(|(key, state)| GuardTarget {
            key,
            state,
            label: token_half_label(key.target, key.selector),
        })
    });
    calls.chain(tokens).collect()
}

fn module_targets(allowlist: &NormalizedAllowlist) -> Vec<ModuleTarget> {
    let blocks = allowlist.module.blocks.iter().map(|b| {
        let key = b.key();
        ModuleTarget {
            key,
            label: selector_label(key.target, key.selector, fallback_signature(key).as_deref()),
        }
    });
    let tokens = allowlist.module.tokens.iter().flat_map(|t| {
        t.blocked_keys().into_iter().map(|key| ModuleTarget {
            key,
            label: token_half_label(key.target, key.selector),
        })
    });
    blocks.chain(tokens).collect()
}

/// Actions that bring `chain` in line with `allowlist`, using live reads.
///
/// Every guard entry of the tag is compared, token halves included even
/// when their desired state is `OFF`. Module entries only ever add blocks.
/// A transition refused by the ratchet aborts the plan.
pub async fn build_plan(
    chain: &ChainConfig,
    tag: &str,
    allowlist: &NormalizedAllowlist,
    reader: &dyn ChainReader,
) -> Result<Plan, SyncError> {
    let mut actions = Vec::new();

    let guard: Vec<GuardTarget> = guard_targets(allowlist)
        .into_iter()
        .filter(|g| {
            let keep = !g.key.is_sentinel();
            if !keep {
                debug!(chain = %chain.slug, tag, key = %g.key, "skipping sentinel guard key");
            }
            keep
        })
        .collect();
    let current = windowed(&guard, READ_BATCH_SIZE, "plan_guard_reads", |g| {
        let key = g.key;
        async move { read_guard_state(reader, chain, key).await }
    })
    .await?;

    for (want, have) in guard.iter().zip(current) {
        if have == want.state {
            continue;
        }
        check_transition(&chain.slug, want.key, have, want.state)?;
        actions.push(Action {
            to: chain.guard,
            data: abi::encode_set_call_allowed(want.key, want.state),
            description: format!("guard {} -> {}", want.label, want.state),
        });
    }

    let module: Vec<ModuleTarget> = module_targets(allowlist)
        .into_iter()
        .filter(|m| !m.key.is_sentinel())
        .collect();
    let blocked = windowed(&module, READ_BATCH_SIZE, "plan_module_reads", |m| {
        let key = m.key;
        async move { reader.is_module_call_blocked(chain.module, key).await }
    })
    .await?;

    for (want, is_blocked) in module.iter().zip(blocked) {
        if is_blocked {
            continue;
        }
        actions.push(Action {
            to: chain.module,
            data: abi::encode_add_blocked_module_call(want.key),
            description: format!("module block {}", want.label),
        });
    }

    info!(chain = %chain.slug, tag, actions = actions.len(), "plan built");
    Ok(Plan {
        chain: chain.clone(),
        tag: tag.to_string(),
        actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wls_schemas::{GuardToken, ModuleBlock, ModuleToken};

    fn a(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    #[test]
    fn token_halves_use_function_names() {
        let mut t = NormalizedAllowlist::empty("t");
        t.guard.tokens.push(GuardToken {
            token: a(1),
            transfer: PermissionState::On,
            approve: PermissionState::Off,
        });
        let targets = guard_targets(&t);
        assert_eq!(targets.len(), 2);
        assert!(targets[0].label.ends_with(".transfer"));
        assert_eq!(targets[1].state, PermissionState::Off);
        assert!(targets[1].label.ends_with(".approve"));
    }

    #[test]
    fn module_targets_only_flagged_halves() {
        let mut t = NormalizedAllowlist::empty("t");
        t.module.tokens.push(ModuleToken {
            token: a(2),
            transfer: false,
            approve: true,
        });
        t.module.blocks.push(ModuleBlock {
            target: a(3),
            selector: Selector::from_bytes([1, 2, 3, 4]),
        });
        let labels: Vec<String> = module_targets(&t).into_iter().map(|m| m.label).collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1], format!("{}.approve", a(2)));
    }
}

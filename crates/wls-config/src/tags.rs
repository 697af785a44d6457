//! Tag file loader.
//!
//! YAML is read into the `Raw*` structs below, then every field is validated
//! and canonicalized into `NormalizedAllowlist`. One bad field aborts the load
//! with `SyncError::Validation { tag, field, detail }`, where `field` is a
//! path such as `guard.allow[0].selectors[1].selector`.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;
use wls_schemas::{
    Address, GuardCall, GuardSection, GuardToken, ModuleBlock, ModuleSection,
    ModuleToken, NormalizedAllowlist, PermissionState, Selector, SyncError,
};

use crate::index::AllowlistIndex;
use crate::read_file;

// ---------------------------------------------------------------------------
// Raw file shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAllowlistFile {
    slug: Option<String>,
    guard: Option<RawGuard>,
    module: Option<RawModule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGuard {
    allow: Option<Vec<RawGuardAllow>>,
    tokens: Option<Vec<RawGuardToken>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGuardAllow {
    target: String,
    selectors: Option<Vec<RawGuardSelector>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGuardSelector {
    selector: String,
    state: String,
    signature: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGuardToken {
    token: String,
    transfer: String,
    approve: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModule {
    block: Option<Vec<RawModuleBlock>>,
    tokens: Option<Vec<RawModuleToken>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModuleBlock {
    target: String,
    selectors: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModuleToken {
    token: String,
    #[serde(default)]
    transfer: bool,
    #[serde(default)]
    approve: bool,
}

// ---------------------------------------------------------------------------
// Field validators
// ---------------------------------------------------------------------------

fn address(tag: &str, field: &str, raw: &str) -> Result<Address, SyncError> {
    Address::parse(raw.trim()).map_err(|e| SyncError::validation(tag, field, e.to_string()))
}

fn selector(tag: &str, field: &str, raw: &str) -> Result<Selector, SyncError> {
    Selector::parse(raw.trim()).map_err(|e| SyncError::validation(tag, field, e.to_string()))
}

fn state(tag: &str, field: &str, raw: &str) -> Result<PermissionState, SyncError> {
    PermissionState::parse(raw.trim()).ok_or_else(|| {
        SyncError::validation(
            tag,
            field,
            format!("unknown state '{raw}' (expected OFF, ON or PERMANENTLY_ON)"),
        )
    })
}

/// A declared signature must hash to the selector it annotates.
fn signature(
    tag: &str,
    field: &str,
    raw: Option<String>,
    sel: Selector,
) -> Result<Option<String>, SyncError> {
    let Some(sig) = raw else {
        return Ok(None);
    };
    let sig = sig.trim().to_string();
    if sig.is_empty() {
        return Ok(None);
    }
    let derived = Selector::from_signature(&sig);
    if derived != sel {
        return Err(SyncError::validation(
            tag,
            field,
            format!("signature '{sig}' hashes to {derived}, not {sel}"),
        ));
    }
    Ok(Some(sig))
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

fn normalize(raw: RawAllowlistFile, source: &str) -> Result<NormalizedAllowlist, SyncError> {
    let slug = raw.slug.map(|s| s.trim().to_string()).unwrap_or_default();
    if slug.is_empty() {
        return Err(SyncError::validation(source, "slug", "missing or empty"));
    }
    let tag = slug.as_str();

    let mut guard = GuardSection::default();
    let mut module = ModuleSection::default();

    if let Some(g) = raw.guard {
        for (i, entry) in g.allow.unwrap_or_default().into_iter().enumerate() {
            let base = format!("guard.allow[{i}]");
            let target = address(tag, &format!("{base}.target"), &entry.target)?;
            for (j, s) in entry.selectors.unwrap_or_default().into_iter().enumerate() {
                let field = format!("{base}.selectors[{j}]");
                let sel = selector(tag, &format!("{field}.selector"), &s.selector)?;
                let st = state(tag, &format!("{field}.state"), &s.state)?;
                let sig = signature(tag, &format!("{field}.signature"), s.signature, sel)?;
                guard.calls.push(GuardCall {
                    target,
                    selector: sel,
                    state: st,
                    signature: sig,
                });
            }
        }

        for (i, entry) in g.tokens.unwrap_or_default().into_iter().enumerate() {
            let base = format!("guard.tokens[{i}]");
            guard.tokens.push(GuardToken {
                token: address(tag, &format!("{base}.token"), &entry.token)?,
                transfer: state(tag, &format!("{base}.transfer"), &entry.transfer)?,
                approve: state(tag, &format!("{base}.approve"), &entry.approve)?,
            });
        }
    }

    if let Some(m) = raw.module {
        for (i, entry) in m.block.unwrap_or_default().into_iter().enumerate() {
            let base = format!("module.block[{i}]");
            let target = address(tag, &format!("{base}.target"), &entry.target)?;
            for (j, s) in entry.selectors.unwrap_or_default().iter().enumerate() {
                module.blocks.push(ModuleBlock {
                    target,
                    selector: selector(tag, &format!("{base}.selectors[{j}]"), s)?,
                });
            }
        }

        for (i, entry) in m.tokens.unwrap_or_default().into_iter().enumerate() {
            module.tokens.push(ModuleToken {
                token: address(tag, &format!("module.tokens[{i}].token"), &entry.token)?,
                transfer: entry.transfer,
                approve: entry.approve,
            });
        }
    }

    Ok(NormalizedAllowlist {
        slug,
        guard,
        module,
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// A document that is valid YAML but has the wrong shape (missing or unknown
/// keys, wrong types) is a `Validation` error against its slug, or against
/// `source` when the slug cannot be read.
fn shape_error(doc: &serde_yaml::Value, source: &str, err: serde_yaml::Error) -> SyncError {
    let tag = doc
        .get("slug")
        .and_then(serde_yaml::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(source);
    let message = err.to_string();
    let (field, detail) = match message.split_once(": ") {
        Some((path, rest)) if !path.is_empty() && !path.contains(' ') => (path, rest),
        _ => ("document", message.as_str()),
    };
    SyncError::validation(tag, field, format!("{detail} ({source})"))
}

/// Parse and validate one tag document. `source` names the file in errors.
pub fn parse_allowlist_str(yaml: &str, source: &str) -> Result<NormalizedAllowlist, SyncError> {
    let doc: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(|e| SyncError::Parse {
        path: source.to_string(),
        message: e.to_string(),
    })?;
    let raw: RawAllowlistFile =
        serde_yaml::from_str(yaml).map_err(|e| shape_error(&doc, source, e))?;
    normalize(raw, source)
}

pub fn load_allowlist_file(path: &Path) -> Result<NormalizedAllowlist, SyncError> {
    let raw = read_file(path)?;
    parse_allowlist_str(&raw, &path.display().to_string())
}

/// Every `*.yaml` / `*.yml` file in `dir`, in file-name order.
pub fn load_all(dir: &Path) -> Result<Vec<NormalizedAllowlist>, SyncError> {
    let io_err = |e: std::io::Error| SyncError::Io {
        path: dir.display().to_string(),
        message: e.to_string(),
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut out = Vec::with_capacity(files.len());
    for path in &files {
        let allowlist = load_allowlist_file(path)?;
        debug!(
            file = %path.display(),
            tag = %allowlist.slug,
            entries = allowlist.entry_count(),
            "loaded allowlist"
        );
        out.push(allowlist);
    }
    Ok(out)
}

/// Load `dir` and return the tag named `slug` (exact match).
pub fn load_allowlist(dir: &Path, slug: &str) -> Result<NormalizedAllowlist, SyncError> {
    let mut index = AllowlistIndex::build(load_all(dir)?)?;
    index.take(slug).ok_or_else(|| SyncError::UnknownTag {
        tag: slug.to_string(),
        chain: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wls_schemas::TRANSFER_SELECTOR;

    const FULL: &str = r#"
slug: lending-core
guard:
  allow:
    - target: "0xAAAAaaaaAAAAaaaaAAAAaaaaAAAAaaaaAAAAaaaa"
      selectors:
        - selector: "0xA9059CBB"
          state: "ON"
          signature: "transfer(address,uint256)"
        - selector: "0x12345678"
          state: "PERMANENTLY_ON"
  tokens:
    - token: "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"
      transfer: "ON"
      approve: "OFF"
module:
  block:
    - target: "0xcccccccccccccccccccccccccccccccccccccccc"
      selectors: ["0xdeadbeef"]
  tokens:
    - token: "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"
      transfer: true
"#;

    #[test]
    fn full_document_normalizes() {
        let a = parse_allowlist_str(FULL, "mem").unwrap();
        assert_eq!(a.slug, "lending-core");
        assert_eq!(a.guard.calls.len(), 2);
        assert_eq!(
            a.guard.calls[0].target.to_string(),
            "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
        );
        assert_eq!(a.guard.calls[0].selector, TRANSFER_SELECTOR);
        assert_eq!(
            a.guard.calls[0].signature.as_deref(),
            Some("transfer(address,uint256)")
        );
        assert_eq!(a.guard.calls[1].state, PermissionState::PermanentlyOn);
        assert_eq!(a.guard.tokens[0].approve, PermissionState::Off);
        assert_eq!(a.module.blocks[0].selector.to_string(), "0xdeadbeef");
        assert!(a.module.tokens[0].transfer);
        assert!(!a.module.tokens[0].approve);
    }

    #[test]
    fn slug_only_document_is_empty() {
        let a = parse_allowlist_str("slug: bare\n", "mem").unwrap();
        assert_eq!(a, NormalizedAllowlist::empty("bare"));
    }

    #[test]
    fn missing_slug_is_validation_error_named_by_source() {
        let err = parse_allowlist_str("guard: {}\n", "tags/x.yaml").unwrap_err();
        assert_eq!(
            err,
            SyncError::validation("tags/x.yaml", "slug", "missing or empty")
        );
    }

    #[test]
    fn bad_selector_reports_field_path() {
        let yaml = r#"
slug: t
guard:
  allow:
    - target: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
      selectors:
        - selector: "0x1234"
          state: "ON"
"#;
        match parse_allowlist_str(yaml, "mem").unwrap_err() {
            SyncError::Validation { tag, field, .. } => {
                assert_eq!(tag, "t");
                assert_eq!(field, "guard.allow[0].selectors[0].selector");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lowercase_state_is_rejected() {
        let yaml = r#"
slug: t
guard:
  tokens:
    - token: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
      transfer: "on"
      approve: "OFF"
"#;
        match parse_allowlist_str(yaml, "mem").unwrap_err() {
            SyncError::Validation { field, .. } => assert_eq!(field, "guard.tokens[0].transfer"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn signature_must_hash_to_selector() {
        let yaml = r#"
slug: t
guard:
  allow:
    - target: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
      selectors:
        - selector: "0x095ea7b3"
          state: "ON"
          signature: "transfer(address,uint256)"
"#;
        match parse_allowlist_str(yaml, "mem").unwrap_err() {
            SyncError::Validation { field, .. } => {
                assert_eq!(field, "guard.allow[0].selectors[0].signature")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_keys_are_validation_errors_against_the_tag() {
        match parse_allowlist_str("slug: t\nguards: {}\n", "tags/t.yaml").unwrap_err() {
            SyncError::Validation { tag, detail, .. } => {
                assert_eq!(tag, "t");
                assert!(detail.contains("guards"));
                assert!(detail.contains("tags/t.yaml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_state_is_validation_error() {
        let yaml = r#"
slug: lending
guard:
  allow:
    - target: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
      selectors:
        - selector: "0x12345678"
"#;
        match parse_allowlist_str(yaml, "tags/lending.yaml").unwrap_err() {
            SyncError::Validation { tag, detail, .. } => {
                assert_eq!(tag, "lending");
                assert!(detail.contains("state"));
                assert!(detail.contains("tags/lending.yaml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn shape_error_without_slug_names_the_file() {
        match parse_allowlist_str("guards: {}\n", "tags/x.yaml").unwrap_err() {
            SyncError::Validation { tag, .. } => assert_eq!(tag, "tags/x.yaml"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = parse_allowlist_str("slug: [unclosed\n", "mem").unwrap_err();
        assert!(matches!(err, SyncError::Parse { .. }));
    }
}

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use wls_schemas::{NormalizedAllowlist, SyncError};

/// Loaded tags keyed by slug.
///
/// Slugs are unique ignoring ASCII case, so a case-insensitive lookup can
/// never be ambiguous.
#[derive(Debug, Clone, Default)]
pub struct AllowlistIndex {
    by_slug: BTreeMap<String, NormalizedAllowlist>,
}

impl AllowlistIndex {
    /// Fails with `DuplicateTag` on the first repeated slug.
    pub fn build(allowlists: Vec<NormalizedAllowlist>) -> Result<Self, SyncError> {
        let mut by_slug: BTreeMap<String, NormalizedAllowlist> = BTreeMap::new();
        for a in allowlists {
            if by_slug.keys().any(|k| k.eq_ignore_ascii_case(&a.slug)) {
                return Err(SyncError::DuplicateTag { tag: a.slug });
            }
            by_slug.insert(a.slug.clone(), a);
        }
        Ok(Self { by_slug })
    }

    pub fn get(&self, slug: &str) -> Option<&NormalizedAllowlist> {
        self.by_slug.get(slug)
    }

    pub fn get_ignore_case(&self, slug: &str) -> Option<&NormalizedAllowlist> {
        self.get(slug).or_else(|| {
            self.by_slug
                .values()
                .find(|a| a.slug.eq_ignore_ascii_case(slug))
        })
    }

    pub fn take(&mut self, slug: &str) -> Option<NormalizedAllowlist> {
        self.by_slug.remove(slug)
    }

    pub fn len(&self) -> usize {
        self.by_slug.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slug.is_empty()
    }

    /// Tags in slug order.
    pub fn iter(&self) -> impl Iterator<Item = &NormalizedAllowlist> + '_ {
        self.by_slug.values()
    }

    /// SHA-256 hex over the canonical JSON of every tag in slug order.
    ///
    /// Independent of file names, key order inside files and address case.
    pub fn content_hash(&self) -> Result<String, SyncError> {
        let tags: Vec<&NormalizedAllowlist> = self.iter().collect();
        let canonical = serde_json::to_string(&tags).map_err(|e| SyncError::Parse {
            path: "<allowlist index>".to_string(),
            message: e.to_string(),
        })?;
        Ok(sha256_hex(canonical.as_bytes()))
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_slug_is_fatal() {
        let err = AllowlistIndex::build(vec![
            NormalizedAllowlist::empty("a"),
            NormalizedAllowlist::empty("b"),
            NormalizedAllowlist::empty("a"),
        ])
        .unwrap_err();
        assert_eq!(err, SyncError::DuplicateTag { tag: "a".to_string() });
    }

    #[test]
    fn duplicate_check_ignores_case() {
        let err = AllowlistIndex::build(vec![
            NormalizedAllowlist::empty("Lending"),
            NormalizedAllowlist::empty("lending"),
        ])
        .unwrap_err();
        assert!(matches!(err, SyncError::DuplicateTag { .. }));
    }

    #[test]
    fn lookup_exact_and_case_insensitive() {
        let idx = AllowlistIndex::build(vec![NormalizedAllowlist::empty("Lending")]).unwrap();
        assert!(idx.get("lending").is_none());
        assert_eq!(idx.get_ignore_case("LENDING").map(|a| a.slug.as_str()), Some("Lending"));
    }

    #[test]
    fn hash_ignores_input_order() {
        let a = AllowlistIndex::build(vec![
            NormalizedAllowlist::empty("x"),
            NormalizedAllowlist::empty("y"),
        ])
        .unwrap();
        let b = AllowlistIndex::build(vec![
            NormalizedAllowlist::empty("y"),
            NormalizedAllowlist::empty("x"),
        ])
        .unwrap();
        let h = a.content_hash().unwrap();
        assert_eq!(h, b.content_hash().unwrap());
        assert_eq!(h.len(), 64);
    }
}

//! Pack canonicalization and content hash.
//!
//! Canonicalization: sort object keys, order rules by `id`, order
//! obligations by stable index (declaration order already is the stable
//! index, so obligations are left as-is), and strip audit-only fields
//! (there are none on [`crate::pack::model::PolicyPack`] today — the
//! model carries no timestamp/authorship fields — but the stripping step
//! is kept explicit so a future field addition doesn't silently enter
//! the hash).

use sha2::{Digest, Sha256};

use super::model::PolicyPack;

/// Recursively sorts object keys of a `serde_json::Value`, leaving array
/// order untouched (arrays are already ordered by the model's own
/// serialization — rules in declared order, which callers are expected to
/// have already sorted by `id` before hashing).
fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut sorted = serde_json::Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(items) => serde_json::Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Produces the pack's canonical bytes: rules sorted by `id`, then
/// object keys sorted recursively, serialized with no whitespace.
pub fn canonical_bytes(pack: &PolicyPack) -> Vec<u8> {
    let mut pack = pack.clone();
    pack.rules.sort_by(|a, b| a.id.cmp(&b.id));
    let value = serde_json::to_value(&pack).expect("PolicyPack always serializes");
    let canonical = canonicalize(&value);
    serde_json::to_vec(&canonical).expect("canonicalized value always serializes")
}

/// 256-bit content hash, hex-encoded, identifying the exact rule set used
/// for an evaluation.
pub fn content_hash(pack: &PolicyPack) -> String {
    let bytes = canonical_bytes(pack);
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::model::*;

    fn sample_pack() -> PolicyPack {
        PolicyPack {
            id: "pack-1".to_string(),
            workspace_id: "ws".to_string(),
            metadata: PackMetadata {
                id: "pack-1".to_string(),
                name: "Sample".to_string(),
                version: "1.0.0".to_string(),
                status: PackStatus::Active,
                owners: vec![],
                labels: vec![],
                pack_mode: PackMode::Enforce,
            },
            scope: PackScope {
                scope_type: ScopeType::Workspace,
                service_ref: None,
                branches: PathFilter::default(),
                repos: PathFilter::default(),
                pr_events: vec!["opened".to_string()],
            },
            priority: 50,
            merge_strategy: MergeStrategy::MostRestrictive,
            defaults: PackDefaults::default(),
            rules: vec![],
        }
    }

    #[test]
    fn hash_is_deterministic_across_field_order() {
        let pack = sample_pack();
        let h1 = content_hash(&pack);
        let h2 = content_hash(&pack);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn hash_changes_with_content() {
        let mut pack = sample_pack();
        let h1 = content_hash(&pack);
        pack.priority = 51;
        let h2 = content_hash(&pack);
        assert_ne!(h1, h2);
    }

    #[test]
    fn rule_order_does_not_affect_hash() {
        let mut pack_a = sample_pack();
        let mut pack_b = sample_pack();
        let rule_x = Rule {
            id: "x".to_string(),
            name: "X".to_string(),
            enabled: true,
            trigger: Trigger::Always,
            when: None,
            requires: vec![],
            obligations: vec![],
            skip_if: None,
            exclude_paths: vec![],
        };
        let rule_y = Rule { id: "y".to_string(), ..rule_x.clone() };
        pack_a.rules = vec![rule_x.clone(), rule_y.clone()];
        pack_b.rules = vec![rule_y, rule_x];
        assert_eq!(content_hash(&pack_a), content_hash(&pack_b));
    }
}

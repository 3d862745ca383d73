//! Three-tier fingerprints, used by the
//! [`crate::dedup`] index and the drift deduplication contract.
//!
//! Grounded on the same canonicalize-then-hash idiom as
//! [`crate::pack::hash`]: sort object keys recursively, serialize with
//! no whitespace, SHA-256, hex-encode.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::drift::DriftType;

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

fn hash_value(value: &serde_json::Value) -> String {
    let canonical = canonicalize(value);
    let bytes = serde_json::to_vec(&canonical).expect("canonicalized value always serializes");
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Serialize)]
pub struct Fingerprints {
    pub strict: String,
    pub medium: String,
    pub broad: String,
}

/// All normalized content that feeds dedup/fingerprinting, before any
/// tier drops fields.
#[derive(Debug, Clone)]
pub struct FingerprintInputs {
    pub workspace_id: String,
    pub service: Option<String>,
    pub drift_type: DriftType,
    pub doc_id: String,
    pub domains: Vec<String>,
    pub key_tokens: Vec<String>,
    pub title: String,
    pub excerpt: String,
}

/// Caps and sorts key tokens so fingerprint stability doesn't depend on
/// extraction order; the top-K by frequency/position is approximated
/// here by simple sort+truncate since tokens already arrive
/// position-deduped from [`crate::signals::ExtractedSignal`].
fn top_key_tokens(tokens: &[String], k: usize) -> Vec<String> {
    let mut sorted = tokens.to_vec();
    sorted.sort();
    sorted.dedup();
    sorted.truncate(k);
    sorted
}

pub fn compute_fingerprints(inputs: &FingerprintInputs) -> Fingerprints {
    let mut domains = inputs.domains.clone();
    domains.sort();

    let strict = serde_json::json!({
        "workspaceId": inputs.workspace_id,
        "service": inputs.service,
        "driftType": inputs.drift_type,
        "domains": domains,
        "docId": inputs.doc_id,
        "keyTokens": top_key_tokens(&inputs.key_tokens, 32),
        "title": inputs.title,
        "excerpt": inputs.excerpt,
    });

    let medium = serde_json::json!({
        "workspaceId": inputs.workspace_id,
        "service": inputs.service,
        "driftType": inputs.drift_type,
        "domains": domains,
        "docId": inputs.doc_id,
        "keyTokens": top_key_tokens(&inputs.key_tokens, 32),
    });

    let broad = serde_json::json!({
        "workspaceId": inputs.workspace_id,
        "service": inputs.service,
        "driftType": inputs.drift_type,
        "docId": inputs.doc_id,
        "topKeyTokens": top_key_tokens(&inputs.key_tokens, 8),
    });

    Fingerprints {
        strict: hash_value(&strict),
        medium: hash_value(&medium),
        broad: hash_value(&broad),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_inputs() -> FingerprintInputs {
        FingerprintInputs {
            workspace_id: "ws".to_string(),
            service: Some("billing".to_string()),
            drift_type: DriftType::Process,
            doc_id: "doc-1".to_string(),
            domains: vec!["payments".to_string(), "billing".to_string()],
            key_tokens: vec!["deploy".to_string(), "rollback".to_string()],
            title: "Change the deploy order".to_string(),
            excerpt: "1. get approval 2. deploy".to_string(),
        }
    }

    #[test]
    fn broad_ignores_title_changes_but_strict_does_not() {
        let mut a = sample_inputs();
        let mut b = sample_inputs();
        a.title = "Original title".to_string();
        b.title = "A totally different title".to_string();
        let fp_a = compute_fingerprints(&a);
        let fp_b = compute_fingerprints(&b);
        assert_eq!(fp_a.broad, fp_b.broad);
        assert_ne!(fp_a.strict, fp_b.strict);
    }

    #[test]
    fn domain_order_does_not_affect_fingerprint() {
        let mut a = sample_inputs();
        let mut b = sample_inputs();
        a.domains = vec!["billing".to_string(), "payments".to_string()];
        b.domains = vec!["payments".to_string(), "billing".to_string()];
        assert_eq!(compute_fingerprints(&a).strict, compute_fingerprints(&b).strict);
    }

    #[test]
    fn medium_drops_free_text_but_keeps_key_tokens() {
        let mut a = sample_inputs();
        let mut b = sample_inputs();
        a.excerpt = "excerpt one".to_string();
        b.excerpt = "excerpt two, wildly different".to_string();
        assert_eq!(compute_fingerprints(&a).medium, compute_fingerprints(&b).medium);
    }
}

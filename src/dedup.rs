//! Deduplication Index.
//!
//! A concurrent map keyed by fingerprint, CAS-style ("insert or merge") —
//! grounded on this crate's use of `moka::sync::Cache` as its in-process
//! concurrent cache primitive (`github/client.rs`'s artifact cache uses
//! `moka::future::Cache`; this index has no need for async eviction
//! callbacks, so the sync variant is the better fit; both come from the
//! same crate already in the dependency tree).

use std::sync::{Arc, Mutex};

use moka::sync::Cache;

use crate::drift::DriftCandidate;
use crate::observability::dedup_metrics;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// `min(0.05 * correlatedSignals, 0.15)` confidence boost on a renewed
/// match.
fn confidence_boost(correlated_signal_count: usize) -> f64 {
    (0.05 * correlated_signal_count as f64).min(0.15)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    /// No existing candidate: fingerprint becomes a new open candidate.
    Created,
    /// A material confidence jump: re-notify.
    Renotified,
    /// Existing candidate has a pending proposal: merge silently.
    SuppressedWithPendingProposal,
    /// No pending proposal either: merge silently.
    Suppressed,
}

pub struct DedupIndex {
    candidates: Cache<String, Arc<Mutex<DriftCandidate>>>,
}

impl DedupIndex {
    pub fn new(max_capacity: u64) -> Self {
        Self { candidates: Cache::new(max_capacity) }
    }

    /// Insert-or-merge a new signal against the fingerprint it
    /// classified to. `new_confidence` and `new_signal_id` describe the
    /// incoming signal; `has_pending_proposal` reflects the existing
    /// candidate's current `PatchProposal` status, if any.
    pub fn upsert(
        &self,
        fingerprint: &str,
        make_candidate: impl FnOnce() -> DriftCandidate,
        new_confidence: f64,
        new_signal_id: &str,
        has_pending_proposal: bool,
    ) -> DedupOutcome {
        if let Some(existing) = self.candidates.get(fingerprint) {
            let mut candidate = lock(&existing);
            let existing_confidence = candidate.confidence;
            if !candidate.correlated_signal_ids.contains(&new_signal_id.to_string()) {
                candidate.correlated_signal_ids.push(new_signal_id.to_string());
            }
            let boost = confidence_boost(candidate.correlated_signal_ids.len());
            candidate.confidence = (candidate.confidence + boost).min(1.0);

            let outcome = if new_confidence - existing_confidence >= 0.15 {
                dedup_metrics().record_renotification();
                DedupOutcome::Renotified
            } else if has_pending_proposal {
                DedupOutcome::SuppressedWithPendingProposal
            } else {
                DedupOutcome::Suppressed
            };
            if !matches!(outcome, DedupOutcome::Renotified) {
                dedup_metrics().record_merged();
            }
            outcome
        } else {
            let candidate = make_candidate();
            self.candidates.insert(fingerprint.to_string(), Arc::new(Mutex::new(candidate)));
            dedup_metrics().record_created();
            DedupOutcome::Created
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<Arc<Mutex<DriftCandidate>>> {
        self.candidates.get(fingerprint)
    }

    pub fn remove(&self, fingerprint: &str) {
        self.candidates.invalidate(fingerprint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::{DriftState, DriftType};

    fn sample_candidate() -> DriftCandidate {
        DriftCandidate {
            workspace_id: "ws".to_string(),
            id: "cand-1".to_string(),
            signal_event_id: "sig-1".to_string(),
            drift_type: DriftType::Process,
            state: DriftState::Ingested,
            attempt: 0,
            last_error: None,
            fingerprint: Some("fp-1".to_string()),
            correlated_signal_ids: vec!["sig-1".to_string()],
            confidence: 0.4,
            evidence_bundle_id: None,
            doc_mapping_id: None,
            patch_proposal_ids: vec![],
            created_at: chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&chrono::Utc),
            updated_at: chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&chrono::Utc),
        }
    }

    #[test]
    fn first_insert_creates() {
        let index = DedupIndex::new(100);
        let outcome = index.upsert("fp-1", sample_candidate, 0.4, "sig-1", false);
        assert_eq!(outcome, DedupOutcome::Created);
    }

    #[test]
    fn large_confidence_jump_renotifies() {
        let index = DedupIndex::new(100);
        index.upsert("fp-1", sample_candidate, 0.4, "sig-1", false);
        let outcome = index.upsert("fp-1", sample_candidate, 0.6, "sig-2", false);
        assert_eq!(outcome, DedupOutcome::Renotified);
    }

    #[test]
    fn small_jump_with_pending_proposal_suppresses() {
        let index = DedupIndex::new(100);
        index.upsert("fp-1", sample_candidate, 0.4, "sig-1", false);
        let outcome = index.upsert("fp-1", sample_candidate, 0.42, "sig-2", true);
        assert_eq!(outcome, DedupOutcome::SuppressedWithPendingProposal);
    }
}

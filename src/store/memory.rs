//! In-memory [`Store`] backing tests and the `fixture://` CLI mode.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AuditEvent, FingerprintTier, Store};
use crate::drift::{DocMapping, DriftCandidate};
use crate::error::GateError;
use crate::evidence::EvidenceBundle;
use crate::patch::PatchProposal;

#[derive(Default)]
struct State {
    audit_log: Vec<AuditEvent>,
    drift_candidates: HashMap<(String, String), DriftCandidate>,
    patch_proposals: HashMap<String, PatchProposal>,
    doc_mappings: HashMap<(String, String), DocMapping>,
    evidence_bundles: HashMap<String, EvidenceBundle>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn audit_log_len(&self) -> usize {
        self.state.lock().unwrap().audit_log.len()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn append_audit_event(&self, event: AuditEvent) -> Result<(), GateError> {
        self.state.lock().unwrap().audit_log.push(event);
        Ok(())
    }

    async fn get_drift_candidate(&self, workspace_id: &str, id: &str) -> Result<Option<DriftCandidate>, GateError> {
        Ok(self.state.lock().unwrap().drift_candidates.get(&(workspace_id.to_string(), id.to_string())).cloned())
    }

    async fn put_drift_candidate(&self, candidate: DriftCandidate) -> Result<(), GateError> {
        let key = (candidate.workspace_id.clone(), candidate.id.clone());
        self.state.lock().unwrap().drift_candidates.insert(key, candidate);
        Ok(())
    }

    async fn list_open_drift_candidates(&self, workspace_id: &str) -> Result<Vec<DriftCandidate>, GateError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .drift_candidates
            .values()
            .filter(|c| c.workspace_id == workspace_id && !c.state.is_terminal())
            .cloned()
            .collect())
    }

    async fn get_patch_proposal(&self, id: &str) -> Result<Option<PatchProposal>, GateError> {
        Ok(self.state.lock().unwrap().patch_proposals.get(id).cloned())
    }

    async fn put_patch_proposal(&self, proposal: PatchProposal) -> Result<(), GateError> {
        self.state.lock().unwrap().patch_proposals.insert(proposal.id.clone(), proposal);
        Ok(())
    }

    async fn get_doc_mapping(&self, workspace_id: &str, service: &str) -> Result<Option<DocMapping>, GateError> {
        Ok(self.state.lock().unwrap().doc_mappings.get(&(workspace_id.to_string(), service.to_string())).cloned())
    }

    async fn put_doc_mapping(&self, mapping: DocMapping) -> Result<(), GateError> {
        let key = (mapping.workspace_id.clone(), mapping.service.clone());
        self.state.lock().unwrap().doc_mappings.insert(key, mapping);
        Ok(())
    }

    async fn put_evidence_bundle(&self, bundle: EvidenceBundle) -> Result<(), GateError> {
        self.state.lock().unwrap().evidence_bundles.insert(bundle.bundle_id.clone(), bundle);
        Ok(())
    }

    async fn get_evidence_bundle(&self, bundle_id: &str) -> Result<Option<EvidenceBundle>, GateError> {
        Ok(self.state.lock().unwrap().evidence_bundles.get(bundle_id).cloned())
    }

    async fn find_evidence_bundle_by_fingerprint(
        &self,
        tier: FingerprintTier,
        fingerprint: &str,
    ) -> Result<Option<EvidenceBundle>, GateError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .evidence_bundles
            .values()
            .find(|b| {
                let fp = match tier {
                    FingerprintTier::Strict => &b.fingerprints.strict,
                    FingerprintTier::Medium => &b.fingerprints.medium,
                    FingerprintTier::Broad => &b.fingerprints.broad,
                };
                fp == fingerprint
            })
            .cloned())
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
            fingerprint: None,
            correlated_signal_ids: vec![],
            confidence: 0.5,
            evidence_bundle_id: None,
            doc_mapping_id: None,
            patch_proposal_ids: vec![],
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn round_trips_a_drift_candidate() {
        let store = InMemoryStore::new();
        store.put_drift_candidate(sample_candidate()).await.unwrap();
        let fetched = store.get_drift_candidate("ws", "cand-1").await.unwrap();
        assert!(fetched.is_some());
    }

    #[tokio::test]
    async fn list_open_excludes_terminal_states() {
        let store = InMemoryStore::new();
        let mut terminal = sample_candidate();
        terminal.id = "cand-done".to_string();
        terminal.state = DriftState::Completed;
        store.put_drift_candidate(sample_candidate()).await.unwrap();
        store.put_drift_candidate(terminal).await.unwrap();

        let open = store.list_open_drift_candidates("ws").await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, "cand-1");
    }
}

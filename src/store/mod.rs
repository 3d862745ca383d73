//! Persisted state layout.
//!
//! An append-only audit log keyed by `(workspaceId, timestamp, eventId)`,
//! plus mutable tables for `DriftCandidate`, `PatchProposal`,
//! `DocMapping`, `Workspace`, and `PolicyPack`. Evidence bundles are
//! stored by `bundleId` with the three fingerprint tiers as secondary
//! keys. Grounded on `database::DatabaseManager` (sqlx-backed,
//! feature-gated) split into a trait so tests and the CLI `fixture`
//! mode run against [`memory::InMemoryStore`] without a database.

pub mod memory;
#[cfg(feature = "database")]
pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::drift::{DriftCandidate, DocMapping};
use crate::error::GateError;
use crate::evidence::EvidenceBundle;
use crate::patch::PatchProposal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintTier {
    Strict,
    Medium,
    Broad,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEventKind {
    StateTransition { drift_id: String, from: String, to: String },
    HumanAction { drift_id: String, action: String, actor: String },
    PackPublished { pack_id: String, content_hash: String },
    EvidenceBundleCreated { bundle_id: String, drift_id: String },
    WritebackOutcome { drift_id: String, outcome: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub workspace_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub event_id: String,
    pub kind: AuditEventKind,
}

/// The persistence boundary every CLI command and drift-driver
/// invocation depends on. `sqlite` is the production implementation
/// behind `feature = "database"`; `memory` backs tests and the
/// `fixture://` CLI mode.
#[async_trait]
pub trait Store: Send + Sync {
    async fn append_audit_event(&self, event: AuditEvent) -> Result<(), GateError>;

    async fn get_drift_candidate(&self, workspace_id: &str, id: &str) -> Result<Option<DriftCandidate>, GateError>;
    async fn put_drift_candidate(&self, candidate: DriftCandidate) -> Result<(), GateError>;
    async fn list_open_drift_candidates(&self, workspace_id: &str) -> Result<Vec<DriftCandidate>, GateError>;

    async fn get_patch_proposal(&self, id: &str) -> Result<Option<PatchProposal>, GateError>;
    async fn put_patch_proposal(&self, proposal: PatchProposal) -> Result<(), GateError>;

    async fn get_doc_mapping(&self, workspace_id: &str, service: &str) -> Result<Option<DocMapping>, GateError>;
    async fn put_doc_mapping(&self, mapping: DocMapping) -> Result<(), GateError>;

    async fn put_evidence_bundle(&self, bundle: EvidenceBundle) -> Result<(), GateError>;
    async fn get_evidence_bundle(&self, bundle_id: &str) -> Result<Option<EvidenceBundle>, GateError>;
    async fn find_evidence_bundle_by_fingerprint(
        &self,
        tier: FingerprintTier,
        fingerprint: &str,
    ) -> Result<Option<EvidenceBundle>, GateError>;
}

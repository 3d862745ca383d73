//! Drift State Machine and data model.

pub mod failure;
pub mod state_machine;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftType {
    Instruction,
    Process,
    Ownership,
    Coverage,
    EnvironmentTooling,
}

/// Mirrors the statig machine's active state as a plain, persistable
/// value — the same split `agent_lifecycle` keeps between `AgentState`
/// (data) and `AgentStateMachine` (statig driver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriftState {
    Ingested,
    EligibilityChecked,
    SignalsCorrelated,
    DriftClassified,
    DocsResolved,
    DocsFetched,
    DocContextExtracted,
    BaselineChecked,
    PatchPlanned,
    PatchGenerated,
    PatchValidated,
    OwnerResolved,
    SlackSent,
    AwaitingHuman,
    Approved,
    EditRequested,
    Rejected,
    Snoozed,
    WritebackValidated,
    WrittenBack,
    Completed,
    Failed,
    FailedNeedsMapping,
}

impl DriftState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DriftState::Completed | DriftState::Failed | DriftState::FailedNeedsMapping | DriftState::Rejected)
    }

    pub fn is_human_gated(self) -> bool {
        matches!(self, DriftState::AwaitingHuman | DriftState::Snoozed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftCandidate {
    pub workspace_id: String,
    pub id: String,
    pub signal_event_id: String,
    pub drift_type: DriftType,
    pub state: DriftState,
    pub attempt: u32,
    pub last_error: Option<String>,
    pub fingerprint: Option<String>,
    pub correlated_signal_ids: Vec<String>,
    pub confidence: f64,
    pub evidence_bundle_id: Option<String>,
    pub doc_mapping_id: Option<String>,
    pub patch_proposal_ids: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocMapping {
    pub workspace_id: String,
    pub id: String,
    pub service: String,
    pub doc_system: String,
    pub doc_id: String,
}

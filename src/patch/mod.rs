//! Patch proposals and the validator pipeline.

pub mod validators;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchStyle {
    ReplaceSteps,
    ReorderSteps,
    UpdateOwnerBlock,
    AddSection,
    AddNote,
    UpdateSection,
    LinkPatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchStatus {
    Proposed,
    Sent,
    Approved,
    Rejected,
    Applied,
    Failed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchSafety {
    pub secrets_redacted: bool,
    pub risky_change_avoided: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchProposal {
    pub id: String,
    pub drift_candidate_id: String,
    pub style: PatchStyle,
    pub status: PatchStatus,
    pub original_markdown: String,
    pub patched_markdown: String,
    pub unified_diff: String,
    pub summary: String,
    pub confidence: f64,
    pub evidence_refs: Vec<String>,
    pub safety: PatchSafety,
    pub needs_human: bool,
    pub expected_doc_revision: Option<String>,
}

//! Evidence bundle assembly.
//!
//! Bundle ids are monotonic within a drift candidate — the builder takes a caller-supplied sequence number
//! rather than reading wall-clock time itself, keeping the module free
//! of hidden nondeterminism.

use serde::{Deserialize, Serialize};

use super::claims::{extract_claims, DocClaim, DocSurface};
use super::fingerprint::{compute_fingerprints, FingerprintInputs, Fingerprints};
use super::impact::{assess_impact, ImpactAssessment, ImpactInputs};
use super::source::{build_source_evidence, SourceEvidence};
use crate::drift::DriftType;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetEvidence {
    pub doc_system: String,
    pub doc_id: String,
    pub surface: DocSurface,
    pub claims: Vec<DocClaim>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub bundle_id: String,
    pub workspace_id: String,
    pub drift_candidate_id: String,
    pub schema_version: u32,
    pub source_evidence: SourceEvidence,
    pub target_evidence: TargetEvidence,
    pub assessment: ImpactAssessment,
    pub fingerprints: Fingerprints,
}

pub struct EvidenceBuilderInput<'a> {
    pub bundle_id: String,
    pub workspace_id: String,
    pub drift_candidate_id: String,
    pub drift_type: DriftType,
    pub source_type: crate::signals::SourceType,
    pub source_id: &'a str,
    pub source_summary: &'a str,
    pub source_raw_text: &'a str,
    pub doc_system: &'a str,
    pub doc_id: &'a str,
    pub doc_surface: DocSurface,
    pub doc_text: &'a str,
    pub domains: Vec<String>,
    pub key_tokens: Vec<String>,
    pub service: Option<String>,
    pub impact_inputs: ImpactInputs,
    pub consequence_text: String,
}

/// Assembles a complete, immutable [`EvidenceBundle`] in one pass: source
/// evidence (with secret redaction already applied), doc-claim
/// extraction, impact assessment, and the three fingerprint tiers.
pub fn build_evidence_bundle(input: EvidenceBuilderInput<'_>) -> EvidenceBundle {
    let source_evidence = build_source_evidence(input.source_type, input.source_id, input.source_summary, input.source_raw_text);
    let claims = extract_claims(input.doc_text, input.drift_type, input.doc_surface);
    let assessment = assess_impact(&input.impact_inputs, input.consequence_text);
    let fingerprints = compute_fingerprints(&FingerprintInputs {
        workspace_id: input.workspace_id.clone(),
        service: input.service,
        drift_type: input.drift_type,
        doc_id: input.doc_id.to_string(),
        domains: input.domains,
        key_tokens: input.key_tokens,
        title: input.source_summary.to_string(),
        excerpt: input.source_raw_text.to_string(),
    });

    EvidenceBundle {
        bundle_id: input.bundle_id,
        workspace_id: input.workspace_id,
        drift_candidate_id: input.drift_candidate_id,
        schema_version: SCHEMA_VERSION,
        source_evidence,
        target_evidence: TargetEvidence {
            doc_system: input.doc_system.to_string(),
            doc_id: input.doc_id.to_string(),
            surface: input.doc_surface,
            claims,
        },
        assessment,
        fingerprints,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::impact::BlastRadius;
    use crate::signals::SourceType;

    #[test]
    fn builds_a_complete_bundle() {
        let bundle = build_evidence_bundle(EvidenceBuilderInput {
            bundle_id: "bundle-1".to_string(),
            workspace_id: "ws".to_string(),
            drift_candidate_id: "cand-1".to_string(),
            drift_type: DriftType::Process,
            source_type: SourceType::GithubPr,
            source_id: "pr-42",
            source_summary: "Reorder the deploy approval gate",
            source_raw_text: "1. deploy\n2. get approval after the fact",
            doc_system: "confluence",
            doc_id: "doc-9",
            doc_surface: DocSurface::Runbook,
            doc_text: "# Deploy\n1. Get approval\n2. Run deploy script\n",
            domains: vec!["deploy".to_string()],
            key_tokens: vec!["deploy".to_string(), "approval".to_string()],
            service: Some("billing".to_string()),
            impact_inputs: ImpactInputs { critical_file_matches: 1, blast_radius: BlastRadius { services: vec!["billing".to_string()], ..Default::default() }, ..Default::default() },
            consequence_text: "deploy runbook approval order no longer matches the pipeline".to_string(),
        });

        assert_eq!(bundle.schema_version, SCHEMA_VERSION);
        assert!(!bundle.target_evidence.claims.is_empty());
        assert!(bundle.assessment.impact_score > 0.0);
        assert_eq!(bundle.fingerprints.strict.len(), 64);
    }
}

//! Doc-claim extraction: deterministic, no LLM —
//! locate token windows per `docSurface`/drift type, emit bounded,
//! confidence-ranked claims.

use serde::{Deserialize, Serialize};

use crate::drift::DriftType;

const MAX_CLAIMS: usize = 20;
const WINDOW_LINES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    InstructionBlock,
    ProcessStep,
    ApiEndpoint,
    OwnerBlock,
    ToolReference,
    CoverageGap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    TokenPattern,
    YamlParse,
    CodeComment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimLocation {
    pub start_line: usize,
    pub end_line: usize,
    pub section: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocClaim {
    pub claim_type: ClaimType,
    pub label: String,
    pub snippet: String,
    pub location: ClaimLocation,
    pub confidence: f64,
    pub extraction_method: ExtractionMethod,
}

struct Pattern {
    claim_type: ClaimType,
    label: &'static str,
    needle: &'static str,
    base_confidence: f64,
    method: ExtractionMethod,
}

fn patterns_for(drift_type: DriftType) -> Vec<Pattern> {
    match drift_type {
        DriftType::Instruction => vec![
            Pattern { claim_type: ClaimType::InstructionBlock, label: "run command", needle: "```", base_confidence: 0.7, method: ExtractionMethod::TokenPattern },
            Pattern { claim_type: ClaimType::ToolReference, label: "tool invocation", needle: "`", base_confidence: 0.5, method: ExtractionMethod::CodeComment },
        ],
        DriftType::Process => vec![
            Pattern { claim_type: ClaimType::ProcessStep, label: "numbered step", needle: "1.", base_confidence: 0.65, method: ExtractionMethod::TokenPattern },
            Pattern { claim_type: ClaimType::ProcessStep, label: "approval gate", needle: "approval", base_confidence: 0.6, method: ExtractionMethod::TokenPattern },
        ],
        DriftType::Ownership => vec![
            Pattern { claim_type: ClaimType::OwnerBlock, label: "owner contact", needle: "@", base_confidence: 0.55, method: ExtractionMethod::TokenPattern },
            Pattern { claim_type: ClaimType::OwnerBlock, label: "codeowners pattern", needle: "CODEOWNERS", base_confidence: 0.6, method: ExtractionMethod::YamlParse },
        ],
        DriftType::Coverage => vec![
            Pattern { claim_type: ClaimType::CoverageGap, label: "endpoint reference", needle: "endpoint", base_confidence: 0.5, method: ExtractionMethod::TokenPattern },
        ],
        DriftType::EnvironmentTooling => vec![
            Pattern { claim_type: ClaimType::ToolReference, label: "tool version pin", needle: "version", base_confidence: 0.5, method: ExtractionMethod::YamlParse },
        ],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocSurface {
    Runbook,
    ApiContract,
    ServiceCatalog,
    DeveloperDoc,
    CodeDoc,
    KnowledgeBase,
}

/// Locates the first occurrence ± [`WINDOW_LINES`] of each pattern
/// relevant to `drift_type`, caps at [`MAX_CLAIMS`], sorted by
/// confidence descending.
pub fn extract_claims(doc_text: &str, drift_type: DriftType, surface: DocSurface) -> Vec<DocClaim> {
    let lines: Vec<&str> = doc_text.lines().collect();
    let mut claims = Vec::new();

    for pattern in patterns_for(drift_type) {
        if let Some((idx, _)) = lines.iter().enumerate().find(|(_, l)| l.contains(pattern.needle)) {
            let start = idx.saturating_sub(WINDOW_LINES);
            let end = (idx + WINDOW_LINES).min(lines.len().saturating_sub(1));
            let snippet = lines[start..=end].join("\n");
            let surface_bonus = if matches!(surface, DocSurface::Runbook | DocSurface::ApiContract) { 0.1 } else { 0.0 };
            claims.push(DocClaim {
                claim_type: pattern.claim_type,
                label: pattern.label.to_string(),
                snippet,
                location: ClaimLocation { start_line: start + 1, end_line: end + 1, section: None },
                confidence: (pattern.base_confidence + surface_bonus).min(1.0),
                extraction_method: pattern.method,
            });
        }
    }

    claims.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
    claims.truncate(MAX_CLAIMS);
    claims
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_process_step_claim() {
        let doc = "# Deploy runbook\n1. Get approval from on-call\n2. Run the deploy script\n";
        let claims = extract_claims(doc, DriftType::Process, DocSurface::Runbook);
        assert!(claims.iter().any(|c| c.claim_type == ClaimType::ProcessStep));
    }

    #[test]
    fn claims_are_sorted_by_confidence_descending() {
        let doc = "@oncall-team owns this.\n1. step one\napproval required\n";
        let claims = extract_claims(doc, DriftType::Process, DocSurface::Runbook);
        for pair in claims.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn no_match_yields_empty_claims() {
        let claims = extract_claims("nothing relevant here", DriftType::Ownership, DocSurface::DeveloperDoc);
        assert!(claims.is_empty());
    }
}

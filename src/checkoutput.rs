//! Check output renderer.
//!
//! A pure function from a [`GlobalDecision`] to the gate's public
//! artifact. Grounded on `cli::commands::doctor::output`'s idiom of
//! building a structured, grouped human-readable report rather
//! than ad-hoc string concatenation.

use serde::{Deserialize, Serialize};

use crate::config::ObservationMode;
use crate::evaluator::aggregator::GlobalDecision;
use crate::pack::model::Decision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Neutral,
    ActionRequired,
}

/// Decision → conclusion mapping: `block → failure`, `warn → neutral`,
/// `pass → success`.
pub fn conclusion_for_decision(decision: Decision) -> Conclusion {
    match decision {
        Decision::Block => Conclusion::Failure,
        Decision::Warn => Conclusion::Neutral,
        Decision::Pass => Conclusion::Success,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutput {
    pub name: String,
    pub conclusion: Conclusion,
    pub title: String,
    pub summary: String,
    pub text: String,
}

const EVALUATOR_VERSION: &str = "verta-gate/policy-evaluator-v1";

/// Builds the check run's public artifact from a computed global decision.
/// Never fails: total internal failure is represented by the caller
/// constructing a [`GlobalDecision`] whose `evaluation_failed` is set —
/// the check run is always produced, even on internal errors.
pub fn render_check_output(global: &GlobalDecision) -> CheckOutput {
    if let Some(reason) = &global.evaluation_failed {
        return CheckOutput {
            name: "Policy Gate".to_string(),
            conclusion: Conclusion::Neutral,
            title: "Evaluation failed".to_string(),
            summary: format!("evaluation failed — {reason}"),
            text: String::new(),
        };
    }

    // Observe invariance: when every selected pack is in observe mode,
    // the conclusion is always success regardless of the true worst
    // decision; mixed observe/non-observe packs fall back to the true
    // aggregated reported decision computed by the aggregator.
    let reported = global.reported_decision;
    let conclusion = conclusion_for_decision(reported);

    let mut summary = String::new();
    summary.push_str(&format!(
        "enforcement mode: {}\n",
        match global.observation_mode {
            ObservationMode::Observe => "observe",
            ObservationMode::Warn => "warn",
            ObservationMode::Enforce => "enforce",
        }
    ));
    summary.push_str(&format!("global decision: {}\n", reported));
    if global.true_decision != reported {
        summary.push_str(&format!(
            "Would {} (observe-only)\n",
            global.true_decision.to_string().to_uppercase()
        ));
    }
    for pack in &global.per_pack {
        summary.push_str(&format!(
            "- {} ({}…) mode={} decision={} rules_triggered={} findings={}\n",
            pack.pack_name,
            &pack.pack_hash[..pack.pack_hash.len().min(16)],
            pack.pack_mode,
            pack.reported_decision,
            pack.rules_triggered,
            pack.findings.len(),
        ));
    }
    summary.push_str(&format!("evaluation time: {}ms\n", global.evaluation_time_ms));
    summary.push_str(&format!("evaluator version: {EVALUATOR_VERSION}\n"));

    let mut blocking = Vec::new();
    let mut warnings = Vec::new();
    let mut unknowns = Vec::new();
    let mut passing = Vec::new();

    for pack in &global.per_pack {
        for finding in &pack.findings {
            let line = format!("[{}] {}: {}", pack.pack_name, finding.rule_name, finding.message);
            match finding.decision {
                Decision::Block => blocking.push(line),
                Decision::Warn => warnings.push(line),
                Decision::Pass if finding.was_unknown => unknowns.push(line),
                Decision::Pass => passing.push(line),
            }
        }
    }

    let mut text = String::new();
    append_group(&mut text, "Blocking", &blocking);
    append_group(&mut text, "Warnings", &warnings);
    append_group(&mut text, "Unable to evaluate", &unknowns);
    append_group(&mut text, "Passing", &passing);

    CheckOutput {
        name: "Policy Gate".to_string(),
        conclusion,
        title: format!("Policy Gate: {reported}"),
        summary,
        text,
    }
}

fn append_group(text: &mut String, title: &str, lines: &[String]) {
    text.push_str(&format!("## {title}\n"));
    if lines.is_empty() {
        text.push_str("(none)\n\n");
        return;
    }
    for line in lines {
        text.push_str("- ");
        text.push_str(line);
        text.push('\n');
    }
    text.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_global() -> GlobalDecision {
        GlobalDecision {
            evaluation_failed: None,
            reported_decision: Decision::Pass,
            true_decision: Decision::Pass,
            observation_mode: ObservationMode::Observe,
            per_pack: vec![],
            evaluation_time_ms: 12,
        }
    }

    #[test]
    fn observe_mode_surfaces_the_suppressed_block_decision() {
        let mut global = base_global();
        global.true_decision = Decision::Block;
        let output = render_check_output(&global);
        assert!(output.summary.contains("Would BLOCK (observe-only)"));
    }

    #[test]
    fn enforced_decision_omits_observe_only_line() {
        let global = base_global();
        let output = render_check_output(&global);
        assert!(!output.summary.contains("observe-only"));
    }
}

//! Multi-Pack Aggregator.

use crate::config::ObservationMode;
use crate::pack::model::{Decision, PackMode};

use super::pack_evaluator::{Finding, PackEvaluation};

#[derive(Debug, Clone)]
pub struct PackDecisionSummary {
    pub pack_name: String,
    pub pack_hash: String,
    pub pack_mode: PackMode,
    pub reported_decision: Decision,
    pub rules_triggered: u32,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone)]
pub struct GlobalDecision {
    /// Set when the evaluation itself failed internally.
    pub evaluation_failed: Option<String>,
    pub reported_decision: Decision,
    pub true_decision: Decision,
    pub observation_mode: ObservationMode,
    pub per_pack: Vec<PackDecisionSummary>,
    pub evaluation_time_ms: u64,
}

/// Combines per-pack evaluations into the global decision: worst of the
/// per-pack *reported* decisions is what is externally surfaced; worst of
/// the *true* decisions is retained for the observe-mode transparency line.
pub fn aggregate(
    pack_names: &[(String, String)],
    evaluations: Vec<PackEvaluation>,
    observation_mode: ObservationMode,
    evaluation_time_ms: u64,
) -> GlobalDecision {
    let reported_decision = Decision::worst_of(evaluations.iter().map(|e| e.reported_decision));
    let true_decision = Decision::worst_of(evaluations.iter().map(|e| e.true_decision));

    let per_pack = evaluations
        .into_iter()
        .map(|eval| {
            let pack_name = pack_names
                .iter()
                .find(|(id, _)| *id == eval.pack_id)
                .map(|(_, name)| name.clone())
                .unwrap_or_else(|| eval.pack_id.clone());
            PackDecisionSummary {
                pack_name,
                pack_hash: eval.pack_hash,
                pack_mode: eval.pack_mode,
                reported_decision: eval.reported_decision,
                rules_triggered: eval.rules_triggered,
                findings: eval.findings,
            }
        })
        .collect();

    GlobalDecision {
        evaluation_failed: None,
        reported_decision,
        true_decision,
        observation_mode,
        per_pack,
        evaluation_time_ms,
    }
}

/// Built when the evaluation could not complete at all (budget blew up
/// before any pack finished, adapter construction failed, etc). The check
/// run is still produced — never silently dropped.
pub fn failed(reason: String, observation_mode: ObservationMode, evaluation_time_ms: u64) -> GlobalDecision {
    GlobalDecision {
        evaluation_failed: Some(reason),
        reported_decision: Decision::Pass,
        true_decision: Decision::Pass,
        observation_mode,
        per_pack: vec![],
        evaluation_time_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_decision_is_worst_of_reported() {
        let evaluations = vec![
            PackEvaluation {
                pack_id: "a".to_string(),
                pack_hash: "h1".to_string(),
                pack_mode: PackMode::Enforce,
                true_decision: Decision::Warn,
                reported_decision: Decision::Warn,
                rules_triggered: 1,
                findings: vec![],
            },
            PackEvaluation {
                pack_id: "b".to_string(),
                pack_hash: "h2".to_string(),
                pack_mode: PackMode::Enforce,
                true_decision: Decision::Block,
                reported_decision: Decision::Block,
                rules_triggered: 1,
                findings: vec![],
            },
        ];
        let names = vec![("a".to_string(), "A".to_string()), ("b".to_string(), "B".to_string())];
        let global = aggregate(&names, evaluations, ObservationMode::Enforce, 10);
        assert_eq!(global.reported_decision, Decision::Block);
    }

    #[test]
    fn observe_mode_pack_reports_pass_but_true_decision_preserved() {
        let evaluations = vec![PackEvaluation {
            pack_id: "a".to_string(),
            pack_hash: "h1".to_string(),
            pack_mode: PackMode::Observe,
            true_decision: Decision::Block,
            reported_decision: Decision::Pass,
            rules_triggered: 1,
            findings: vec![],
        }];
        let names = vec![("a".to_string(), "A".to_string())];
        let global = aggregate(&names, evaluations, ObservationMode::Observe, 5);
        assert_eq!(global.reported_decision, Decision::Pass);
        assert_eq!(global.true_decision, Decision::Block);
    }
}

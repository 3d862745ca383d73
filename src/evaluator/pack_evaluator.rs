//! Per-pack evaluation.

use std::collections::HashMap;

use crate::adapters::ExternalAdapter;
use crate::budget::EvaluationBudget;
use crate::comparators::{ComparatorRegistry, ComparatorStatus};
use crate::conditions::TriState;
use crate::config::ExternalDependencyMode;
use crate::facts::{FactResolver, PriorGateResult};
use crate::globbing::any_glob_matches;
use crate::pack::model::{Decision, ObligationCheck, PackDefaults, PackMode, PolicyPack, Rule, Trigger};
use crate::pr_context::PrContext;

#[derive(Debug, Clone)]
pub struct Finding {
    pub rule_id: String,
    pub rule_name: String,
    pub decision: Decision,
    pub was_unknown: bool,
    pub message: String,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PackEvaluation {
    pub pack_id: String,
    pub pack_hash: String,
    pub pack_mode: PackMode,
    /// The decision the pack actually computed.
    pub true_decision: Decision,
    /// `pass` when `pack_mode == observe`, else equal to `true_decision`.
    pub reported_decision: Decision,
    pub rules_triggered: u32,
    pub findings: Vec<Finding>,
}

fn merge_defaults(workspace_defaults: &PackDefaults, pack_defaults: &PackDefaults) -> PackDefaults {
    PackDefaults {
        timeout_ms: pack_defaults.timeout_ms.or(workspace_defaults.timeout_ms),
        severity: pack_defaults.severity.or(workspace_defaults.severity),
        min_approvals: pack_defaults.min_approvals.or(workspace_defaults.min_approvals),
    }
}

fn trigger_fires(trigger: &Trigger, ctx: &PrContext) -> bool {
    match trigger {
        Trigger::Always => true,
        Trigger::PathGlobs { globs } => ctx.files.iter().any(|f| any_glob_matches(globs, &f.filename)),
        Trigger::Labels { labels } => labels.iter().any(|l| ctx.labels.contains(l)),
        Trigger::ChangeSurface { surface } => ctx.files.iter().any(|f| f.filename.contains(surface.as_str())),
    }
}

fn excluded_by_paths(rule: &Rule, ctx: &PrContext) -> bool {
    !rule.exclude_paths.is_empty()
        && ctx.files.iter().all(|f| any_glob_matches(&rule.exclude_paths, &f.filename))
}

async fn evaluate_rule(
    rule: &Rule,
    ctx: &PrContext,
    prior_gates: &HashMap<String, PriorGateResult>,
    comparators: &ComparatorRegistry,
    adapter: &dyn ExternalAdapter,
    budget: &EvaluationBudget,
    defaults: &PackDefaults,
) -> Option<Finding> {
    if !rule.enabled || !trigger_fires(&rule.trigger, ctx) || excluded_by_paths(rule, ctx) {
        return None;
    }

    let resolver = FactResolver::new(ctx, prior_gates);

    if let Some(when) = &rule.when {
        if !when.evaluate(&resolver.as_fn()).is_true() {
            return None;
        }
    }
    if let Some(skip_if) = &rule.skip_if {
        if skip_if.evaluate(&resolver.as_fn()).is_true() {
            return None;
        }
    }

    let mut obligation_decisions = Vec::with_capacity(rule.obligations.len());
    let mut was_unknown_any = false;
    let mut messages = Vec::new();
    let mut evidence = Vec::new();

    for obligation in &rule.obligations {
        let (decision, unknown, message, mut ev) = match &obligation.check {
            ObligationCheck::Comparator { comparator_id, params } => {
                let comparator = comparators.get(comparator_id);
                match comparator {
                    None => (obligation.decision_on_unknown(), true, format!("unregistered comparator {comparator_id}"), vec![]),
                    Some(comparator) => {
                        let outcome = match defaults.timeout_ms {
                            Some(ms) => {
                                budget
                                    .run_with_timeout_override(
                                        std::time::Duration::from_millis(ms),
                                        comparator.evaluate(ctx, params, adapter, budget),
                                    )
                                    .await
                            }
                            None => budget.run_with_timeout(comparator.evaluate(ctx, params, adapter, budget)).await,
                        };
                        match outcome {
                            Err(e) => (obligation.decision_on_unknown(), true, e.to_string(), vec![]),
                            Ok(result) => match result.status {
                                ComparatorStatus::Pass => (Decision::Pass, false, result.message, result.evidence),
                                ComparatorStatus::Fail => (obligation.decision_on_fail, false, result.message, result.evidence),
                                ComparatorStatus::Unknown => (obligation.decision_on_unknown(), true, result.message, result.evidence),
                            },
                        }
                    }
                }
            }
            ObligationCheck::Condition { condition } => match condition.evaluate(&resolver.as_fn()) {
                TriState::True => (Decision::Pass, false, "condition satisfied".to_string(), vec![]),
                TriState::False => (obligation.decision_on_fail, false, "condition not satisfied".to_string(), vec![]),
                TriState::Unknown => (obligation.decision_on_unknown(), true, "condition depends on an unknown fact".to_string(), vec![]),
            },
        };
        obligation_decisions.push(decision);
        was_unknown_any |= unknown;
        messages.push(message);
        evidence.append(&mut ev);
    }

    let rule_decision = Decision::worst_of(obligation_decisions);

    Some(Finding {
        rule_id: rule.id.clone(),
        rule_name: rule.name.clone(),
        decision: rule_decision,
        was_unknown: was_unknown_any,
        message: messages.join("; "),
        evidence,
    })
}

/// The finding recorded for a rule that never ran because the evaluation
/// budget was already exhausted. `hard_fail` treats an unchecked rule as a
/// block (fail closed); `soft_fail` records it as unknown without escalating
/// the pack's decision.
fn budget_exhausted_finding(rule: &Rule, mode: ExternalDependencyMode) -> Finding {
    let decision = match mode {
        ExternalDependencyMode::HardFail => Decision::Block,
        ExternalDependencyMode::SoftFail => Decision::Pass,
    };
    Finding {
        rule_id: rule.id.clone(),
        rule_name: rule.name.clone(),
        decision,
        was_unknown: true,
        message: "evaluation budget exhausted before this rule ran".to_string(),
        evidence: vec![],
    }
}

pub async fn evaluate_pack(
    pack: &PolicyPack,
    workspace_defaults: &PackDefaults,
    ctx: &PrContext,
    prior_gates: &HashMap<String, PriorGateResult>,
    comparators: &ComparatorRegistry,
    adapter: &dyn ExternalAdapter,
    budget: &EvaluationBudget,
    external_dependency_mode: ExternalDependencyMode,
) -> PackEvaluation {
    let effective_defaults = merge_defaults(workspace_defaults, &pack.defaults);

    let mut findings = Vec::new();
    for (idx, rule) in pack.rules.iter().enumerate() {
        if budget.is_expired() {
            // The budget ran out mid-pack. Rather than silently dropping the
            // remaining rules, surface them so the reported decision reflects
            // that they were never actually checked.
            for skipped in &pack.rules[idx..] {
                findings.push(budget_exhausted_finding(skipped, external_dependency_mode));
            }
            break;
        }
        if let Some(finding) = evaluate_rule(rule, ctx, prior_gates, comparators, adapter, budget, &effective_defaults).await {
            findings.push(finding);
        }
    }

    let true_decision = Decision::worst_of(findings.iter().map(|f| f.decision));
    let reported_decision = if pack.metadata.pack_mode == PackMode::Observe { Decision::Pass } else { true_decision };

    PackEvaluation {
        pack_id: pack.id.clone(),
        pack_hash: crate::pack::hash::content_hash(pack),
        pack_mode: pack.metadata.pack_mode,
        true_decision,
        reported_decision,
        rules_triggered: findings.len() as u32,
        findings,
    }
}

//! Cross-pack conflict detection.

use std::collections::HashMap;

use crate::pack::model::{Decision, MergeStrategy, Obligation, PolicyPack, Rule};

#[derive(Debug, Clone, PartialEq)]
pub enum ConflictKind {
    /// (a) both packs define a rule with the same id but different obligations.
    RuleConflict,
    /// (b) equal priority, both `mergeStrategy = EXPLICIT`, overlapping scope.
    MergeStrategyConflict,
    /// (c) equal priority, differing merge strategies, overlapping scope.
    PriorityConflict,
}

#[derive(Debug, Clone)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub rule_id: String,
    pub pack_a: String,
    pub pack_b: String,
}

fn strictness(decision: Decision) -> u8 {
    match decision {
        Decision::Block => 2,
        Decision::Warn => 1,
        Decision::Pass => 0,
    }
}

/// `MOST_RESTRICTIVE`: the obligation with the strictest `decisionOnFail`.
pub fn most_restrictive<'a>(a: &'a Obligation, b: &'a Obligation) -> &'a Obligation {
    if strictness(a.decision_on_fail) >= strictness(b.decision_on_fail) {
        a
    } else {
        b
    }
}

/// `HIGHEST_PRIORITY`: obligations from the higher-priority pack; ties
/// broken lexicographically by pack id.
pub fn highest_priority<'a>(
    pack_a_id: &str,
    pack_a_priority: u8,
    obligations_a: &'a [Obligation],
    pack_b_id: &str,
    pack_b_priority: u8,
    obligations_b: &'a [Obligation],
) -> &'a [Obligation] {
    match pack_a_priority.cmp(&pack_b_priority) {
        std::cmp::Ordering::Greater => obligations_a,
        std::cmp::Ordering::Less => obligations_b,
        std::cmp::Ordering::Equal => {
            if pack_a_id <= pack_b_id {
                obligations_a
            } else {
                obligations_b
            }
        }
    }
}

fn rule_key(rule: &Rule) -> String {
    // Obligations don't implement Hash; compare by their canonical JSON
    // representation, the same stable-ordering trick used for pack
    // hashing.
    serde_json::to_string(&rule.obligations).unwrap_or_default()
}

/// Detects rule-id collisions across a selected set of packs. Priority/merge-strategy conflicts require
/// overlapping *scope*, which is a selector-time property — this function
/// only receives packs that already passed selection, so any two packs
/// present here are by definition overlapping in scope for the current PR.
pub fn detect_rule_conflicts(packs: &[&PolicyPack]) -> Vec<Conflict> {
    let mut by_rule_id: HashMap<&str, Vec<(&str, &Rule)>> = HashMap::new();
    for pack in packs {
        for rule in &pack.rules {
            by_rule_id.entry(rule.id.as_str()).or_default().push((pack.id.as_str(), rule));
        }
    }

    let mut conflicts = Vec::new();
    for (rule_id, owners) in by_rule_id {
        for i in 0..owners.len() {
            for j in (i + 1)..owners.len() {
                let (pack_a, rule_a) = owners[i];
                let (pack_b, rule_b) = owners[j];
                if rule_key(rule_a) != rule_key(rule_b) {
                    conflicts.push(Conflict {
                        kind: ConflictKind::RuleConflict,
                        rule_id: rule_id.to_string(),
                        pack_a: pack_a.to_string(),
                        pack_b: pack_b.to_string(),
                    });
                }
            }
        }
    }
    conflicts
}

/// Detects merge-strategy and priority conflicts between same-priority
/// pack pairs.
pub fn detect_priority_conflicts(packs: &[&PolicyPack]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for i in 0..packs.len() {
        for j in (i + 1)..packs.len() {
            let a = packs[i];
            let b = packs[j];
            if a.priority != b.priority {
                continue;
            }
            let kind = if a.merge_strategy == MergeStrategy::Explicit && b.merge_strategy == MergeStrategy::Explicit {
                ConflictKind::MergeStrategyConflict
            } else if a.merge_strategy != b.merge_strategy {
                ConflictKind::PriorityConflict
            } else {
                continue;
            };
            conflicts.push(Conflict { kind, rule_id: String::new(), pack_a: a.id.clone(), pack_b: b.id.clone() });
        }
    }
    conflicts
}

//! Fact Resolver.
//!
//! Facts are dot-addressed, read-only projections over [`PrContext`] and
//! prior gate results. An unknown fact (missing field, out-of-range index,
//! no prior check by that name) resolves to `None` — the owning condition
//! becomes `unknown` rather than failing the evaluation.

use std::collections::HashMap;

use crate::checkoutput::Conclusion;
use crate::pr_context::PrContext;

/// A resolved fact value. Deliberately narrower than `serde_json::Value`
/// (no object variant) since facts are always scalars or scalar arrays —
/// the dotted-path addressing already does the job a nested object would.
#[derive(Debug, Clone, PartialEq)]
pub enum FactValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<FactValue>),
}

impl FactValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FactValue::Number(n) => Some(*n),
            FactValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            FactValue::String(s) => s.parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FactValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Loose equality against a `serde_json::Value` literal from a pack,
    /// coercing numbers/strings/bools across representations the way a
    /// hand-authored YAML/JSON pack would expect (`"2" == 2`, `true ==
    /// "true"`), but never coercing into or out of arrays.
    pub fn loosely_eq(&self, other: &serde_json::Value) -> bool {
        use serde_json::Value as J;
        match (self, other) {
            (FactValue::Null, J::Null) => true,
            (FactValue::Bool(a), J::Bool(b)) => a == b,
            (FactValue::Bool(a), J::String(s)) => s.parse::<bool>().map(|b| *a == b).unwrap_or(false),
            (FactValue::Number(a), J::Number(n)) => n.as_f64().map(|b| *a == b).unwrap_or(false),
            (FactValue::Number(a), J::String(s)) => s.parse::<f64>().map(|b| *a == b).unwrap_or(false),
            (FactValue::String(a), J::String(b)) => a == b,
            (FactValue::String(a), J::Number(n)) => n.as_f64().and_then(|b| a.parse::<f64>().ok().map(|a| a == b)).unwrap_or(false),
            (FactValue::String(a), J::Bool(b)) => a.parse::<bool>().map(|a| a == *b).unwrap_or(false),
            (FactValue::Array(items), J::Array(other_items)) => {
                items.len() == other_items.len()
                    && items.iter().zip(other_items.iter()).all(|(a, b)| a.loosely_eq(b))
            }
            _ => false,
        }
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        FactValue::String(value.to_string())
    }
}

impl From<String> for FactValue {
    fn from(value: String) -> Self {
        FactValue::String(value)
    }
}

impl From<u64> for FactValue {
    fn from(value: u64) -> Self {
        FactValue::Number(value as f64)
    }
}

impl From<u32> for FactValue {
    fn from(value: u32) -> Self {
        FactValue::Number(value as f64)
    }
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self {
        FactValue::Bool(value)
    }
}

/// A single named check's latest result on a head commit, as seen by
/// `gate.<checkName>.status` / `gate.<checkName>.findings`.
#[derive(Debug, Clone)]
pub struct PriorGateResult {
    pub status: Conclusion,
    pub findings: Vec<String>,
}

/// Resolves dot-addressed paths against a PR context and prior gate
/// results. Grounded on `github::types`'s read-model style:
/// a thin, side-effect-free projection struct rather than a generic JSON
/// path library, since the fact surface is small and fixed.
pub struct FactResolver<'a> {
    pr: &'a PrContext,
    prior_gates: &'a HashMap<String, PriorGateResult>,
}

impl<'a> FactResolver<'a> {
    pub fn new(pr: &'a PrContext, prior_gates: &'a HashMap<String, PriorGateResult>) -> Self {
        Self { pr, prior_gates }
    }

    /// Resolve a single dotted path. Returns `None` for any unknown
    /// fact — unrecognized path, missing prior gate, or an index out of
    /// range — never panics and never falls back to a default value.
    pub fn resolve(&self, path: &str) -> Option<FactValue> {
        let segments: Vec<&str> = path.split('.').collect();
        match segments.as_slice() {
            ["pr", "author"] => Some(self.pr.author.clone().into()),
            ["pr", "authorIsBot"] => Some(self.pr.author_is_bot.into()),
            ["pr", "title"] => Some(self.pr.title.clone().into()),
            ["pr", "baseBranch"] => Some(self.pr.base_branch.clone().into()),
            ["pr", "headBranch"] => Some(self.pr.head_branch.clone().into()),
            ["pr", "additions"] => Some(self.pr.additions.into()),
            ["pr", "deletions"] => Some(self.pr.deletions.into()),
            ["pr", "labels[]"] | ["pr", "labels"] => {
                Some(FactValue::Array(self.pr.labels.iter().map(|l| l.clone().into()).collect()))
            }
            ["pr", "approvals", "count"] => Some((self.pr.approved_count() as u32).into()),
            ["diff", "filesChanged", "count"] => Some((self.pr.files_changed_count() as u32).into()),
            ["gate", check, "status"] => self.prior_gates.get(*check).map(|g| match g.status {
                Conclusion::Success => FactValue::from("success"),
                Conclusion::Failure => FactValue::from("failure"),
                Conclusion::Neutral => FactValue::from("neutral"),
                Conclusion::ActionRequired => FactValue::from("action_required"),
            }),
            ["gate", check, "findings"] => self
                .prior_gates
                .get(*check)
                .map(|g| FactValue::Array(g.findings.iter().map(|f| f.clone().into()).collect())),
            _ => None,
        }
    }

    /// Adapts to the `Fn(&str) -> Option<FactValue>` shape [`crate::conditions::Condition::evaluate`]
    /// expects, without forcing callers to hold a boxed closure.
    pub fn as_fn(&self) -> impl Fn(&str) -> Option<FactValue> + '_ {
        move |path: &str| self.resolve(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pr_context::{Approval, ApprovalState, PrEventType};

    fn sample_pr() -> PrContext {
        PrContext {
            workspace_id: "ws".to_string(),
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            pr_number: 1,
            event_type: PrEventType::Opened,
            head_sha: "abc".to_string(),
            base_sha: "def".to_string(),
            base_branch: "main".to_string(),
            head_branch: "feature".to_string(),
            author: "alice".to_string(),
            author_is_bot: false,
            title: "Add widget".to_string(),
            body: String::new(),
            labels: vec!["needs-review".to_string()],
            commits: vec![],
            additions: 10,
            deletions: 2,
            files: vec![],
            approvals: vec![
                Approval { login: "bob".to_string(), state: ApprovalState::Approved, is_bot: false },
                Approval { login: "carol".to_string(), state: ApprovalState::Approved, is_bot: false },
                Approval { login: "renovate[bot]".to_string(), state: ApprovalState::Approved, is_bot: true },
            ],
            check_runs: vec![],
        }
    }

    #[test]
    fn resolves_approval_count_excluding_bots() {
        let pr = sample_pr();
        let gates = HashMap::new();
        let resolver = FactResolver::new(&pr, &gates);
        assert_eq!(resolver.resolve("pr.approvals.count"), Some(FactValue::Number(2.0)));
    }

    #[test]
    fn unknown_path_resolves_to_none() {
        let pr = sample_pr();
        let gates = HashMap::new();
        let resolver = FactResolver::new(&pr, &gates);
        assert_eq!(resolver.resolve("pr.nonsense"), None);
    }

    #[test]
    fn cross_gate_fact_reads_prior_status() {
        let pr = sample_pr();
        let mut gates = HashMap::new();
        gates.insert(
            "contractIntegrity".to_string(),
            PriorGateResult { status: Conclusion::Success, findings: vec![] },
        );
        let resolver = FactResolver::new(&pr, &gates);
        assert_eq!(resolver.resolve("gate.contractIntegrity.status"), Some(FactValue::from("success")));
        assert_eq!(resolver.resolve("gate.missingCheck.status"), None);
    }
}

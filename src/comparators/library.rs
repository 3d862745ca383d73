//! The ten built-in comparators.

use async_trait::async_trait;
use serde::Deserialize;

use super::{Comparator, ComparatorRegistry, ComparatorResult};
use crate::adapters::ExternalAdapter;
use crate::budget::EvaluationBudget;
use crate::globbing::any_glob_matches;
use crate::pr_context::{CheckConclusion, PrContext};

pub fn register_builtins(registry: &mut ComparatorRegistry) {
    registry.register(std::sync::Arc::new(ArtifactUpdated));
    registry.register(std::sync::Arc::new(ArtifactPresent));
    registry.register(std::sync::Arc::new(PrTemplateFieldPresent));
    registry.register(std::sync::Arc::new(ChecksPassed));
    registry.register(std::sync::Arc::new(NoSecretsInDiff));
    registry.register(std::sync::Arc::new(HumanApprovalPresent));
    registry.register(std::sync::Arc::new(MinApprovals));
    registry.register(std::sync::Arc::new(ActorIsAgent));
    registry.register(std::sync::Arc::new(ChangedPathMatches));
    registry.register(std::sync::Arc::new(OpenapiSchemaValid));
}

fn invalid_params(comparator_id: &str, err: impl std::fmt::Display) -> ComparatorResult {
    ComparatorResult::unknown("INVALID_PARAMS", format!("{comparator_id}: {err}"))
}

#[derive(Deserialize)]
struct PathsParams {
    paths: Vec<String>,
}

pub struct ArtifactUpdated;

#[async_trait]
impl Comparator for ArtifactUpdated {
    fn id(&self) -> &'static str {
        "artifact/artifactUpdated"
    }

    async fn evaluate(
        &self,
        ctx: &PrContext,
        params: &serde_json::Value,
        _adapter: &dyn ExternalAdapter,
        _budget: &EvaluationBudget,
    ) -> ComparatorResult {
        let params: PathsParams = match serde_json::from_value(params.clone()) {
            Ok(p) => p,
            Err(e) => return invalid_params(self.id(), e),
        };
        let matched = ctx.files.iter().any(|f| any_glob_matches(&params.paths, &f.filename));
        if matched {
            ComparatorResult::pass("matching artifact present in changed files")
        } else {
            ComparatorResult::fail("NOT_UPDATED", "no changed file matched the configured artifact locator")
        }
    }
}

pub struct ArtifactPresent;

#[async_trait]
impl Comparator for ArtifactPresent {
    fn id(&self) -> &'static str {
        "artifact/artifactPresent"
    }

    async fn evaluate(
        &self,
        ctx: &PrContext,
        params: &serde_json::Value,
        adapter: &dyn ExternalAdapter,
        budget: &EvaluationBudget,
    ) -> ComparatorResult {
        let params: PathsParams = match serde_json::from_value(params.clone()) {
            Ok(p) => p,
            Err(e) => return invalid_params(self.id(), e),
        };
        if budget.reserve_api_call().is_err() {
            return ComparatorResult::unknown("BUDGET_EXCEEDED", "evaluation budget exhausted");
        }
        for path in &params.paths {
            match adapter.fetch_file(&ctx.head_sha, path).await {
                Ok(Some(_)) => return ComparatorResult::pass(format!("{path} found in repo tree")),
                Ok(None) => continue,
                Err(e) => return ComparatorResult::unknown(e.reason_code(), e.to_string()),
            }
        }
        ComparatorResult::fail("NOT_FOUND", "no configured artifact locator was findable in the repo tree")
    }
}

#[derive(Deserialize)]
struct FieldsParams {
    fields: Vec<String>,
}

pub struct PrTemplateFieldPresent;

#[async_trait]
impl Comparator for PrTemplateFieldPresent {
    fn id(&self) -> &'static str {
        "evidence/prTemplateFieldPresent"
    }

    async fn evaluate(
        &self,
        ctx: &PrContext,
        params: &serde_json::Value,
        _adapter: &dyn ExternalAdapter,
        _budget: &EvaluationBudget,
    ) -> ComparatorResult {
        let params: FieldsParams = match serde_json::from_value(params.clone()) {
            Ok(p) => p,
            Err(e) => return invalid_params(self.id(), e),
        };
        let body_lower = ctx.body.to_lowercase();
        let missing: Vec<&String> = params
            .fields
            .iter()
            .filter(|field| !body_lower.contains(&field.to_lowercase()))
            .collect();
        if missing.is_empty() {
            ComparatorResult::pass("all required template fields present")
        } else {
            ComparatorResult::fail(
                "MISSING_FIELDS",
                format!("missing template fields: {}", missing.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")),
            )
        }
    }
}

#[derive(Deserialize)]
struct NamesParams {
    names: Vec<String>,
}

pub struct ChecksPassed;

#[async_trait]
impl Comparator for ChecksPassed {
    fn id(&self) -> &'static str {
        "evidence/checkrunsPassed"
    }

    async fn evaluate(
        &self,
        ctx: &PrContext,
        params: &serde_json::Value,
        _adapter: &dyn ExternalAdapter,
        _budget: &EvaluationBudget,
    ) -> ComparatorResult {
        let params: NamesParams = match serde_json::from_value(params.clone()) {
            Ok(p) => p,
            Err(e) => return invalid_params(self.id(), e),
        };
        for name in &params.names {
            match ctx.latest_check_run(name) {
                None => return ComparatorResult::unknown("NO_SUCH_CHECK", format!("no check run named {name} on head sha")),
                Some(run) => match run.conclusion {
                    Some(CheckConclusion::Success) => continue,
                    Some(other) => {
                        return ComparatorResult::fail("CHECK_NOT_SUCCESSFUL", format!("{name} concluded {other:?}"))
                    }
                    None => return ComparatorResult::unknown("CHECK_PENDING", format!("{name} has not completed")),
                },
            }
        }
        ComparatorResult::pass("all named check runs succeeded")
    }
}

pub struct NoSecretsInDiff;

#[async_trait]
impl Comparator for NoSecretsInDiff {
    fn id(&self) -> &'static str {
        "safety/noSecretsInDiff"
    }

    async fn evaluate(
        &self,
        ctx: &PrContext,
        _params: &serde_json::Value,
        _adapter: &dyn ExternalAdapter,
        _budget: &EvaluationBudget,
    ) -> ComparatorResult {
        let mut hits = Vec::new();
        for line in ctx.added_lines() {
            if let Some(pattern) = crate::comparators::secrets::scan_line(line) {
                hits.push(pattern);
            }
        }
        if hits.is_empty() {
            ComparatorResult::pass("no secret-shaped strings found in added lines")
        } else {
            ComparatorResult::fail("SECRET_DETECTED", format!("matched patterns: {}", hits.join(", ")))
        }
    }
}

pub struct HumanApprovalPresent;

#[async_trait]
impl Comparator for HumanApprovalPresent {
    fn id(&self) -> &'static str {
        "governance/humanApprovalPresent"
    }

    async fn evaluate(
        &self,
        ctx: &PrContext,
        _params: &serde_json::Value,
        _adapter: &dyn ExternalAdapter,
        _budget: &EvaluationBudget,
    ) -> ComparatorResult {
        if ctx.human_approvals().next().is_some() {
            ComparatorResult::pass("at least one human approval present")
        } else {
            ComparatorResult::fail("NO_HUMAN_APPROVAL", "no non-bot approved review found")
        }
    }
}

#[derive(Deserialize)]
struct MinCountParams {
    min_count: u32,
}

pub struct MinApprovals;

#[async_trait]
impl Comparator for MinApprovals {
    fn id(&self) -> &'static str {
        "governance/minApprovals"
    }

    async fn evaluate(
        &self,
        ctx: &PrContext,
        params: &serde_json::Value,
        _adapter: &dyn ExternalAdapter,
        _budget: &EvaluationBudget,
    ) -> ComparatorResult {
        let params: MinCountParams = match serde_json::from_value(params.clone()) {
            Ok(p) => p,
            Err(e) => return invalid_params(self.id(), e),
        };
        let approved = ctx.approved_count() as u32;
        if approved >= params.min_count {
            ComparatorResult::pass(format!("{approved} approvals >= required {}", params.min_count))
        } else {
            ComparatorResult::fail(
                "INSUFFICIENT_APPROVALS",
                format!("{approved} approvals < required {}", params.min_count),
            )
        }
    }
}

pub struct ActorIsAgent;

#[async_trait]
impl Comparator for ActorIsAgent {
    fn id(&self) -> &'static str {
        "actor/actorIsAgent"
    }

    async fn evaluate(
        &self,
        ctx: &PrContext,
        _params: &serde_json::Value,
        _adapter: &dyn ExternalAdapter,
        _budget: &EvaluationBudget,
    ) -> ComparatorResult {
        if ctx.author_is_bot {
            ComparatorResult::pass(format!("{} is a known agent/bot account", ctx.author))
        } else {
            ComparatorResult::fail("NOT_AN_AGENT", format!("{} is not a known agent/bot account", ctx.author))
        }
    }
}

#[derive(Deserialize)]
struct GlobsParams {
    globs: Vec<String>,
}

pub struct ChangedPathMatches;

#[async_trait]
impl Comparator for ChangedPathMatches {
    fn id(&self) -> &'static str {
        "trigger/changedPathMatches"
    }

    async fn evaluate(
        &self,
        ctx: &PrContext,
        params: &serde_json::Value,
        _adapter: &dyn ExternalAdapter,
        _budget: &EvaluationBudget,
    ) -> ComparatorResult {
        let params: GlobsParams = match serde_json::from_value(params.clone()) {
            Ok(p) => p,
            Err(e) => return invalid_params(self.id(), e),
        };
        if ctx.files.iter().any(|f| any_glob_matches(&params.globs, &f.filename)) {
            ComparatorResult::pass("a changed path matched the configured glob set")
        } else {
            ComparatorResult::fail("NO_PATH_MATCH", "no changed path matched the configured glob set")
        }
    }
}

#[derive(Deserialize)]
struct DocPathParams {
    path: String,
}

pub struct OpenapiSchemaValid;

#[async_trait]
impl Comparator for OpenapiSchemaValid {
    fn id(&self) -> &'static str {
        "schema/openapiSchemaValid"
    }

    async fn evaluate(
        &self,
        ctx: &PrContext,
        params: &serde_json::Value,
        adapter: &dyn ExternalAdapter,
        budget: &EvaluationBudget,
    ) -> ComparatorResult {
        let params: DocPathParams = match serde_json::from_value(params.clone()) {
            Ok(p) => p,
            Err(e) => return invalid_params(self.id(), e),
        };
        if budget.reserve_api_call().is_err() {
            return ComparatorResult::unknown("BUDGET_EXCEEDED", "evaluation budget exhausted");
        }
        let fetched = match adapter.fetch_file(&ctx.head_sha, &params.path).await {
            Ok(Some(f)) => f,
            Ok(None) => return ComparatorResult::unknown("NOT_FOUND", format!("{} not found", params.path)),
            Err(e) => return ComparatorResult::unknown(e.reason_code(), e.to_string()),
        };
        let parsed: serde_json::Value = match serde_json::from_str(&fetched.content) {
            Ok(v) => v,
            Err(e) => return ComparatorResult::fail("NOT_VALID_JSON", format!("{}: {e}", params.path)),
        };
        let has_version = parsed.get("openapi").is_some() || parsed.get("swagger").is_some();
        let has_paths = parsed.get("paths").map(|p| p.is_object()).unwrap_or(false);
        let has_info = parsed.get("info").map(|i| i.is_object()).unwrap_or(false);
        if has_version && has_paths && has_info {
            ComparatorResult::pass("document has openapi/swagger, info, and paths")
        } else {
            ComparatorResult::fail("STRUCTURAL_MISMATCH", "missing one of openapi/swagger, info, paths")
        }
    }
}

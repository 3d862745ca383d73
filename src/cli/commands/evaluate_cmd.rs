use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};

use super::Command;
use crate::adapters::{fixture::FixtureAdapter, github::GitHubAdapter, ExternalAdapter};
use crate::budget::EvaluationBudget;
use crate::checkoutput::render_check_output;
use crate::comparators::ComparatorRegistry;
use crate::config::config;
use crate::evaluator::{aggregate, evaluate_pack};
use crate::fetcher::ArtifactFetcher;
use crate::pack::model::{PackDefaults, PolicyPack};
use crate::pack::selector::{select_packs, SelectionRequest};
use crate::pack::validator::{validate_semantics, validate_structure};
use crate::pr_context::PrContext;

pub struct EvaluateCommand {
    pub pr_context_path: String,
    pub pack_paths: Vec<String>,
    pub fixture: bool,
}

impl EvaluateCommand {
    pub fn new(pr_context_path: String, pack_paths: Vec<String>, fixture: bool) -> Self {
        Self { pr_context_path, pack_paths, fixture }
    }

    fn load_packs(&self, comparators: &ComparatorRegistry) -> Result<Vec<PolicyPack>> {
        let mut packs = Vec::new();
        for path in &self.pack_paths {
            let raw = std::fs::read_to_string(path).with_context(|| format!("reading pack {path}"))?;
            let value: serde_json::Value = serde_json::from_str(&raw)?;
            validate_structure(&value).map_err(|errs| anyhow::anyhow!("{path}: {errs:?}"))?;
            let pack: PolicyPack = serde_json::from_value(value)?;
            validate_semantics(&pack, comparators).map_err(|errs| anyhow::anyhow!("{path}: {errs:?}"))?;
            packs.push(pack);
        }
        Ok(packs)
    }
}

#[async_trait::async_trait]
impl Command for EvaluateCommand {
    async fn execute(&self) -> Result<()> {
        let cfg = config();
        let comparators = ComparatorRegistry::with_builtins();
        let packs = self.load_packs(&comparators)?;

        let pr_raw = std::fs::read_to_string(&self.pr_context_path)?;
        let pr: PrContext = serde_json::from_str(&pr_raw)?;

        let adapter: Arc<dyn ExternalAdapter> = if self.fixture {
            Arc::new(FixtureAdapter::new())
        } else {
            Arc::new(GitHubAdapter::new(cfg.github.token.clone().unwrap_or_default())?)
        };

        let req = SelectionRequest { pr: &pr, event_type_str: event_type_str(&pr), service_ref: None };
        let selected = select_packs(&packs, &req);
        let pack_names: Vec<(String, String)> =
            selected.iter().map(|p| (p.id.clone(), p.metadata.name.clone())).collect();

        let budget = EvaluationBudget::new(
            cfg.budgets.max_total_ms,
            cfg.budgets.per_comparator_timeout_ms,
            cfg.budgets.max_api_calls,
        );
        let prior_gates = HashMap::new();
        let started = std::time::Instant::now();

        // Expansion selection (§4.1) runs once, ahead of any obligation that
        // reads file contents, so comparators see a budget that already
        // accounts for it.
        let expansion = ArtifactFetcher::new(adapter.as_ref(), cfg).expand(&pr, &budget).await?;
        if !expansion.skipped_by_pattern.is_empty() || !expansion.skipped_by_cap.is_empty() {
            eprintln!(
                "artifact fetcher: fetched {} file(s), skipped {} by pattern, {} by byte cap, {} not selected",
                expansion.fetched.len(),
                expansion.skipped_by_pattern.len(),
                expansion.skipped_by_cap.len(),
                expansion.not_selected.len()
            );
        }

        let mut evaluations = Vec::new();
        for pack in &selected {
            let evaluation =
                evaluate_pack(
                    pack,
                    &PackDefaults::default(),
                    &pr,
                    &prior_gates,
                    &comparators,
                    adapter.as_ref(),
                    &budget,
                    cfg.budgets.external_dependency_mode,
                )
                .await;
            evaluations.push(evaluation);
        }

        let global = aggregate(&pack_names, evaluations, cfg.budgets.observation_mode, started.elapsed().as_millis() as u64);
        let output = render_check_output(&global);
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

fn event_type_str(pr: &PrContext) -> &'static str {
    use crate::pr_context::PrEventType;
    match pr.event_type {
        PrEventType::Opened => "opened",
        PrEventType::Synchronize => "synchronize",
        PrEventType::Reopened => "reopened",
        PrEventType::Closed => "closed",
        PrEventType::Labeled => "labeled",
    }
}

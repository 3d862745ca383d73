//! Artifact Fetcher.
//!
//! Budgeted, cancellable fetches of PR file contents for obligations that
//! need to read file bodies rather than just diff metadata. Grounded on
//! `adapters::ExternalAdapter`'s budget-checked, cancellation-aware
//! contract: every fetch goes through [`crate::budget::EvaluationBudget`]
//! the same way a comparator's adapter call does.
//!
//! Key algorithm — **expansion selection**: from the PR's changed-file
//! list, filter out files matching a skip pattern (binary, lock, minified,
//! build-artifact), sort the remainder descending by `additions+deletions`,
//! and fetch the top N. Skipped files are reported for transparency but
//! don't count against the per-file byte cap.

use crate::adapters::ExternalAdapter;
use crate::budget::EvaluationBudget;
use crate::config::GateConfig;
use crate::error::GateError;
use crate::globbing::any_glob_matches;
use crate::pr_context::{FileChange, PrContext};

fn skip_patterns() -> Vec<String> {
    [
        "*.lock",
        "*.min.js",
        "*.min.css",
        "*.map",
        "*.png",
        "*.jpg",
        "*.jpeg",
        "*.gif",
        "*.bmp",
        "*.ico",
        "*.svg",
        "*.woff",
        "*.woff2",
        "*.ttf",
        "*.eot",
        "*.pdf",
        "*.zip",
        "*.tar",
        "*.gz",
        "*.jar",
        "*.war",
        "*.class",
        "*.pyc",
        "*.so",
        "*.dylib",
        "*.dll",
        "*.exe",
        "*.wasm",
        "dist/**",
        "build/**",
        "target/**",
        "node_modules/**",
        "vendor/**",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// One successfully fetched file, content included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArtifact {
    pub filename: String,
    pub content: String,
}

/// The full accounting of one expansion pass: what got fetched and why
/// everything else didn't.
#[derive(Debug, Clone, Default)]
pub struct ExpansionResult {
    pub fetched: Vec<FetchedArtifact>,
    pub skipped_by_pattern: Vec<String>,
    pub skipped_by_cap: Vec<String>,
    pub not_selected: Vec<String>,
}

pub struct ArtifactFetcher<'a> {
    adapter: &'a dyn ExternalAdapter,
    max_context_files: usize,
    max_file_bytes: u64,
}

impl<'a> ArtifactFetcher<'a> {
    pub fn new(adapter: &'a dyn ExternalAdapter, cfg: &GateConfig) -> Self {
        Self {
            adapter,
            max_context_files: cfg.budgets.max_context_files as usize,
            max_file_bytes: cfg.budgets.max_file_bytes_for_expansion,
        }
    }

    /// Selects and fetches the top-churn changed files, enforcing the
    /// per-file byte cap and the per-evaluation budget on every call.
    pub async fn expand(&self, ctx: &PrContext, budget: &EvaluationBudget) -> Result<ExpansionResult, GateError> {
        let patterns = skip_patterns();
        let mut result = ExpansionResult::default();

        let mut candidates: Vec<&FileChange> = Vec::new();
        for file in &ctx.files {
            if any_glob_matches(&patterns, &file.filename) {
                result.skipped_by_pattern.push(file.filename.clone());
            } else {
                candidates.push(file);
            }
        }
        candidates.sort_by_key(|f| std::cmp::Reverse(f.changed_lines()));

        let split_at = candidates.len().min(self.max_context_files);
        let (selected, rest) = candidates.split_at(split_at);
        result.not_selected = rest.iter().map(|f| f.filename.clone()).collect();

        for file in selected {
            if budget.is_expired() {
                result.not_selected.push(file.filename.clone());
                continue;
            }
            budget.reserve_api_call()?;
            let outcome = budget.run_with_timeout(self.adapter.fetch_file(&ctx.head_sha, &file.filename)).await?;
            match outcome? {
                Some(fetched) if fetched.content.len() as u64 > self.max_file_bytes => {
                    result.skipped_by_cap.push(file.filename.clone());
                }
                Some(fetched) => {
                    result.fetched.push(FetchedArtifact { filename: file.filename.clone(), content: fetched.content });
                }
                None => {}
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixture::FixtureAdapter;
    use crate::pr_context::FileStatus;

    fn file(name: &str, additions: u32, deletions: u32) -> FileChange {
        FileChange { filename: name.to_string(), status: FileStatus::Modified, additions, deletions, patch: None }
    }

    fn sample_ctx(files: Vec<FileChange>) -> PrContext {
        PrContext {
            workspace_id: "ws".to_string(),
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            pr_number: 1,
            event_type: crate::pr_context::PrEventType::Opened,
            head_sha: "abc".to_string(),
            base_sha: "def".to_string(),
            base_branch: "main".to_string(),
            head_branch: "feature".to_string(),
            author: "alice".to_string(),
            author_is_bot: false,
            title: "t".to_string(),
            body: String::new(),
            labels: vec![],
            commits: vec![],
            additions: 0,
            deletions: 0,
            files,
            approvals: vec![],
            check_runs: vec![],
        }
    }

    fn cfg_with(max_context_files: u32, max_file_bytes: u64) -> GateConfig {
        let mut cfg = GateConfig::default();
        cfg.budgets.max_context_files = max_context_files;
        cfg.budgets.max_file_bytes_for_expansion = max_file_bytes;
        cfg
    }

    #[tokio::test]
    async fn skip_patterns_exclude_lockfiles_and_build_output() {
        let adapter = FixtureAdapter::new();
        adapter.seed_file("abc", "Cargo.lock", "lockfile contents");
        adapter.seed_file("abc", "src/main.rs", "fn main() {}");
        let ctx = sample_ctx(vec![file("Cargo.lock", 500, 500), file("src/main.rs", 5, 1)]);
        let cfg = cfg_with(3, 10 * 1024);
        let fetcher = ArtifactFetcher::new(&adapter, &cfg);
        let budget = EvaluationBudget::from_config(&cfg.budgets);

        let result = fetcher.expand(&ctx, &budget).await.unwrap();
        assert_eq!(result.skipped_by_pattern, vec!["Cargo.lock".to_string()]);
        assert_eq!(result.fetched.len(), 1);
        assert_eq!(result.fetched[0].filename, "src/main.rs");
    }

    #[tokio::test]
    async fn selects_top_n_by_churn_and_reports_the_rest() {
        let adapter = FixtureAdapter::new();
        adapter.seed_file("abc", "a.rs", "a");
        adapter.seed_file("abc", "b.rs", "b");
        adapter.seed_file("abc", "c.rs", "c");
        let ctx = sample_ctx(vec![file("a.rs", 1, 0), file("b.rs", 100, 0), file("c.rs", 50, 0)]);
        let cfg = cfg_with(2, 10 * 1024);
        let fetcher = ArtifactFetcher::new(&adapter, &cfg);
        let budget = EvaluationBudget::from_config(&cfg.budgets);

        let result = fetcher.expand(&ctx, &budget).await.unwrap();
        let fetched_names: Vec<_> = result.fetched.iter().map(|f| f.filename.clone()).collect();
        assert_eq!(fetched_names, vec!["b.rs".to_string(), "c.rs".to_string()]);
        assert_eq!(result.not_selected, vec!["a.rs".to_string()]);
    }

    #[tokio::test]
    async fn oversized_file_is_skipped_by_cap_not_fetched() {
        let adapter = FixtureAdapter::new();
        adapter.seed_file("abc", "big.rs", &"x".repeat(100));
        let ctx = sample_ctx(vec![file("big.rs", 10, 0)]);
        let cfg = cfg_with(3, 50);
        let fetcher = ArtifactFetcher::new(&adapter, &cfg);
        let budget = EvaluationBudget::from_config(&cfg.budgets);

        let result = fetcher.expand(&ctx, &budget).await.unwrap();
        assert!(result.fetched.is_empty());
        assert_eq!(result.skipped_by_cap, vec!["big.rs".to_string()]);
    }
}

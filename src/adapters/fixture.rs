//! In-memory [`ExternalAdapter`] used by tests and the `fixture://`
//! CLI mode — no network calls, fully deterministic. Grounded on
//! `github::client::GitHubClient`'s shape, with the same method
//! surface backed by a `Mutex`-guarded in-memory store instead of
//! `octocrab`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{DocRevision, ExternalAdapter, FetchedFile, FileEncoding, WriteOutcome, WriteResult};
use crate::checkoutput::CheckOutput;
use crate::error::GateError;
use crate::pr_context::{Approval, CheckRun};

#[derive(Default)]
struct FixtureState {
    files: HashMap<(String, String), FetchedFile>,
    reviews: HashMap<(String, String, u64), Vec<Approval>>,
    check_runs: HashMap<(String, String, String), Vec<CheckRun>>,
    docs: HashMap<(String, String), (String, DocRevision)>,
    posted_checks: Vec<CheckOutput>,
    notifications: Vec<(String, String)>,
}

/// Fully in-process, no I/O. Every call succeeds against whatever was
/// seeded; anything not seeded resolves to `NotFound`/empty, never an
/// error — a missing fixture entry is a test-authoring signal, not a
/// transport failure.
pub struct FixtureAdapter {
    state: Mutex<FixtureState>,
}

impl FixtureAdapter {
    pub fn new() -> Self {
        Self { state: Mutex::new(FixtureState::default()) }
    }

    pub fn seed_file(&self, ref_: &str, path: &str, content: &str) {
        let mut state = self.state.lock().unwrap();
        state.files.insert(
            (ref_.to_string(), path.to_string()),
            FetchedFile { content: content.to_string(), encoding: FileEncoding::Utf8, size: content.len() as u64 },
        );
    }

    pub fn seed_reviews(&self, owner: &str, repo: &str, pr_number: u64, approvals: Vec<Approval>) {
        self.state.lock().unwrap().reviews.insert((owner.to_string(), repo.to_string(), pr_number), approvals);
    }

    pub fn seed_check_runs(&self, owner: &str, repo: &str, sha: &str, runs: Vec<CheckRun>) {
        self.state.lock().unwrap().check_runs.insert((owner.to_string(), repo.to_string(), sha.to_string()), runs);
    }

    pub fn seed_doc(&self, doc_system: &str, doc_id: &str, content: &str, revision: DocRevision) {
        self.state
            .lock()
            .unwrap()
            .docs
            .insert((doc_system.to_string(), doc_id.to_string()), (content.to_string(), revision));
    }

    pub fn posted_checks(&self) -> Vec<CheckOutput> {
        self.state.lock().unwrap().posted_checks.clone()
    }

    pub fn notifications(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().notifications.clone()
    }
}

impl Default for FixtureAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExternalAdapter for FixtureAdapter {
    async fn fetch_file(&self, ref_: &str, path: &str) -> Result<Option<FetchedFile>, GateError> {
        Ok(self.state.lock().unwrap().files.get(&(ref_.to_string(), path.to_string())).cloned())
    }

    async fn list_reviews(&self, owner: &str, repo: &str, pr_number: u64) -> Result<Vec<Approval>, GateError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .reviews
            .get(&(owner.to_string(), repo.to_string(), pr_number))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_check_runs(&self, owner: &str, repo: &str, sha: &str) -> Result<Vec<CheckRun>, GateError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .check_runs
            .get(&(owner.to_string(), repo.to_string(), sha.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn post_check(&self, _owner: &str, _repo: &str, _sha: &str, output: &CheckOutput) -> Result<(), GateError> {
        self.state.lock().unwrap().posted_checks.push(output.clone());
        Ok(())
    }

    async fn write_doc(
        &self,
        doc_system: &str,
        doc_id: &str,
        new_content: &str,
        expected_revision: &DocRevision,
    ) -> Result<WriteResult, GateError> {
        let mut state = self.state.lock().unwrap();
        let key = (doc_system.to_string(), doc_id.to_string());
        match state.docs.get(&key) {
            None => {
                state.docs.insert(key, (new_content.to_string(), expected_revision.clone()));
                Ok(WriteResult::Applied(WriteOutcome { revision: expected_revision.clone() }))
            }
            Some((_, current)) if current == expected_revision => {
                let next = match current {
                    DocRevision::Opaque(s) => DocRevision::Opaque(format!("{s}-next")),
                    DocRevision::Numeric(n) => DocRevision::Numeric(n + 1),
                };
                state.docs.insert(key, (new_content.to_string(), next.clone()));
                Ok(WriteResult::Applied(WriteOutcome { revision: next }))
            }
            Some((_, current)) => Ok(WriteResult::RevisionMismatch { current: current.clone() }),
        }
    }

    async fn post_notification(&self, channel: &str, message: &str) -> Result<(), GateError> {
        self.state.lock().unwrap().notifications.push((channel.to_string(), message.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_file_returns_seeded_content() {
        let adapter = FixtureAdapter::new();
        adapter.seed_file("main", "README.md", "hello");
        let file = adapter.fetch_file("main", "README.md").await.unwrap().unwrap();
        assert_eq!(file.content, "hello");
    }

    #[tokio::test]
    async fn fetch_file_missing_returns_none_not_error() {
        let adapter = FixtureAdapter::new();
        let file = adapter.fetch_file("main", "missing.md").await.unwrap();
        assert!(file.is_none());
    }

    #[tokio::test]
    async fn write_doc_first_write_applies_unconditionally() {
        let adapter = FixtureAdapter::new();
        let result = adapter
            .write_doc("confluence", "doc-1", "content", &DocRevision::Opaque("r1".to_string()))
            .await
            .unwrap();
        assert!(matches!(result, WriteResult::Applied(_)));
    }
}

//! GitHub-backed [`ExternalAdapter`]. Grounded on `github::client::GitHubClient`'s
//! octocrab construction idiom and `http::client::RateLimitedHttpClient`'s
//! caching, narrowed to the read-only PR/file/check/review surface plus
//! doc writeback when `doc_system == "github"` (a doc stored as a file
//! in a repository, addressed as `owner/repo/path@ref`).

use octocrab::Octocrab;

use super::{DocRevision, ExternalAdapter, FetchedFile, FileEncoding, WriteOutcome, WriteResult};
use crate::checkoutput::CheckOutput;
use crate::error::GateError;
use crate::observability::adapter_metrics;
use crate::pr_context::{Approval, ApprovalState, CheckConclusion, CheckRun};

pub struct GitHubAdapter {
    octocrab: Octocrab,
}

impl GitHubAdapter {
    pub fn new(token: String) -> Result<Self, GateError> {
        let octocrab = Octocrab::builder()
            .personal_token(token)
            .build()
            .map_err(GateError::from)?;
        Ok(Self { octocrab })
    }

    /// `doc_id` for a GitHub-stored doc is `"owner/repo/path/to/file.md"`.
    fn parse_github_doc_id(doc_id: &str) -> Result<(String, String, String), GateError> {
        let mut parts = doc_id.splitn(3, '/');
        let (Some(owner), Some(repo), Some(path)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(GateError::Validation(format!("doc id `{doc_id}` is not `owner/repo/path`")));
        };
        Ok((owner.to_string(), repo.to_string(), path.to_string()))
    }
}

#[async_trait::async_trait]
impl ExternalAdapter for GitHubAdapter {
    async fn fetch_file(&self, ref_: &str, path: &str) -> Result<Option<FetchedFile>, GateError> {
        adapter_metrics().record_call();
        let (owner, repo, file_path) = {
            let mut parts = path.splitn(3, '/');
            let (Some(owner), Some(repo), Some(rest)) = (parts.next(), parts.next(), parts.next()) else {
                return Err(GateError::Validation(format!("path `{path}` is not `owner/repo/path`")));
            };
            (owner.to_string(), repo.to_string(), rest.to_string())
        };

        match self.octocrab.repos(&owner, &repo).get_content().path(&file_path).r#ref(ref_).send().await {
            Ok(mut content) => {
                let Some(item) = content.items.pop() else { return Ok(None) };
                let text = item.decoded_content().unwrap_or_default();
                Ok(Some(FetchedFile { size: text.len() as u64, content: text, encoding: FileEncoding::Utf8 }))
            }
            Err(err) => {
                let mapped: GateError = err.into();
                if matches!(mapped, GateError::NotFound(_)) {
                    Ok(None)
                } else {
                    adapter_metrics().record_error();
                    Err(mapped)
                }
            }
        }
    }

    async fn list_reviews(&self, owner: &str, repo: &str, pr_number: u64) -> Result<Vec<Approval>, GateError> {
        adapter_metrics().record_call();
        let reviews = self
            .octocrab
            .pulls(owner, repo)
            .list_reviews(pr_number)
            .send()
            .await
            .map_err(|e| {
                adapter_metrics().record_error();
                GateError::from(e)
            })?;

        Ok(reviews
            .items
            .into_iter()
            .map(|r| Approval {
                login: r.user.map(|u| u.login).unwrap_or_default(),
                state: match r.state.map(|s| format!("{s:?}")).unwrap_or_default().as_str() {
                    "Approved" => ApprovalState::Approved,
                    "ChangesRequested" => ApprovalState::ChangesRequested,
                    "Dismissed" => ApprovalState::Dismissed,
                    _ => ApprovalState::Commented,
                },
                is_bot: false,
            })
            .collect())
    }

    async fn list_check_runs(&self, owner: &str, repo: &str, sha: &str) -> Result<Vec<CheckRun>, GateError> {
        adapter_metrics().record_call();
        let route = format!("/repos/{owner}/{repo}/commits/{sha}/check-runs");
        let page: serde_json::Value = self.octocrab.get(route, None::<&()>).await.map_err(|e| {
            adapter_metrics().record_error();
            GateError::from(e)
        })?;

        let runs = page
            .get("check_runs")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|r| CheckRun {
                name: r.get("name").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                conclusion: r.get("conclusion").and_then(|v| v.as_str()).map(|c| match c {
                    "success" => CheckConclusion::Success,
                    "failure" => CheckConclusion::Failure,
                    "neutral" => CheckConclusion::Neutral,
                    "action_required" => CheckConclusion::ActionRequired,
                    "cancelled" => CheckConclusion::Cancelled,
                    "timed_out" => CheckConclusion::TimedOut,
                    _ => CheckConclusion::Neutral,
                }),
                completed_at: r
                    .get("completed_at")
                    .and_then(|v| v.as_str())
                    .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                    .map(|d| d.with_timezone(&chrono::Utc)),
            })
            .collect();
        Ok(runs)
    }

    async fn post_check(&self, owner: &str, repo: &str, sha: &str, output: &CheckOutput) -> Result<(), GateError> {
        adapter_metrics().record_call();
        let route = format!("/repos/{owner}/{repo}/check-runs");
        let body = serde_json::json!({
            "name": output.name,
            "head_sha": sha,
            "status": "completed",
            "conclusion": format!("{:?}", output.conclusion).to_lowercase(),
            "output": {
                "title": output.title,
                "summary": output.summary,
                "text": output.text,
            },
        });
        self.octocrab.post::<_, serde_json::Value>(route, Some(&body)).await.map_err(|e| {
            adapter_metrics().record_error();
            GateError::from(e)
        })?;
        Ok(())
    }

    async fn write_doc(
        &self,
        doc_system: &str,
        doc_id: &str,
        new_content: &str,
        expected_revision: &DocRevision,
    ) -> Result<WriteResult, GateError> {
        adapter_metrics().record_call();
        if doc_system != "github" {
            return Err(GateError::Validation(format!("GitHubAdapter cannot write doc system `{doc_system}`")));
        }
        let (owner, repo, path) = Self::parse_github_doc_id(doc_id)?;
        let DocRevision::Opaque(expected_sha) = expected_revision else {
            return Err(GateError::Validation("GitHub doc revisions are opaque blob shas".to_string()));
        };

        let mut current = self
            .octocrab
            .repos(&owner, &repo)
            .get_content()
            .path(&path)
            .send()
            .await
            .map_err(GateError::from)?;
        let Some(existing) = current.items.pop() else {
            return Err(GateError::NotFound(format!("github doc {owner}/{repo}/{path} not found")));
        };
        if &existing.sha != expected_sha {
            return Ok(WriteResult::RevisionMismatch { current: DocRevision::Opaque(existing.sha) });
        }

        match self
            .octocrab
            .repos(&owner, &repo)
            .update_file(&path, "drift remediation: update managed doc", new_content, &existing.sha)
            .send()
            .await
        {
            Ok(update) => Ok(WriteResult::Applied(WriteOutcome { revision: DocRevision::Opaque(update.content.sha) })),
            Err(err) => {
                let mapped: GateError = err.into();
                if matches!(mapped, GateError::Conflict(_)) {
                    Ok(WriteResult::Conflict)
                } else {
                    adapter_metrics().record_error();
                    Err(mapped)
                }
            }
        }
    }

    async fn post_notification(&self, channel: &str, message: &str) -> Result<(), GateError> {
        // GitHub has no native chat-notification surface; the gate's
        // primary in-repo notification is the check run itself
        // (`post_check`). Chat delivery (Slack, etc.) is a distinct
        // adapter implementation, not this one.
        tracing::info!(channel, message, "GitHubAdapter has no chat channel; notification logged only");
        Ok(())
    }
}

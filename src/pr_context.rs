//! Read-only PR context consumed by comparators and fact resolvers.

use serde::{Deserialize, Serialize};

/// A single changed file in a pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    pub filename: String,
    pub status: FileStatus,
    pub additions: u32,
    pub deletions: u32,
    /// Unified diff hunk text, when available (large/binary files may omit it).
    pub patch: Option<String>,
}

impl FileChange {
    pub fn changed_lines(&self) -> u32 {
        self.additions + self.deletions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    Renamed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approval {
    pub login: String,
    pub state: ApprovalState,
    #[serde(default)]
    pub is_bot: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRun {
    pub name: String,
    pub conclusion: Option<CheckConclusion>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    Success,
    Failure,
    Neutral,
    ActionRequired,
    Cancelled,
    TimedOut,
}

/// The PR event type that triggered evaluation, used by Pack Selector
/// scope matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrEventType {
    Opened,
    Synchronize,
    Reopened,
    Closed,
    Labeled,
}

/// All fields are read-only: comparators and fact resolvers only ever
/// project from this structure, never mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrContext {
    pub workspace_id: String,
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
    pub event_type: PrEventType,
    pub head_sha: String,
    pub base_sha: String,
    pub base_branch: String,
    pub head_branch: String,
    pub author: String,
    #[serde(default)]
    pub author_is_bot: bool,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub commits: Vec<String>,
    pub additions: u32,
    pub deletions: u32,
    #[serde(default)]
    pub files: Vec<FileChange>,
    #[serde(default)]
    pub approvals: Vec<Approval>,
    #[serde(default)]
    pub check_runs: Vec<CheckRun>,
}

impl PrContext {
    pub fn files_changed_count(&self) -> usize {
        self.files.len()
    }

    pub fn human_approvals(&self) -> impl Iterator<Item = &Approval> {
        self.approvals
            .iter()
            .filter(|a| !a.is_bot && a.state == ApprovalState::Approved)
    }

    pub fn approved_count(&self) -> usize {
        self.human_approvals().count()
    }

    pub fn latest_check_run(&self, name: &str) -> Option<&CheckRun> {
        self.check_runs
            .iter()
            .filter(|c| c.name == name)
            .max_by_key(|c| c.completed_at)
    }

    pub fn added_lines(&self) -> impl Iterator<Item = &str> {
        self.files.iter().flat_map(|f| {
            f.patch.iter().flat_map(|p| {
                p.lines()
                    .filter(|l| l.starts_with('+') && !l.starts_with("+++"))
            })
        })
    }
}

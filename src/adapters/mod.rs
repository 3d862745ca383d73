//! External adapter contract.
//!
//! These are the only side-effectful operations the core may perform.
//! Every call is budget-checked (see [`crate::budget`]) and
//! cancellation-aware by construction: implementations must respect the
//! [`crate::budget::CancellationToken`] passed alongside the request.

pub mod fixture;
pub mod github;

use crate::error::GateError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileEncoding {
    Utf8,
    Base64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedFile {
    pub content: String,
    pub encoding: FileEncoding,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocRevision {
    /// An opaque, string-compared revision (e.g. a git blob sha, a wiki
    /// page version string).
    Opaque(String),
    /// A numeric revision (e.g. a Confluence page version number).
    Numeric(u64),
}

impl DocRevision {
    /// Whether two revisions are directly, meaningfully comparable. The
    /// `DocRevisionUnchanged` validator treats numeric revisions compared
    /// against a differently-shaped revision as not comparable and
    /// downgrades to a warning rather than a hard mismatch.
    pub fn comparable_to(&self, other: &DocRevision) -> bool {
        matches!(
            (self, other),
            (DocRevision::Opaque(_), DocRevision::Opaque(_))
                | (DocRevision::Numeric(_), DocRevision::Numeric(_))
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub revision: DocRevision,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    Applied(WriteOutcome),
    RevisionMismatch { current: DocRevision },
    Conflict,
}

/// The only side-effectful surface the core depends on.
#[async_trait]
pub trait ExternalAdapter: Send + Sync {
    async fn fetch_file(&self, ref_: &str, path: &str) -> Result<Option<FetchedFile>, GateError>;

    async fn list_reviews(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<Vec<crate::pr_context::Approval>, GateError>;

    async fn list_check_runs(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<Vec<crate::pr_context::CheckRun>, GateError>;

    async fn post_check(&self, owner: &str, repo: &str, sha: &str, output: &crate::checkoutput::CheckOutput) -> Result<(), GateError>;

    async fn write_doc(
        &self,
        doc_system: &str,
        doc_id: &str,
        new_content: &str,
        expected_revision: &DocRevision,
    ) -> Result<WriteResult, GateError>;

    async fn post_notification(&self, channel: &str, message: &str) -> Result<(), GateError>;
}

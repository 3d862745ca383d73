//! Writeback Coordinator.
//!
//! Optimistic-concurrency apply/no-op/conflict coordinator. Mirrors
//! `bundling/git_ops.rs`'s fetch-compare-apply-or-conflict idiom
//! (fetch current ref, compare, fast-forward or
//! report conflict), generalized from git refs to arbitrary doc
//! revisions behind [`crate::adapters::ExternalAdapter`].

use crate::adapters::{DocRevision, ExternalAdapter, WriteResult};
use crate::drift::failure::FailureCode;
use crate::error::GateError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WritebackOutcome {
    Applied { revision: DocRevision },
    /// A second apply of identical content against the same revision is
    /// a no-op, not a new write.
    NoOp { revision: DocRevision },
    RevisionMismatch { current: DocRevision },
    Conflict,
}

impl WritebackOutcome {
    /// Maps a non-applied outcome to the drift state machine's failure
    /// taxonomy.
    pub fn failure_code(&self) -> Option<FailureCode> {
        match self {
            WritebackOutcome::Applied { .. } | WritebackOutcome::NoOp { .. } => None,
            WritebackOutcome::RevisionMismatch { .. } => Some(FailureCode::RevisionMismatch),
            WritebackOutcome::Conflict => Some(FailureCode::DocConflict),
        }
    }
}

pub struct WritebackCoordinator<'a> {
    adapter: &'a dyn ExternalAdapter,
}

impl<'a> WritebackCoordinator<'a> {
    pub fn new(adapter: &'a dyn ExternalAdapter) -> Self {
        Self { adapter }
    }

    /// Applies `new_content` to `(doc_system, doc_id)` if `expected_revision`
    /// still matches the doc's current revision. Never attempts to write
    /// outside a declared managed region — that exclusion is enforced
    /// earlier by the patch validator pipeline (`ManagedRegionOnly`); the
    /// coordinator here only owns the fetch/compare/apply contract.
    pub async fn apply(
        &self,
        doc_system: &str,
        doc_id: &str,
        new_content: &str,
        expected_revision: &DocRevision,
        last_applied_content: Option<&str>,
    ) -> Result<WritebackOutcome, GateError> {
        if last_applied_content == Some(new_content) {
            return Ok(WritebackOutcome::NoOp { revision: expected_revision.clone() });
        }

        match self.adapter.write_doc(doc_system, doc_id, new_content, expected_revision).await? {
            WriteResult::Applied(outcome) => Ok(WritebackOutcome::Applied { revision: outcome.revision }),
            WriteResult::RevisionMismatch { current } => Ok(WritebackOutcome::RevisionMismatch { current }),
            WriteResult::Conflict => Ok(WritebackOutcome::Conflict),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixture::FixtureAdapter;

    #[tokio::test]
    async fn second_apply_of_identical_content_is_a_noop() {
        let adapter = FixtureAdapter::new();
        adapter.seed_doc("confluence", "doc-1", "hello", DocRevision::Opaque("r1".to_string()));
        let coordinator = WritebackCoordinator::new(&adapter);

        let first = coordinator
            .apply("confluence", "doc-1", "updated", &DocRevision::Opaque("r1".to_string()), None)
            .await
            .unwrap();
        assert!(matches!(first, WritebackOutcome::Applied { .. }));

        let second = coordinator
            .apply("confluence", "doc-1", "updated", &DocRevision::Opaque("r2".to_string()), Some("updated"))
            .await
            .unwrap();
        assert!(matches!(second, WritebackOutcome::NoOp { .. }));
    }

    #[tokio::test]
    async fn stale_revision_reports_mismatch() {
        let adapter = FixtureAdapter::new();
        adapter.seed_doc("confluence", "doc-1", "hello", DocRevision::Opaque("r2".to_string()));
        let coordinator = WritebackCoordinator::new(&adapter);

        let outcome = coordinator
            .apply("confluence", "doc-1", "updated", &DocRevision::Opaque("r1".to_string()), None)
            .await
            .unwrap();
        assert_eq!(outcome.failure_code(), Some(FailureCode::RevisionMismatch));
    }
}

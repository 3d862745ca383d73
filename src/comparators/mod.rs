//! Comparator Library.
//!
//! A comparator is a pure-ish predicate over `(PrContext, params)` —
//! "pure" modulo the budgeted artifact reads some of them need, which go
//! through [`crate::adapters::ExternalAdapter`] rather than touching the
//! network directly. Registered by stable string identifier, the same
//! shape as `github::client`'s retry-policy registry lookup.

pub mod library;
pub mod secrets;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::adapters::ExternalAdapter;
use crate::budget::EvaluationBudget;
use crate::pr_context::PrContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparatorStatus {
    Pass,
    Fail,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparatorResult {
    pub status: ComparatorStatus,
    pub reason_code: String,
    pub message: String,
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl ComparatorResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self { status: ComparatorStatus::Pass, reason_code: "OK".to_string(), message: message.into(), evidence: vec![] }
    }

    pub fn fail(reason_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { status: ComparatorStatus::Fail, reason_code: reason_code.into(), message: message.into(), evidence: vec![] }
    }

    pub fn unknown(reason_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { status: ComparatorStatus::Unknown, reason_code: reason_code.into(), message: message.into(), evidence: vec![] }
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }
}

/// Comparators never throw: any internal
/// error is represented as `ComparatorResult::unknown`, never an `Err`.
#[async_trait]
pub trait Comparator: Send + Sync {
    fn id(&self) -> &'static str;

    async fn evaluate(
        &self,
        ctx: &PrContext,
        params: &serde_json::Value,
        adapter: &dyn ExternalAdapter,
        budget: &EvaluationBudget,
    ) -> ComparatorResult;
}

/// Registry keyed by stable comparator identifier.
#[derive(Default)]
pub struct ComparatorRegistry {
    comparators: HashMap<&'static str, Arc<dyn Comparator>>,
}

impl ComparatorRegistry {
    pub fn new() -> Self {
        Self { comparators: HashMap::new() }
    }

    pub fn register(&mut self, comparator: Arc<dyn Comparator>) {
        self.comparators.insert(comparator.id(), comparator);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Comparator>> {
        self.comparators.get(id).cloned()
    }

    /// The registry pre-populated with the built-in ten.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        library::register_builtins(&mut registry);
        registry
    }
}

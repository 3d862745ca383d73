//! Pack Evaluator and Multi-Pack Aggregator.

pub mod aggregator;
pub mod conflict;
pub mod pack_evaluator;

pub use aggregator::{aggregate, GlobalDecision, PackDecisionSummary};
pub use pack_evaluator::{evaluate_pack, Finding, PackEvaluation};

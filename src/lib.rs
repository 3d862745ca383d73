// verta-gate library: a repository-change policy gate (Track A) and
// documentation-drift remediation engine (Track B).

pub mod adapters;
pub mod budget;
pub mod checkoutput;
pub mod cli;
pub mod comparators;
pub mod conditions;
pub mod config;
pub mod dedup;
pub mod drift;
pub mod error;
pub mod evaluator;
pub mod evidence;
pub mod facts;
pub mod fetcher;
pub mod globbing;
pub mod observability;
pub mod pack;
pub mod patch;
pub mod pr_context;
pub mod shutdown;
pub mod signals;
pub mod store;
pub mod telemetry;
pub mod writeback;

pub use adapters::{fixture::FixtureAdapter, github::GitHubAdapter, ExternalAdapter};
pub use budget::{CancellationToken, EvaluationBudget};
pub use checkoutput::{conclusion_for_decision, CheckOutput};
pub use config::{config, init_config, GateConfig};
pub use dedup::{DedupIndex, DedupOutcome};
pub use error::GateError;
pub use evaluator::{aggregate, evaluate_pack, Finding, GlobalDecision, PackEvaluation};
pub use fetcher::{ArtifactFetcher, ExpansionResult, FetchedArtifact};
pub use observability::{adapter_metrics, create_workflow_span, dedup_metrics, OperationTimer};
pub use pack::model::PolicyPack;
pub use shutdown::ShutdownCoordinator;
pub use store::{memory::InMemoryStore, Store};
pub use telemetry::{create_drift_span, create_evaluation_span, generate_correlation_id, init_telemetry, shutdown_telemetry};

#[cfg(feature = "database")]
pub use store::sqlite::SqliteStore;

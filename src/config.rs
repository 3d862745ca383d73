//! Configuration for the gate.
//!
//! Layered the same way `MyLittleSodaConfig` was: built-in defaults, an
//! optional file, then environment overrides prefixed `VERTA_GATE`.

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Top-level configuration structure for the gate.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GateConfig {
    /// GitHub adapter configuration.
    pub github: GitHubConfig,
    /// Observability settings.
    pub observability: ObservabilityConfig,
    /// Per-evaluation budgets.
    pub budgets: BudgetConfig,
    /// Drift remediation tunables.
    pub drift: DriftConfig,
    /// Database settings (optional, used only with `feature = "database"`).
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubConfig {
    /// GitHub API token (can be set via env var).
    pub token: Option<String>,
    pub owner: String,
    pub repo: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub json_logs: bool,
}

/// Per-evaluation tunables, minus the ones that live on `DriftConfig`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BudgetConfig {
    pub observation_mode: ObservationMode,
    pub external_dependency_mode: ExternalDependencyMode,
    pub max_total_ms: u64,
    pub per_comparator_timeout_ms: u64,
    pub max_api_calls: u32,
    pub max_findings: u32,
    pub max_evidence_snippets_per_finding: u32,
    pub max_context_files: u32,
    pub max_file_bytes_for_expansion: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationMode {
    Observe,
    Warn,
    Enforce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalDependencyMode {
    SoftFail,
    HardFail,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DriftConfig {
    pub confidence_min_threshold: f64,
    pub auto_approve_threshold: f64,
    pub max_changed_lines: u32,
    pub retention_days: u32,
    pub lock_ttl_seconds: u64,
    pub max_transitions_per_invocation: u32,
    pub max_retry_attempts: u32,
    pub max_doc_age_days: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub auto_migrate: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            github: GitHubConfig {
                token: None,
                owner: "example-org".to_string(),
                repo: "example-repo".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: true,
            },
            budgets: BudgetConfig {
                observation_mode: ObservationMode::Warn,
                external_dependency_mode: ExternalDependencyMode::SoftFail,
                max_total_ms: 30_000,
                per_comparator_timeout_ms: 5_000,
                max_api_calls: 40,
                max_findings: 200,
                max_evidence_snippets_per_finding: 5,
                max_context_files: 3,
                max_file_bytes_for_expansion: 10 * 1024,
            },
            drift: DriftConfig {
                confidence_min_threshold: 0.40,
                auto_approve_threshold: 0.85,
                max_changed_lines: 50,
                retention_days: 90,
                lock_ttl_seconds: 30,
                max_transitions_per_invocation: 5,
                max_retry_attempts: 3,
                max_doc_age_days: 365,
            },
            database: None,
        }
    }
}

static CONFIG: OnceLock<GateConfig> = OnceLock::new();

/// Load configuration from (in order of increasing precedence): built-in
/// defaults, `gate.toml` in the working directory if present, and
/// `VERTA_GATE_*` environment variables. Idempotent; the first successful
/// call wins for the process lifetime.
pub fn init_config() -> Result<&'static GateConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }

    let defaults = GateConfig::default();
    let builder = Config::builder()
        .add_source(File::with_name("gate").required(false))
        .add_source(Environment::with_prefix("VERTA_GATE").separator("__"));

    let settled: GateConfig = match builder.build() {
        Ok(c) => c.try_deserialize().unwrap_or(defaults),
        Err(_) => defaults,
    };

    Ok(CONFIG.get_or_init(|| settled))
}

/// Access the process-wide configuration, initializing it with defaults if
/// `init_config` has not yet been called.
pub fn config() -> &'static GateConfig {
    CONFIG.get_or_init(GateConfig::default)
}

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Initialize structured tracing for the gate process.
///
/// Emits JSON log lines so a deployment can ship them to whatever log
/// aggregator it already runs; no OTLP exporter is wired here, a
/// deliberately "simplified version" of full OpenTelemetry export.
pub fn init_telemetry() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    tracing::info!("gate telemetry initialized with structured logging");
    Ok(())
}

/// Generate a correlation ID for linking one evaluation's or one drift
/// invocation's log lines together.
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span with common pack-evaluation attributes.
pub fn create_evaluation_span(
    workspace_id: &str,
    repo: &str,
    pr_number: Option<u64>,
    correlation_id: Option<&str>,
) -> tracing::Span {
    tracing::info_span!(
        "pack_evaluation",
        workspace.id = workspace_id,
        repo = repo,
        pr.number = pr_number,
        correlation.id = correlation_id,
        otel.kind = "internal"
    )
}

/// Create a span with common drift-step attributes.
pub fn create_drift_span(
    workspace_id: &str,
    drift_id: &str,
    correlation_id: Option<&str>,
) -> tracing::Span {
    tracing::info_span!(
        "drift_step",
        workspace.id = workspace_id,
        drift.id = drift_id,
        correlation.id = correlation_id,
        otel.kind = "internal"
    )
}

/// Shutdown telemetry gracefully.
pub fn shutdown_telemetry() {
    tracing::info!("gate telemetry shutdown complete");
}

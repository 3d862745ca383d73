//! Typed error taxonomy for the gate.
//!
//! Comparators and fact resolvers never return [`GateError`] — per the
//! propagation policy they resolve to `unknown` with a reason code instead.
//! This type is for everything else that is allowed to fail loudly: config
//! loading, pack validation, store I/O, and adapter calls.

use thiserror::Error;

/// One of the ten error kinds the gate's failure taxonomy distinguishes.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("timed out after {elapsed_ms}ms: {operation}")]
    Timeout { operation: String, elapsed_ms: u64 },

    #[error("budget exceeded: {0}")]
    BudgetExceeded(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unknown error: {0}")]
    Unknown(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unsafe: {0}")]
    Unsafe(String),
}

impl GateError {
    /// Stable reason code, independent of the display message, used in
    /// `Finding::evidence` and audit log entries.
    pub fn reason_code(&self) -> &'static str {
        match self {
            GateError::Validation(_) => "VALIDATION_ERROR",
            GateError::NotFound(_) => "NOT_FOUND",
            GateError::Unauthorized(_) => "UNAUTHORIZED",
            GateError::RateLimited { .. } => "RATE_LIMITED",
            GateError::Timeout { .. } => "TIMEOUT",
            GateError::BudgetExceeded(_) => "BUDGET_EXCEEDED",
            GateError::Transport(_) => "TRANSPORT",
            GateError::Unknown(_) => "UNKNOWN",
            GateError::Conflict(_) => "CONFLICT",
            GateError::Unsafe(_) => "UNSAFE",
        }
    }
}

impl From<octocrab::Error> for GateError {
    fn from(err: octocrab::Error) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. } => match source.status_code.as_u16() {
                401 | 403 => GateError::Unauthorized(source.message.clone()),
                404 => GateError::NotFound(source.message.clone()),
                409 => GateError::Conflict(source.message.clone()),
                429 => GateError::RateLimited { retry_after_ms: 60_000 },
                _ => GateError::Transport(source.message.clone()),
            },
            other => GateError::Transport(other.to_string()),
        }
    }
}

impl From<std::io::Error> for GateError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => GateError::NotFound(err.to_string()),
            std::io::ErrorKind::TimedOut => GateError::Timeout {
                operation: "io".to_string(),
                elapsed_ms: 0,
            },
            _ => GateError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for GateError {
    fn from(err: serde_json::Error) -> Self {
        GateError::Validation(err.to_string())
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for GateError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => GateError::NotFound("row not found".to_string()),
            other => GateError::Transport(other.to_string()),
        }
    }
}

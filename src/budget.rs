//! Per-evaluation budget and cancellation.
//!
//! Generalized from `http::client`'s process-wide `governor::RateLimiter`
//! (steady-state GitHub API throttling) to a scoped counter: a policy
//! evaluation's budget resets every evaluation rather than refilling over
//! time, so a standing rate limiter is the wrong shape here — this is a
//! plain atomic counter plus a deadline instead.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::GateError;

/// Cooperative cancellation token. Shared between the top-level evaluation
/// and every child scope (one per rule) — the evaluator owns the
/// top-level token and scopes child tokens per rule.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// A child scope shares the same cancellation flag: cancelling a
    /// parent cancels every child, but a child has no way to cancel its
    /// parent.
    pub fn child(&self) -> Self {
        self.clone()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks `maxTotalMs`, `perComparatorTimeoutMs`, and `maxApiCalls` for one
/// pack evaluation.
#[derive(Debug)]
pub struct EvaluationBudget {
    deadline: Instant,
    per_comparator_timeout: Duration,
    max_api_calls: u32,
    api_calls_used: AtomicU32,
    token: CancellationToken,
}

impl EvaluationBudget {
    pub fn new(max_total_ms: u64, per_comparator_timeout_ms: u64, max_api_calls: u32) -> Self {
        Self {
            deadline: Instant::now() + Duration::from_millis(max_total_ms),
            per_comparator_timeout: Duration::from_millis(per_comparator_timeout_ms),
            max_api_calls,
            api_calls_used: AtomicU32::new(0),
            token: CancellationToken::new(),
        }
    }

    pub fn from_config(cfg: &crate::config::BudgetConfig) -> Self {
        Self::new(cfg.max_total_ms, cfg.per_comparator_timeout_ms, cfg.max_api_calls)
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn per_comparator_timeout(&self) -> Duration {
        self.per_comparator_timeout
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline || self.token.is_cancelled()
    }

    /// Reserve one outbound call against the budget. Fails fast with
    /// `BUDGET_EXCEEDED` once the cap is hit; does not itself perform the
    /// call.
    pub fn reserve_api_call(&self) -> Result<(), GateError> {
        if self.is_expired() {
            self.token.cancel();
            return Err(GateError::BudgetExceeded(
                "evaluation wall-clock budget exhausted".to_string(),
            ));
        }
        let used = self.api_calls_used.fetch_add(1, Ordering::SeqCst) + 1;
        if used > self.max_api_calls {
            self.token.cancel();
            return Err(GateError::BudgetExceeded(format!(
                "max_api_calls ({}) exceeded",
                self.max_api_calls
            )));
        }
        Ok(())
    }

    pub fn api_calls_used(&self) -> u32 {
        self.api_calls_used.load(Ordering::SeqCst)
    }

    /// Run a future under the per-comparator timeout, additionally bailing
    /// early if the token is already cancelled.
    pub async fn run_with_timeout<F, T>(&self, fut: F) -> Result<T, GateError>
    where
        F: std::future::Future<Output = T>,
    {
        self.run_with_timeout_override(self.per_comparator_timeout, fut).await
    }

    /// Like [`Self::run_with_timeout`], but with a pack-supplied timeout
    /// that can only tighten the operator ceiling, never loosen it — a pack
    /// cannot grant itself more time than the workspace operator allows.
    pub async fn run_with_timeout_override<F, T>(&self, timeout: Duration, fut: F) -> Result<T, GateError>
    where
        F: std::future::Future<Output = T>,
    {
        if self.token.is_cancelled() {
            return Err(GateError::Unknown("CANCELLED".to_string()));
        }
        let effective = timeout.min(self.per_comparator_timeout);
        match tokio::time::timeout(effective, fut).await {
            Ok(v) => Ok(v),
            Err(_) => Err(GateError::Timeout {
                operation: "comparator".to_string(),
                elapsed_ms: effective.as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_api_call_fails_fast_past_cap() {
        let budget = EvaluationBudget::new(60_000, 5_000, 2);
        assert!(budget.reserve_api_call().is_ok());
        assert!(budget.reserve_api_call().is_ok());
        let err = budget.reserve_api_call().unwrap_err();
        assert_eq!(err.reason_code(), "BUDGET_EXCEEDED");
        assert!(budget.token().is_cancelled());
    }

    #[test]
    fn child_token_shares_cancellation() {
        let token = CancellationToken::new();
        let child = token.child();
        token.cancel();
        assert!(child.is_cancelled());
    }
}

//! Failure-class taxonomy and backoff.

use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    Timeout,
    RateLimited,
    ServiceUnavailable,
    NeedsDocMapping,
    NeedsOwnerMapping,
    NoManagedRegion,
    MultiplePrimaryDocs,
    PatchValidationFailed,
    UnsafePatch,
    SecretsDetected,
    PatchTooLarge,
    OutOfScope,
    RevisionMismatch,
    DocConflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Retryable,
    Configuration,
    Safety,
    Concurrency,
}

impl FailureCode {
    pub fn class(self) -> FailureClass {
        match self {
            FailureCode::Timeout | FailureCode::RateLimited | FailureCode::ServiceUnavailable => FailureClass::Retryable,
            FailureCode::NeedsDocMapping
            | FailureCode::NeedsOwnerMapping
            | FailureCode::NoManagedRegion
            | FailureCode::MultiplePrimaryDocs => FailureClass::Configuration,
            FailureCode::PatchValidationFailed
            | FailureCode::UnsafePatch
            | FailureCode::SecretsDetected
            | FailureCode::PatchTooLarge
            | FailureCode::OutOfScope => FailureClass::Safety,
            FailureCode::RevisionMismatch | FailureCode::DocConflict => FailureClass::Concurrency,
        }
    }
}

/// Jittered exponential backoff: `base * 2^attempt`, capped, with up to
/// ±25% jitter so many drifts retrying at once don't thunder-herd the
/// same downstream system.
pub fn backoff_for_attempt(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let exp = base.saturating_mul(1u32 << attempt.min(16));
    let capped = exp.min(cap);
    let jitter_frac = rand::rng().random_range(-0.25f64..=0.25f64);
    let millis = (capped.as_millis() as f64 * (1.0 + jitter_frac)).max(0.0);
    Duration::from_millis(millis as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classes_are_partitioned_correctly() {
        assert_eq!(FailureCode::Timeout.class(), FailureClass::Retryable);
        assert_eq!(FailureCode::RateLimited.class(), FailureClass::Retryable);
        assert_eq!(FailureCode::ServiceUnavailable.class(), FailureClass::Retryable);
    }

    #[test]
    fn configuration_classes_are_partitioned_correctly() {
        assert_eq!(FailureCode::NeedsDocMapping.class(), FailureClass::Configuration);
        assert_eq!(FailureCode::NoManagedRegion.class(), FailureClass::Configuration);
    }

    #[test]
    fn backoff_is_bounded_by_cap() {
        let cap = Duration::from_secs(30);
        for attempt in 0..20 {
            let d = backoff_for_attempt(attempt, Duration::from_millis(500), cap);
            assert!(d <= cap + cap / 4);
        }
    }
}

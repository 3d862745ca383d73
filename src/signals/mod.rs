//! Signal Normalizers.
//!
//! Converts inbound events from each upstream source into one uniform
//! shape. Grounded on `github::types`'s webhook-payload-to-domain-type
//! conversion idiom (plain `From`/constructor
//! functions per payload shape, no trait-object dispatch needed since the
//! source type set is small and fixed).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    GithubPr,
    PagerdutyIncident,
    SlackCluster,
    DatadogAlert,
    GrafanaAlert,
    GithubIac,
    GithubCodeowners,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Immutable append record. `raw_payload` is kept as an opaque
/// JSON blob — normalizers only promise to fill `extracted` consistently
/// per `source_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalEvent {
    pub workspace_id: String,
    pub id: String,
    pub source_type: SourceType,
    pub occurred_at: chrono::DateTime<chrono::Utc>,
    pub raw_payload: serde_json::Value,
    pub extracted: ExtractedSignal,
    pub severity: Severity,
    pub service: Option<String>,
}

/// The normalized fields every downstream stage (dedup, evidence builder)
/// actually reads, regardless of source type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedSignal {
    pub title: String,
    pub summary: String,
    pub key_tokens: Vec<String>,
    pub referenced_paths: Vec<String>,
    pub referenced_services: Vec<String>,
}

/// Transport-layer dedup key:
/// `(workspaceId, sourceType, eventId)`.
pub fn transport_dedup_key(workspace_id: &str, source_type: SourceType, event_id: &str) -> String {
    format!("{workspace_id}:{source_type:?}:{event_id}")
}

/// Bounded tokenizer shared by every normalizer: lowercases, splits on
/// non-alphanumerics, drops short/common tokens, caps the output so a
/// pathological payload cannot blow up downstream fingerprinting.
fn extract_key_tokens(text: &str) -> Vec<String> {
    const MAX_TOKENS: usize = 32;
    const MIN_LEN: usize = 3;
    let mut tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .map(|t| t.to_lowercase())
        .filter(|t| t.len() >= MIN_LEN)
        .collect();
    tokens.dedup();
    tokens.truncate(MAX_TOKENS);
    tokens
}

pub mod github_pr {
    use super::*;

    pub fn normalize(
        workspace_id: &str,
        event_id: &str,
        occurred_at: chrono::DateTime<chrono::Utc>,
        pr_title: &str,
        pr_body: &str,
        changed_paths: &[String],
        raw_payload: serde_json::Value,
    ) -> SignalEvent {
        let mut key_tokens = extract_key_tokens(pr_title);
        key_tokens.extend(extract_key_tokens(pr_body));
        SignalEvent {
            workspace_id: workspace_id.to_string(),
            id: event_id.to_string(),
            source_type: SourceType::GithubPr,
            occurred_at,
            raw_payload,
            extracted: ExtractedSignal {
                title: pr_title.to_string(),
                summary: pr_body.chars().take(280).collect(),
                key_tokens,
                referenced_paths: changed_paths.to_vec(),
                referenced_services: vec![],
            },
            severity: Severity::Info,
            service: None,
        }
    }
}

pub mod pagerduty_incident {
    use super::*;

    pub fn normalize(
        workspace_id: &str,
        event_id: &str,
        occurred_at: chrono::DateTime<chrono::Utc>,
        title: &str,
        description: &str,
        urgency_is_high: bool,
        service: Option<String>,
        raw_payload: serde_json::Value,
    ) -> SignalEvent {
        SignalEvent {
            workspace_id: workspace_id.to_string(),
            id: event_id.to_string(),
            source_type: SourceType::PagerdutyIncident,
            occurred_at,
            raw_payload,
            extracted: ExtractedSignal {
                title: title.to_string(),
                summary: description.chars().take(280).collect(),
                key_tokens: extract_key_tokens(&format!("{title} {description}")),
                referenced_paths: vec![],
                referenced_services: service.clone().into_iter().collect(),
            },
            severity: if urgency_is_high { Severity::Critical } else { Severity::Warning },
            service,
        }
    }
}

pub mod slack_cluster {
    use super::*;

    pub fn normalize(
        workspace_id: &str,
        event_id: &str,
        occurred_at: chrono::DateTime<chrono::Utc>,
        messages: &[String],
        channel_service: Option<String>,
        raw_payload: serde_json::Value,
    ) -> SignalEvent {
        let joined = messages.join(" ");
        SignalEvent {
            workspace_id: workspace_id.to_string(),
            id: event_id.to_string(),
            source_type: SourceType::SlackCluster,
            occurred_at,
            raw_payload,
            extracted: ExtractedSignal {
                title: messages.first().cloned().unwrap_or_default(),
                summary: joined.chars().take(280).collect(),
                key_tokens: extract_key_tokens(&joined),
                referenced_paths: vec![],
                referenced_services: channel_service.clone().into_iter().collect(),
            },
            severity: Severity::Info,
            service: channel_service,
        }
    }
}

pub mod alert {
    use super::*;

    /// Shared by `datadog_alert` and `grafana_alert` — both are
    /// threshold-style monitoring alerts with the same normalized shape.
    pub fn normalize(
        workspace_id: &str,
        event_id: &str,
        occurred_at: chrono::DateTime<chrono::Utc>,
        source_type: SourceType,
        alert_name: &str,
        message: &str,
        is_critical: bool,
        service: Option<String>,
        raw_payload: serde_json::Value,
    ) -> SignalEvent {
        debug_assert!(matches!(source_type, SourceType::DatadogAlert | SourceType::GrafanaAlert));
        SignalEvent {
            workspace_id: workspace_id.to_string(),
            id: event_id.to_string(),
            source_type,
            occurred_at,
            raw_payload,
            extracted: ExtractedSignal {
                title: alert_name.to_string(),
                summary: message.chars().take(280).collect(),
                key_tokens: extract_key_tokens(&format!("{alert_name} {message}")),
                referenced_paths: vec![],
                referenced_services: service.clone().into_iter().collect(),
            },
            severity: if is_critical { Severity::Critical } else { Severity::Warning },
            service,
        }
    }
}

pub mod iac_and_codeowners {
    use super::*;

    pub fn normalize(
        workspace_id: &str,
        event_id: &str,
        occurred_at: chrono::DateTime<chrono::Utc>,
        source_type: SourceType,
        title: &str,
        changed_paths: &[String],
        raw_payload: serde_json::Value,
    ) -> SignalEvent {
        debug_assert!(matches!(source_type, SourceType::GithubIac | SourceType::GithubCodeowners));
        SignalEvent {
            workspace_id: workspace_id.to_string(),
            id: event_id.to_string(),
            source_type,
            occurred_at,
            raw_payload,
            extracted: ExtractedSignal {
                title: title.to_string(),
                summary: String::new(),
                key_tokens: extract_key_tokens(title),
                referenced_paths: changed_paths.to_vec(),
                referenced_services: vec![],
            },
            severity: Severity::Info,
            service: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_dedup_key_is_stable() {
        let a = transport_dedup_key("ws", SourceType::GithubPr, "evt-1");
        let b = transport_dedup_key("ws", SourceType::GithubPr, "evt-1");
        assert_eq!(a, b);
    }

    #[test]
    fn key_tokens_are_bounded() {
        let huge = "word ".repeat(1000);
        let tokens = extract_key_tokens(&huge);
        assert!(tokens.len() <= 32);
    }
}

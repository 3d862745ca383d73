use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;

use super::Command;
use crate::config::config;
use crate::drift::state_machine::advance;
use crate::drift::state_machine::DriftEvent;
use crate::store::{AuditEvent, AuditEventKind, Store};
use crate::store::memory::InMemoryStore;
#[cfg(feature = "database")]
use crate::store::sqlite::SqliteStore;

pub struct DriftStepCommand {
    pub workspace: String,
    pub id: String,
    pub event_path: String,
    pub fixture: bool,
}

impl DriftStepCommand {
    pub fn new(workspace: String, id: String, event_path: String, fixture: bool) -> Self {
        Self { workspace, id, event_path, fixture }
    }

    async fn store(&self) -> Result<Arc<dyn Store>> {
        if self.fixture {
            return Ok(Arc::new(InMemoryStore::new()));
        }
        #[cfg(feature = "database")]
        {
            let cfg = config();
            let db = cfg.database.as_ref().context("no [database] section configured; pass --fixture or set one")?;
            let store = SqliteStore::new(&db.url, db.auto_migrate).await?;
            return Ok(Arc::new(store));
        }
        #[cfg(not(feature = "database"))]
        anyhow::bail!("built without the `database` feature; pass --fixture")
    }
}

#[async_trait::async_trait]
impl Command for DriftStepCommand {
    async fn execute(&self) -> Result<()> {
        let store = self.store().await?;

        let raw = std::fs::read_to_string(&self.event_path).with_context(|| format!("reading {}", self.event_path))?;
        let event: DriftEvent = serde_json::from_str(&raw)?;

        let mut candidate = store
            .get_drift_candidate(&self.workspace, &self.id)
            .await?
            .with_context(|| format!("no drift candidate {} in workspace {}", self.id, self.workspace))?;

        let from = candidate.state;
        let (next, attempt, last_error) = advance(candidate.state, candidate.attempt, &event);
        candidate.state = next;
        candidate.attempt = attempt;
        candidate.last_error = last_error;
        candidate.updated_at = Utc::now();

        store.put_drift_candidate(candidate.clone()).await?;
        if next != from {
            store
                .append_audit_event(AuditEvent {
                    workspace_id: self.workspace.clone(),
                    timestamp: Utc::now(),
                    event_id: uuid::Uuid::new_v4().to_string(),
                    kind: AuditEventKind::StateTransition {
                        drift_id: self.id.clone(),
                        from: format!("{from:?}"),
                        to: format!("{next:?}"),
                    },
                })
                .await?;
        }

        println!("{}", serde_json::to_string_pretty(&candidate)?);
        Ok(())
    }
}

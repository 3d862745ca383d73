//! SQLite-backed [`Store`],
//! `feature = "database"`. Grounded on
//! `database::DatabaseManager` (sqlx raw queries against a migrated
//! `SqlitePool`), retargeted from agent-coordination tables to the
//! gate's own schema: an append-only `audit_log` plus one table per
//! mutable aggregate, each row holding its JSON-serialized value so the
//! store doesn't need a second, hand-maintained column set per field.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use super::{AuditEvent, FingerprintTier, Store};
use crate::drift::{DocMapping, DriftCandidate};
use crate::error::GateError;
use crate::evidence::EvidenceBundle;
use crate::patch::PatchProposal;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(database_url: &str, auto_migrate: bool) -> Result<Self, GateError> {
        use sqlx::migrate::MigrateDatabase;
        if !sqlx::Sqlite::database_exists(database_url).await.unwrap_or(false) {
            sqlx::Sqlite::create_database(database_url).await?;
        }
        let pool = SqlitePool::connect(database_url).await?;
        if auto_migrate {
            Self::ensure_schema(&pool).await?;
        }
        Ok(Self { pool })
    }

    async fn ensure_schema(pool: &SqlitePool) -> Result<(), GateError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit_log (
                workspace_id TEXT NOT NULL,
                event_id TEXT NOT NULL,
                occurred_at TEXT NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (workspace_id, occurred_at, event_id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS drift_candidates (
                workspace_id TEXT NOT NULL,
                id TEXT NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (workspace_id, id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS patch_proposals (
                id TEXT PRIMARY KEY,
                payload TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS doc_mappings (
                workspace_id TEXT NOT NULL,
                service TEXT NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (workspace_id, service)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS evidence_bundles (
                bundle_id TEXT PRIMARY KEY,
                fingerprint_strict TEXT NOT NULL,
                fingerprint_medium TEXT NOT NULL,
                fingerprint_broad TEXT NOT NULL,
                payload TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn append_audit_event(&self, event: AuditEvent) -> Result<(), GateError> {
        let payload = serde_json::to_string(&event)?;
        sqlx::query("INSERT INTO audit_log (workspace_id, event_id, occurred_at, payload) VALUES (?1, ?2, ?3, ?4)")
            .bind(&event.workspace_id)
            .bind(&event.event_id)
            .bind(event.timestamp.to_rfc3339())
            .bind(payload)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_drift_candidate(&self, workspace_id: &str, id: &str) -> Result<Option<DriftCandidate>, GateError> {
        let row = sqlx::query("SELECT payload FROM drift_candidates WHERE workspace_id = ?1 AND id = ?2")
            .bind(workspace_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| serde_json::from_str(r.get::<String, _>("payload").as_str()).map_err(GateError::from))
            .transpose()
    }

    async fn put_drift_candidate(&self, candidate: DriftCandidate) -> Result<(), GateError> {
        let payload = serde_json::to_string(&candidate)?;
        sqlx::query("INSERT OR REPLACE INTO drift_candidates (workspace_id, id, payload) VALUES (?1, ?2, ?3)")
            .bind(&candidate.workspace_id)
            .bind(&candidate.id)
            .bind(payload)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_open_drift_candidates(&self, workspace_id: &str) -> Result<Vec<DriftCandidate>, GateError> {
        let rows = sqlx::query("SELECT payload FROM drift_candidates WHERE workspace_id = ?1")
            .bind(workspace_id)
            .fetch_all(&self.pool)
            .await?;
        let mut candidates = Vec::new();
        for row in rows {
            let candidate: DriftCandidate = serde_json::from_str(row.get::<String, _>("payload").as_str())?;
            if !candidate.state.is_terminal() {
                candidates.push(candidate);
            }
        }
        Ok(candidates)
    }

    async fn get_patch_proposal(&self, id: &str) -> Result<Option<PatchProposal>, GateError> {
        let row = sqlx::query("SELECT payload FROM patch_proposals WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| serde_json::from_str(r.get::<String, _>("payload").as_str()).map_err(GateError::from))
            .transpose()
    }

    async fn put_patch_proposal(&self, proposal: PatchProposal) -> Result<(), GateError> {
        let payload = serde_json::to_string(&proposal)?;
        sqlx::query("INSERT OR REPLACE INTO patch_proposals (id, payload) VALUES (?1, ?2)")
            .bind(&proposal.id)
            .bind(payload)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_doc_mapping(&self, workspace_id: &str, service: &str) -> Result<Option<DocMapping>, GateError> {
        let row = sqlx::query("SELECT payload FROM doc_mappings WHERE workspace_id = ?1 AND service = ?2")
            .bind(workspace_id)
            .bind(service)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| serde_json::from_str(r.get::<String, _>("payload").as_str()).map_err(GateError::from))
            .transpose()
    }

    async fn put_doc_mapping(&self, mapping: DocMapping) -> Result<(), GateError> {
        let payload = serde_json::to_string(&mapping)?;
        sqlx::query("INSERT OR REPLACE INTO doc_mappings (workspace_id, service, payload) VALUES (?1, ?2, ?3)")
            .bind(&mapping.workspace_id)
            .bind(&mapping.service)
            .bind(payload)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn put_evidence_bundle(&self, bundle: EvidenceBundle) -> Result<(), GateError> {
        let payload = serde_json::to_string(&bundle)?;
        sqlx::query(
            "INSERT OR REPLACE INTO evidence_bundles (bundle_id, fingerprint_strict, fingerprint_medium, fingerprint_broad, payload) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&bundle.bundle_id)
        .bind(&bundle.fingerprints.strict)
        .bind(&bundle.fingerprints.medium)
        .bind(&bundle.fingerprints.broad)
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_evidence_bundle(&self, bundle_id: &str) -> Result<Option<EvidenceBundle>, GateError> {
        let row = sqlx::query("SELECT payload FROM evidence_bundles WHERE bundle_id = ?1")
            .bind(bundle_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| serde_json::from_str(r.get::<String, _>("payload").as_str()).map_err(GateError::from))
            .transpose()
    }

    async fn find_evidence_bundle_by_fingerprint(
        &self,
        tier: FingerprintTier,
        fingerprint: &str,
    ) -> Result<Option<EvidenceBundle>, GateError> {
        let column = match tier {
            FingerprintTier::Strict => "fingerprint_strict",
            FingerprintTier::Medium => "fingerprint_medium",
            FingerprintTier::Broad => "fingerprint_broad",
        };
        let query = format!("SELECT payload FROM evidence_bundles WHERE {column} = ?1 LIMIT 1");
        let row = sqlx::query(&query).bind(fingerprint).fetch_optional(&self.pool).await?;
        row.map(|r| serde_json::from_str(r.get::<String, _>("payload").as_str()).map_err(GateError::from))
            .transpose()
    }
}

use anyhow::Result;

use super::Command;
use crate::config::config;

pub struct DoctorCommand;

#[async_trait::async_trait]
impl Command for DoctorCommand {
    async fn execute(&self) -> Result<()> {
        let cfg = config();
        println!("config: loaded");
        println!("github.owner/repo: {}/{}", cfg.github.owner, cfg.github.repo);
        match &cfg.github.token {
            Some(_) => println!("github.token: present"),
            None => println!("github.token: MISSING (set VERTA_GATE__GITHUB__TOKEN or run with --fixture)"),
        }

        match &cfg.database {
            Some(db) if cfg!(feature = "database") => {
                #[cfg(feature = "database")]
                {
                    match crate::store::sqlite::SqliteStore::new(&db.url, db.auto_migrate).await {
                        Ok(_) => println!("database: reachable ({})", db.url),
                        Err(e) => println!("database: UNREACHABLE ({e})"),
                    }
                }
                #[cfg(not(feature = "database"))]
                {
                    let _ = db;
                }
            }
            Some(_) => println!("database: configured but built without the `database` feature"),
            None => println!("database: not configured (fixture mode only)"),
        }

        println!(
            "budgets: max_total_ms={} per_comparator_timeout_ms={} max_api_calls={}",
            cfg.budgets.max_total_ms, cfg.budgets.per_comparator_timeout_ms, cfg.budgets.max_api_calls
        );
        Ok(())
    }
}

pub mod doctor_cmd;
pub mod drift_cmd;
pub mod evaluate_cmd;
pub mod pack_cmd;

/// A subcommand that can be constructed from parsed args and run.
#[async_trait::async_trait]
pub trait Command {
    async fn execute(&self) -> anyhow::Result<()>;
}

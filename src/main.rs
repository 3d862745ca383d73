use anyhow::Result;
use clap::Parser;

use verta_gate::cli::commands::doctor_cmd::DoctorCommand;
use verta_gate::cli::commands::drift_cmd::DriftStepCommand;
use verta_gate::cli::commands::evaluate_cmd::EvaluateCommand;
use verta_gate::cli::commands::pack_cmd::{PackPublishCommand, PackValidateCommand};
use verta_gate::cli::commands::Command;
use verta_gate::cli::{Cli, Commands, DriftCommands, PackCommands};
use verta_gate::config::init_config;
use verta_gate::shutdown::ShutdownCoordinator;
use verta_gate::telemetry::{init_telemetry, shutdown_telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = init_config() {
        eprintln!("Warning: failed to initialize configuration: {e}");
    }

    if let Err(e) = init_telemetry() {
        eprintln!("Warning: failed to initialize telemetry: {e}");
    }

    let _shutdown_coordinator = ShutdownCoordinator::new();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate { pr_context, packs } => {
            EvaluateCommand::new(pr_context, packs, cli.fixture).execute().await
        }
        Commands::Drift { command: DriftCommands::Step { workspace, id, event } } => {
            DriftStepCommand::new(workspace, id, event, cli.fixture).execute().await
        }
        Commands::Pack { command: PackCommands::Validate { path } } => {
            PackValidateCommand { path }.execute().await
        }
        Commands::Pack { command: PackCommands::Publish { path } } => {
            PackPublishCommand { path }.execute().await
        }
        Commands::Doctor => DoctorCommand.execute().await,
    };

    shutdown_telemetry();

    result
}

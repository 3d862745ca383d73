//! CLI surface. `clap`-derive `Cli`/`Commands`, one module per
//! subcommand, mirroring the `cli::mod` + `cli::commands::*`
//! layout used throughout this crate (a `Command` trait with an async
//! `execute`).

use clap::{Parser, Subcommand};

pub mod commands;

#[derive(Parser)]
#[command(name = "verta-gate")]
#[command(about = "Repository-change policy gate and documentation-drift remediation engine")]
pub struct Cli {
    /// Use the in-memory fixture store/adapter instead of GitHub + sqlite.
    #[arg(long, global = true)]
    pub fixture: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate a PR context against the selected policy packs and print
    /// the resulting check output.
    Evaluate {
        /// Path to a JSON-encoded `PrContext`.
        #[arg(long)]
        pr_context: String,
        /// Paths to JSON-encoded `PolicyPack` files to consider.
        #[arg(long = "pack", required = true)]
        packs: Vec<String>,
    },
    /// Drift remediation pipeline commands.
    Drift {
        #[command(subcommand)]
        command: DriftCommands,
    },
    /// Policy pack authoring commands.
    Pack {
        #[command(subcommand)]
        command: PackCommands,
    },
    /// Diagnose local configuration and connectivity.
    Doctor,
}

#[derive(Subcommand)]
pub enum DriftCommands {
    /// Advance one drift candidate through a single state-machine step.
    Step {
        /// Workspace the candidate belongs to.
        #[arg(long, default_value = "default")]
        workspace: String,
        /// Drift candidate id.
        #[arg(long)]
        id: String,
        /// Path to a JSON-encoded `DriftEvent`.
        #[arg(long)]
        event: String,
    },
}

#[derive(Subcommand)]
pub enum PackCommands {
    /// Validate a pack file's structure and semantics.
    Validate {
        #[arg(long)]
        path: String,
    },
    /// Validate a pack file and print its content hash, as published
    /// alongside every evaluation that uses it.
    Publish {
        #[arg(long)]
        path: String,
    },
}

//! DayTask CLI - tasks and notes from the terminal
//!
//! Works offline against the local database; queued changes are replayed
//! whenever the server is reachable and the user is signed in.

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::common::open_context;
use crate::commands::{auth_cmd, note, notifications, settings, status, sync, task, watch};
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "daytask=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let global = cli.global;

    if let Commands::Watch { interval } = cli.command {
        return watch::run_watch(interval, &global).await;
    }

    let context = open_context(&global, None).await?;
    let workspace = &context.workspace;

    match cli.command {
        Commands::Task(command) => task::run_task(command, workspace).await,
        Commands::Note(command) => note::run_note(command, workspace).await,
        Commands::Login { email, password } => {
            auth_cmd::run_login(&email, password, &context).await
        }
        Commands::Register {
            username,
            email,
            password,
        } => auth_cmd::run_register(&username, &email, password, &context).await,
        Commands::Logout => auth_cmd::run_logout(&context).await,
        Commands::Sync => sync::run_sync(workspace).await,
        Commands::Status { json } => status::run_status(json, &context).await,
        Commands::Settings(command) => settings::run_settings(command, workspace).await,
        Commands::Notifications(command) => {
            notifications::run_notifications(command, workspace).await
        }
        Commands::Watch { .. } => Ok(()),
    }
}

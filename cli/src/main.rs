// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Warden CLI
//!
//! The `warden` binary is the operator's handle on the moderation engine.
//! Every invocation loads the configuration, wires a [`ModerationEngine`]
//! and runs one command against it.
//!
//! ## Commands
//!
//! - `warden config show|validate|generate` - Configuration management
//! - `warden db migrate` - Apply PostgreSQL schema migrations
//! - `warden moderator add|remove|update|get|list` - Moderator directory
//! - `warden ban add|remove|check|list` - Ban ledger
//! - `warden report create|process|get|list` - Report workflow
//! - `warden logs list` - Audit log
//! - `warden check moderator|admin|owner|permission|banned` - Authorization queries
//! - `warden maintenance expire-bans|reap-moderators|run` - Housekeeping
//!
//! With the in-memory backend, state lives only as long as one invocation.
//!
//! [`ModerationEngine`]: warden_core::ModerationEngine

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

use warden::commands::{
    self, BanCommand, CheckCommand, ConfigCommand, DbCommand, LogsCommand, MaintenanceCommand, ModeratorCommand,
    ReportCommand,
};
use warden::output::OutputFormat;

/// Warden - moderation authorization and enforcement
#[derive(Parser)]
#[command(name = "warden")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "WARDEN_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "WARDEN_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Database schema management
    #[command(name = "db")]
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },

    /// Moderator directory
    #[command(name = "moderator")]
    Moderator {
        #[command(subcommand)]
        command: ModeratorCommand,
    },

    /// Community bans
    #[command(name = "ban")]
    Ban {
        #[command(subcommand)]
        command: BanCommand,
    },

    /// Content reports
    #[command(name = "report")]
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },

    /// Moderation audit log
    #[command(name = "logs")]
    Logs {
        #[command(subcommand)]
        command: LogsCommand,
    },

    /// Authorization queries
    #[command(name = "check")]
    Check {
        #[command(subcommand)]
        command: CheckCommand,
    },

    /// Housekeeping tasks
    #[command(name = "maintenance")]
    Maintenance {
        #[command(subcommand)]
        command: MaintenanceCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    let dotenv = dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;
    if let Some(path) = dotenv {
        debug!("Loaded environment from {:?}", path);
    }

    let Some(command) = cli.command else {
        eprintln!("{}", "No command specified. Use --help for usage.".yellow());
        std::process::exit(1);
    };

    match command {
        Commands::Config { command } => commands::config::handle_command(command, cli.config, cli.format).await,
        Commands::Db { command } => commands::db::handle_command(command, cli.config).await,
        Commands::Moderator { command } => {
            let engine = commands::connect(cli.config).await?;
            commands::moderator::handle_command(command, engine, cli.format).await
        }
        Commands::Ban { command } => {
            let engine = commands::connect(cli.config).await?;
            commands::ban::handle_command(command, engine, cli.format).await
        }
        Commands::Report { command } => {
            let engine = commands::connect(cli.config).await?;
            commands::report::handle_command(command, engine, cli.format).await
        }
        Commands::Logs { command } => {
            let engine = commands::connect(cli.config).await?;
            commands::logs::handle_command(command, engine, cli.format).await
        }
        Commands::Check { command } => {
            let engine = commands::connect(cli.config).await?;
            commands::check::handle_command(command, engine, cli.format).await
        }
        Commands::Maintenance { command } => {
            let engine = commands::connect(cli.config).await?;
            commands::maintenance::handle_command(command, engine, cli.format).await
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_typed_arguments() {
        let cli = Cli::try_parse_from([
            "warden", "moderator", "update", "u1", "c1", "--by", "owner", "--role", "admin", "-p", "ban_user",
            "-p", "mute_user", "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Some(Commands::Moderator {
                command: ModeratorCommand::Update { role, permissions, .. },
            }) => {
                assert_eq!(role, Some(warden_core::domain::permission::Role::Admin));
                assert_eq!(permissions.len(), 2);
            }
            _ => panic!("expected moderator update"),
        }

        assert!(Cli::try_parse_from(["warden", "check", "permission", "u1", "c1", "fly"]).is_err());
    }
}

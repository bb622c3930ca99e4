// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use warden_core::domain::config::{ModerationConfig, StorageKind};

use crate::output::{print_json, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show effective configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./warden-config.yaml)
        #[arg(short, long, default_value = "./warden-config.yaml")]
        output: PathBuf,

        /// Include every section with comments
        #[arg(long)]
        examples: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths, format),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate {
            output,
            examples,
            force,
        } => generate(&output, examples, force),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool, format: OutputFormat) -> Result<()> {
    let config = ModerationConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if format == OutputFormat::Json {
        return print_json(&config);
    }

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. WARDEN_CONFIG_PATH: {}",
            std::env::var("WARDEN_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./warden-config.yaml");
        println!("  4. ~/.warden/config.yaml");
        println!("  5. /etc/warden/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    let spec = &config.spec;
    println!("{}", "Storage:".bold());
    match spec.storage.backend {
        StorageKind::InMemory => println!("  Backend: in-memory {}", "(state is lost on exit)".dimmed()),
        StorageKind::Postgres => {
            println!("  Backend: postgres");
            println!(
                "  Connection: {}",
                redact(spec.storage.connection_string.as_deref().unwrap_or("(none)"))
            );
            println!("  Max connections: {}", spec.storage.max_connections);
        }
    }
    println!("  Operation timeout: {:?}", spec.store.operation_timeout);
    println!();

    println!("{}", "Authorization cache:".bold());
    if spec.cache.enabled {
        println!("  Authorization TTL: {:?}", spec.cache.authorization_ttl);
        println!("  Ban TTL: {:?}", spec.cache.ban_ttl);
        println!("  Operation timeout: {:?}", spec.cache.operation_timeout);
        println!("  Max entries: {}", spec.cache.max_entries);
    } else {
        println!("  {}", "disabled".yellow());
    }
    println!();

    println!("{}", "Reports:".bold());
    println!("  Re-process policy: {:?}", spec.reports.reprocess_policy);
    println!();

    println!("{}", "Retention:".bold());
    println!("  Moderator tombstones: {:?}", spec.retention.moderator_tombstones);

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = ModerationConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: &Path, with_examples: bool, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite",
            output.display()
        );
    }

    std::fs::write(output, sample(with_examples))
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

fn sample(with_examples: bool) -> &'static str {
    if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    }
}

/// Hide the password part of a connection URL.
fn redact(connection: &str) -> String {
    let Some((scheme, rest)) = connection.split_once("://") else {
        return connection.to_string();
    };
    let Some((credentials, host)) = rest.split_once('@') else {
        return connection.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{}://{}:****@{}", scheme, user, host),
        None => connection.to_string(),
    }
}

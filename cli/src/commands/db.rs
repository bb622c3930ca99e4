// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Database schema commands

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use super::connect;

#[derive(Subcommand)]
pub enum DbCommand {
    /// Apply pending schema migrations
    Migrate,
}

pub async fn handle_command(command: DbCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        DbCommand::Migrate => migrate(config_override).await,
    }
}

async fn migrate(config_override: Option<PathBuf>) -> Result<()> {
    let engine = connect(config_override).await?;

    if engine.database().is_none() {
        println!(
            "{}",
            "In-memory storage configured; nothing to migrate".yellow()
        );
        return Ok(());
    }

    info!("Applying schema migrations");
    engine.migrate().await.context("Migration failed")?;
    println!("{}", "✓ Database schema is up to date".green());

    Ok(())
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Maintenance commands
//!
//! Intended to be run from cron or a systemd timer.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;
use tracing::info;

use warden_core::ModerationEngine;

use crate::output::{print_json, OutputFormat};

#[derive(Subcommand)]
pub enum MaintenanceCommand {
    /// Deactivate every active ban past its expiry
    ExpireBans,

    /// Permanently delete moderator tombstones past the retention window
    ReapModerators,

    /// Run every maintenance task once
    Run,
}

pub async fn handle_command(command: MaintenanceCommand, engine: ModerationEngine, format: OutputFormat) -> Result<()> {
    let maintenance = engine.maintenance();

    match command {
        MaintenanceCommand::ExpireBans => {
            let expired = maintenance.expire_bans().await?;
            info!(expired, "Ban expiry sweep finished");
            if format == OutputFormat::Json {
                return print_json(&json!({ "expired_bans": expired }));
            }
            println!("{}", format!("✓ {} expired ban(s) deactivated", expired).green());
        }
        MaintenanceCommand::ReapModerators => {
            let reaped = maintenance.reap_removed_moderators().await?;
            info!(reaped, "Moderator tombstone reaping finished");
            if format == OutputFormat::Json {
                return print_json(&json!({ "reaped_moderators": reaped }));
            }
            println!("{}", format!("✓ {} moderator tombstone(s) purged", reaped).green());
        }
        MaintenanceCommand::Run => {
            let report = maintenance.run_once().await?;
            if format == OutputFormat::Json {
                return print_json(&report);
            }
            println!("{}", "✓ Maintenance complete".green());
            println!("  Expired bans: {}", report.expired_bans);
            println!("  Reaped moderators: {}", report.reaped_moderators);
        }
    }

    Ok(())
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Warden CLI

pub mod ban;
pub mod check;
pub mod config;
pub mod db;
pub mod logs;
pub mod maintenance;
pub mod moderator;
pub mod report;

pub use self::ban::BanCommand;
pub use self::check::CheckCommand;
pub use self::config::ConfigCommand;
pub use self::db::DbCommand;
pub use self::logs::LogsCommand;
pub use self::maintenance::MaintenanceCommand;
pub use self::moderator::ModeratorCommand;
pub use self::report::ReportCommand;

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use warden_core::domain::config::ModerationConfig;
use warden_core::domain::pagination::PageRequest;
use warden_core::ModerationEngine;

/// Load configuration (discovery + env overrides) and wire the engine.
pub async fn connect(config_override: Option<PathBuf>) -> Result<ModerationEngine> {
    let config = ModerationConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;
    ModerationEngine::from_config(&config)
        .await
        .context("Failed to start moderation engine")
}

/// `--page` / `--limit` pair shared by list commands.
#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Items per page (1-100)
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

impl PageArgs {
    pub fn request(&self) -> Result<PageRequest> {
        PageRequest::new(self.page, self.limit).context("Invalid pagination")
    }
}

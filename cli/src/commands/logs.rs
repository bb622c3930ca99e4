// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Audit log commands

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use warden_core::domain::identity::{CommunityId, UserId};
use warden_core::ModerationEngine;

use super::PageArgs;
use crate::output::{mod_log_line, page_footer, print_json, OutputFormat};

#[derive(Subcommand)]
pub enum LogsCommand {
    /// List audit entries of a community, newest first
    List {
        #[arg(value_name = "COMMUNITY_ID")]
        community: String,

        /// Only entries written by this moderator
        #[arg(short, long, value_name = "USER_ID")]
        moderator: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },
}

pub async fn handle_command(command: LogsCommand, engine: ModerationEngine, format: OutputFormat) -> Result<()> {
    match command {
        LogsCommand::List {
            community,
            moderator,
            page,
        } => {
            let moderator = moderator.map(UserId::new);
            let result = engine
                .audit()
                .get_mod_logs(&CommunityId::new(community), moderator.as_ref(), page.request()?)
                .await?;
            if format == OutputFormat::Json {
                return print_json(&result);
            }
            if result.items.is_empty() {
                println!("{}", "No audit entries found".yellow());
                return Ok(());
            }
            for entry in &result.items {
                println!("  {}", mod_log_line(entry));
            }
            println!("{}", page_footer(&result).dimmed());
        }
    }

    Ok(())
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Ban ledger commands
//!
//! Commands: add, remove, check, list

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use warden_core::domain::identity::{CommunityId, UserId};
use warden_core::ModerationEngine;

use super::PageArgs;
use crate::output::{ban_term, page_footer, print_audited, print_ban, print_ban_status, print_json, OutputFormat};

#[derive(Subcommand)]
pub enum BanCommand {
    /// Ban a user from a community (replaces any active ban)
    Add {
        #[arg(value_name = "USER_ID")]
        user: String,

        #[arg(value_name = "COMMUNITY_ID")]
        community: String,

        /// Acting moderator
        #[arg(long = "by", value_name = "USER_ID")]
        by: String,

        #[arg(long)]
        reason: String,

        /// Ban length in days; omit for a permanent ban
        #[arg(short, long, value_name = "DAYS")]
        days: Option<u32>,
    },

    /// Lift the active ban
    Remove {
        #[arg(value_name = "USER_ID")]
        user: String,

        #[arg(value_name = "COMMUNITY_ID")]
        community: String,

        #[arg(long = "by", value_name = "USER_ID")]
        by: String,
    },

    /// Show whether a user is banned right now (bypasses the cache)
    Check {
        #[arg(value_name = "USER_ID")]
        user: String,

        #[arg(value_name = "COMMUNITY_ID")]
        community: String,
    },

    /// List bans of a community, newest first
    List {
        #[arg(value_name = "COMMUNITY_ID")]
        community: String,

        /// Include lifted and expired bans
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        page: PageArgs,
    },
}

pub async fn handle_command(command: BanCommand, engine: ModerationEngine, format: OutputFormat) -> Result<()> {
    let bans = engine.bans();

    match command {
        BanCommand::Add {
            user,
            community,
            by,
            reason,
            days,
        } => {
            let audited = bans
                .ban_user(&UserId::new(by), &UserId::new(user), &CommunityId::new(community), &reason, days)
                .await?;
            if format == OutputFormat::Json {
                return print_json(&audited.value);
            }
            let ban = &audited.value;
            print_audited(
                &audited,
                &format!("{} banned from {} ({})", ban.user_id, ban.community_id, ban_term(ban)),
            );
        }
        BanCommand::Remove { user, community, by } => {
            let audited = bans
                .unban_user(&UserId::new(by), &UserId::new(user), &CommunityId::new(community))
                .await?;
            if format == OutputFormat::Json {
                return print_json(&audited.value);
            }
            let ban = &audited.value;
            print_audited(&audited, &format!("{} unbanned from {}", ban.user_id, ban.community_id));
        }
        BanCommand::Check { user, community } => {
            let status = bans
                .is_user_banned(&UserId::new(user), &CommunityId::new(community))
                .await?;
            if format == OutputFormat::Json {
                return print_json(&status);
            }
            print_ban_status(status.as_ref());
        }
        BanCommand::List { community, all, page } => {
            let result = bans
                .list_bans(&CommunityId::new(community), !all, page.request()?)
                .await?;
            if format == OutputFormat::Json {
                return print_json(&result);
            }
            if result.items.is_empty() {
                println!("{}", "No bans found".yellow());
                return Ok(());
            }
            for ban in &result.items {
                print_ban(ban);
            }
            println!("{}", page_footer(&result).dimmed());
        }
    }

    Ok(())
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Moderator directory commands
//!
//! Commands: add, remove, update, get, list

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use warden_core::domain::identity::{CommunityId, UserId};
use warden_core::domain::moderator::{ModeratorStatus, ModeratorUpdate};
use warden_core::domain::permission::{Permission, PermissionSet, Role};
use warden_core::ModerationEngine;

use super::PageArgs;
use crate::output::{format_moderator_status, page_footer, print_audited, print_json, print_moderator, OutputFormat};

#[derive(Subcommand)]
pub enum ModeratorCommand {
    /// Invite a user as moderator of a community
    Add {
        #[arg(value_name = "USER_ID")]
        user: String,

        #[arg(value_name = "COMMUNITY_ID")]
        community: String,

        /// Role granted (admin, moderator, content_mod, user_mod, auto_mod)
        #[arg(short, long, default_value = "moderator")]
        role: Role,

        /// Acting user
        #[arg(long = "by", value_name = "USER_ID")]
        by: String,
    },

    /// Remove a moderator (kept as a tombstone until reaped)
    Remove {
        #[arg(value_name = "USER_ID")]
        user: String,

        #[arg(value_name = "COMMUNITY_ID")]
        community: String,

        #[arg(long = "by", value_name = "USER_ID")]
        by: String,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Change role, permissions, status or notes
    Update {
        #[arg(value_name = "USER_ID")]
        user: String,

        #[arg(value_name = "COMMUNITY_ID")]
        community: String,

        #[arg(long = "by", value_name = "USER_ID")]
        by: String,

        /// New role; resets permissions to its defaults unless --permission is given
        #[arg(short, long)]
        role: Option<Role>,

        /// Explicit permission (repeatable)
        #[arg(short, long = "permission", value_name = "PERMISSION")]
        permissions: Vec<Permission>,

        /// active, inactive or pending
        #[arg(short, long)]
        status: Option<ModeratorStatus>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Show one moderator
    Get {
        #[arg(value_name = "USER_ID")]
        user: String,

        #[arg(value_name = "COMMUNITY_ID")]
        community: String,
    },

    /// List moderators of a community, newest first
    List {
        #[arg(value_name = "COMMUNITY_ID")]
        community: String,

        #[command(flatten)]
        page: PageArgs,
    },
}

pub async fn handle_command(command: ModeratorCommand, engine: ModerationEngine, format: OutputFormat) -> Result<()> {
    let moderators = engine.moderators();

    match command {
        ModeratorCommand::Add { user, community, role, by } => {
            let audited = moderators
                .add_moderator(&UserId::new(user), &CommunityId::new(community), role, &UserId::new(by))
                .await?;
            if format == OutputFormat::Json {
                return print_json(&audited.value);
            }
            let m = &audited.value;
            print_audited(&audited, &format!("{} is now {} of {}", m.user_id, m.role, m.community_id));
        }
        ModeratorCommand::Remove { user, community, by, reason } => {
            let audited = moderators
                .remove_moderator(&CommunityId::new(community), &UserId::new(user), &UserId::new(by), reason)
                .await?;
            if format == OutputFormat::Json {
                return print_json(&audited.value);
            }
            let m = &audited.value;
            print_audited(&audited, &format!("{} removed from {}", m.user_id, m.community_id));
        }
        ModeratorCommand::Update {
            user,
            community,
            by,
            role,
            permissions,
            status,
            notes,
        } => {
            let update = ModeratorUpdate {
                role,
                permissions: explicit_permissions(permissions),
                status,
                notes,
            };
            let audited = moderators
                .update_moderator(&CommunityId::new(community), &UserId::new(user), &UserId::new(by), update)
                .await?;
            if format == OutputFormat::Json {
                return print_json(&audited.value);
            }
            print_audited(&audited, "Moderator updated");
            print_moderator(&audited.value);
        }
        ModeratorCommand::Get { user, community } => {
            let moderator = moderators
                .get_moderator(&CommunityId::new(community), &UserId::new(user))
                .await?;
            if format == OutputFormat::Json {
                return print_json(&moderator);
            }
            print_moderator(&moderator);
        }
        ModeratorCommand::List { community, page } => {
            let result = moderators
                .list_moderators(&CommunityId::new(community), page.request()?)
                .await?;
            if format == OutputFormat::Json {
                return print_json(&result);
            }
            if result.items.is_empty() {
                println!("{}", "No moderators found".yellow());
                return Ok(());
            }
            for m in &result.items {
                println!(
                    "  {} {} [{}] since {}",
                    m.user_id.as_str().bold(),
                    m.role,
                    format_moderator_status(m.status),
                    m.invited_at.format("%Y-%m-%d")
                );
            }
            println!("{}", page_footer(&result).dimmed());
        }
    }

    Ok(())
}

/// No `--permission` flags means "leave permissions alone".
fn explicit_permissions(permissions: Vec<Permission>) -> Option<PermissionSet> {
    if permissions.is_empty() {
        None
    } else {
        Some(permissions.into_iter().collect())
    }
}

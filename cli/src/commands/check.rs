// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Authorization queries, answered the way request handlers see them
//! (through the authorization cache).

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;

use warden_core::domain::identity::{CommunityId, UserId};
use warden_core::domain::permission::Permission;
use warden_core::ModerationEngine;

use crate::output::{print_ban_status, print_json, OutputFormat};

#[derive(Subcommand)]
pub enum CheckCommand {
    /// Is the user an active moderator of the community?
    Moderator {
        #[arg(value_name = "USER_ID")]
        user: String,
        #[arg(value_name = "COMMUNITY_ID")]
        community: String,
    },

    /// Is the user an active admin of the community?
    Admin {
        #[arg(value_name = "USER_ID")]
        user: String,
        #[arg(value_name = "COMMUNITY_ID")]
        community: String,
    },

    /// Is the user the community owner?
    Owner {
        #[arg(value_name = "USER_ID")]
        user: String,
        #[arg(value_name = "COMMUNITY_ID")]
        community: String,
    },

    /// Does the user hold a permission in the community?
    Permission {
        #[arg(value_name = "USER_ID")]
        user: String,
        #[arg(value_name = "COMMUNITY_ID")]
        community: String,
        /// e.g. ban_user, process_reports
        #[arg(value_name = "PERMISSION")]
        permission: Permission,
    },

    /// Is the user banned from the community?
    Banned {
        #[arg(value_name = "USER_ID")]
        user: String,
        #[arg(value_name = "COMMUNITY_ID")]
        community: String,
    },
}

pub async fn handle_command(command: CheckCommand, engine: ModerationEngine, format: OutputFormat) -> Result<()> {
    let authz = engine.authorization();

    let (question, answer) = match command {
        CheckCommand::Moderator { user, community } => {
            let (user, community) = (UserId::new(user), CommunityId::new(community));
            let answer = authz.is_moderator_or_higher(&user, &community).await?;
            (format!("{} moderates {}", user, community), answer)
        }
        CheckCommand::Admin { user, community } => {
            let (user, community) = (UserId::new(user), CommunityId::new(community));
            let answer = authz.is_admin(&user, &community).await?;
            (format!("{} administers {}", user, community), answer)
        }
        CheckCommand::Owner { user, community } => {
            let (user, community) = (UserId::new(user), CommunityId::new(community));
            let answer = engine.moderators().is_community_owner(&user, &community).await?;
            (format!("{} owns {}", user, community), answer)
        }
        CheckCommand::Permission {
            user,
            community,
            permission,
        } => {
            let (user, community) = (UserId::new(user), CommunityId::new(community));
            let answer = authz.has_permission(&user, &community, permission).await?;
            (format!("{} holds {} in {}", user, permission, community), answer)
        }
        CheckCommand::Banned { user, community } => {
            let status = authz
                .is_user_banned(&UserId::new(user), &CommunityId::new(community))
                .await?;
            if format == OutputFormat::Json {
                return print_json(&status);
            }
            print_ban_status(status.as_ref());
            return Ok(());
        }
    };

    if format == OutputFormat::Json {
        return print_json(&json!({ "question": question, "answer": answer }));
    }

    if answer {
        println!("{} {}", "yes".green().bold(), question.dimmed());
    } else {
        println!("{} {}", "no".red().bold(), question.dimmed());
    }

    Ok(())
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Moderation Audit Log Entries
//!
//! Every mutating moderation operation appends exactly one [`ModLog`]. Entries
//! are immutable once written; retention is handled outside the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::identity::{CommunityId, UserId};
use crate::domain::permission::ParseTagError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModLogId(pub Uuid);

impl ModLogId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ModLogId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ModLogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionCategory {
    Content,
    User,
    Community,
    Report,
}

/// Closed taxonomy of moderation actions recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModActionType {
    // Content
    RemovePost,
    RemoveComment,
    ApprovePost,
    ApproveComment,
    PinPost,
    UnpinPost,
    LockPost,
    UnlockPost,
    // Users
    BanUser,
    TempBanUser,
    UnbanUser,
    MuteUser,
    WarnUser,
    // Community
    AddModerator,
    RemoveModerator,
    ChangeModeratorRole,
    UpdateCommunity,
    UpdateRules,
    // Reports
    ProcessReport,
}

impl ModActionType {
    pub const ALL: [ModActionType; 19] = [
        ModActionType::RemovePost,
        ModActionType::RemoveComment,
        ModActionType::ApprovePost,
        ModActionType::ApproveComment,
        ModActionType::PinPost,
        ModActionType::UnpinPost,
        ModActionType::LockPost,
        ModActionType::UnlockPost,
        ModActionType::BanUser,
        ModActionType::TempBanUser,
        ModActionType::UnbanUser,
        ModActionType::MuteUser,
        ModActionType::WarnUser,
        ModActionType::AddModerator,
        ModActionType::RemoveModerator,
        ModActionType::ChangeModeratorRole,
        ModActionType::UpdateCommunity,
        ModActionType::UpdateRules,
        ModActionType::ProcessReport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModActionType::RemovePost => "remove_post",
            ModActionType::RemoveComment => "remove_comment",
            ModActionType::ApprovePost => "approve_post",
            ModActionType::ApproveComment => "approve_comment",
            ModActionType::PinPost => "pin_post",
            ModActionType::UnpinPost => "unpin_post",
            ModActionType::LockPost => "lock_post",
            ModActionType::UnlockPost => "unlock_post",
            ModActionType::BanUser => "ban_user",
            ModActionType::TempBanUser => "temp_ban_user",
            ModActionType::UnbanUser => "unban_user",
            ModActionType::MuteUser => "mute_user",
            ModActionType::WarnUser => "warn_user",
            ModActionType::AddModerator => "add_moderator",
            ModActionType::RemoveModerator => "remove_moderator",
            ModActionType::ChangeModeratorRole => "change_moderator_role",
            ModActionType::UpdateCommunity => "update_community",
            ModActionType::UpdateRules => "update_rules",
            ModActionType::ProcessReport => "process_report",
        }
    }

    pub fn category(&self) -> ActionCategory {
        use ModActionType::*;
        match self {
            RemovePost | RemoveComment | ApprovePost | ApproveComment | PinPost | UnpinPost
            | LockPost | UnlockPost => ActionCategory::Content,
            BanUser | TempBanUser | UnbanUser | MuteUser | WarnUser => ActionCategory::User,
            AddModerator | RemoveModerator | ChangeModeratorRole | UpdateCommunity
            | UpdateRules => ActionCategory::Community,
            ProcessReport => ActionCategory::Report,
        }
    }
}

impl fmt::Display for ModActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModActionType {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModActionType::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ParseTagError::new("moderation action", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModLog {
    pub id: ModLogId,
    pub community_id: CommunityId,
    pub moderator_id: UserId,
    pub action_type: ModActionType,
    pub target_id: Option<String>,
    pub target_type: Option<String>,
    pub reason: Option<String>,
    pub details: serde_json::Map<String, serde_json::Value>,
    pub previous_state: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl ModLog {
    pub fn new(community_id: CommunityId, moderator_id: UserId, action_type: ModActionType) -> Self {
        Self {
            id: ModLogId::new(),
            community_id,
            moderator_id,
            action_type,
            target_id: None,
            target_type: None,
            reason: None,
            details: serde_json::Map::new(),
            previous_state: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_target(mut self, target_id: impl Into<String>, target_type: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self.target_type = Some(target_type.into());
        self
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn with_previous_state(mut self, state: serde_json::Value) -> Self {
        self.previous_state = Some(state);
        self
    }
}

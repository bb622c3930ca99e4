// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Roles, Permissions and the Role-Permission Registry
//!
//! A [`Permission`] is a single tagged capability (`ban_user`,
//! `view_reports`, ...). A [`Role`] is a named bundle of default permissions.
//! The mapping between the two is a process-wide immutable table built on
//! first use and only reachable through [`default_permissions`].
//!
//! | Role | Content | Users | Community | Reports |
//! |------|---------|-------|-----------|---------|
//! | `admin` | all | all | all | all |
//! | `moderator` | all | all | `view_mod_logs` | all |
//! | `content_mod` | all | - | - | all |
//! | `user_mod` | - | all | - | all |
//! | `auto_mod` | `remove_post`, `remove_comment` | - | - | `view_reports` |

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: '{value}'")]
pub struct ParseTagError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseTagError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Coarse grouping of permissions, used for display and registry construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionGroup {
    Content,
    Users,
    Community,
    Reports,
}

/// Single named moderation capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    // Content
    RemovePost,
    RemoveComment,
    ApprovePost,
    ApproveComment,
    PinPost,
    LockPost,
    // Users
    BanUser,
    UnbanUser,
    MuteUser,
    WarnUser,
    // Community
    EditCommunity,
    ManageModerators,
    ManageRules,
    ViewModLogs,
    // Reports
    ViewReports,
    ProcessReports,
}

impl Permission {
    pub const ALL: [Permission; 16] = [
        Permission::RemovePost,
        Permission::RemoveComment,
        Permission::ApprovePost,
        Permission::ApproveComment,
        Permission::PinPost,
        Permission::LockPost,
        Permission::BanUser,
        Permission::UnbanUser,
        Permission::MuteUser,
        Permission::WarnUser,
        Permission::EditCommunity,
        Permission::ManageModerators,
        Permission::ManageRules,
        Permission::ViewModLogs,
        Permission::ViewReports,
        Permission::ProcessReports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::RemovePost => "remove_post",
            Permission::RemoveComment => "remove_comment",
            Permission::ApprovePost => "approve_post",
            Permission::ApproveComment => "approve_comment",
            Permission::PinPost => "pin_post",
            Permission::LockPost => "lock_post",
            Permission::BanUser => "ban_user",
            Permission::UnbanUser => "unban_user",
            Permission::MuteUser => "mute_user",
            Permission::WarnUser => "warn_user",
            Permission::EditCommunity => "edit_community",
            Permission::ManageModerators => "manage_moderators",
            Permission::ManageRules => "manage_rules",
            Permission::ViewModLogs => "view_mod_logs",
            Permission::ViewReports => "view_reports",
            Permission::ProcessReports => "process_reports",
        }
    }

    pub fn group(&self) -> PermissionGroup {
        match self {
            Permission::RemovePost
            | Permission::RemoveComment
            | Permission::ApprovePost
            | Permission::ApproveComment
            | Permission::PinPost
            | Permission::LockPost => PermissionGroup::Content,
            Permission::BanUser
            | Permission::UnbanUser
            | Permission::MuteUser
            | Permission::WarnUser => PermissionGroup::Users,
            Permission::EditCommunity
            | Permission::ManageModerators
            | Permission::ManageRules
            | Permission::ViewModLogs => PermissionGroup::Community,
            Permission::ViewReports | Permission::ProcessReports => PermissionGroup::Reports,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParseTagError::new("permission", s))
    }
}

/// Ordered set of permissions held by a moderator.
pub type PermissionSet = BTreeSet<Permission>;

/// Named bundle of default permissions scoped to one community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Moderator,
    ContentMod,
    UserMod,
    AutoMod,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Moderator,
        Role::ContentMod,
        Role::UserMod,
        Role::AutoMod,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::ContentMod => "content_mod",
            Role::UserMod => "user_mod",
            Role::AutoMod => "auto_mod",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ParseTagError::new("role", s))
    }
}

static REGISTRY: LazyLock<HashMap<Role, PermissionSet>> = LazyLock::new(build_registry);

fn group(g: PermissionGroup) -> impl Iterator<Item = Permission> {
    Permission::ALL.into_iter().filter(move |p| p.group() == g)
}

fn build_registry() -> HashMap<Role, PermissionSet> {
    use PermissionGroup::*;

    let admin: PermissionSet = Permission::ALL.into_iter().collect();

    let moderator: PermissionSet = group(Content)
        .chain(group(Users))
        .chain(group(Reports))
        .chain([Permission::ViewModLogs])
        .collect();

    let content_mod: PermissionSet = group(Content).chain(group(Reports)).collect();

    let user_mod: PermissionSet = group(Users).chain(group(Reports)).collect();

    let auto_mod: PermissionSet = [
        Permission::RemovePost,
        Permission::RemoveComment,
        Permission::ViewReports,
    ]
    .into_iter()
    .collect();

    HashMap::from([
        (Role::Admin, admin),
        (Role::Moderator, moderator),
        (Role::ContentMod, content_mod),
        (Role::UserMod, user_mod),
        (Role::AutoMod, auto_mod),
    ])
}

/// Default permission set for `role`.
pub fn default_permissions(role: Role) -> &'static PermissionSet {
    // Every Role variant is inserted by build_registry.
    &REGISTRY[&role]
}

/// Permissions a role change should produce: the explicit list when one is
/// supplied in the same operation, otherwise the registry defaults.
pub fn resolve_permissions(role: Role, explicit: Option<PermissionSet>) -> PermissionSet {
    explicit.unwrap_or_else(|| default_permissions(role).clone())
}

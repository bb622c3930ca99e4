// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Moderator Aggregate
//!
//! A moderator is a user granted a [`Role`] and a permission set scoped to a
//! single community. At most one live record exists per
//! `(user_id, community_id)`; removal tombstones the record (`deleted_at`)
//! and the reaper deletes tombstones once the retention window has passed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::identity::{CommunityId, UserId};
use crate::domain::permission::{
    default_permissions, resolve_permissions, ParseTagError, Permission, PermissionSet, Role,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModeratorId(pub Uuid);

impl ModeratorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ModeratorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ModeratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeratorStatus {
    Active,
    Inactive,
    Pending,
}

impl ModeratorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeratorStatus::Active => "active",
            ModeratorStatus::Inactive => "inactive",
            ModeratorStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for ModeratorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeratorStatus {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ModeratorStatus::Active),
            "inactive" => Ok(ModeratorStatus::Inactive),
            "pending" => Ok(ModeratorStatus::Pending),
            _ => Err(ParseTagError::new("moderator status", s)),
        }
    }
}

/// Cumulative activity counters, keyed by audit action tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeratorStats {
    #[serde(default)]
    pub counters_by_kind: BTreeMap<String, u64>,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl ModeratorStats {
    pub fn record(&mut self, kind: &str, at: DateTime<Utc>) {
        *self.counters_by_kind.entry(kind.to_string()).or_insert(0) += 1;
        self.last_active_at = Some(at);
    }

    pub fn total(&self) -> u64 {
        self.counters_by_kind.values().sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Moderator {
    pub id: ModeratorId,
    pub user_id: UserId,
    pub community_id: CommunityId,
    pub role: Role,
    pub permissions: PermissionSet,
    pub invited_by: UserId,
    pub invited_at: DateTime<Utc>,
    pub status: ModeratorStatus,
    pub notes: Option<String>,
    pub stats: ModeratorStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Partial update applied by `UpdateModerator`. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ModeratorUpdate {
    pub role: Option<Role>,
    pub permissions: Option<PermissionSet>,
    pub status: Option<ModeratorStatus>,
    pub notes: Option<String>,
}

impl ModeratorUpdate {
    pub fn is_empty(&self) -> bool {
        self.role.is_none()
            && self.permissions.is_none()
            && self.status.is_none()
            && self.notes.is_none()
    }
}

impl Moderator {
    /// New active moderator holding `role`'s default permissions.
    pub fn new(user_id: UserId, community_id: CommunityId, role: Role, invited_by: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: ModeratorId::new(),
            user_id,
            community_id,
            role,
            permissions: default_permissions(role).clone(),
            invited_by,
            invited_at: now,
            status: ModeratorStatus::Active,
            notes: None,
            stats: ModeratorStats::default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ModeratorStatus::Active && self.deleted_at.is_none()
    }

    pub fn is_removed(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.is_active() && self.permissions.contains(&permission)
    }

    /// The founding admin record of a community is self-invited.
    pub fn is_owner(&self) -> bool {
        self.is_active() && self.role == Role::Admin && self.invited_by == self.user_id
    }

    /// Apply a partial update. A role change resets permissions to the new
    /// role's defaults unless the same update carries explicit permissions.
    pub fn apply_update(&mut self, update: ModeratorUpdate) {
        match update.role {
            Some(role) => {
                self.permissions = resolve_permissions(role, update.permissions);
                self.role = role;
            }
            None => {
                if let Some(permissions) = update.permissions {
                    self.permissions = permissions;
                }
            }
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
        self.updated_at = Utc::now();
    }

    pub fn mark_removed(&mut self, at: DateTime<Utc>) {
        self.status = ModeratorStatus::Inactive;
        self.deleted_at = Some(at);
        self.updated_at = at;
    }

    /// Snapshot of the fields an update can change, stored as the audit
    /// entry's previous state.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "role": self.role,
            "permissions": self.permissions,
            "status": self.status,
            "notes": self.notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moderator(role: Role) -> Moderator {
        Moderator::new(UserId::from("u1"), CommunityId::from("c1"), role, UserId::from("owner"))
    }

    #[test]
    fn test_new_moderator_is_active_with_defaults() {
        let m = moderator(Role::Moderator);
        assert!(m.is_active());
        assert_eq!(&m.permissions, default_permissions(Role::Moderator));
        assert!(m.has_permission(Permission::BanUser));
        assert!(!m.is_owner());
    }

    #[test]
    fn test_role_change_resets_permissions() {
        let mut m = moderator(Role::Admin);
        m.apply_update(ModeratorUpdate {
            role: Some(Role::AutoMod),
            ..Default::default()
        });
        assert_eq!(m.role, Role::AutoMod);
        assert_eq!(&m.permissions, default_permissions(Role::AutoMod));
    }

    #[test]
    fn test_role_change_with_explicit_permissions() {
        let mut m = moderator(Role::Moderator);
        let explicit: PermissionSet = [Permission::ViewReports].into_iter().collect();
        m.apply_update(ModeratorUpdate {
            role: Some(Role::ContentMod),
            permissions: Some(explicit.clone()),
            ..Default::default()
        });
        assert_eq!(m.role, Role::ContentMod);
        assert_eq!(m.permissions, explicit);
    }

    #[test]
    fn test_inactive_moderator_holds_no_effective_permissions() {
        let mut m = moderator(Role::Admin);
        m.apply_update(ModeratorUpdate {
            status: Some(ModeratorStatus::Pending),
            ..Default::default()
        });
        assert!(!m.has_permission(Permission::BanUser));

        let mut m = moderator(Role::Admin);
        m.mark_removed(Utc::now());
        assert!(m.is_removed());
        assert!(!m.is_active());
    }

    #[test]
    fn test_self_invited_admin_is_owner() {
        let m = Moderator::new(
            UserId::from("founder"),
            CommunityId::from("c1"),
            Role::Admin,
            UserId::from("founder"),
        );
        assert!(m.is_owner());
    }

    #[test]
    fn test_stats_record() {
        let mut stats = ModeratorStats::default();
        let now = Utc::now();
        stats.record("ban_user", now);
        stats.record("ban_user", now);
        stats.record("process_report", now);
        assert_eq!(stats.counters_by_kind["ban_user"], 2);
        assert_eq!(stats.total(), 3);
        assert_eq!(stats.last_active_at, Some(now));
    }
}

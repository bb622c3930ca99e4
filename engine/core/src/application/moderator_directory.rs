// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Moderator Directory Application Service
//!
//! CRUD over community moderators plus the authoritative role and permission
//! checks the authorization cache sits in front of.
//!
//! Uniqueness of `(user_id, community_id)` is enforced by the repository's
//! atomic insert; this service never checks for an existing record before
//! inserting. Every mutation appends one audit entry:
//!
//! | Operation | Action type |
//! |-----------|-------------|
//! | `add_moderator` | `add_moderator` |
//! | `remove_moderator` | `remove_moderator` |
//! | `update_moderator` | `change_moderator_role` |

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::application::audit_log::{record_action, AuditLogService};
use crate::application::error::{with_deadline, Audited, ModerationError};
use crate::domain::identity::{CommunityId, UserId};
use crate::domain::mod_log::{ModActionType, ModLog};
use crate::domain::moderator::{Moderator, ModeratorUpdate};
use crate::domain::pagination::{PageRequest, Paginated};
use crate::domain::permission::{Permission, Role};
use crate::domain::repository::ModeratorRepository;

// ============================================================================
// Service Trait
// ============================================================================

#[async_trait]
pub trait ModeratorService: Send + Sync {
    /// Invite `user_id` into `community_id` with `role`'s default permissions.
    /// Fails with `Conflict` if the user already moderates the community.
    async fn add_moderator(
        &self,
        user_id: &UserId,
        community_id: &CommunityId,
        role: Role,
        invited_by: &UserId,
    ) -> Result<Audited<Moderator>, ModerationError>;

    /// Remove (tombstone) a moderator. Returns the record as it was.
    async fn remove_moderator(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
        removed_by: &UserId,
        reason: Option<String>,
    ) -> Result<Audited<Moderator>, ModerationError>;

    /// Partial update; returns the post-update record. `Conflict` when
    /// another update of the same record lands between the read and the write.
    async fn update_moderator(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
        updated_by: &UserId,
        update: ModeratorUpdate,
    ) -> Result<Audited<Moderator>, ModerationError>;

    async fn get_moderator(&self, community_id: &CommunityId, user_id: &UserId) -> Result<Moderator, ModerationError>;

    async fn list_moderators(
        &self,
        community_id: &CommunityId,
        page: PageRequest,
    ) -> Result<Paginated<Moderator>, ModerationError>;

    async fn has_permission(
        &self,
        user_id: &UserId,
        community_id: &CommunityId,
        permission: Permission,
    ) -> Result<bool, ModerationError>;

    async fn is_moderator_or_higher(&self, user_id: &UserId, community_id: &CommunityId) -> Result<bool, ModerationError>;

    async fn is_admin(&self, user_id: &UserId, community_id: &CommunityId) -> Result<bool, ModerationError>;

    async fn is_community_owner(&self, user_id: &UserId, community_id: &CommunityId) -> Result<bool, ModerationError>;
}

// ============================================================================
// Standard Implementation
// ============================================================================

pub struct StandardModeratorService {
    repository: Arc<dyn ModeratorRepository>,
    audit: Arc<dyn AuditLogService>,
    store_timeout: Duration,
}

impl StandardModeratorService {
    pub fn new(
        repository: Arc<dyn ModeratorRepository>,
        audit: Arc<dyn AuditLogService>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            audit,
            store_timeout,
        }
    }

    async fn find(&self, community_id: &CommunityId, user_id: &UserId) -> Result<Option<Moderator>, ModerationError> {
        with_deadline(
            self.store_timeout,
            || format!("look up moderator {} in community {}", user_id, community_id),
            self.repository.find(community_id, user_id),
        )
        .await
    }

    async fn active(&self, community_id: &CommunityId, user_id: &UserId) -> Result<Option<Moderator>, ModerationError> {
        Ok(self.find(community_id, user_id).await?.filter(Moderator::is_active))
    }
}

fn not_a_moderator(community_id: &CommunityId, user_id: &UserId) -> ModerationError {
    ModerationError::NotFound(format!("moderator {} in community {}", user_id, community_id))
}

#[async_trait]
impl ModeratorService for StandardModeratorService {
    async fn add_moderator(
        &self,
        user_id: &UserId,
        community_id: &CommunityId,
        role: Role,
        invited_by: &UserId,
    ) -> Result<Audited<Moderator>, ModerationError> {
        info!(
            "Adding moderator {} to community {} as {} (invited by {})",
            user_id, community_id, role, invited_by
        );

        let moderator = Moderator::new(user_id.clone(), community_id.clone(), role, invited_by.clone());

        with_deadline(
            self.store_timeout,
            || format!("add moderator {} to community {}", user_id, community_id),
            self.repository.insert(&moderator),
        )
        .await
        .map_err(|e| {
            if e.is_conflict() {
                ModerationError::Conflict(format!(
                    "user {} is already a moderator of community {}",
                    user_id, community_id
                ))
            } else {
                e
            }
        })?;

        let entry = ModLog::new(community_id.clone(), invited_by.clone(), ModActionType::AddModerator)
            .with_target(user_id.as_str(), "user")
            .with_detail("role", role.as_str())
            .with_detail("moderator_id", moderator.id.to_string());

        Ok(record_action(self.audit.as_ref(), moderator, entry).await)
    }

    async fn remove_moderator(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
        removed_by: &UserId,
        reason: Option<String>,
    ) -> Result<Audited<Moderator>, ModerationError> {
        info!(
            "Removing moderator {} from community {} (by {})",
            user_id, community_id, removed_by
        );

        let removed = with_deadline(
            self.store_timeout,
            || format!("remove moderator {} from community {}", user_id, community_id),
            self.repository.tombstone(community_id, user_id, Utc::now()),
        )
        .await?
        .ok_or_else(|| not_a_moderator(community_id, user_id))?;

        let entry = ModLog::new(community_id.clone(), removed_by.clone(), ModActionType::RemoveModerator)
            .with_target(user_id.as_str(), "user")
            .with_reason(reason)
            .with_detail("role", removed.role.as_str())
            .with_previous_state(removed.snapshot());

        Ok(record_action(self.audit.as_ref(), removed, entry).await)
    }

    async fn update_moderator(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
        updated_by: &UserId,
        update: ModeratorUpdate,
    ) -> Result<Audited<Moderator>, ModerationError> {
        if update.is_empty() {
            return Err(ModerationError::InvalidInput(
                "moderator update must change at least one of role, permissions, status or notes".to_string(),
            ));
        }

        let mut moderator = self
            .find(community_id, user_id)
            .await?
            .ok_or_else(|| not_a_moderator(community_id, user_id))?;

        let previous = moderator.snapshot();
        let previous_role = moderator.role;
        let read_at = moderator.updated_at;
        let new_role = update.role;

        moderator.apply_update(update);

        // Conditional on `read_at`; a concurrent update surfaces as Conflict.
        with_deadline(
            self.store_timeout,
            || format!("update moderator {} in community {}", user_id, community_id),
            self.repository.update(&moderator, read_at),
        )
        .await?;

        info!(
            "Updated moderator {} in community {} (role {} -> {}, status {})",
            user_id, community_id, previous_role, moderator.role, moderator.status
        );

        let mut entry = ModLog::new(community_id.clone(), updated_by.clone(), ModActionType::ChangeModeratorRole)
            .with_target(user_id.as_str(), "user")
            .with_detail("role", moderator.role.as_str())
            .with_detail("status", moderator.status.as_str())
            .with_detail(
                "permissions",
                moderator.permissions.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
            )
            .with_previous_state(previous);
        if new_role.is_some_and(|r| r != previous_role) {
            entry = entry.with_detail("previous_role", previous_role.as_str());
        }

        Ok(record_action(self.audit.as_ref(), moderator, entry).await)
    }

    async fn get_moderator(&self, community_id: &CommunityId, user_id: &UserId) -> Result<Moderator, ModerationError> {
        debug!("Fetching moderator {} in community {}", user_id, community_id);
        self.find(community_id, user_id)
            .await?
            .ok_or_else(|| not_a_moderator(community_id, user_id))
    }

    async fn list_moderators(
        &self,
        community_id: &CommunityId,
        page: PageRequest,
    ) -> Result<Paginated<Moderator>, ModerationError> {
        debug!("Listing moderators of community {} ({:?})", community_id, page);
        let (items, total) = with_deadline(
            self.store_timeout,
            || format!("list moderators of community {}", community_id),
            self.repository.list_by_community(community_id, page),
        )
        .await?;
        Ok(Paginated::new(items, total, page))
    }

    async fn has_permission(
        &self,
        user_id: &UserId,
        community_id: &CommunityId,
        permission: Permission,
    ) -> Result<bool, ModerationError> {
        Ok(self
            .active(community_id, user_id)
            .await?
            .is_some_and(|m| m.has_permission(permission)))
    }

    async fn is_moderator_or_higher(&self, user_id: &UserId, community_id: &CommunityId) -> Result<bool, ModerationError> {
        Ok(self.active(community_id, user_id).await?.is_some())
    }

    async fn is_admin(&self, user_id: &UserId, community_id: &CommunityId) -> Result<bool, ModerationError> {
        Ok(self
            .active(community_id, user_id)
            .await?
            .is_some_and(|m| m.role == Role::Admin))
    }

    async fn is_community_owner(&self, user_id: &UserId, community_id: &CommunityId) -> Result<bool, ModerationError> {
        Ok(self
            .active(community_id, user_id)
            .await?
            .is_some_and(|m| m.is_owner()))
    }
}

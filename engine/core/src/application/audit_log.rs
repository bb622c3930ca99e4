// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Audit Log Application Service
//!
//! Appends [`ModLog`] entries and serves the per-community history.
//!
//! Logging is observational: the action being documented has already been
//! applied when [`record_action`] runs, so a failed append turns into an
//! [`AuditWarning`] on the action's result and a `warn!` event, never into a
//! rollback.
//!
//! After a successful append the acting moderator's activity counters are
//! bumped on a best-effort basis.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::application::error::{with_deadline, AuditWarning, Audited, ModerationError};
use crate::domain::identity::{CommunityId, UserId};
use crate::domain::mod_log::ModLog;
use crate::domain::pagination::{PageRequest, Paginated};
use crate::domain::repository::{ModLogRepository, ModeratorRepository};

#[async_trait]
pub trait AuditLogService: Send + Sync {
    /// Append one entry. Fails with `Internal` when the store rejects it.
    async fn log_mod_action(&self, entry: ModLog) -> Result<ModLog, ModerationError>;

    /// Entries of a community, optionally for one acting moderator, newest first.
    async fn get_mod_logs(
        &self,
        community_id: &CommunityId,
        moderator_id: Option<&UserId>,
        page: PageRequest,
    ) -> Result<Paginated<ModLog>, ModerationError>;
}

pub struct StandardAuditLogService {
    repository: Arc<dyn ModLogRepository>,
    moderators: Option<Arc<dyn ModeratorRepository>>,
    store_timeout: Duration,
}

impl StandardAuditLogService {
    pub fn new(repository: Arc<dyn ModLogRepository>, store_timeout: Duration) -> Self {
        Self {
            repository,
            moderators: None,
            store_timeout,
        }
    }

    /// Also maintain moderator activity counters from appended entries.
    pub fn with_activity_tracking(mut self, moderators: Arc<dyn ModeratorRepository>) -> Self {
        self.moderators = Some(moderators);
        self
    }

    async fn track_activity(&self, entry: &ModLog) {
        let Some(moderators) = &self.moderators else {
            return;
        };
        let result = tokio::time::timeout(
            self.store_timeout,
            moderators.record_activity(
                &entry.community_id,
                &entry.moderator_id,
                entry.action_type.as_str(),
                entry.created_at,
            ),
        )
        .await;

        match result {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => debug!(
                "Actor {} has no moderator record in {}; activity not counted",
                entry.moderator_id, entry.community_id
            ),
            Ok(Err(e)) => warn!(
                moderator = %entry.moderator_id,
                community = %entry.community_id,
                error = %e,
                "Failed to update moderator activity counters"
            ),
            Err(_) => warn!(
                moderator = %entry.moderator_id,
                community = %entry.community_id,
                "Moderator activity update timed out"
            ),
        }
    }
}

#[async_trait]
impl AuditLogService for StandardAuditLogService {
    async fn log_mod_action(&self, entry: ModLog) -> Result<ModLog, ModerationError> {
        debug!(
            "Appending mod log {} ({}) in community {}",
            entry.id, entry.action_type, entry.community_id
        );

        with_deadline(
            self.store_timeout,
            || format!("append mod log {} ({})", entry.id, entry.action_type),
            self.repository.append(&entry),
        )
        .await
        .map_err(|e| match e {
            ModerationError::Internal(_) => e,
            // Anything else the log store reports is still an internal failure.
            other => ModerationError::Internal(other.to_string()),
        })?;

        self.track_activity(&entry).await;
        Ok(entry)
    }

    async fn get_mod_logs(
        &self,
        community_id: &CommunityId,
        moderator_id: Option<&UserId>,
        page: PageRequest,
    ) -> Result<Paginated<ModLog>, ModerationError> {
        let (items, total) = with_deadline(
            self.store_timeout,
            || format!("list mod logs of community {}", community_id),
            self.repository.list(community_id, moderator_id, page),
        )
        .await?;
        Ok(Paginated::new(items, total, page))
    }
}

/// Append `entry` for an action that already happened and attach the
/// outcome to `value`.
pub(crate) async fn record_action<T>(
    audit: &dyn AuditLogService,
    value: T,
    entry: ModLog,
) -> Audited<T> {
    let action_type = entry.action_type;
    let community_id = entry.community_id.clone();
    match audit.log_mod_action(entry).await {
        Ok(logged) => {
            info!(
                "Recorded {} by {} in community {} (log {})",
                action_type, logged.moderator_id, community_id, logged.id
            );
            Audited::logged(value, logged.id)
        }
        Err(e) => {
            warn!(
                action = %action_type,
                community = %community_id,
                error = %e,
                "Moderation action applied but its audit entry could not be written"
            );
            Audited::unlogged(
                value,
                AuditWarning {
                    action_type,
                    message: e.to_string(),
                },
            )
        }
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Ban Ledger Application Service
//!
//! Community bans with optional expiry. A pair `(user_id, community_id)` has
//! at most one active ban; banning again overwrites it in place through
//! [`BanRepository::upsert_active`].
//!
//! Expiry is lazy: [`BanService::is_user_banned`] treats a ban past its
//! `expires_at` as lifted and flips it off with a conditional update. Lazy
//! expiry is bookkeeping, not a moderator action, so it writes no audit entry.
//! [`BanService::expire_bans`] performs the same transition in bulk.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::application::audit_log::{record_action, AuditLogService};
use crate::application::error::{with_deadline, Audited, ModerationError};
use crate::domain::ban::{BanStatus, CommunityBan};
use crate::domain::identity::{CommunityId, UserId};
use crate::domain::mod_log::{ModActionType, ModLog};
use crate::domain::pagination::{PageRequest, Paginated};
use crate::domain::repository::BanRepository;

#[async_trait]
pub trait BanService: Send + Sync {
    /// Ban `user_id` from `community_id`. `None` days means permanent.
    async fn ban_user(
        &self,
        moderator_id: &UserId,
        user_id: &UserId,
        community_id: &CommunityId,
        reason: &str,
        duration_days: Option<u32>,
    ) -> Result<Audited<CommunityBan>, ModerationError>;

    /// Lift the active ban. Returns the deactivated record. A ban already
    /// past its expiry is `NotFound`: it is deactivated without an audit
    /// entry, the same as on a ban check.
    async fn unban_user(
        &self,
        moderator_id: &UserId,
        user_id: &UserId,
        community_id: &CommunityId,
    ) -> Result<Audited<CommunityBan>, ModerationError>;

    /// Ban metadata if the user is banned right now.
    async fn is_user_banned(&self, user_id: &UserId, community_id: &CommunityId) -> Result<Option<BanStatus>, ModerationError>;

    async fn list_bans(
        &self,
        community_id: &CommunityId,
        active_only: bool,
        page: PageRequest,
    ) -> Result<Paginated<CommunityBan>, ModerationError>;

    /// Deactivate every active ban past its expiry. Returns how many flipped.
    async fn expire_bans(&self) -> Result<u64, ModerationError>;
}

pub struct StandardBanService {
    repository: Arc<dyn BanRepository>,
    audit: Arc<dyn AuditLogService>,
    store_timeout: Duration,
}

impl StandardBanService {
    pub fn new(repository: Arc<dyn BanRepository>, audit: Arc<dyn AuditLogService>, store_timeout: Duration) -> Self {
        Self {
            repository,
            audit,
            store_timeout,
        }
    }

    async fn find_active(&self, user_id: &UserId, community_id: &CommunityId) -> Result<Option<CommunityBan>, ModerationError> {
        with_deadline(
            self.store_timeout,
            || format!("look up active ban of {} in community {}", user_id, community_id),
            self.repository.find_active(community_id, user_id),
        )
        .await
    }

    /// Flip an expired ban off. The ban counts as lifted whether or not the
    /// write lands, so failures are only logged.
    async fn lapse(&self, ban: &CommunityBan, now: DateTime<Utc>) {
        match tokio::time::timeout(self.store_timeout, self.repository.deactivate_if_active(ban.id, now)).await {
            Ok(Ok(true)) => {
                metrics::counter!("warden_bans_expired_total", "path" => "lazy").increment(1);
                debug!(
                    "Ban {} of {} in community {} expired; deactivated",
                    ban.id, ban.user_id, ban.community_id
                );
            }
            Ok(Ok(false)) => debug!("Ban {} was already deactivated", ban.id),
            Ok(Err(e)) => warn!(ban = %ban.id, error = %e, "Failed to deactivate expired ban"),
            Err(_) => warn!(ban = %ban.id, "Deactivating expired ban timed out"),
        }
    }
}

#[async_trait]
impl BanService for StandardBanService {
    async fn ban_user(
        &self,
        moderator_id: &UserId,
        user_id: &UserId,
        community_id: &CommunityId,
        reason: &str,
        duration_days: Option<u32>,
    ) -> Result<Audited<CommunityBan>, ModerationError> {
        if duration_days == Some(0) {
            return Err(ModerationError::InvalidInput(
                "ban duration must be at least one day; omit it for a permanent ban".to_string(),
            ));
        }
        if reason.trim().is_empty() {
            return Err(ModerationError::InvalidInput("ban reason must not be empty".to_string()));
        }

        let ban = CommunityBan::new(
            community_id.clone(),
            user_id.clone(),
            moderator_id.clone(),
            reason.to_string(),
            duration_days,
        )
        .map_err(|e| ModerationError::InvalidInput(e.to_string()))?;

        let stored = with_deadline(
            self.store_timeout,
            || format!("ban {} in community {}", user_id, community_id),
            self.repository.upsert_active(&ban),
        )
        .await?;

        match stored.expires_at {
            Some(until) => info!(
                "Banned {} from community {} until {} (by {})",
                user_id, community_id, until, moderator_id
            ),
            None => info!(
                "Banned {} from community {} permanently (by {})",
                user_id, community_id, moderator_id
            ),
        }

        let action = if duration_days.is_some() {
            ModActionType::TempBanUser
        } else {
            ModActionType::BanUser
        };
        let mut entry = ModLog::new(community_id.clone(), moderator_id.clone(), action)
            .with_target(user_id.as_str(), "user")
            .with_reason(Some(stored.reason.clone()))
            .with_detail("ban_id", stored.id.to_string());
        if let Some(days) = duration_days {
            entry = entry.with_detail("duration_days", days);
        }
        if let Some(until) = stored.expires_at {
            entry = entry.with_detail("expires_at", until.to_rfc3339());
        }

        Ok(record_action(self.audit.as_ref(), stored, entry).await)
    }

    async fn unban_user(
        &self,
        moderator_id: &UserId,
        user_id: &UserId,
        community_id: &CommunityId,
    ) -> Result<Audited<CommunityBan>, ModerationError> {
        let no_ban = || ModerationError::NotFound(format!("active ban of {} in community {}", user_id, community_id));

        let mut ban = self.find_active(user_id, community_id).await?.ok_or_else(no_ban)?;

        let now = Utc::now();
        if ban.is_expired_at(now) {
            // Already lifted by expiry; nothing for a moderator to undo.
            self.lapse(&ban, now).await;
            return Err(no_ban());
        }
        let lifted = with_deadline(
            self.store_timeout,
            || format!("unban {} in community {}", user_id, community_id),
            self.repository.deactivate_if_active(ban.id, now),
        )
        .await?;
        if !lifted {
            // Someone else lifted it between the lookup and the update.
            return Err(no_ban());
        }
        ban.is_active = false;
        ban.updated_at = now;

        info!("Unbanned {} from community {} (by {})", user_id, community_id, moderator_id);

        let entry = ModLog::new(community_id.clone(), moderator_id.clone(), ModActionType::UnbanUser)
            .with_target(user_id.as_str(), "user")
            .with_detail("ban_id", ban.id.to_string())
            .with_previous_state(serde_json::json!({
                "reason": ban.reason,
                "expires_at": ban.expires_at,
                "banned_by": ban.moderator_id,
            }));

        Ok(record_action(self.audit.as_ref(), ban, entry).await)
    }

    async fn is_user_banned(&self, user_id: &UserId, community_id: &CommunityId) -> Result<Option<BanStatus>, ModerationError> {
        let Some(ban) = self.find_active(user_id, community_id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if !ban.is_expired_at(now) {
            return Ok(Some(ban.status()));
        }

        self.lapse(&ban, now).await;
        Ok(None)
    }

    async fn list_bans(
        &self,
        community_id: &CommunityId,
        active_only: bool,
        page: PageRequest,
    ) -> Result<Paginated<CommunityBan>, ModerationError> {
        let (items, total) = with_deadline(
            self.store_timeout,
            || format!("list bans of community {}", community_id),
            self.repository.list_by_community(community_id, active_only, page),
        )
        .await?;
        Ok(Paginated::new(items, total, page))
    }

    async fn expire_bans(&self) -> Result<u64, ModerationError> {
        let expired = with_deadline(
            self.store_timeout,
            || "expire lapsed bans".to_string(),
            self.repository.deactivate_expired(Utc::now()),
        )
        .await?;
        if expired > 0 {
            metrics::counter!("warden_bans_expired_total", "path" => "sweep").increment(expired);
            info!("Deactivated {} expired ban(s)", expired);
        }
        Ok(expired)
    }
}

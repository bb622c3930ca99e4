// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Maintenance Application Service
//!
//! Housekeeping that keeps the stores tidy without changing any answer the
//! engine gives: the bulk expired-ban sweep and reaping of moderator
//! tombstones past the retention window. Neither writes audit entries.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::application::ban_ledger::BanService;
use crate::application::error::{with_deadline, ModerationError};
use crate::domain::repository::ModeratorRepository;

/// Counts from one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub expired_bans: u64,
    pub reaped_moderators: u64,
}

#[async_trait]
pub trait MaintenanceService: Send + Sync {
    async fn expire_bans(&self) -> Result<u64, ModerationError>;

    /// Delete moderator tombstones older than the retention window.
    async fn reap_removed_moderators(&self) -> Result<u64, ModerationError>;

    async fn run_once(&self) -> Result<MaintenanceReport, ModerationError> {
        Ok(MaintenanceReport {
            expired_bans: self.expire_bans().await?,
            reaped_moderators: self.reap_removed_moderators().await?,
        })
    }
}

pub struct StandardMaintenanceService {
    bans: Arc<dyn BanService>,
    moderators: Arc<dyn ModeratorRepository>,
    tombstone_retention: Duration,
    store_timeout: Duration,
}

impl StandardMaintenanceService {
    pub fn new(
        bans: Arc<dyn BanService>,
        moderators: Arc<dyn ModeratorRepository>,
        tombstone_retention: Duration,
        store_timeout: Duration,
    ) -> Self {
        Self {
            bans,
            moderators,
            tombstone_retention,
            store_timeout,
        }
    }
}

#[async_trait]
impl MaintenanceService for StandardMaintenanceService {
    async fn expire_bans(&self) -> Result<u64, ModerationError> {
        self.bans.expire_bans().await
    }

    async fn reap_removed_moderators(&self) -> Result<u64, ModerationError> {
        let retention = chrono::Duration::from_std(self.tombstone_retention)
            .map_err(|e| ModerationError::InvalidInput(format!("tombstone retention out of range: {}", e)))?;
        let cutoff = Utc::now() - retention;

        let reaped = with_deadline(
            self.store_timeout,
            || format!("reap moderator tombstones removed before {}", cutoff),
            self.moderators.purge_tombstones(cutoff),
        )
        .await?;
        if reaped > 0 {
            info!("Reaped {} moderator tombstone(s) removed before {}", reaped, cutoff);
        }
        Ok(reaped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::audit_log::StandardAuditLogService;
    use crate::application::ban_ledger::StandardBanService;
    use crate::domain::identity::{CommunityId, UserId};
    use crate::domain::moderator::Moderator;
    use crate::domain::permission::Role;
    use crate::infrastructure::repositories::{
        InMemoryBanRepository, InMemoryModLogRepository, InMemoryModeratorRepository,
    };

    fn service(retention: Duration) -> (StandardMaintenanceService, Arc<InMemoryModeratorRepository>) {
        let timeout = Duration::from_secs(1);
        let moderators = Arc::new(InMemoryModeratorRepository::new());
        let audit = Arc::new(StandardAuditLogService::new(Arc::new(InMemoryModLogRepository::new()), timeout));
        let bans = Arc::new(StandardBanService::new(Arc::new(InMemoryBanRepository::new()), audit, timeout));
        (
            StandardMaintenanceService::new(bans, moderators.clone(), retention, timeout),
            moderators,
        )
    }

    async fn seed_tombstone(repo: &InMemoryModeratorRepository, user: &str, removed_days_ago: i64) {
        let moderator = Moderator::new(UserId::from(user), CommunityId::from("c1"), Role::Moderator, UserId::from("owner"));
        repo.insert(&moderator).await.unwrap();
        repo.tombstone(
            &CommunityId::from("c1"),
            &UserId::from(user),
            Utc::now() - chrono::Duration::days(removed_days_ago),
        )
        .await
        .unwrap()
        .expect("tombstoned");
    }

    #[tokio::test]
    async fn test_reaps_only_old_tombstones() {
        let (service, repo) = service(Duration::from_secs(30 * 24 * 60 * 60));
        seed_tombstone(&repo, "old", 45).await;
        seed_tombstone(&repo, "recent", 2).await;

        let live = Moderator::new(UserId::from("live"), CommunityId::from("c1"), Role::Admin, UserId::from("live"));
        repo.insert(&live).await.unwrap();

        assert_eq!(service.reap_removed_moderators().await.unwrap(), 1);
        assert_eq!(service.reap_removed_moderators().await.unwrap(), 0);
        assert!(repo.find(&CommunityId::from("c1"), &UserId::from("live")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_run_once_with_nothing_to_do() {
        let (service, _) = service(Duration::from_secs(60));
        assert_eq!(service.run_once().await.unwrap(), MaintenanceReport::default());
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Moderation Engine
//!
//! Composition root: builds repositories, the cache store and every service
//! from a [`ModerationConfig`] and hands out shared handles to them.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use warden_core::domain::config::ModerationConfig;
//! use warden_core::ModerationEngine;
//!
//! let engine = ModerationEngine::from_config(&ModerationConfig::default()).await?;
//! let banned = engine
//!     .authorization()
//!     .is_user_banned(&"u2".into(), &"c1".into())
//!     .await?;
//! # Ok(())
//! # }
//! ```

use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use crate::application::audit_log::{AuditLogService, StandardAuditLogService};
use crate::application::authorization::{AuthorizationService, CachedAuthorizationService};
use crate::application::ban_ledger::{BanService, StandardBanService};
use crate::application::maintenance::{MaintenanceService, StandardMaintenanceService};
use crate::application::moderator_directory::{ModeratorService, StandardModeratorService};
use crate::application::report_workflow::{ReportService, StandardReportService};
use crate::application::repository_factory::Repositories;
use crate::domain::cache::CacheStore;
use crate::domain::config::ModerationConfig;
use crate::domain::repository::StorageBackend;
use crate::infrastructure::cache::{DisabledCacheStore, InMemoryCacheStore};
use crate::infrastructure::db::Database;

#[derive(Clone)]
pub struct ModerationEngine {
    config: ModerationConfig,
    database: Option<Database>,
    audit: Arc<dyn AuditLogService>,
    moderators: Arc<dyn ModeratorService>,
    bans: Arc<dyn BanService>,
    reports: Arc<dyn ReportService>,
    authorization: Arc<dyn AuthorizationService>,
    maintenance: Arc<dyn MaintenanceService>,
}

impl ModerationEngine {
    /// Connect to the configured backend and wire every service.
    pub async fn from_config(config: &ModerationConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let database = match config.spec.storage.backend()? {
            StorageBackend::InMemory => {
                info!("Using in-memory storage; state is lost on exit");
                None
            }
            StorageBackend::PostgreSQL(pg) => {
                let db = Database::new(&pg)
                    .await
                    .context("Failed to initialise PostgreSQL storage")?;
                info!("Connected to PostgreSQL (max {} connections)", pg.max_connections);
                Some(db)
            }
        };

        let repositories = Repositories::create(database.as_ref());
        Ok(Self::with_parts(config, repositories, cache_store_for(config), database))
    }

    /// In-memory engine with the given configuration.
    pub fn in_memory(config: &ModerationConfig) -> Self {
        Self::with_parts(config, Repositories::in_memory(), cache_store_for(config), None)
    }

    /// Wire services over caller-supplied repositories and cache store.
    pub fn with_parts(
        config: &ModerationConfig,
        repositories: Repositories,
        cache: Arc<dyn CacheStore>,
        database: Option<Database>,
    ) -> Self {
        let spec = &config.spec;
        let store_timeout = spec.store.operation_timeout;

        let audit: Arc<dyn AuditLogService> = Arc::new(
            StandardAuditLogService::new(repositories.mod_logs.clone(), store_timeout)
                .with_activity_tracking(repositories.moderators.clone()),
        );
        let moderators: Arc<dyn ModeratorService> = Arc::new(StandardModeratorService::new(
            repositories.moderators.clone(),
            audit.clone(),
            store_timeout,
        ));
        let bans: Arc<dyn BanService> = Arc::new(StandardBanService::new(
            repositories.bans.clone(),
            audit.clone(),
            store_timeout,
        ));
        let reports: Arc<dyn ReportService> = Arc::new(StandardReportService::new(
            repositories.reports.clone(),
            audit.clone(),
            spec.reports.reprocess_policy,
            store_timeout,
        ));
        let authorization: Arc<dyn AuthorizationService> = Arc::new(CachedAuthorizationService::new(
            moderators.clone(),
            bans.clone(),
            cache,
            spec.cache.clone(),
        ));
        let maintenance: Arc<dyn MaintenanceService> = Arc::new(StandardMaintenanceService::new(
            bans.clone(),
            repositories.moderators.clone(),
            spec.retention.moderator_tombstones,
            store_timeout,
        ));

        Self {
            config: config.clone(),
            database,
            audit,
            moderators,
            bans,
            reports,
            authorization,
            maintenance,
        }
    }

    /// Apply schema migrations when running on PostgreSQL.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        match &self.database {
            Some(db) => db.migrate().await,
            None => Ok(()),
        }
    }

    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    pub fn audit(&self) -> &Arc<dyn AuditLogService> {
        &self.audit
    }

    pub fn moderators(&self) -> &Arc<dyn ModeratorService> {
        &self.moderators
    }

    pub fn bans(&self) -> &Arc<dyn BanService> {
        &self.bans
    }

    pub fn reports(&self) -> &Arc<dyn ReportService> {
        &self.reports
    }

    pub fn authorization(&self) -> &Arc<dyn AuthorizationService> {
        &self.authorization
    }

    pub fn maintenance(&self) -> &Arc<dyn MaintenanceService> {
        &self.maintenance
    }
}

fn cache_store_for(config: &ModerationConfig) -> Arc<dyn CacheStore> {
    let cache = &config.spec.cache;
    if cache.enabled {
        Arc::new(InMemoryCacheStore::new(cache.max_entries))
    } else {
        info!("Authorization cache disabled");
        Arc::new(DisabledCacheStore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::{CommunityId, UserId};
    use crate::domain::permission::{Permission, Role};

    #[tokio::test]
    async fn test_from_default_config_is_in_memory() {
        let engine = ModerationEngine::from_config(&ModerationConfig::default()).await.unwrap();
        assert!(engine.database().is_none());
        engine.migrate().await.unwrap();

        let (u1, c1, owner) = (UserId::from("u1"), CommunityId::from("c1"), UserId::from("owner"));
        engine
            .moderators()
            .add_moderator(&u1, &c1, Role::Moderator, &owner)
            .await
            .unwrap();
        assert!(engine.authorization().has_permission(&u1, &c1, Permission::BanUser).await.unwrap());
    }

    #[tokio::test]
    async fn test_audit_entries_feed_activity_stats() {
        let engine = ModerationEngine::in_memory(&ModerationConfig::default());
        let (m1, c1, owner) = (UserId::from("m1"), CommunityId::from("c1"), UserId::from("owner"));
        engine.moderators().add_moderator(&m1, &c1, Role::Moderator, &owner).await.unwrap();

        engine
            .bans()
            .ban_user(&m1, &UserId::from("u2"), &c1, "spam", Some(3))
            .await
            .unwrap();
        engine
            .bans()
            .ban_user(&m1, &UserId::from("u3"), &c1, "spam", None)
            .await
            .unwrap();

        let stats = engine.moderators().get_moderator(&c1, &m1).await.unwrap().stats;
        assert_eq!(stats.counters_by_kind["temp_ban_user"], 1);
        assert_eq!(stats.counters_by_kind["ban_user"], 1);
        assert_eq!(stats.total(), 2);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = ModerationConfig::default();
        config.kind = "SomethingElse".to_string();
        assert!(ModerationEngine::from_config(&config).await.is_err());
    }
}

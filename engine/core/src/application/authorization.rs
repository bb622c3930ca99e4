// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Authorization Cache
//!
//! Read-through cache in front of the moderator directory and the ban ledger
//! for the four hot-path checks:
//!
//! | Check | Key | TTL (default) |
//! |-------|-----|---------------|
//! | moderator or higher | `moderator:{user}:{community}` | 5m |
//! | specific permission | `permission:{user}:{community}:{permission}` | 5m |
//! | admin | `admin:{user}:{community}` | 5m |
//! | banned | `banned:{user}:{community}` | 1m |
//!
//! Writes to the directory or ledger never invalidate entries; an answer may
//! be stale for up to its TTL. A failing or slow cache store degrades to a
//! miss and the authoritative component answers instead.

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::application::ban_ledger::BanService;
use crate::application::error::ModerationError;
use crate::application::moderator_directory::ModeratorService;
use crate::domain::ban::BanStatus;
use crate::domain::cache::{CacheKey, CacheStore, CachedBan};
use crate::domain::config::CacheConfig;
use crate::domain::identity::{CommunityId, UserId};
use crate::domain::permission::Permission;

#[async_trait]
pub trait AuthorizationService: Send + Sync {
    async fn is_moderator_or_higher(&self, user_id: &UserId, community_id: &CommunityId) -> Result<bool, ModerationError>;

    async fn has_permission(
        &self,
        user_id: &UserId,
        community_id: &CommunityId,
        permission: Permission,
    ) -> Result<bool, ModerationError>;

    async fn is_admin(&self, user_id: &UserId, community_id: &CommunityId) -> Result<bool, ModerationError>;

    /// Ban metadata if the user is banned; `None` means the user may act.
    async fn is_user_banned(&self, user_id: &UserId, community_id: &CommunityId) -> Result<Option<BanStatus>, ModerationError>;
}

pub struct CachedAuthorizationService {
    moderators: Arc<dyn ModeratorService>,
    bans: Arc<dyn BanService>,
    cache: Arc<dyn CacheStore>,
    settings: CacheConfig,
}

impl CachedAuthorizationService {
    pub fn new(
        moderators: Arc<dyn ModeratorService>,
        bans: Arc<dyn BanService>,
        cache: Arc<dyn CacheStore>,
        settings: CacheConfig,
    ) -> Self {
        Self {
            moderators,
            bans,
            cache,
            settings,
        }
    }

    /// Cached value for `key` if present, decodable and accepted by `usable`.
    async fn lookup<T: DeserializeOwned>(&self, key: &CacheKey, usable: impl Fn(&T) -> bool) -> Option<T> {
        let check = key.kind().as_str();
        let key_str = key.to_string();

        let raw = match tokio::time::timeout(self.settings.operation_timeout, self.cache.get(&key_str)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                metrics::counter!("warden_authz_cache_errors_total", "check" => check).increment(1);
                warn!(key = %key_str, error = %e, "Cache read failed, falling through");
                None
            }
            Err(_) => {
                metrics::counter!("warden_authz_cache_errors_total", "check" => check).increment(1);
                warn!(key = %key_str, timeout = ?self.settings.operation_timeout, "Cache read timed out, falling through");
                None
            }
        };

        let value = raw.and_then(|raw| match serde_json::from_str::<T>(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                metrics::counter!("warden_authz_cache_errors_total", "check" => check).increment(1);
                warn!(key = %key_str, error = %e, "Discarding undecodable cache entry");
                None
            }
        });

        match value {
            Some(value) if usable(&value) => {
                metrics::counter!("warden_authz_cache_hits_total", "check" => check).increment(1);
                debug!("Authorization cache hit for {}", key_str);
                Some(value)
            }
            _ => {
                metrics::counter!("warden_authz_cache_misses_total", "check" => check).increment(1);
                None
            }
        }
    }

    /// Best-effort write back; failures are logged and dropped.
    async fn store<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        let key_str = key.to_string();
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key = %key_str, error = %e, "Failed to encode cache entry");
                return;
            }
        };

        match tokio::time::timeout(self.settings.operation_timeout, self.cache.set(&key_str, encoded, ttl)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(key = %key_str, error = %e, "Cache write failed"),
            Err(_) => warn!(key = %key_str, "Cache write timed out"),
        }
    }

    async fn cached_flag<F>(&self, key: CacheKey, authoritative: F) -> Result<bool, ModerationError>
    where
        F: std::future::Future<Output = Result<bool, ModerationError>> + Send,
    {
        if let Some(flag) = self.lookup::<bool>(&key, |_| true).await {
            return Ok(flag);
        }
        let flag = authoritative.await?;
        self.store(&key, &flag, self.settings.authorization_ttl).await;
        Ok(flag)
    }
}

#[async_trait]
impl AuthorizationService for CachedAuthorizationService {
    async fn is_moderator_or_higher(&self, user_id: &UserId, community_id: &CommunityId) -> Result<bool, ModerationError> {
        let key = CacheKey::Moderator {
            user_id: user_id.clone(),
            community_id: community_id.clone(),
        };
        self.cached_flag(key, self.moderators.is_moderator_or_higher(user_id, community_id))
            .await
    }

    async fn has_permission(
        &self,
        user_id: &UserId,
        community_id: &CommunityId,
        permission: Permission,
    ) -> Result<bool, ModerationError> {
        let key = CacheKey::Permission {
            user_id: user_id.clone(),
            community_id: community_id.clone(),
            permission,
        };
        self.cached_flag(key, self.moderators.has_permission(user_id, community_id, permission))
            .await
    }

    async fn is_admin(&self, user_id: &UserId, community_id: &CommunityId) -> Result<bool, ModerationError> {
        let key = CacheKey::Admin {
            user_id: user_id.clone(),
            community_id: community_id.clone(),
        };
        self.cached_flag(key, self.moderators.is_admin(user_id, community_id)).await
    }

    async fn is_user_banned(&self, user_id: &UserId, community_id: &CommunityId) -> Result<Option<BanStatus>, ModerationError> {
        let key = CacheKey::Banned {
            user_id: user_id.clone(),
            community_id: community_id.clone(),
        };

        // A cached ban that has run out goes back to the ledger so it can be
        // lazily deactivated there.
        let now = Utc::now();
        if let Some(cached) = self.lookup::<CachedBan>(&key, |c| !c.has_lapsed(now)).await {
            return Ok(cached.into_status());
        }

        let status = self.bans.is_user_banned(user_id, community_id).await?;
        self.store(&key, &CachedBan::from_status(status.as_ref()), self.settings.ban_ttl)
            .await;
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::audit_log::StandardAuditLogService;
    use crate::application::ban_ledger::StandardBanService;
    use crate::application::moderator_directory::StandardModeratorService;
    use crate::domain::ban::CommunityBan;
    use crate::domain::cache::CacheError;
    use crate::domain::repository::BanRepository;
    use crate::domain::permission::Role;
    use crate::infrastructure::cache::InMemoryCacheStore;
    use crate::infrastructure::repositories::{
        InMemoryBanRepository, InMemoryModLogRepository, InMemoryModeratorRepository,
    };

    struct FailingCacheStore;

    #[async_trait]
    impl CacheStore for FailingCacheStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }
    }

    struct HangingCacheStore;

    #[async_trait]
    impl CacheStore for HangingCacheStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            futures::future::pending().await
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            futures::future::pending().await
        }
    }

    struct Harness {
        authz: CachedAuthorizationService,
        moderators: Arc<StandardModeratorService>,
        bans: Arc<StandardBanService>,
        ban_repo: Arc<InMemoryBanRepository>,
    }

    fn harness(cache: Arc<dyn CacheStore>) -> Harness {
        let timeout = Duration::from_secs(1);
        let audit = Arc::new(StandardAuditLogService::new(Arc::new(InMemoryModLogRepository::new()), timeout));
        let moderators = Arc::new(StandardModeratorService::new(
            Arc::new(InMemoryModeratorRepository::new()),
            audit.clone(),
            timeout,
        ));
        let ban_repo = Arc::new(InMemoryBanRepository::new());
        let bans = Arc::new(StandardBanService::new(ban_repo.clone(), audit, timeout));
        let authz = CachedAuthorizationService::new(moderators.clone(), bans.clone(), cache, CacheConfig::default());
        Harness {
            authz,
            moderators,
            bans,
            ban_repo,
        }
    }

    fn ids() -> (UserId, CommunityId, UserId) {
        (UserId::from("u1"), CommunityId::from("c1"), UserId::from("owner"))
    }

    #[tokio::test]
    async fn test_checks_match_directory() {
        let h = harness(Arc::new(InMemoryCacheStore::new(1_000)));
        let (u1, c1, owner) = ids();

        assert!(!h.authz.is_moderator_or_higher(&u1, &c1).await.unwrap());
        // Negative answers are cached too; use another user for the positive path.
        let u2 = UserId::from("u2");
        h.moderators.add_moderator(&u2, &c1, Role::Moderator, &owner).await.unwrap();
        assert!(h.authz.is_moderator_or_higher(&u2, &c1).await.unwrap());
        assert!(h.authz.has_permission(&u2, &c1, Permission::BanUser).await.unwrap());
        assert!(!h.authz.has_permission(&u2, &c1, Permission::ManageModerators).await.unwrap());
        assert!(!h.authz.is_admin(&u2, &c1).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_admin_answer_is_stale_until_ttl() {
        let h = harness(Arc::new(InMemoryCacheStore::new(1_000)));
        let (u1, c1, owner) = ids();
        h.moderators.add_moderator(&u1, &c1, Role::Admin, &owner).await.unwrap();

        assert!(h.authz.is_admin(&u1, &c1).await.unwrap());

        tokio::time::advance(Duration::from_secs(10)).await;
        h.moderators
            .update_moderator(
                &c1,
                &u1,
                &owner,
                crate::domain::moderator::ModeratorUpdate {
                    role: Some(Role::Moderator),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!h.moderators.is_admin(&u1, &c1).await.unwrap());

        tokio::time::advance(Duration::from_secs(50)).await;
        assert!(h.authz.is_admin(&u1, &c1).await.unwrap(), "cached answer within TTL");

        tokio::time::advance(Duration::from_secs(241)).await;
        assert!(!h.authz.is_admin(&u1, &c1).await.unwrap(), "refreshed after TTL");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ban_answers_use_shorter_ttl() {
        let h = harness(Arc::new(InMemoryCacheStore::new(1_000)));
        let (u2, c1, m1) = (UserId::from("u2"), CommunityId::from("c1"), UserId::from("m1"));

        h.bans.ban_user(&m1, &u2, &c1, "spam", None).await.unwrap();
        let status = h.authz.is_user_banned(&u2, &c1).await.unwrap().expect("banned");
        assert!(status.is_permanent);

        h.bans.unban_user(&m1, &u2, &c1).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(h.authz.is_user_banned(&u2, &c1).await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(h.authz.is_user_banned(&u2, &c1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lapsed_cached_ban_falls_through_to_ledger() {
        let cache = Arc::new(InMemoryCacheStore::new(1_000));
        let h = harness(cache.clone());
        let (u2, c1) = (UserId::from("u2"), CommunityId::from("c1"));

        let mut ban = CommunityBan::new(c1.clone(), u2.clone(), UserId::from("m1"), "spam".to_string(), Some(1)).unwrap();
        ban.expires_at = Some(Utc::now() - chrono::Duration::seconds(5));
        h.ban_repo.upsert_active(&ban).await.unwrap();

        // Entry written while the ban was still in force.
        let key = CacheKey::Banned { user_id: u2.clone(), community_id: c1.clone() };
        let stale = CachedBan::from_status(Some(&ban.status()));
        cache
            .set(&key.to_string(), serde_json::to_string(&stale).unwrap(), Duration::from_secs(60))
            .await
            .unwrap();

        assert!(h.authz.is_user_banned(&u2, &c1).await.unwrap().is_none());
        assert!(h.ban_repo.find_active(&c1, &u2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failing_cache_falls_through() {
        let h = harness(Arc::new(FailingCacheStore));
        let (u1, c1, owner) = ids();

        h.moderators.add_moderator(&u1, &c1, Role::Admin, &owner).await.unwrap();
        assert!(h.authz.is_admin(&u1, &c1).await.unwrap());
        assert!(h.authz.is_user_banned(&u1, &c1).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_cache_is_bounded_by_timeout() {
        let h = harness(Arc::new(HangingCacheStore));
        let (u1, c1, owner) = ids();

        h.moderators.add_moderator(&u1, &c1, Role::ContentMod, &owner).await.unwrap();
        assert!(h.authz.has_permission(&u1, &c1, Permission::RemovePost).await.unwrap());
        assert!(!h.authz.has_permission(&u1, &c1, Permission::BanUser).await.unwrap());
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let cache = Arc::new(InMemoryCacheStore::new(1_000));
        let h = harness(cache.clone());
        let (u1, c1, owner) = ids();
        h.moderators.add_moderator(&u1, &c1, Role::Admin, &owner).await.unwrap();

        cache
            .set("admin:u1:c1", "not json".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(h.authz.is_admin(&u1, &c1).await.unwrap());
        assert_eq!(cache.get("admin:u1:c1").await.unwrap().as_deref(), Some("true"));
    }
}

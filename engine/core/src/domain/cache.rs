// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Cache Store Abstraction
//!
//! Key-value store with per-entry TTL used by the authorization cache.
//! Values are opaque strings (JSON); the store never interprets them.
//!
//! The cache is strictly an optimization. Nothing authoritative reads from
//! it, and callers treat every [`CacheError`] as a miss.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::domain::ban::BanStatus;
use crate::domain::identity::{CommunityId, UserId};
use crate::domain::permission::Permission;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cached value for '{key}' could not be decoded: {reason}")]
    Decode { key: String, reason: String },
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fresh value for `key`, or `None` on a miss or after expiry.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
}

/// The four cached authorization checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    Moderator,
    Permission,
    Admin,
    Banned,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Moderator => "moderator",
            CheckKind::Permission => "permission",
            CheckKind::Admin => "admin",
            CheckKind::Banned => "banned",
        }
    }
}

/// Cache key `(check, user, community[, permission])`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Moderator { user_id: UserId, community_id: CommunityId },
    Permission { user_id: UserId, community_id: CommunityId, permission: Permission },
    Admin { user_id: UserId, community_id: CommunityId },
    Banned { user_id: UserId, community_id: CommunityId },
}

impl CacheKey {
    pub fn kind(&self) -> CheckKind {
        match self {
            CacheKey::Moderator { .. } => CheckKind::Moderator,
            CacheKey::Permission { .. } => CheckKind::Permission,
            CacheKey::Admin { .. } => CheckKind::Admin,
            CacheKey::Banned { .. } => CheckKind::Banned,
        }
    }
}

/// Key segment with `%` and `:` percent-encoded so ids containing the
/// separator cannot collide with another `(user, community)` pair.
struct Segment<'a>(&'a str);

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in self.0.chars() {
            match ch {
                '%' => f.write_str("%25")?,
                ':' => f.write_str("%3A")?,
                c => write!(f, "{}", c)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Moderator { user_id, community_id } => write!(
                f,
                "moderator:{}:{}",
                Segment(user_id.as_str()),
                Segment(community_id.as_str())
            ),
            CacheKey::Permission { user_id, community_id, permission } => write!(
                f,
                "permission:{}:{}:{}",
                Segment(user_id.as_str()),
                Segment(community_id.as_str()),
                permission
            ),
            CacheKey::Admin { user_id, community_id } => write!(
                f,
                "admin:{}:{}",
                Segment(user_id.as_str()),
                Segment(community_id.as_str())
            ),
            CacheKey::Banned { user_id, community_id } => write!(
                f,
                "banned:{}:{}",
                Segment(user_id.as_str()),
                Segment(community_id.as_str())
            ),
        }
    }
}

/// Serialized form of a `banned:` entry: the answer plus what is needed to
/// render a denial message without going back to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedBan {
    pub banned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub is_permanent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedBan {
    pub fn from_status(status: Option<&BanStatus>) -> Self {
        match status {
            Some(s) => Self {
                banned: true,
                reason: Some(s.reason.clone()),
                is_permanent: s.is_permanent,
                expires_at: s.expires_at,
            },
            None => Self {
                banned: false,
                reason: None,
                is_permanent: false,
                expires_at: None,
            },
        }
    }

    pub fn into_status(self) -> Option<BanStatus> {
        if !self.banned {
            return None;
        }
        Some(BanStatus {
            reason: self.reason.unwrap_or_default(),
            is_permanent: self.is_permanent,
            expires_at: self.expires_at,
        })
    }

    /// A cached positive answer whose ban has already run out.
    pub fn has_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.banned && matches!(self.expires_at, Some(at) if now > at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_scheme() {
        let u = UserId::from("u1");
        let c = CommunityId::from("c1");
        assert_eq!(
            CacheKey::Moderator { user_id: u.clone(), community_id: c.clone() }.to_string(),
            "moderator:u1:c1"
        );
        assert_eq!(
            CacheKey::Permission {
                user_id: u.clone(),
                community_id: c.clone(),
                permission: Permission::BanUser
            }
            .to_string(),
            "permission:u1:c1:ban_user"
        );
        assert_eq!(CacheKey::Admin { user_id: u.clone(), community_id: c.clone() }.to_string(), "admin:u1:c1");
        assert_eq!(CacheKey::Banned { user_id: u, community_id: c }.to_string(), "banned:u1:c1");
    }

    #[test]
    fn test_separator_in_ids_does_not_collide() {
        let left = CacheKey::Admin {
            user_id: UserId::from("a"),
            community_id: CommunityId::from("b:c"),
        };
        let right = CacheKey::Admin {
            user_id: UserId::from("a:b"),
            community_id: CommunityId::from("c"),
        };
        assert_ne!(left.to_string(), right.to_string());
        assert_eq!(left.to_string(), "admin:a:b%3Ac");
        assert_eq!(right.to_string(), "admin:a%3Ab:c");

        // An id that already looks escaped stays distinct too.
        let escaped = CacheKey::Admin {
            user_id: UserId::from("a%3Ab"),
            community_id: CommunityId::from("c"),
        };
        assert_eq!(escaped.to_string(), "admin:a%253Ab:c");
    }

    #[test]
    fn test_cached_ban_serialization() {
        let negative = serde_json::to_string(&CachedBan::from_status(None)).unwrap();
        assert_eq!(negative, r#"{"banned":false,"is_permanent":false}"#);

        let status = BanStatus {
            reason: "spam".to_string(),
            is_permanent: true,
            expires_at: None,
        };
        let cached = CachedBan::from_status(Some(&status));
        let decoded: CachedBan = serde_json::from_str(&serde_json::to_string(&cached).unwrap()).unwrap();
        assert_eq!(decoded.into_status(), Some(status));
    }

    #[test]
    fn test_lapsed() {
        let now = Utc::now();
        let cached = CachedBan {
            banned: true,
            reason: Some("spam".to_string()),
            is_permanent: false,
            expires_at: Some(now - chrono::Duration::seconds(1)),
        };
        assert!(cached.has_lapsed(now));
        assert!(!CachedBan::from_status(None).has_lapsed(now));
    }
}

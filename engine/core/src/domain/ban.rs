// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::identity::{CommunityId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BanId(pub Uuid);

impl BanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ban of one user from one community.
///
/// Permanent if and only if `expires_at` is `None`. Only one record per
/// `(user_id, community_id)` may be active; banning again overwrites it.
/// Upper bound on `duration_days`; the ledger column is a signed 32-bit integer.
pub const MAX_BAN_DURATION_DAYS: u32 = i32::MAX as u32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BanDurationError {
    #[error("ban duration of {0} days is out of range")]
    OutOfRange(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityBan {
    pub id: BanId,
    pub community_id: CommunityId,
    pub user_id: UserId,
    pub moderator_id: UserId,
    pub reason: String,
    pub duration_days: Option<u32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommunityBan {
    /// New active ban starting now. Fails when the expiry would not fit
    /// the ledger or the calendar.
    pub fn new(
        community_id: CommunityId,
        user_id: UserId,
        moderator_id: UserId,
        reason: String,
        duration_days: Option<u32>,
    ) -> Result<Self, BanDurationError> {
        let now = Utc::now();
        let expires_at = match duration_days {
            Some(days) if days > MAX_BAN_DURATION_DAYS => return Err(BanDurationError::OutOfRange(days)),
            Some(days) => Some(
                now.checked_add_signed(Duration::days(i64::from(days)))
                    .ok_or(BanDurationError::OutOfRange(days))?,
            ),
            None => None,
        };
        Ok(Self {
            id: BanId::new(),
            community_id,
            user_id,
            moderator_id,
            reason,
            duration_days,
            expires_at,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_permanent(&self) -> bool {
        self.expires_at.is_none()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if now > expires_at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn status(&self) -> BanStatus {
        BanStatus {
            reason: self.reason.clone(),
            is_permanent: self.is_permanent(),
            expires_at: self.expires_at,
        }
    }
}

/// Metadata returned by `IsUserBanned` for a ban still in force.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanStatus {
    pub reason: String,
    pub is_permanent: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl BanStatus {
    /// Message shown to a banned user trying to act in the community.
    pub fn denial_message(&self) -> String {
        match self.expires_at {
            Some(until) if !self.is_permanent => format!(
                "You are banned from this community until {}. Reason: {}",
                until.format("%Y-%m-%d %H:%M UTC"),
                self.reason
            ),
            _ => format!(
                "You are permanently banned from this community. Reason: {}",
                self.reason
            ),
        }
    }
}

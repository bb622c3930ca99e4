// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Ban Repository
//!
//! One active ban per pair is the partial unique index
//! `community_bans_active_pair_idx (community_id, user_id) WHERE is_active`.
//! Banning upserts against it; lifting and expiring are conditional updates
//! on `is_active`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::ban::{BanId, CommunityBan};
use crate::domain::identity::{CommunityId, UserId};
use crate::domain::pagination::PageRequest;
use crate::domain::repository::{BanRepository, RepositoryError};

const BAN_COLUMNS: &str =
    "id, community_id, user_id, moderator_id, reason, duration_days, expires_at, is_active, created_at, updated_at";

pub struct PostgresBanRepository {
    pool: PgPool,
}

impl PostgresBanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BanRepository for PostgresBanRepository {
    async fn upsert_active(&self, ban: &CommunityBan) -> Result<CommunityBan, RepositoryError> {
        let duration_days = ban
            .duration_days
            .map(i32::try_from)
            .transpose()
            .map_err(|_| RepositoryError::Serialization(format!("Ban duration {:?} out of range", ban.duration_days)))?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO community_bans (
                id, community_id, user_id, moderator_id, reason, duration_days,
                expires_at, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8, $9)
            ON CONFLICT (community_id, user_id) WHERE is_active DO UPDATE SET
                moderator_id = EXCLUDED.moderator_id,
                reason = EXCLUDED.reason,
                duration_days = EXCLUDED.duration_days,
                expires_at = EXCLUDED.expires_at,
                updated_at = EXCLUDED.updated_at
            RETURNING {BAN_COLUMNS}
            "#
        ))
        .bind(ban.id.0)
        .bind(ban.community_id.as_str())
        .bind(ban.user_id.as_str())
        .bind(ban.moderator_id.as_str())
        .bind(&ban.reason)
        .bind(duration_days)
        .bind(ban.expires_at)
        .bind(ban.created_at)
        .bind(ban.updated_at)
        .fetch_one(&self.pool)
        .await?;

        parse_ban_row(row)
    }

    async fn find_active(&self, community_id: &CommunityId, user_id: &UserId) -> Result<Option<CommunityBan>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {BAN_COLUMNS} FROM community_bans \
             WHERE community_id = $1 AND user_id = $2 AND is_active"
        ))
        .bind(community_id.as_str())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(parse_ban_row).transpose()
    }

    async fn deactivate_if_active(&self, id: BanId, at: DateTime<Utc>) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE community_bans SET is_active = FALSE, updated_at = $2 WHERE id = $1 AND is_active",
        )
        .bind(id.0)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_by_community(
        &self,
        community_id: &CommunityId,
        active_only: bool,
        page: PageRequest,
    ) -> Result<(Vec<CommunityBan>, u64), RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM community_bans WHERE community_id = $1 AND (is_active OR NOT $2)",
        )
        .bind(community_id.as_str())
        .bind(active_only)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            "SELECT {BAN_COLUMNS} FROM community_bans \
             WHERE community_id = $1 AND (is_active OR NOT $2) \
             ORDER BY created_at DESC, id \
             LIMIT $3 OFFSET $4"
        ))
        .bind(community_id.as_str())
        .bind(active_only)
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let bans = rows.into_iter().map(parse_ban_row).collect::<Result<Vec<_>, _>>()?;
        Ok((bans, total as u64))
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE community_bans
            SET is_active = FALSE, updated_at = $1
            WHERE is_active AND expires_at IS NOT NULL AND expires_at < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

fn parse_ban_row(row: PgRow) -> Result<CommunityBan, RepositoryError> {
    let duration_days: Option<i32> = row.try_get("duration_days")?;
    let duration_days = duration_days
        .map(u32::try_from)
        .transpose()
        .map_err(|e| RepositoryError::Serialization(format!("Invalid ban duration: {}", e)))?;

    Ok(CommunityBan {
        id: BanId(row.try_get("id")?),
        community_id: CommunityId(row.try_get("community_id")?),
        user_id: UserId(row.try_get("user_id")?),
        moderator_id: UserId(row.try_get("moderator_id")?),
        reason: row.try_get("reason")?,
        duration_days,
        expires_at: row.try_get("expires_at")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Moderator Repository
//!
//! Live-pair uniqueness is the partial unique index
//! `moderators_live_pair_idx (community_id, user_id) WHERE deleted_at IS NULL`;
//! inserts rely on `ON CONFLICT ... DO NOTHING` against it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::identity::{CommunityId, UserId};
use crate::domain::moderator::{Moderator, ModeratorId, ModeratorStats, ModeratorStatus};
use crate::domain::pagination::PageRequest;
use crate::domain::permission::{PermissionSet, Role};
use crate::domain::repository::{ModeratorRepository, RepositoryError};

const MODERATOR_COLUMNS: &str = "id, user_id, community_id, role, permissions, invited_by, invited_at, \
     status, notes, stats, created_at, updated_at, deleted_at";

pub struct PostgresModeratorRepository {
    pool: PgPool,
}

impl PostgresModeratorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ModeratorRepository for PostgresModeratorRepository {
    async fn insert(&self, moderator: &Moderator) -> Result<(), RepositoryError> {
        let permissions = serde_json::to_value(&moderator.permissions)?;
        let stats = serde_json::to_value(&moderator.stats)?;

        let result = sqlx::query(
            r#"
            INSERT INTO moderators (
                id, user_id, community_id, role, permissions, invited_by, invited_at,
                status, notes, stats, created_at, updated_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NULL)
            ON CONFLICT (community_id, user_id) WHERE deleted_at IS NULL DO NOTHING
            "#,
        )
        .bind(moderator.id.0)
        .bind(moderator.user_id.as_str())
        .bind(moderator.community_id.as_str())
        .bind(moderator.role.as_str())
        .bind(permissions)
        .bind(moderator.invited_by.as_str())
        .bind(moderator.invited_at)
        .bind(moderator.status.as_str())
        .bind(&moderator.notes)
        .bind(stats)
        .bind(moderator.created_at)
        .bind(moderator.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "live moderator record exists for ({}, {})",
                moderator.user_id, moderator.community_id
            )));
        }
        Ok(())
    }

    async fn update(&self, moderator: &Moderator, expected_updated_at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let permissions = serde_json::to_value(&moderator.permissions)?;

        // Stats are owned by record_activity and are not overwritten here.
        let result = sqlx::query(
            r#"
            UPDATE moderators
            SET role = $2, permissions = $3, status = $4, notes = $5, updated_at = $6
            WHERE id = $1 AND deleted_at IS NULL AND updated_at = $7
            "#,
        )
        .bind(moderator.id.0)
        .bind(moderator.role.as_str())
        .bind(permissions)
        .bind(moderator.status.as_str())
        .bind(&moderator.notes)
        .bind(moderator.updated_at)
        .bind(expected_updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let live: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM moderators WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(moderator.id.0)
        .fetch_one(&self.pool)
        .await?;
        if live {
            Err(RepositoryError::Conflict(format!(
                "Moderator {} was modified concurrently",
                moderator.id
            )))
        } else {
            Err(RepositoryError::NotFound(format!("Moderator {} not found", moderator.id)))
        }
    }

    async fn find(&self, community_id: &CommunityId, user_id: &UserId) -> Result<Option<Moderator>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {MODERATOR_COLUMNS} FROM moderators \
             WHERE community_id = $1 AND user_id = $2 AND deleted_at IS NULL"
        ))
        .bind(community_id.as_str())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(parse_moderator_row).transpose()
    }

    async fn tombstone(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<Moderator>, RepositoryError> {
        // The CTE reads the pre-update snapshot of the row being tombstoned.
        let row = sqlx::query(&format!(
            r#"
            WITH previous AS (
                SELECT {MODERATOR_COLUMNS} FROM moderators
                WHERE community_id = $1 AND user_id = $2 AND deleted_at IS NULL
                FOR UPDATE
            ), removed AS (
                UPDATE moderators m
                SET deleted_at = $3, status = 'inactive', updated_at = $3
                FROM previous
                WHERE m.id = previous.id
                RETURNING m.id
            )
            SELECT previous.* FROM previous JOIN removed ON removed.id = previous.id
            "#
        ))
        .bind(community_id.as_str())
        .bind(user_id.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(parse_moderator_row).transpose()
    }

    async fn list_by_community(
        &self,
        community_id: &CommunityId,
        page: PageRequest,
    ) -> Result<(Vec<Moderator>, u64), RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM moderators WHERE community_id = $1 AND deleted_at IS NULL",
        )
        .bind(community_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            "SELECT {MODERATOR_COLUMNS} FROM moderators \
             WHERE community_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC, id \
             LIMIT $2 OFFSET $3"
        ))
        .bind(community_id.as_str())
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let moderators = rows
            .into_iter()
            .map(parse_moderator_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((moderators, total as u64))
    }

    async fn record_activity(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
        kind: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        // Single-statement increment so concurrent actions never lose counts.
        let result = sqlx::query(
            r#"
            UPDATE moderators
            SET stats = jsonb_set(
                    jsonb_set(
                        stats,
                        ARRAY['counters_by_kind'],
                        COALESCE(stats->'counters_by_kind', '{}'::jsonb)
                    ),
                    ARRAY['counters_by_kind', $3::text],
                    to_jsonb(COALESCE((stats->'counters_by_kind'->>$3)::bigint, 0) + 1)
                )
                || jsonb_build_object('last_active_at', to_jsonb($4::timestamptz))
            WHERE community_id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(community_id.as_str())
        .bind(user_id.as_str())
        .bind(kind)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_tombstones(&self, before: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM moderators WHERE deleted_at IS NOT NULL AND deleted_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn parse_moderator_row(row: PgRow) -> Result<Moderator, RepositoryError> {
    let role: String = row.try_get("role")?;
    let status: String = row.try_get("status")?;
    let permissions: serde_json::Value = row.try_get("permissions")?;
    let stats: serde_json::Value = row.try_get("stats")?;

    let role: Role = role
        .parse()
        .map_err(|e| RepositoryError::Serialization(format!("Failed to parse role: {}", e)))?;
    let status: ModeratorStatus = status
        .parse()
        .map_err(|e| RepositoryError::Serialization(format!("Failed to parse status: {}", e)))?;
    let permissions: PermissionSet = serde_json::from_value(permissions)
        .map_err(|e| RepositoryError::Serialization(format!("Failed to deserialize permissions: {}", e)))?;
    let stats: ModeratorStats = serde_json::from_value(stats)
        .map_err(|e| RepositoryError::Serialization(format!("Failed to deserialize stats: {}", e)))?;

    Ok(Moderator {
        id: ModeratorId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        community_id: CommunityId(row.try_get("community_id")?),
        role,
        permissions,
        invited_by: UserId(row.try_get("invited_by")?),
        invited_at: row.try_get("invited_at")?,
        status,
        notes: row.try_get("notes")?,
        stats,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Mod Log Repository
//!
//! Insert-only; no statement here updates or deletes an entry.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::identity::{CommunityId, UserId};
use crate::domain::mod_log::{ModActionType, ModLog, ModLogId};
use crate::domain::pagination::PageRequest;
use crate::domain::repository::{ModLogRepository, RepositoryError};

const MOD_LOG_COLUMNS: &str =
    "id, community_id, moderator_id, action_type, target_id, target_type, reason, details, previous_state, created_at";

pub struct PostgresModLogRepository {
    pool: PgPool,
}

impl PostgresModLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ModLogRepository for PostgresModLogRepository {
    async fn append(&self, entry: &ModLog) -> Result<(), RepositoryError> {
        let details = serde_json::Value::Object(entry.details.clone());

        sqlx::query(
            r#"
            INSERT INTO mod_logs (
                id, community_id, moderator_id, action_type, target_id, target_type,
                reason, details, previous_state, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id.0)
        .bind(entry.community_id.as_str())
        .bind(entry.moderator_id.as_str())
        .bind(entry.action_type.as_str())
        .bind(&entry.target_id)
        .bind(&entry.target_type)
        .bind(&entry.reason)
        .bind(details)
        .bind(&entry.previous_state)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(
        &self,
        community_id: &CommunityId,
        moderator_id: Option<&UserId>,
        page: PageRequest,
    ) -> Result<(Vec<ModLog>, u64), RepositoryError> {
        let moderator_id = moderator_id.map(|m| m.as_str());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM mod_logs WHERE community_id = $1 AND ($2::text IS NULL OR moderator_id = $2)",
        )
        .bind(community_id.as_str())
        .bind(moderator_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            "SELECT {MOD_LOG_COLUMNS} FROM mod_logs \
             WHERE community_id = $1 AND ($2::text IS NULL OR moderator_id = $2) \
             ORDER BY created_at DESC, id \
             LIMIT $3 OFFSET $4"
        ))
        .bind(community_id.as_str())
        .bind(moderator_id)
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let entries = rows.into_iter().map(parse_mod_log_row).collect::<Result<Vec<_>, _>>()?;
        Ok((entries, total as u64))
    }
}

fn parse_mod_log_row(row: PgRow) -> Result<ModLog, RepositoryError> {
    let action_type: String = row.try_get("action_type")?;
    let action_type: ModActionType = action_type
        .parse()
        .map_err(|e| RepositoryError::Serialization(format!("Failed to parse action type: {}", e)))?;

    let details = match row.try_get::<serde_json::Value, _>("details")? {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(RepositoryError::Serialization(format!(
                "mod log details must be a JSON object, got {}",
                other
            )))
        }
    };

    Ok(ModLog {
        id: ModLogId(row.try_get("id")?),
        community_id: CommunityId(row.try_get("community_id")?),
        moderator_id: UserId(row.try_get("moderator_id")?),
        action_type,
        target_id: row.try_get("target_id")?,
        target_type: row.try_get("target_type")?,
        reason: row.try_get("reason")?,
        details,
        previous_state: row.try_get("previous_state")?,
        created_at: row.try_get("created_at")?,
    })
}

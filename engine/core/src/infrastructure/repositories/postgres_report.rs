// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Report Repository

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::identity::{CommunityId, UserId};
use crate::domain::pagination::PageRequest;
use crate::domain::report::{Report, ReportFilter, ReportId, ReportProcessing, ReportStatus, TargetType};
use crate::domain::repository::{ReportRepository, RepositoryError};

const REPORT_COLUMNS: &str = "id, community_id, reporter_id, target_id, target_type, reason, description, status, \
     processed_by, processed_at, moderator_notes, action_taken, created_at, updated_at";

pub struct PostgresReportRepository {
    pool: PgPool,
}

impl PostgresReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for PostgresReportRepository {
    async fn insert(&self, report: &Report) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO reports (
                id, community_id, reporter_id, target_id, target_type, reason, description,
                status, processed_by, processed_at, moderator_notes, action_taken,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(report.id.0)
        .bind(report.community_id.as_str())
        .bind(report.reporter_id.as_str())
        .bind(&report.target_id)
        .bind(report.target_type.as_str())
        .bind(&report.reason)
        .bind(&report.description)
        .bind(report.status.as_str())
        .bind(report.processed_by.as_ref().map(|u| u.as_str()))
        .bind(report.processed_at)
        .bind(&report.moderator_notes)
        .bind(&report.action_taken)
        .bind(report.created_at)
        .bind(report.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: ReportId) -> Result<Option<Report>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(parse_report_row).transpose()
    }

    async fn apply_processing(
        &self,
        id: ReportId,
        processing: &ReportProcessing,
        only_if_pending: bool,
    ) -> Result<Option<Report>, RepositoryError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE reports
            SET status = $2, processed_by = $3, processed_at = $4,
                moderator_notes = $5, action_taken = $6, updated_at = $4
            WHERE id = $1 AND (status = 'pending' OR NOT $7)
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(id.0)
        .bind(processing.status.as_str())
        .bind(processing.processed_by.as_str())
        .bind(processing.processed_at)
        .bind(&processing.notes)
        .bind(&processing.action_taken)
        .bind(only_if_pending)
        .fetch_optional(&self.pool)
        .await?;

        row.map(parse_report_row).transpose()
    }

    async fn list(
        &self,
        community_id: &CommunityId,
        filter: &ReportFilter,
        page: PageRequest,
    ) -> Result<(Vec<Report>, u64), RepositoryError> {
        let status = filter.status.map(|s| s.as_str());
        let target_type = filter.target_type.map(|t| t.as_str());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reports
            WHERE community_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR target_type = $3)
            "#,
        )
        .bind(community_id.as_str())
        .bind(status)
        .bind(target_type)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {REPORT_COLUMNS} FROM reports
            WHERE community_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR target_type = $3)
            ORDER BY created_at DESC, id
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(community_id.as_str())
        .bind(status)
        .bind(target_type)
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let reports = rows.into_iter().map(parse_report_row).collect::<Result<Vec<_>, _>>()?;
        Ok((reports, total as u64))
    }

    async fn count_pending(&self, community_id: &CommunityId) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reports WHERE community_id = $1 AND status = 'pending'",
        )
        .bind(community_id.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }
}

fn parse_report_row(row: PgRow) -> Result<Report, RepositoryError> {
    let target_type: String = row.try_get("target_type")?;
    let status: String = row.try_get("status")?;
    let processed_by: Option<String> = row.try_get("processed_by")?;

    let target_type: TargetType = target_type
        .parse()
        .map_err(|e| RepositoryError::Serialization(format!("Failed to parse target type: {}", e)))?;
    let status: ReportStatus = status
        .parse()
        .map_err(|e| RepositoryError::Serialization(format!("Failed to parse report status: {}", e)))?;

    Ok(Report {
        id: ReportId(row.try_get("id")?),
        community_id: CommunityId(row.try_get("community_id")?),
        reporter_id: UserId(row.try_get("reporter_id")?),
        target_id: row.try_get("target_id")?,
        target_type,
        reason: row.try_get("reason")?,
        description: row.try_get("description")?,
        status,
        processed_by: processed_by.map(UserId),
        processed_at: row.try_get("processed_at")?,
        moderator_notes: row.try_get("moderator_notes")?,
        action_taken: row.try_get("action_taken")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

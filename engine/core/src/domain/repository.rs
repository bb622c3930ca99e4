// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for each aggregate, defined in the domain layer and
//! implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `ModeratorRepository` | `Moderator` | `InMemoryModeratorRepository`, `PostgresModeratorRepository` |
//! | `BanRepository` | `CommunityBan` | `InMemoryBanRepository`, `PostgresBanRepository` |
//! | `ReportRepository` | `Report` | `InMemoryReportRepository`, `PostgresReportRepository` |
//! | `ModLogRepository` | `ModLog` | `InMemoryModLogRepository`, `PostgresModLogRepository` |
//!
//! ## Atomicity
//!
//! The engine runs concurrently and holds no locks of its own, so every
//! uniqueness rule lives behind a single repository call:
//!
//! - `ModeratorRepository::insert` is insert-if-absent on the live
//!   `(user_id, community_id)` pair and fails with `RepositoryError::Conflict`.
//!   Removed (tombstoned) records stay behind until purged.
//! - `BanRepository::upsert_active` overwrites the one active ban of a pair.
//! - `BanRepository::deactivate_if_active` and
//!   `ReportRepository::apply_processing` are conditional updates that report
//!   whether they applied.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ban::{BanId, CommunityBan};
use crate::domain::identity::{CommunityId, UserId};
use crate::domain::mod_log::ModLog;
use crate::domain::moderator::Moderator;
use crate::domain::pagination::PageRequest;
use crate::domain::report::{Report, ReportFilter, ReportId, ReportProcessing};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

#[async_trait]
pub trait ModeratorRepository: Send + Sync {
    /// Insert a new moderator unless a live record exists for the pair.
    /// Tombstones of the pair do not block the insert.
    async fn insert(&self, moderator: &Moderator) -> Result<(), RepositoryError>;

    /// Write role, permissions, status, notes and `updated_at` of the live
    /// record with the same id, provided it still carries
    /// `expected_updated_at`. Stats and invite fields are left alone.
    ///
    /// `Conflict` when another update landed first, `NotFound` when there is
    /// no live record.
    async fn update(&self, moderator: &Moderator, expected_updated_at: DateTime<Utc>) -> Result<(), RepositoryError>;

    /// Live (non-tombstoned) record for the pair, whatever its status.
    async fn find(&self, community_id: &CommunityId, user_id: &UserId) -> Result<Option<Moderator>, RepositoryError>;

    /// Tombstone the live record for the pair, returning it as it was before
    /// removal. `None` when there was nothing to remove.
    async fn tombstone(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<Moderator>, RepositoryError>;

    /// Live records of a community, newest first.
    async fn list_by_community(
        &self,
        community_id: &CommunityId,
        page: PageRequest,
    ) -> Result<(Vec<Moderator>, u64), RepositoryError>;

    /// Bump the activity counter `kind` for the live record of the pair.
    /// Returns false when the user is not a moderator of the community.
    async fn record_activity(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
        kind: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Permanently delete tombstones removed before `before`.
    async fn purge_tombstones(&self, before: DateTime<Utc>) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait BanRepository: Send + Sync {
    /// Create the active ban for the pair or overwrite the existing one.
    /// The stored record is returned (an overwrite keeps the original id).
    async fn upsert_active(&self, ban: &CommunityBan) -> Result<CommunityBan, RepositoryError>;

    async fn find_active(&self, community_id: &CommunityId, user_id: &UserId) -> Result<Option<CommunityBan>, RepositoryError>;

    /// Flip `is_active` off only if the ban is still active.
    async fn deactivate_if_active(&self, id: BanId, at: DateTime<Utc>) -> Result<bool, RepositoryError>;

    /// Bans of a community, newest first.
    async fn list_by_community(
        &self,
        community_id: &CommunityId,
        active_only: bool,
        page: PageRequest,
    ) -> Result<(Vec<CommunityBan>, u64), RepositoryError>;

    /// Deactivate every active ban whose expiry is before `now`.
    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn insert(&self, report: &Report) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: ReportId) -> Result<Option<Report>, RepositoryError>;

    /// Stamp processing metadata. With `only_if_pending` the write is
    /// conditional on the report still being pending; `None` is returned when
    /// that condition failed or the report does not exist.
    async fn apply_processing(
        &self,
        id: ReportId,
        processing: &ReportProcessing,
        only_if_pending: bool,
    ) -> Result<Option<Report>, RepositoryError>;

    /// Reports of a community matching `filter`, newest first.
    async fn list(
        &self,
        community_id: &CommunityId,
        filter: &ReportFilter,
        page: PageRequest,
    ) -> Result<(Vec<Report>, u64), RepositoryError>;

    async fn count_pending(&self, community_id: &CommunityId) -> Result<u64, RepositoryError>;
}

/// Append-only store for audit entries.
#[async_trait]
pub trait ModLogRepository: Send + Sync {
    async fn append(&self, entry: &ModLog) -> Result<(), RepositoryError>;

    /// Entries of a community, optionally for one acting moderator, newest first.
    async fn list(
        &self,
        community_id: &CommunityId,
        moderator_id: Option<&UserId>,
        page: PageRequest,
    ) -> Result<(Vec<ModLog>, u64), RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Uniqueness violated: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(db.message().to_string())
            }
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository contracts defined in
//! `crate::domain::repository`.
//!
//! ## PostgreSQL Repositories
//!
//! - **PostgresModeratorRepository** - moderators with a partial unique index on live pairs
//! - **PostgresBanRepository** - bans with a partial unique index on active pairs
//! - **PostgresReportRepository** - reports and their processing metadata
//! - **PostgresModLogRepository** - append-only audit trail
//!
//! ## In-Memory Repositories
//!
//! HashMap-backed implementations for tests, the CLI's ephemeral mode and
//! single-process deployments. Each conditional operation runs entirely under
//! one write lock, which gives the same atomicity the SQL statements provide.

pub mod postgres_ban;
pub mod postgres_mod_log;
pub mod postgres_moderator;
pub mod postgres_report;

pub use postgres_ban::PostgresBanRepository;
pub use postgres_mod_log::PostgresModLogRepository;
pub use postgres_moderator::PostgresModeratorRepository;
pub use postgres_report::PostgresReportRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::ban::{BanId, CommunityBan};
use crate::domain::identity::{CommunityId, UserId};
use crate::domain::mod_log::ModLog;
use crate::domain::moderator::{Moderator, ModeratorId};
use crate::domain::pagination::{PageRequest, Paginated};
use crate::domain::report::{Report, ReportFilter, ReportId, ReportProcessing, ReportStatus};
use crate::domain::repository::{
    BanRepository, ModLogRepository, ModeratorRepository, RepositoryError, ReportRepository,
};

fn page_of<T>(all: Vec<T>, page: PageRequest) -> (Vec<T>, u64) {
    let page = Paginated::from_sorted(all, page);
    (page.items, page.total)
}

fn is_live_pair(m: &Moderator, community_id: &CommunityId, user_id: &UserId) -> bool {
    !m.is_removed() && &m.community_id == community_id && &m.user_id == user_id
}

// ============================================================================
// Moderators
// ============================================================================

#[derive(Clone, Default)]
pub struct InMemoryModeratorRepository {
    moderators: Arc<RwLock<HashMap<ModeratorId, Moderator>>>,
}

impl InMemoryModeratorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModeratorRepository for InMemoryModeratorRepository {
    async fn insert(&self, moderator: &Moderator) -> Result<(), RepositoryError> {
        let mut moderators = self.moderators.write();
        if moderators
            .values()
            .any(|m| is_live_pair(m, &moderator.community_id, &moderator.user_id))
        {
            return Err(RepositoryError::Conflict(format!(
                "live moderator record exists for ({}, {})",
                moderator.user_id, moderator.community_id
            )));
        }
        moderators.insert(moderator.id, moderator.clone());
        Ok(())
    }

    async fn update(&self, moderator: &Moderator, expected_updated_at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut moderators = self.moderators.write();
        match moderators.get_mut(&moderator.id) {
            Some(existing) if !existing.is_removed() => {
                if existing.updated_at != expected_updated_at {
                    return Err(RepositoryError::Conflict(format!(
                        "Moderator {} was modified concurrently",
                        moderator.id
                    )));
                }
                existing.role = moderator.role;
                existing.permissions = moderator.permissions.clone();
                existing.status = moderator.status;
                existing.notes = moderator.notes.clone();
                existing.updated_at = moderator.updated_at;
                Ok(())
            }
            _ => Err(RepositoryError::NotFound(format!("Moderator {} not found", moderator.id))),
        }
    }

    async fn find(&self, community_id: &CommunityId, user_id: &UserId) -> Result<Option<Moderator>, RepositoryError> {
        let moderators = self.moderators.read();
        Ok(moderators
            .values()
            .find(|m| is_live_pair(m, community_id, user_id))
            .cloned())
    }

    async fn tombstone(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<Moderator>, RepositoryError> {
        let mut moderators = self.moderators.write();
        let Some(live) = moderators
            .values_mut()
            .find(|m| is_live_pair(m, community_id, user_id))
        else {
            return Ok(None);
        };
        let before = live.clone();
        live.mark_removed(at);
        Ok(Some(before))
    }

    async fn list_by_community(
        &self,
        community_id: &CommunityId,
        page: PageRequest,
    ) -> Result<(Vec<Moderator>, u64), RepositoryError> {
        let moderators = self.moderators.read();
        let mut live: Vec<Moderator> = moderators
            .values()
            .filter(|m| !m.is_removed() && &m.community_id == community_id)
            .cloned()
            .collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(live, page))
    }

    async fn record_activity(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
        kind: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut moderators = self.moderators.write();
        match moderators
            .values_mut()
            .find(|m| is_live_pair(m, community_id, user_id))
        {
            Some(m) => {
                m.stats.record(kind, at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn purge_tombstones(&self, before: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut moderators = self.moderators.write();
        let count = moderators.len();
        moderators.retain(|_, m| !matches!(m.deleted_at, Some(at) if at < before));
        Ok((count - moderators.len()) as u64)
    }
}

// ============================================================================
// Bans
// ============================================================================

#[derive(Clone, Default)]
pub struct InMemoryBanRepository {
    bans: Arc<RwLock<HashMap<BanId, CommunityBan>>>,
}

impl InMemoryBanRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BanRepository for InMemoryBanRepository {
    async fn upsert_active(&self, ban: &CommunityBan) -> Result<CommunityBan, RepositoryError> {
        let mut bans = self.bans.write();
        if let Some(active) = bans
            .values_mut()
            .find(|b| b.is_active && b.community_id == ban.community_id && b.user_id == ban.user_id)
        {
            active.moderator_id = ban.moderator_id.clone();
            active.reason = ban.reason.clone();
            active.duration_days = ban.duration_days;
            active.expires_at = ban.expires_at;
            active.updated_at = ban.updated_at;
            return Ok(active.clone());
        }
        bans.insert(ban.id, ban.clone());
        Ok(ban.clone())
    }

    async fn find_active(&self, community_id: &CommunityId, user_id: &UserId) -> Result<Option<CommunityBan>, RepositoryError> {
        let bans = self.bans.read();
        Ok(bans
            .values()
            .find(|b| b.is_active && &b.community_id == community_id && &b.user_id == user_id)
            .cloned())
    }

    async fn deactivate_if_active(&self, id: BanId, at: DateTime<Utc>) -> Result<bool, RepositoryError> {
        let mut bans = self.bans.write();
        match bans.get_mut(&id) {
            Some(ban) if ban.is_active => {
                ban.is_active = false;
                ban.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_by_community(
        &self,
        community_id: &CommunityId,
        active_only: bool,
        page: PageRequest,
    ) -> Result<(Vec<CommunityBan>, u64), RepositoryError> {
        let bans = self.bans.read();
        let mut matching: Vec<CommunityBan> = bans
            .values()
            .filter(|b| &b.community_id == community_id && (!active_only || b.is_active))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(matching, page))
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut bans = self.bans.write();
        let mut expired = 0;
        for ban in bans.values_mut().filter(|b| b.is_active && b.is_expired_at(now)) {
            ban.is_active = false;
            ban.updated_at = now;
            expired += 1;
        }
        Ok(expired)
    }
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Clone, Default)]
pub struct InMemoryReportRepository {
    reports: Arc<RwLock<HashMap<ReportId, Report>>>,
}

impl InMemoryReportRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportRepository for InMemoryReportRepository {
    async fn insert(&self, report: &Report) -> Result<(), RepositoryError> {
        let mut reports = self.reports.write();
        if reports.contains_key(&report.id) {
            return Err(RepositoryError::Conflict(format!("Report {} already exists", report.id)));
        }
        reports.insert(report.id, report.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ReportId) -> Result<Option<Report>, RepositoryError> {
        Ok(self.reports.read().get(&id).cloned())
    }

    async fn apply_processing(
        &self,
        id: ReportId,
        processing: &ReportProcessing,
        only_if_pending: bool,
    ) -> Result<Option<Report>, RepositoryError> {
        let mut reports = self.reports.write();
        match reports.get_mut(&id) {
            Some(report) if !only_if_pending || report.status == ReportStatus::Pending => {
                report.apply(processing.clone());
                Ok(Some(report.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list(
        &self,
        community_id: &CommunityId,
        filter: &ReportFilter,
        page: PageRequest,
    ) -> Result<(Vec<Report>, u64), RepositoryError> {
        let reports = self.reports.read();
        let mut matching: Vec<Report> = reports
            .values()
            .filter(|r| &r.community_id == community_id && filter.matches(r))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(matching, page))
    }

    async fn count_pending(&self, community_id: &CommunityId) -> Result<u64, RepositoryError> {
        let reports = self.reports.read();
        Ok(reports
            .values()
            .filter(|r| &r.community_id == community_id && r.status == ReportStatus::Pending)
            .count() as u64)
    }
}

// ============================================================================
// Mod logs
// ============================================================================

/// Entries are kept in append order, so reverse iteration is newest first.
#[derive(Clone, Default)]
pub struct InMemoryModLogRepository {
    entries: Arc<RwLock<Vec<ModLog>>>,
}

impl InMemoryModLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl ModLogRepository for InMemoryModLogRepository {
    async fn append(&self, entry: &ModLog) -> Result<(), RepositoryError> {
        self.entries.write().push(entry.clone());
        Ok(())
    }

    async fn list(
        &self,
        community_id: &CommunityId,
        moderator_id: Option<&UserId>,
        page: PageRequest,
    ) -> Result<(Vec<ModLog>, u64), RepositoryError> {
        let entries = self.entries.read();
        let matching: Vec<ModLog> = entries
            .iter()
            .rev()
            .filter(|e| &e.community_id == community_id && moderator_id.is_none_or(|m| &e.moderator_id == m))
            .cloned()
            .collect();
        Ok(page_of(matching, page))
    }
}

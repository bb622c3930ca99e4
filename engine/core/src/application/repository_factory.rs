// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory
//!
//! Creates concrete repository implementations for the configured storage
//! backend. Lives in the application layer so the domain layer keeps only the
//! repository traits.

use std::sync::Arc;

use crate::domain::repository::{BanRepository, ModLogRepository, ModeratorRepository, ReportRepository};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::{
    InMemoryBanRepository, InMemoryModLogRepository, InMemoryModeratorRepository, InMemoryReportRepository,
    PostgresBanRepository, PostgresModLogRepository, PostgresModeratorRepository, PostgresReportRepository,
};

/// Creates a ModeratorRepository; `None` selects the in-memory backend
pub fn create_moderator_repository(database: Option<&Database>) -> Arc<dyn ModeratorRepository> {
    match database {
        None => Arc::new(InMemoryModeratorRepository::new()),
        Some(db) => Arc::new(PostgresModeratorRepository::new(db.get_pool().clone())),
    }
}

/// Creates a BanRepository; `None` selects the in-memory backend
pub fn create_ban_repository(database: Option<&Database>) -> Arc<dyn BanRepository> {
    match database {
        None => Arc::new(InMemoryBanRepository::new()),
        Some(db) => Arc::new(PostgresBanRepository::new(db.get_pool().clone())),
    }
}

/// Creates a ReportRepository; `None` selects the in-memory backend
pub fn create_report_repository(database: Option<&Database>) -> Arc<dyn ReportRepository> {
    match database {
        None => Arc::new(InMemoryReportRepository::new()),
        Some(db) => Arc::new(PostgresReportRepository::new(db.get_pool().clone())),
    }
}

/// Creates a ModLogRepository; `None` selects the in-memory backend
pub fn create_mod_log_repository(database: Option<&Database>) -> Arc<dyn ModLogRepository> {
    match database {
        None => Arc::new(InMemoryModLogRepository::new()),
        Some(db) => Arc::new(PostgresModLogRepository::new(db.get_pool().clone())),
    }
}

/// One repository per aggregate, all on the same backend.
#[derive(Clone)]
pub struct Repositories {
    pub moderators: Arc<dyn ModeratorRepository>,
    pub bans: Arc<dyn BanRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub mod_logs: Arc<dyn ModLogRepository>,
}

impl Repositories {
    pub fn create(database: Option<&Database>) -> Self {
        Self {
            moderators: create_moderator_repository(database),
            bans: create_ban_repository(database),
            reports: create_report_repository(database),
            mod_logs: create_mod_log_repository(database),
        }
    }

    pub fn in_memory() -> Self {
        Self::create(None)
    }
}

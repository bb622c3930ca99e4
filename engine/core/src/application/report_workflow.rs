// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Report Workflow Application Service
//!
//! Intake and triage of user reports. Creation is open to any user and is not
//! audited; processing is a moderator action and appends a `process_report`
//! entry.
//!
//! Under [`ReprocessPolicy::Reject`] the pending-to-terminal transition is
//! re-checked by the store (`apply_processing` with `only_if_pending`), so two
//! moderators racing on the same report cannot both succeed.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::application::audit_log::{record_action, AuditLogService};
use crate::application::error::{with_deadline, Audited, ModerationError};
use crate::domain::identity::{CommunityId, UserId};
use crate::domain::mod_log::{ModActionType, ModLog};
use crate::domain::pagination::{PageRequest, Paginated};
use crate::domain::report::{
    Report, ReportFilter, ReportId, ReportProcessing, ReportStatus, ReportTransitionError, ReprocessPolicy, TargetType,
};
use crate::domain::repository::ReportRepository;

/// Fields of a new report.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub reporter_id: UserId,
    pub community_id: CommunityId,
    pub target_id: String,
    pub target_type: TargetType,
    pub reason: String,
    pub description: Option<String>,
}

#[async_trait]
pub trait ReportService: Send + Sync {
    async fn create_report(&self, report: NewReport) -> Result<Report, ModerationError>;

    /// Move a report to a terminal status and stamp who did it and when.
    async fn process_report(
        &self,
        report_id: ReportId,
        moderator_id: &UserId,
        status: ReportStatus,
        notes: Option<String>,
        action_taken: Option<String>,
    ) -> Result<Audited<Report>, ModerationError>;

    async fn get_report(&self, report_id: ReportId) -> Result<Report, ModerationError>;

    async fn list_reports(
        &self,
        community_id: &CommunityId,
        filter: ReportFilter,
        page: PageRequest,
    ) -> Result<Paginated<Report>, ModerationError>;

    async fn count_pending_reports(&self, community_id: &CommunityId) -> Result<u64, ModerationError>;
}

pub struct StandardReportService {
    repository: Arc<dyn ReportRepository>,
    audit: Arc<dyn AuditLogService>,
    policy: ReprocessPolicy,
    store_timeout: Duration,
}

impl StandardReportService {
    pub fn new(
        repository: Arc<dyn ReportRepository>,
        audit: Arc<dyn AuditLogService>,
        policy: ReprocessPolicy,
        store_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            audit,
            policy,
            store_timeout,
        }
    }

    pub fn policy(&self) -> ReprocessPolicy {
        self.policy
    }
}

fn already_processed(id: ReportId, status: ReportStatus) -> ModerationError {
    ModerationError::InvalidState(ReportTransitionError::AlreadyProcessed { id, status }.to_string())
}

#[async_trait]
impl ReportService for StandardReportService {
    async fn create_report(&self, new: NewReport) -> Result<Report, ModerationError> {
        if new.target_id.trim().is_empty() {
            return Err(ModerationError::InvalidInput("report target id must not be empty".to_string()));
        }
        if new.reason.trim().is_empty() {
            return Err(ModerationError::InvalidInput("report reason must not be empty".to_string()));
        }

        let report = Report::new(
            new.reporter_id,
            new.community_id,
            new.target_id,
            new.target_type,
            new.reason,
            new.description,
        );

        with_deadline(
            self.store_timeout,
            || format!("create report {} in community {}", report.id, report.community_id),
            self.repository.insert(&report),
        )
        .await?;

        info!(
            "Report {} filed by {} against {} {} in community {}",
            report.id, report.reporter_id, report.target_type, report.target_id, report.community_id
        );
        Ok(report)
    }

    async fn process_report(
        &self,
        report_id: ReportId,
        moderator_id: &UserId,
        status: ReportStatus,
        notes: Option<String>,
        action_taken: Option<String>,
    ) -> Result<Audited<Report>, ModerationError> {
        let current = self.get_report(report_id).await?;

        let processing = ReportProcessing {
            status,
            processed_by: moderator_id.clone(),
            processed_at: Utc::now(),
            notes,
            action_taken,
        };

        current.check_transition(&processing, self.policy).map_err(|e| match e {
            ReportTransitionError::NonTerminalTarget(_) => ModerationError::InvalidInput(e.to_string()),
            ReportTransitionError::AlreadyProcessed { .. } => ModerationError::InvalidState(e.to_string()),
        })?;

        let only_if_pending = self.policy == ReprocessPolicy::Reject;
        let processed = with_deadline(
            self.store_timeout,
            || format!("process report {}", report_id),
            self.repository.apply_processing(report_id, &processing, only_if_pending),
        )
        .await?;

        let processed = match processed {
            Some(report) => report,
            None if only_if_pending => {
                // Lost the race against another moderator.
                let winner = self.get_report(report_id).await?;
                return Err(already_processed(report_id, winner.status));
            }
            None => return Err(ModerationError::NotFound(format!("report {}", report_id))),
        };

        info!(
            "Report {} processed as {} by {} (was {})",
            report_id, processed.status, moderator_id, current.status
        );

        let mut entry = ModLog::new(
            processed.community_id.clone(),
            moderator_id.clone(),
            ModActionType::ProcessReport,
        )
        .with_target(report_id.to_string(), "report")
        .with_detail("status", processed.status.as_str())
        .with_detail("reported_target_id", processed.target_id.clone())
        .with_detail("reported_target_type", processed.target_type.as_str());
        if let Some(action) = &processed.action_taken {
            entry = entry.with_detail("action_taken", action.clone());
        }
        if current.status.is_terminal() {
            entry = entry.with_previous_state(serde_json::json!({
                "status": current.status,
                "processed_by": current.processed_by,
                "processed_at": current.processed_at,
                "moderator_notes": current.moderator_notes,
                "action_taken": current.action_taken,
            }));
        }

        Ok(record_action(self.audit.as_ref(), processed, entry).await)
    }

    async fn get_report(&self, report_id: ReportId) -> Result<Report, ModerationError> {
        with_deadline(
            self.store_timeout,
            || format!("look up report {}", report_id),
            self.repository.find_by_id(report_id),
        )
        .await?
        .ok_or_else(|| ModerationError::NotFound(format!("report {}", report_id)))
    }

    async fn list_reports(
        &self,
        community_id: &CommunityId,
        filter: ReportFilter,
        page: PageRequest,
    ) -> Result<Paginated<Report>, ModerationError> {
        debug!("Listing reports of community {} ({:?})", community_id, filter);
        let (items, total) = with_deadline(
            self.store_timeout,
            || format!("list reports of community {}", community_id),
            self.repository.list(community_id, &filter, page),
        )
        .await?;
        Ok(Paginated::new(items, total, page))
    }

    async fn count_pending_reports(&self, community_id: &CommunityId) -> Result<u64, ModerationError> {
        with_deadline(
            self.store_timeout,
            || format!("count pending reports of community {}", community_id),
            self.repository.count_pending(community_id),
        )
        .await
    }
}

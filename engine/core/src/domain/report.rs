// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Report Aggregate
//!
//! User-submitted flag on a post, comment, user or community. Reports start
//! `pending` and move to exactly one of `approved`, `rejected` or `ignored`
//! when a moderator processes them:
//!
//! ```text
//!            ┌──> approved
//! pending ───┼──> rejected
//!            └──> ignored
//! ```
//!
//! Whether a terminal report may be processed a second time is decided by
//! [`ReprocessPolicy`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::identity::{CommunityId, UserId};
use crate::domain::permission::ParseTagError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub Uuid);

impl ReportId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Post,
    Comment,
    User,
    Community,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Post => "post",
            TargetType::Comment => "comment",
            TargetType::User => "user",
            TargetType::Community => "community",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(TargetType::Post),
            "comment" => Ok(TargetType::Comment),
            "user" => Ok(TargetType::User),
            "community" => Ok(TargetType::Community),
            _ => Err(ParseTagError::new("target type", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Approved,
    Rejected,
    Ignored,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Approved => "approved",
            ReportStatus::Rejected => "rejected",
            ReportStatus::Ignored => "ignored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReportStatus::Pending)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "approved" => Ok(ReportStatus::Approved),
            "rejected" => Ok(ReportStatus::Rejected),
            "ignored" => Ok(ReportStatus::Ignored),
            _ => Err(ParseTagError::new("report status", s)),
        }
    }
}

/// What happens when a moderator processes a report that is already terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReprocessPolicy {
    /// Terminal reports are final; re-processing fails.
    #[default]
    Reject,
    /// Re-processing replaces the previous processing metadata.
    Overwrite,
}

impl FromStr for ReprocessPolicy {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(ReprocessPolicy::Reject),
            "overwrite" => Ok(ReprocessPolicy::Overwrite),
            _ => Err(ParseTagError::new("reprocess policy", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub community_id: CommunityId,
    pub reporter_id: UserId,
    pub target_id: String,
    pub target_type: TargetType,
    pub reason: String,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub processed_by: Option<UserId>,
    pub processed_at: Option<DateTime<Utc>>,
    pub moderator_notes: Option<String>,
    pub action_taken: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome a moderator stamps onto a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportProcessing {
    pub status: ReportStatus,
    pub processed_by: UserId,
    pub processed_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub action_taken: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportTransitionError {
    #[error("Report cannot be moved back to '{0}'")]
    NonTerminalTarget(ReportStatus),

    #[error("Report {id} was already processed as '{status}'")]
    AlreadyProcessed { id: ReportId, status: ReportStatus },
}

impl Report {
    pub fn new(
        reporter_id: UserId,
        community_id: CommunityId,
        target_id: String,
        target_type: TargetType,
        reason: String,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ReportId::new(),
            community_id,
            reporter_id,
            target_id,
            target_type,
            reason,
            description,
            status: ReportStatus::Pending,
            processed_by: None,
            processed_at: None,
            moderator_notes: None,
            action_taken: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check that `processing` is a legal transition from the current state.
    pub fn check_transition(
        &self,
        processing: &ReportProcessing,
        policy: ReprocessPolicy,
    ) -> Result<(), ReportTransitionError> {
        if !processing.status.is_terminal() {
            return Err(ReportTransitionError::NonTerminalTarget(processing.status));
        }
        if self.status.is_terminal() && policy == ReprocessPolicy::Reject {
            return Err(ReportTransitionError::AlreadyProcessed {
                id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    pub fn process(
        &mut self,
        processing: ReportProcessing,
        policy: ReprocessPolicy,
    ) -> Result<(), ReportTransitionError> {
        self.check_transition(&processing, policy)?;
        self.apply(processing);
        Ok(())
    }

    /// Stamp processing metadata without checking the transition.
    pub(crate) fn apply(&mut self, processing: ReportProcessing) {
        self.status = processing.status;
        self.processed_by = Some(processing.processed_by);
        self.processed_at = Some(processing.processed_at);
        self.moderator_notes = processing.notes;
        self.action_taken = processing.action_taken;
        self.updated_at = processing.processed_at;
    }
}

/// Optional filters for listing a community's reports.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub target_type: Option<TargetType>,
}

impl ReportFilter {
    pub fn matches(&self, report: &Report) -> bool {
        self.status.is_none_or(|s| s == report.status)
            && self.target_type.is_none_or(|t| t == report.target_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> Report {
        Report::new(
            UserId::from("r1"),
            CommunityId::from("c1"),
            "p1".to_string(),
            TargetType::Post,
            "spam".to_string(),
            None,
        )
    }

    fn processing(status: ReportStatus) -> ReportProcessing {
        ReportProcessing {
            status,
            processed_by: UserId::from("m1"),
            processed_at: Utc::now(),
            notes: Some("ok".to_string()),
            action_taken: Some("removed".to_string()),
        }
    }

    #[test]
    fn test_new_report_is_pending() {
        let r = report();
        assert_eq!(r.status, ReportStatus::Pending);
        assert!(r.processed_by.is_none());
    }

    #[test]
    fn test_process_pending_report() {
        let mut r = report();
        r.process(processing(ReportStatus::Approved), ReprocessPolicy::Reject)
            .unwrap();
        assert_eq!(r.status, ReportStatus::Approved);
        assert_eq!(r.processed_by, Some(UserId::from("m1")));
        assert_eq!(r.action_taken.as_deref(), Some("removed"));
    }

    #[test]
    fn test_cannot_move_back_to_pending() {
        let mut r = report();
        let err = r
            .process(processing(ReportStatus::Pending), ReprocessPolicy::Overwrite)
            .unwrap_err();
        assert_eq!(err, ReportTransitionError::NonTerminalTarget(ReportStatus::Pending));
    }

    #[test]
    fn test_reprocess_policies() {
        let mut r = report();
        r.process(processing(ReportStatus::Rejected), ReprocessPolicy::Reject)
            .unwrap();

        let err = r
            .process(processing(ReportStatus::Approved), ReprocessPolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, ReportTransitionError::AlreadyProcessed { status: ReportStatus::Rejected, .. }));

        r.process(processing(ReportStatus::Ignored), ReprocessPolicy::Overwrite)
            .unwrap();
        assert_eq!(r.status, ReportStatus::Ignored);
    }

    #[test]
    fn test_filter() {
        let r = report();
        assert!(ReportFilter::default().matches(&r));
        assert!(ReportFilter { status: Some(ReportStatus::Pending), target_type: Some(TargetType::Post) }.matches(&r));
        assert!(!ReportFilter { status: Some(ReportStatus::Approved), target_type: None }.matches(&r));
        assert!(!ReportFilter { status: None, target_type: Some(TargetType::User) }.matches(&r));
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Application Layer
//!
//! Service traits and their `Standard*` implementations, the read-through
//! authorization cache, the repository factory and the [`ModerationEngine`]
//! facade that wires them together.

pub mod audit_log;
pub mod authorization;
pub mod ban_ledger;
pub mod engine;
pub mod error;
pub mod maintenance;
pub mod moderator_directory;
pub mod report_workflow;
pub mod repository_factory;

pub use audit_log::{AuditLogService, StandardAuditLogService};
pub use authorization::{AuthorizationService, CachedAuthorizationService};
pub use ban_ledger::{BanService, StandardBanService};
pub use engine::ModerationEngine;
pub use error::{AuditWarning, Audited, ModerationError};
pub use maintenance::{MaintenanceReport, MaintenanceService, StandardMaintenanceService};
pub use moderator_directory::{ModeratorService, StandardModeratorService};
pub use report_workflow::{NewReport, ReportService, StandardReportService};

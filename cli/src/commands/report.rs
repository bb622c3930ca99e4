// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Report workflow commands
//!
//! Commands: create, process, get, list

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use uuid::Uuid;

use warden_core::application::NewReport;
use warden_core::domain::identity::{CommunityId, UserId};
use warden_core::domain::report::{ReportFilter, ReportId, ReportStatus, TargetType};
use warden_core::ModerationEngine;

use super::PageArgs;
use crate::output::{format_report_status, page_footer, print_audited, print_json, print_report, OutputFormat};

#[derive(Subcommand)]
pub enum ReportCommand {
    /// File a report against a post, comment, user or community
    Create {
        #[arg(value_name = "COMMUNITY_ID")]
        community: String,

        /// post, comment, user or community
        #[arg(value_name = "TARGET_TYPE")]
        target_type: TargetType,

        #[arg(value_name = "TARGET_ID")]
        target_id: String,

        /// Reporting user
        #[arg(long = "by", value_name = "USER_ID")]
        by: String,

        #[arg(long)]
        reason: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Resolve a report
    Process {
        #[arg(value_name = "REPORT_ID")]
        report_id: Uuid,

        /// approved, rejected or ignored
        #[arg(value_name = "STATUS")]
        status: ReportStatus,

        /// Acting moderator
        #[arg(long = "by", value_name = "USER_ID")]
        by: String,

        #[arg(long)]
        notes: Option<String>,

        /// Free-form description of what was done
        #[arg(long = "action")]
        action_taken: Option<String>,
    },

    /// Show one report
    Get {
        #[arg(value_name = "REPORT_ID")]
        report_id: Uuid,
    },

    /// List reports of a community, newest first
    List {
        #[arg(value_name = "COMMUNITY_ID")]
        community: String,

        #[arg(short, long)]
        status: Option<ReportStatus>,

        #[arg(short, long = "target-type")]
        target_type: Option<TargetType>,

        #[command(flatten)]
        page: PageArgs,
    },
}

pub async fn handle_command(command: ReportCommand, engine: ModerationEngine, format: OutputFormat) -> Result<()> {
    let reports = engine.reports();

    match command {
        ReportCommand::Create {
            community,
            target_type,
            target_id,
            by,
            reason,
            description,
        } => {
            let report = reports
                .create_report(NewReport {
                    reporter_id: UserId::new(by),
                    community_id: CommunityId::new(community),
                    target_id,
                    target_type,
                    reason,
                    description,
                })
                .await?;
            if format == OutputFormat::Json {
                return print_json(&report);
            }
            println!("{}", format!("✓ Report filed: {}", report.id).green());
        }
        ReportCommand::Process {
            report_id,
            status,
            by,
            notes,
            action_taken,
        } => {
            let audited = reports
                .process_report(ReportId(report_id), &UserId::new(by), status, notes, action_taken)
                .await?;
            if format == OutputFormat::Json {
                return print_json(&audited.value);
            }
            print_audited(&audited, &format!("Report {} marked {}", audited.value.id, status));
        }
        ReportCommand::Get { report_id } => {
            let report = reports.get_report(ReportId(report_id)).await?;
            if format == OutputFormat::Json {
                return print_json(&report);
            }
            print_report(&report);
        }
        ReportCommand::List {
            community,
            status,
            target_type,
            page,
        } => {
            let community = CommunityId::new(community);
            let result = reports
                .list_reports(&community, ReportFilter { status, target_type }, page.request()?)
                .await?;
            if format == OutputFormat::Json {
                return print_json(&result);
            }
            let pending = reports.count_pending_reports(&community).await?;
            println!("{} pending in {}", pending.to_string().bold(), community);
            if result.items.is_empty() {
                println!("{}", "No reports found".yellow());
                return Ok(());
            }
            for report in &result.items {
                println!(
                    "  {} [{}] {} {} - {}",
                    report.id.to_string().dimmed(),
                    format_report_status(report.status),
                    report.target_type,
                    report.target_id,
                    report.reason
                );
            }
            println!("{}", page_footer(&result).dimmed());
        }
    }

    Ok(())
}

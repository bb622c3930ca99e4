// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Terminal rendering for engine records
//!
//! Every command prints either human-readable lines or, with `--output json`,
//! the record itself serialized with serde.

use anyhow::Result;
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::Serialize;

use warden_core::domain::ban::{BanStatus, CommunityBan};
use warden_core::domain::mod_log::ModLog;
use warden_core::domain::moderator::{Moderator, ModeratorStatus};
use warden_core::domain::pagination::Paginated;
use warden_core::domain::report::{Report, ReportStatus};
use warden_core::Audited;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the success line of a mutation and, when the audit entry was lost,
/// a warning underneath it. The action itself stands either way.
pub fn print_audited<T>(audited: &Audited<T>, success: &str) {
    println!("{}", format!("✓ {}", success).green());
    match (&audited.log_id, &audited.audit_warning) {
        (_, Some(warning)) => eprintln!(
            "{}",
            format!(
                "⚠ Audit entry for {} was not recorded: {}",
                warning.action_type, warning.message
            )
            .yellow()
        ),
        (Some(log_id), None) => println!("  Audit entry: {}", log_id.to_string().dimmed()),
        (None, None) => {}
    }
}

pub fn format_moderator_status(status: ModeratorStatus) -> ColoredString {
    match status {
        ModeratorStatus::Active => status.as_str().green(),
        ModeratorStatus::Inactive => status.as_str().yellow(),
        ModeratorStatus::Pending => status.as_str().cyan(),
    }
}

pub fn format_report_status(status: ReportStatus) -> ColoredString {
    match status {
        ReportStatus::Pending => status.as_str().yellow(),
        ReportStatus::Approved => status.as_str().green(),
        ReportStatus::Rejected => status.as_str().red(),
        ReportStatus::Ignored => status.as_str().dimmed(),
    }
}

pub fn ban_term(ban: &CommunityBan) -> String {
    match (ban.expires_at, ban.duration_days) {
        (Some(until), Some(days)) => format!(
            "{} day(s), until {}",
            days,
            until.format("%Y-%m-%d %H:%M UTC")
        ),
        (Some(until), None) => format!("until {}", until.format("%Y-%m-%d %H:%M UTC")),
        (None, _) => "permanent".to_string(),
    }
}

pub fn print_moderator(moderator: &Moderator) {
    println!(
        "Moderator {} in {}",
        moderator.user_id.as_str().bold(),
        moderator.community_id
    );
    println!("  ID: {}", moderator.id);
    println!("  Role: {}", moderator.role);
    println!("  Status: {}", format_moderator_status(moderator.status));
    if let Some(removed) = moderator.deleted_at {
        println!("  Removed at: {}", removed.to_rfc3339().red());
    }
    let permissions: Vec<&str> = moderator.permissions.iter().map(|p| p.as_str()).collect();
    println!("  Permissions: {}", permissions.join(", "));
    println!(
        "  Invited by: {} at {}",
        moderator.invited_by,
        moderator.invited_at.to_rfc3339()
    );
    if let Some(notes) = &moderator.notes {
        println!("  Notes: {}", notes);
    }
    println!("  Actions logged: {}", moderator.stats.total());
    if let Some(last) = moderator.stats.last_active_at {
        println!("  Last active: {}", last.to_rfc3339());
    }
}

pub fn print_ban(ban: &CommunityBan) {
    let state = if ban.is_active {
        "active".red()
    } else {
        "lifted".dimmed()
    };
    println!(
        "  {} {} by {} [{}] {} - {}",
        ban.id.to_string().dimmed(),
        ban.user_id.as_str().bold(),
        ban.moderator_id,
        state,
        ban_term(ban),
        ban.reason
    );
}

pub fn print_ban_status(status: Option<&BanStatus>) {
    match status {
        Some(status) => println!("{}", status.denial_message().red()),
        None => println!("{}", "Not banned".green()),
    }
}

pub fn print_report(report: &Report) {
    println!("Report {}", report.id.to_string().bold());
    println!("  Status: {}", format_report_status(report.status));
    println!("  Community: {}", report.community_id);
    println!("  Reporter: {}", report.reporter_id);
    println!("  Target: {} {}", report.target_type, report.target_id);
    println!("  Reason: {}", report.reason);
    if let Some(description) = &report.description {
        println!("  Description: {}", description);
    }
    if let (Some(by), Some(at)) = (&report.processed_by, report.processed_at) {
        println!("  Processed by: {} at {}", by, at.to_rfc3339());
    }
    if let Some(notes) = &report.moderator_notes {
        println!("  Notes: {}", notes);
    }
    if let Some(action) = &report.action_taken {
        println!("  Action taken: {}", action);
    }
}

pub fn mod_log_line(entry: &ModLog) -> String {
    let mut line = format!(
        "{} {} {}",
        entry.created_at.format("%Y-%m-%d %H:%M:%S"),
        entry.moderator_id,
        entry.action_type
    );
    if let (Some(id), Some(kind)) = (&entry.target_id, &entry.target_type) {
        line.push_str(&format!(" {}:{}", kind, id));
    }
    if let Some(reason) = &entry.reason {
        line.push_str(&format!(" ({})", reason));
    }
    line
}

/// Footer printed under every paginated listing.
pub fn page_footer<T>(page: &Paginated<T>) -> String {
    format!(
        "Page {}/{} ({} total)",
        page.page,
        page.total_pages().max(1),
        page.total
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::domain::identity::{CommunityId, UserId};
    use warden_core::domain::mod_log::ModActionType;
    use warden_core::domain::pagination::PageRequest;

    fn ban(days: Option<u32>) -> CommunityBan {
        CommunityBan::new(
            CommunityId::from("c1"),
            UserId::from("u2"),
            UserId::from("m1"),
            "spam".to_string(),
            days,
        )
        .unwrap()
    }

    #[test]
    fn test_ban_term() {
        assert_eq!(ban_term(&ban(None)), "permanent");
        assert!(ban_term(&ban(Some(7))).starts_with("7 day(s), until "));
    }

    #[test]
    fn test_mod_log_line_includes_target_and_reason() {
        let entry = ModLog::new(CommunityId::from("c1"), UserId::from("m1"), ModActionType::BanUser)
            .with_target("u2", "user")
            .with_reason(Some("spam".to_string()));
        let line = mod_log_line(&entry);
        assert!(line.ends_with("m1 ban_user user:u2 (spam)"));
    }

    #[test]
    fn test_page_footer_never_reports_zero_pages() {
        let empty: Paginated<u8> = Paginated::from_sorted(Vec::new(), PageRequest::first(20).unwrap());
        assert_eq!(page_footer(&empty), "Page 1/1 (0 total)");

        let full = Paginated::from_sorted((0..45u8).collect(), PageRequest::new(2, 20).unwrap());
        assert_eq!(page_footer(&full), "Page 2/3 (45 total)");
    }
}

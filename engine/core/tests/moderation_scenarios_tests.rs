// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end scenarios through the `ModerationEngine` facade on in-memory
//! storage: invites and permissions, bans with expiry, report triage, and the
//! one-entry-per-mutation audit trail.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio_test::assert_ok;

use warden_core::application::repository_factory::Repositories;
use warden_core::application::NewReport;
use warden_core::domain::ban::CommunityBan;
use warden_core::domain::config::ModerationConfig;
use warden_core::domain::identity::{CommunityId, UserId};
use warden_core::domain::mod_log::{ModActionType, ModLog};
use warden_core::domain::moderator::ModeratorUpdate;
use warden_core::domain::pagination::PageRequest;
use warden_core::domain::permission::{default_permissions, Permission, Role};
use warden_core::domain::report::{ReportStatus, ReprocessPolicy, TargetType};
use warden_core::domain::repository::{BanRepository, ModLogRepository, RepositoryError};
use warden_core::infrastructure::cache::InMemoryCacheStore;
use warden_core::{ModerationEngine, ModerationError};

fn engine() -> ModerationEngine {
    ModerationEngine::in_memory(&ModerationConfig::default())
}

fn user(id: &str) -> UserId {
    UserId::from(id)
}

fn community(id: &str) -> CommunityId {
    CommunityId::from(id)
}

async fn audit_actions(engine: &ModerationEngine, community_id: &CommunityId) -> Vec<ModActionType> {
    let page = assert_ok!(engine.audit().get_mod_logs(community_id, None, PageRequest::new(1, 100).unwrap()).await);
    // Oldest first reads more naturally in assertions.
    page.items.into_iter().rev().map(|l| l.action_type).collect()
}

#[tokio::test]
async fn test_invited_moderator_can_ban() {
    let engine = engine();
    let (u1, c1) = (user("u1"), community("c1"));

    assert_ok!(engine.moderators().add_moderator(&u1, &c1, Role::Moderator, &user("owner")).await);

    assert!(assert_ok!(engine.moderators().has_permission(&u1, &c1, Permission::BanUser).await));
    assert!(assert_ok!(engine.authorization().has_permission(&u1, &c1, Permission::BanUser).await));
    assert!(!assert_ok!(engine.authorization().is_admin(&u1, &c1).await));
}

#[tokio::test]
async fn test_seven_day_ban_reports_temporary_status() {
    let engine = engine();
    let (m1, u2, c1) = (user("m1"), user("u2"), community("c1"));

    let before = Utc::now();
    assert_ok!(engine.bans().ban_user(&m1, &u2, &c1, "spam", Some(7)).await);
    let after = Utc::now();

    let status = assert_ok!(engine.authorization().is_user_banned(&u2, &c1).await).expect("user is banned");
    assert_eq!(status.reason, "spam");
    assert!(!status.is_permanent);
    let expires_at = status.expires_at.expect("temporary ban has an expiry");
    assert!(expires_at >= before + chrono::Duration::days(7));
    assert!(expires_at <= after + chrono::Duration::days(7));
    assert!(status.denial_message().starts_with("You are banned from this community until "));
}

#[tokio::test]
async fn test_report_triage() {
    let engine = engine();
    let c1 = community("c1");

    let report = assert_ok!(
        engine
            .reports()
            .create_report(NewReport {
                reporter_id: user("r1"),
                community_id: c1.clone(),
                target_id: "p1".to_string(),
                target_type: TargetType::Post,
                reason: "spam".to_string(),
                description: None,
            })
            .await
    );
    assert_eq!(report.status, ReportStatus::Pending);
    assert_eq!(assert_ok!(engine.reports().count_pending_reports(&c1).await), 1);

    let processed = assert_ok!(
        engine
            .reports()
            .process_report(
                report.id,
                &user("m1"),
                ReportStatus::Approved,
                Some("ok".to_string()),
                Some("removed".to_string()),
            )
            .await
    );
    assert_eq!(processed.value.status, ReportStatus::Approved);
    assert_eq!(processed.value.action_taken.as_deref(), Some("removed"));

    let fetched = assert_ok!(engine.reports().get_report(report.id).await);
    assert_eq!(fetched.processed_by, Some(user("m1")));
    assert_eq!(fetched.moderator_notes.as_deref(), Some("ok"));

    // Default policy keeps outcomes final.
    assert_eq!(engine.config().spec.reports.reprocess_policy, ReprocessPolicy::Reject);
    let err = engine
        .reports()
        .process_report(report.id, &user("m2"), ReportStatus::Ignored, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ModerationError::InvalidState(_)));
}

#[tokio::test]
async fn test_overwrite_policy_from_config() {
    let mut config = ModerationConfig::default();
    config.spec.reports.reprocess_policy = ReprocessPolicy::Overwrite;
    let engine = ModerationEngine::in_memory(&config);

    let report = assert_ok!(
        engine
            .reports()
            .create_report(NewReport {
                reporter_id: user("r1"),
                community_id: community("c1"),
                target_id: "u9".to_string(),
                target_type: TargetType::User,
                reason: "harassment".to_string(),
                description: Some("repeated DMs".to_string()),
            })
            .await
    );
    assert_ok!(
        engine
            .reports()
            .process_report(report.id, &user("m1"), ReportStatus::Rejected, None, None)
            .await
    );
    let second = assert_ok!(
        engine
            .reports()
            .process_report(report.id, &user("m2"), ReportStatus::Approved, None, Some("warned".to_string()))
            .await
    );
    assert_eq!(second.value.status, ReportStatus::Approved);
    assert_eq!(second.value.processed_by, Some(user("m2")));
}

#[tokio::test]
async fn test_every_mutation_appends_exactly_one_entry() {
    let engine = engine();
    let (owner, m1, u2, c1) = (user("owner"), user("m1"), user("u2"), community("c1"));

    assert_ok!(engine.moderators().add_moderator(&m1, &c1, Role::Moderator, &owner).await);
    assert_ok!(
        engine
            .moderators()
            .update_moderator(
                &c1,
                &m1,
                &owner,
                ModeratorUpdate {
                    role: Some(Role::ContentMod),
                    ..Default::default()
                },
            )
            .await
    );
    assert_ok!(engine.bans().ban_user(&m1, &u2, &c1, "spam", None).await);
    assert_ok!(engine.bans().ban_user(&m1, &u2, &c1, "spam again", Some(2)).await);
    assert_ok!(engine.bans().unban_user(&m1, &u2, &c1).await);
    let report = assert_ok!(
        engine
            .reports()
            .create_report(NewReport {
                reporter_id: user("r1"),
                community_id: c1.clone(),
                target_id: "c42".to_string(),
                target_type: TargetType::Comment,
                reason: "off-topic".to_string(),
                description: None,
            })
            .await
    );
    assert_ok!(
        engine
            .reports()
            .process_report(report.id, &m1, ReportStatus::Ignored, None, None)
            .await
    );
    assert_ok!(engine.moderators().remove_moderator(&c1, &m1, &owner, Some("stepped down".to_string())).await);

    // Reads and failed mutations write nothing.
    assert_ok!(engine.moderators().list_moderators(&c1, PageRequest::default()).await);
    assert!(engine.bans().unban_user(&m1, &u2, &c1).await.is_err());
    assert_ok!(engine.bans().is_user_banned(&u2, &c1).await);

    assert_eq!(
        audit_actions(&engine, &c1).await,
        vec![
            ModActionType::AddModerator,
            ModActionType::ChangeModeratorRole,
            ModActionType::BanUser,
            ModActionType::TempBanUser,
            ModActionType::UnbanUser,
            ModActionType::ProcessReport,
            ModActionType::RemoveModerator,
        ]
    );

    let by_owner = assert_ok!(engine.audit().get_mod_logs(&c1, Some(&owner), PageRequest::default()).await);
    assert_eq!(by_owner.total, 3);
}

#[tokio::test]
async fn test_role_change_resets_to_registry_defaults() {
    let engine = engine();
    let (u1, c1, owner) = (user("u1"), community("c1"), user("owner"));
    assert_ok!(engine.moderators().add_moderator(&u1, &c1, Role::Admin, &owner).await);

    for role in Role::ALL {
        let updated = assert_ok!(
            engine
                .moderators()
                .update_moderator(
                    &c1,
                    &u1,
                    &owner,
                    ModeratorUpdate {
                        role: Some(role),
                        ..Default::default()
                    },
                )
                .await
        );
        assert_eq!(&updated.value.permissions, default_permissions(role));
    }
}

#[tokio::test]
async fn test_concurrent_invites_conflict() {
    let engine = engine();

    let mut handles = Vec::new();
    for i in 0..12 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .moderators()
                .add_moderator(&user("u1"), &community("c1"), Role::Moderator, &user(&format!("inviter{i}")))
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert!(e.is_conflict(), "unexpected error: {e}"),
        }
    }
    assert_eq!(created, 1);

    let page = assert_ok!(engine.moderators().list_moderators(&community("c1"), PageRequest::default()).await);
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn test_expired_ban_is_lifted_and_sweep_is_idempotent() {
    let repositories = Repositories::in_memory();
    let engine = ModerationEngine::with_parts(
        &ModerationConfig::default(),
        repositories.clone(),
        Arc::new(InMemoryCacheStore::new(100)),
        None,
    );
    let (u2, u3, c1) = (user("u2"), user("u3"), community("c1"));

    for target in [&u2, &u3] {
        let mut ban = CommunityBan::new(c1.clone(), target.clone(), user("m1"), "spam".to_string(), Some(1)).unwrap();
        ban.expires_at = Some(Utc::now() - chrono::Duration::hours(1));
        assert_ok!(repositories.bans.upsert_active(&ban).await);
    }

    // Lazy path for u2.
    assert!(assert_ok!(engine.bans().is_user_banned(&u2, &c1).await).is_none());
    assert!(assert_ok!(repositories.bans.find_active(&c1, &u2).await).is_none());

    // Sweep catches u3 only, then finds nothing.
    assert_eq!(assert_ok!(engine.maintenance().expire_bans().await), 1);
    assert_eq!(assert_ok!(engine.maintenance().expire_bans().await), 0);

    // Bookkeeping is not a moderator action.
    assert!(audit_actions(&engine, &c1).await.is_empty());
}

struct UnavailableModLogRepository;

#[async_trait]
impl ModLogRepository for UnavailableModLogRepository {
    async fn append(&self, _entry: &ModLog) -> Result<(), RepositoryError> {
        Err(RepositoryError::Database("mod_logs: connection refused".to_string()))
    }

    async fn list(
        &self,
        _community_id: &CommunityId,
        _moderator_id: Option<&UserId>,
        _page: PageRequest,
    ) -> Result<(Vec<ModLog>, u64), RepositoryError> {
        Err(RepositoryError::Database("mod_logs: connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_audit_failure_is_a_warning_not_a_rollback() {
    let mut repositories = Repositories::in_memory();
    repositories.mod_logs = Arc::new(UnavailableModLogRepository);
    let engine = ModerationEngine::with_parts(
        &ModerationConfig::default(),
        repositories,
        Arc::new(InMemoryCacheStore::new(100)),
        None,
    );
    let (m1, u2, c1) = (user("m1"), user("u2"), community("c1"));

    let banned = assert_ok!(engine.bans().ban_user(&m1, &u2, &c1, "spam", None).await);
    assert!(!banned.is_logged());
    let warning = banned.audit_warning.expect("audit warning attached");
    assert_eq!(warning.action_type, ModActionType::BanUser);
    assert!(warning.message.contains("connection refused"));

    // The ban itself stands.
    let status = assert_ok!(engine.bans().is_user_banned(&u2, &c1).await);
    assert!(status.is_some_and(|s| s.is_permanent));

    let err = engine
        .audit()
        .get_mod_logs(&c1, None, PageRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ModerationError::Internal(_)));
}

#[tokio::test]
async fn test_pagination_bounds() {
    assert!(PageRequest::new(0, 10).is_err());
    assert!(PageRequest::new(1, 0).is_err());
    assert!(PageRequest::new(1, 101).is_err());

    let engine = engine();
    let c1 = community("c1");
    for i in 0..5 {
        assert_ok!(
            engine
                .moderators()
                .add_moderator(&user(&format!("u{i}")), &c1, Role::AutoMod, &user("owner"))
                .await
        );
    }
    let last = assert_ok!(engine.moderators().list_moderators(&c1, PageRequest::new(3, 2).unwrap()).await);
    assert_eq!(last.total, 5);
    assert_eq!(last.items.len(), 1);
    let beyond = assert_ok!(engine.moderators().list_moderators(&c1, PageRequest::new(4, 2).unwrap()).await);
    assert!(beyond.items.is_empty());
}

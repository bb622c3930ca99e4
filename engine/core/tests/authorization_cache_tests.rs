// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Staleness window and failure behaviour of the authorization cache as seen
//! through the engine facade. Tokio time is paused so TTLs can be crossed
//! deterministically.

use std::time::Duration;

use warden_core::domain::config::ModerationConfig;
use warden_core::domain::identity::{CommunityId, UserId};
use warden_core::domain::moderator::{ModeratorStatus, ModeratorUpdate};
use warden_core::domain::permission::{Permission, Role};
use warden_core::ModerationEngine;

fn ids() -> (UserId, CommunityId, UserId) {
    (UserId::from("u1"), CommunityId::from("c1"), UserId::from("owner"))
}

async fn downgrade(engine: &ModerationEngine, role: Role) {
    let (u1, c1, owner) = ids();
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
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_admin_downgrade_is_visible_only_after_ttl() {
    let engine = ModerationEngine::in_memory(&ModerationConfig::default());
    let (u1, c1, owner) = ids();
    engine.moderators().add_moderator(&u1, &c1, Role::Admin, &owner).await.unwrap();

    // T: cache admin:u1:c1 = true
    assert!(engine.authorization().is_admin(&u1, &c1).await.unwrap());

    // T+10s: role downgraded.
    tokio::time::advance(Duration::from_secs(10)).await;
    downgrade(&engine, Role::Moderator).await;

    // T+60s: still served from cache.
    tokio::time::advance(Duration::from_secs(50)).await;
    assert!(engine.authorization().is_admin(&u1, &c1).await.unwrap());
    assert!(!engine.moderators().is_admin(&u1, &c1).await.unwrap());

    // Past T+5m: refreshed from the directory.
    tokio::time::advance(Duration::from_secs(241)).await;
    assert!(!engine.authorization().is_admin(&u1, &c1).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_permission_and_membership_answers_share_the_window() {
    let engine = ModerationEngine::in_memory(&ModerationConfig::default());
    let (u1, c1, owner) = ids();
    engine.moderators().add_moderator(&u1, &c1, Role::Moderator, &owner).await.unwrap();

    assert!(engine.authorization().is_moderator_or_higher(&u1, &c1).await.unwrap());
    assert!(engine.authorization().has_permission(&u1, &c1, Permission::BanUser).await.unwrap());

    engine
        .moderators()
        .update_moderator(
            &c1,
            &u1,
            &owner,
            ModeratorUpdate {
                status: Some(ModeratorStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(299)).await;
    assert!(engine.authorization().is_moderator_or_higher(&u1, &c1).await.unwrap());
    assert!(engine.authorization().has_permission(&u1, &c1, Permission::BanUser).await.unwrap());

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(!engine.authorization().is_moderator_or_higher(&u1, &c1).await.unwrap());
    assert!(!engine.authorization().has_permission(&u1, &c1, Permission::BanUser).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_ban_answers_refresh_after_one_minute() {
    let engine = ModerationEngine::in_memory(&ModerationConfig::default());
    let (m1, u2, c1) = (UserId::from("m1"), UserId::from("u2"), CommunityId::from("c1"));

    assert!(engine.authorization().is_user_banned(&u2, &c1).await.unwrap().is_none());
    engine.bans().ban_user(&m1, &u2, &c1, "spam", None).await.unwrap();

    // Cached "not banned" is still served inside the window.
    tokio::time::advance(Duration::from_secs(59)).await;
    assert!(engine.authorization().is_user_banned(&u2, &c1).await.unwrap().is_none());

    tokio::time::advance(Duration::from_secs(2)).await;
    let status = engine.authorization().is_user_banned(&u2, &c1).await.unwrap().expect("banned");
    assert_eq!(
        status.denial_message(),
        "You are permanently banned from this community. Reason: spam"
    );
}

#[tokio::test]
async fn test_disabled_cache_answers_from_the_directory() {
    let mut config = ModerationConfig::default();
    config.spec.cache.enabled = false;
    let engine = ModerationEngine::in_memory(&config);
    let (u1, c1, owner) = ids();
    engine.moderators().add_moderator(&u1, &c1, Role::Admin, &owner).await.unwrap();

    assert!(engine.authorization().is_admin(&u1, &c1).await.unwrap());
    downgrade(&engine, Role::UserMod).await;
    assert!(!engine.authorization().is_admin(&u1, &c1).await.unwrap());
    assert!(engine.authorization().has_permission(&u1, &c1, Permission::MuteUser).await.unwrap());
}

#[tokio::test]
async fn test_ids_containing_the_key_separator_get_their_own_entries() {
    let engine = ModerationEngine::in_memory(&ModerationConfig::default());
    let owner = UserId::from("owner");
    let (a, b_c) = (UserId::from("a"), CommunityId::from("b:c"));
    let (a_b, c) = (UserId::from("a:b"), CommunityId::from("c"));

    engine.moderators().add_moderator(&a, &b_c, Role::Admin, &owner).await.unwrap();
    assert!(engine.authorization().is_admin(&a, &b_c).await.unwrap());

    // Same characters, different pair: no shared cache entry.
    assert!(!engine.moderators().is_admin(&a_b, &c).await.unwrap());
    assert!(!engine.authorization().is_admin(&a_b, &c).await.unwrap());
    assert!(!engine.authorization().is_moderator_or_higher(&a_b, &c).await.unwrap());
    assert!(!engine
        .authorization()
        .has_permission(&a_b, &c, Permission::BanUser)
        .await
        .unwrap());
}

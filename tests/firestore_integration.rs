// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running, with
//! FIRESTORE_EMULATOR_HOST pointing at it. Without it they are skipped.
//!
//! The emulator is shared between tests, so every test uses fresh ids.

use chrono::Utc;
use gymhub::db::{OwnerChange, Store};
use gymhub::error::AppError;
use gymhub::models::{
    BillingCycle, DurationUnit, GrantStatus, Gym, GymMembership, Member, MemberStatus,
    MembershipPlan, PasswordHash, PlanStatus, PlanType, Role, User,
};
use std::sync::Arc;

mod common;
use common::test_store;

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

fn test_user(role: Role) -> User {
    let now = Utc::now();
    User {
        id: unique("user"),
        name: "Test User".to_string(),
        email: format!("{}@example.com", unique("mail")),
        password_hash: PasswordHash("not-a-real-hash".to_string()),
        role,
        gym_id: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn test_plan(max_members: u32) -> MembershipPlan {
    let now = Utc::now();
    MembershipPlan {
        id: unique("plan"),
        name: unique("Plan"),
        plan_type: PlanType::Basic,
        description: String::new(),
        price: 1000.0,
        original_price: None,
        billing_cycle: BillingCycle::Monthly,
        duration: 1,
        duration_unit: DurationUnit::Months,
        setup_fee: 0.0,
        features: Vec::new(),
        max_gyms: 1,
        max_staff: 1,
        max_members,
        free_trial_days: 0,
        renewal_discount: 0.0,
        is_featured: false,
        is_popular: false,
        status: PlanStatus::Active,
        created_by: None,
        created_at: now,
        updated_at: now,
    }
}

fn test_member(gym_id: &str, grant_id: &str) -> Member {
    let now = Utc::now();
    Member {
        id: unique("member"),
        gym_id: gym_id.to_string(),
        gym_membership_id: grant_id.to_string(),
        name: "Member".to_string(),
        email: None,
        phone: None,
        start_date: now,
        end_date: None,
        status: MemberStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

/// Owner, gym and a grant of a fresh plan with `max_members` slots.
async fn provisioned(store: &Store, max_members: u32) -> (User, Gym, GymMembership) {
    let plan = test_plan(max_members);
    store.insert_plan(&plan).await.unwrap();

    let mut owner = test_user(Role::GymOwner);
    let gym = Gym::new("Emulator Gym", Some(owner.id.clone()), None);
    owner.gym_id = Some(gym.id.clone());
    let grant = GymMembership::issue(&gym.id, &plan, None, Utc::now());

    store.provision_owner(&owner, &gym, Some(&grant)).await.unwrap();
    (owner, gym, grant)
}

// ═══════════════════════════════════════════════════════════════════════════
// USER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_user_insert_and_lookup() {
    require_emulator!();
    let store = test_store().await;

    let user = test_user(Role::SuperAdmin);
    assert!(store.get_user(&user.id).await.unwrap().is_none());

    store.insert_user(&user).await.unwrap();

    let fetched = store.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(fetched.email, user.email);
    assert_eq!(fetched.role, Role::SuperAdmin);

    let by_email = store.find_user_by_email(&user.email).await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    require_emulator!();
    let store = test_store().await;

    let first = test_user(Role::GymOwner);
    store.insert_user(&first).await.unwrap();

    let mut second = test_user(Role::GymOwner);
    second.email = first.email.clone();
    let err = store.insert_user(&second).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

// ═══════════════════════════════════════════════════════════════════════════
// GYM TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_provision_links_owner_and_gym() {
    require_emulator!();
    let store = test_store().await;

    let (owner, gym, grant) = provisioned(&store, 5).await;

    let stored_owner = store.get_user(&owner.id).await.unwrap().unwrap();
    assert_eq!(stored_owner.gym_id.as_deref(), Some(gym.id.as_str()));

    let stored_gym = store.get_gym(&gym.id).await.unwrap().unwrap();
    assert_eq!(stored_gym.owner_id.as_deref(), Some(owner.id.as_str()));

    let active = store.active_grant_for_gym(&gym.id).await.unwrap().unwrap();
    assert_eq!(active.id, grant.id);
    assert_eq!(active.max_members, 5);
}

#[tokio::test]
async fn test_reassign_and_delete_gym() {
    require_emulator!();
    let store = test_store().await;

    let (old_owner, gym, _) = provisioned(&store, 5).await;
    let new_owner = test_user(Role::GymOwner);
    store.insert_user(&new_owner).await.unwrap();

    let change = store.reassign_gym_owner(&gym, &new_owner.id).await.unwrap();
    assert_eq!(
        change,
        OwnerChange::Reassigned {
            previous_owner: Some(old_owner.id.clone())
        }
    );
    let old = store.get_user(&old_owner.id).await.unwrap().unwrap();
    assert!(old.gym_id.is_none());
    let new = store.get_user(&new_owner.id).await.unwrap().unwrap();
    assert_eq!(new.gym_id.as_deref(), Some(gym.id.as_str()));

    let admin = test_user(Role::SuperAdmin);
    store.insert_user(&admin).await.unwrap();
    let change = store.reassign_gym_owner(&gym, &admin.id).await.unwrap();
    assert_eq!(change, OwnerChange::InvalidOwner);

    let unlinked = store.delete_gym(&gym.id).await.unwrap();
    assert_eq!(unlinked, 1);
    assert!(store.get_gym(&gym.id).await.unwrap().is_none());
    let new = store.get_user(&new_owner.id).await.unwrap().unwrap();
    assert!(new.gym_id.is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// CAPACITY TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_create_member_respects_capacity() {
    require_emulator!();
    let store = test_store().await;
    let (_, gym, grant) = provisioned(&store, 2).await;

    for expected in 1..=2 {
        let snapshot = store
            .create_member(&test_member(&gym.id, &grant.id))
            .await
            .unwrap();
        assert_eq!(snapshot.current_members, expected);
    }

    let err = store
        .create_member(&test_member(&gym.id, &grant.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CapacityExceeded));

    assert_eq!(store.list_members_for_gym(&gym.id).await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_admissions() {
    require_emulator!();
    let store = Arc::new(test_store().await);
    let (_, gym, grant) = provisioned(&store, 3).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        let member = test_member(&gym.id, &grant.id);
        handles.push(tokio::spawn(async move { store.create_member(&member).await }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 3);

    let stored = store.get_grant(&grant.id).await.unwrap().unwrap();
    assert_eq!(stored.current_members, 3);
}

#[tokio::test]
async fn test_delete_member_releases_once() {
    require_emulator!();
    let store = test_store().await;
    let (_, gym, grant) = provisioned(&store, 2).await;

    let member = test_member(&gym.id, &grant.id);
    store.create_member(&member).await.unwrap();

    let deleted = store.delete_member(&member.id).await.unwrap();
    assert_eq!(deleted.id, member.id);

    let err = store.delete_member(&member.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let stored = store.get_grant(&grant.id).await.unwrap().unwrap();
    assert_eq!(stored.current_members, 0);
}

#[tokio::test]
async fn test_update_after_delete_does_not_resurrect_member() {
    require_emulator!();
    let store = test_store().await;
    let (_, gym, grant) = provisioned(&store, 2).await;

    let mut member = test_member(&gym.id, &grant.id);
    store.create_member(&member).await.unwrap();

    member.name = "Renamed".to_string();
    store.update_member(&member).await.unwrap();
    let stored = store.get_member(&member.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Renamed");

    store.delete_member(&member.id).await.unwrap();

    // A late update of the deleted member must not write it back
    member.name = "Ghost".to_string();
    let err = store.update_member(&member).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(store.get_member(&member.id).await.unwrap().is_none());

    let stored = store.get_grant(&grant.id).await.unwrap().unwrap();
    assert_eq!(stored.current_members, 0);
    assert!(store.list_members_for_gym(&gym.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_issue_grant_supersedes() {
    require_emulator!();
    let store = test_store().await;
    let (_, gym, first) = provisioned(&store, 2).await;

    let plan = test_plan(10);
    store.insert_plan(&plan).await.unwrap();
    let second = GymMembership::issue(&gym.id, &plan, None, Utc::now());

    let superseded = store.issue_grant(&second).await.unwrap();
    assert_eq!(superseded, 1);

    let old = store.get_grant(&first.id).await.unwrap().unwrap();
    assert_eq!(old.status, GrantStatus::Superseded);
    let active = store.active_grant_for_gym(&gym.id).await.unwrap().unwrap();
    assert_eq!(active.id, second.id);

    // A plan with an active grant can't be deleted
    let err = store.delete_plan(&plan.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

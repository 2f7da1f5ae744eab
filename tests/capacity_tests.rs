// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Member capacity tests.
//!
//! Concurrent admissions and removals must keep the grant counter equal to
//! the number of members counted against it, and never above the ceiling.

use gymhub::error::AppError;
use gymhub::models::{GrantStatus, PlanView};
use gymhub::services::plans::PlanInput;
use gymhub::services::roster::{CreateMemberRequest, UpdateMemberRequest};
use std::sync::Arc;

mod common;
use common::{create_test_app, seed_owner, seed_plan};

fn member(name: &str) -> CreateMemberRequest {
    CreateMemberRequest {
        name: name.to_string(),
        email: None,
        phone: None,
        start_date: None,
        end_date: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_admissions_stop_at_capacity() {
    let (_, state) = create_test_app();
    let plan = seed_plan(&state, "Small", 5).await;
    let onboarded = seed_owner(&state, "owner@gymhub.test", Some(&plan.plan.id)).await;
    let owner = Arc::new(onboarded.owner);

    let mut handles = Vec::new();
    for i in 0..20 {
        let state = state.clone();
        let owner = owner.clone();
        handles.push(tokio::spawn(async move {
            state
                .roster
                .create(&owner, member(&format!("Member {}", i)))
                .await
        }));
    }

    let mut admitted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(AppError::CapacityExceeded) => rejected += 1,
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }
    assert_eq!(admitted, 5);
    assert_eq!(rejected, 15);

    let (members, capacity) = state.roster.list(&owner).await.unwrap();
    assert_eq!(members.len(), 5);
    let capacity = capacity.unwrap();
    assert_eq!(capacity.current_members, 5);
    assert_eq!(capacity.max_members, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_last_slot_race_has_one_winner() {
    let (_, state) = create_test_app();
    let plan = seed_plan(&state, "Solo", 1).await;
    let onboarded = seed_owner(&state, "owner@gymhub.test", Some(&plan.plan.id)).await;
    let owner = Arc::new(onboarded.owner);

    let first = {
        let (state, owner) = (state.clone(), owner.clone());
        tokio::spawn(async move { state.roster.create(&owner, member("First")).await })
    };
    let second = {
        let (state, owner) = (state.clone(), owner.clone());
        tokio::spawn(async move { state.roster.create(&owner, member("Second")).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(AppError::CapacityExceeded))));
}

#[tokio::test]
async fn test_full_roster_is_unchanged_by_rejection() {
    let (_, state) = create_test_app();
    let plan = seed_plan(&state, "Pair", 2).await;
    let onboarded = seed_owner(&state, "owner@gymhub.test", Some(&plan.plan.id)).await;
    let owner = onboarded.owner;

    state.roster.create(&owner, member("A")).await.unwrap();
    let (_, capacity) = state.roster.create(&owner, member("B")).await.unwrap();
    assert_eq!(capacity.current_members, 2);

    let err = state.roster.create(&owner, member("C")).await.unwrap_err();
    assert!(matches!(err, AppError::CapacityExceeded));

    let (members, capacity) = state.roster.list(&owner).await.unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(capacity.unwrap().current_members, 2);
}

#[tokio::test]
async fn test_delete_frees_a_slot() {
    let (_, state) = create_test_app();
    let plan = seed_plan(&state, "Solo", 1).await;
    let onboarded = seed_owner(&state, "owner@gymhub.test", Some(&plan.plan.id)).await;
    let owner = onboarded.owner;

    let (first, _) = state.roster.create(&owner, member("First")).await.unwrap();
    assert!(state.roster.create(&owner, member("Second")).await.is_err());

    state.roster.delete(&owner, &first.id).await.unwrap();
    let (_, capacity) = state.roster.create(&owner, member("Second")).await.unwrap();
    assert_eq!(capacity.current_members, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_double_delete_releases_once() {
    let (_, state) = create_test_app();
    let plan = seed_plan(&state, "Trio", 3).await;
    let onboarded = seed_owner(&state, "owner@gymhub.test", Some(&plan.plan.id)).await;
    let owner = Arc::new(onboarded.owner);

    state.roster.create(&owner, member("Keep")).await.unwrap();
    let (doomed, _) = state.roster.create(&owner, member("Doomed")).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..2 {
        let (state, owner, id) = (state.clone(), owner.clone(), doomed.id.clone());
        handles.push(tokio::spawn(
            async move { state.roster.delete(&owner, &id).await },
        ));
    }

    let mut deleted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => deleted += 1,
            Err(AppError::NotFound(_)) => {}
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }
    assert_eq!(deleted, 1);

    let (members, capacity) = state.roster.list(&owner).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(capacity.unwrap().current_members, 1);
}

#[tokio::test]
async fn test_release_floors_at_zero() {
    let (_, state) = create_test_app();
    let plan = seed_plan(&state, "Gold", 3).await;
    let onboarded = seed_owner(&state, "owner@gymhub.test", Some(&plan.plan.id)).await;
    let grant = onboarded.membership.unwrap().grant;

    state.grants.release(&grant.id).await.unwrap();
    state.grants.release(&grant.id).await.unwrap();

    let stored = state.store.get_grant(&grant.id).await.unwrap().unwrap();
    assert_eq!(stored.current_members, 0);
}

#[tokio::test]
async fn test_reserve_and_release_directly() {
    let (_, state) = create_test_app();
    let plan = seed_plan(&state, "Pair", 2).await;
    let onboarded = seed_owner(&state, "owner@gymhub.test", Some(&plan.plan.id)).await;
    let grant_id = onboarded.membership.unwrap().grant.id;

    assert!(state.grants.reserve(&grant_id).await.unwrap());
    assert!(state.grants.reserve(&grant_id).await.unwrap());
    assert!(!state.grants.reserve(&grant_id).await.unwrap());

    state.grants.release(&grant_id).await.unwrap();
    assert!(state.grants.reserve(&grant_id).await.unwrap());
}

#[tokio::test]
async fn test_regrant_supersedes_previous() {
    let (_, state) = create_test_app();
    let small = seed_plan(&state, "Small", 1).await;
    let large = seed_plan(&state, "Large", 10).await;
    let onboarded = seed_owner(&state, "owner@gymhub.test", Some(&small.plan.id)).await;
    let owner = onboarded.owner;
    let first_grant = onboarded.membership.unwrap().grant;

    let (kept, _) = state.roster.create(&owner, member("Early")).await.unwrap();
    assert!(state.roster.create(&owner, member("Late")).await.is_err());

    let details = state
        .grants
        .grant(&onboarded.gym.id, &large.plan.id, Some("admin-1"))
        .await
        .unwrap();
    assert_eq!(details.grant.max_members, 10);
    assert_eq!(details.grant.current_members, 0);

    let old = state.store.get_grant(&first_grant.id).await.unwrap().unwrap();
    assert_eq!(old.status, GrantStatus::Superseded);

    let active = state
        .grants
        .active_for_gym(&onboarded.gym.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.id, details.grant.id);

    // New admissions count against the new grant
    let (late, capacity) = state.roster.create(&owner, member("Late")).await.unwrap();
    assert_eq!(late.gym_membership_id, details.grant.id);
    assert_eq!(capacity.current_members, 1);

    // Existing members keep their original grant reference
    let early = state.store.get_member(&kept.id).await.unwrap().unwrap();
    assert_eq!(early.gym_membership_id, first_grant.id);
}

#[tokio::test]
async fn test_plan_edit_leaves_grant_ceiling() {
    let (_, state) = create_test_app();
    let plan = seed_plan(&state, "Gold", 2).await;
    let onboarded = seed_owner(&state, "owner@gymhub.test", Some(&plan.plan.id)).await;

    let updated: PlanView = state
        .plans
        .update(
            &plan.plan.id,
            PlanInput {
                max_members: Some(50),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.plan.max_members, 50);

    let grant = state
        .grants
        .active_for_gym(&onboarded.gym.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(grant.max_members, 2);
}

#[tokio::test]
async fn test_no_grant_means_no_admission() {
    let (_, state) = create_test_app();
    let onboarded = seed_owner(&state, "owner@gymhub.test", None).await;

    let err = state
        .roster
        .create(&onboarded.owner, member("Nobody"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(msg) if msg == "Gym Membership not found"));
}

#[tokio::test]
async fn test_update_does_not_touch_counter() {
    let (_, state) = create_test_app();
    let plan = seed_plan(&state, "Gold", 3).await;
    let onboarded = seed_owner(&state, "owner@gymhub.test", Some(&plan.plan.id)).await;
    let owner = onboarded.owner;

    let (created, _) = state.roster.create(&owner, member("Alex")).await.unwrap();
    let updated = state
        .roster
        .update(
            &owner,
            &created.id,
            UpdateMemberRequest {
                phone: Some("555-0100".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.phone.as_deref(), Some("555-0100"));
    assert_eq!(updated.gym_membership_id, created.gym_membership_id);

    let (_, capacity) = state.roster.list(&owner).await.unwrap();
    assert_eq!(capacity.unwrap().current_members, 1);
}

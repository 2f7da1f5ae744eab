// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Membership grants and the capacity counter.
//!
//! A grant binds one plan to one gym. Issuing a new grant supersedes the gym's
//! previous active grant in the same commit, so a gym never has two.

use chrono::Utc;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{GrantDetails, GymMembership, MembershipPlan, PlanView};

#[derive(Clone)]
pub struct MembershipGrants {
    store: Store,
}

impl MembershipGrants {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Grant `plan_id` to `gym_id`, starting now.
    pub async fn grant(
        &self,
        gym_id: &str,
        plan_id: &str,
        granted_by: Option<&str>,
    ) -> Result<GrantDetails> {
        if self.store.get_gym(gym_id).await?.is_none() {
            return Err(AppError::NotFound("Gym not found".to_string()));
        }
        let plan = self
            .store
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Plan not found".to_string()))?;

        let grant = Self::issue(gym_id, &plan, granted_by);
        let superseded = self.store.issue_grant(&grant).await?;

        tracing::info!(
            gym_id,
            plan_id,
            grant_id = %grant.id,
            max_members = grant.max_members,
            superseded,
            "Gym membership granted"
        );

        Ok(GrantDetails {
            grant,
            plan: Some(PlanView::from(plan)),
        })
    }

    /// Build a fresh grant without storing it.
    pub fn issue(gym_id: &str, plan: &MembershipPlan, granted_by: Option<&str>) -> GymMembership {
        GymMembership::issue(gym_id, plan, granted_by.map(str::to_string), Utc::now())
    }

    /// The gym's active grant, if any.
    pub async fn active_for_gym(&self, gym_id: &str) -> Result<Option<GymMembership>> {
        self.store.active_grant_for_gym(gym_id).await
    }

    /// Take one slot. `false` when the grant is full or superseded.
    pub async fn reserve(&self, grant_id: &str) -> Result<bool> {
        let admitted = self.store.reserve_capacity(grant_id).await?;
        if !admitted {
            tracing::debug!(grant_id, "Capacity reservation rejected");
        }
        Ok(admitted)
    }

    /// Give one slot back, never below zero.
    pub async fn release(&self, grant_id: &str) -> Result<()> {
        self.store.release_capacity(grant_id).await
    }
}

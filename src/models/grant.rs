// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym membership grants: a plan bound to one gym with a member ceiling.
//!
//! The counter rules live here as plain methods so both store backends apply
//! identical arithmetic inside their own atomic scopes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::MembershipPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantStatus {
    #[default]
    Active,
    /// Replaced by a newer grant for the same gym
    Superseded,
}

/// Grant stored in the `gym_memberships` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GymMembership {
    /// Document ID
    pub id: String,
    pub gym_id: String,
    pub plan_id: String,
    /// Administrator who issued the grant
    #[serde(default)]
    pub purchased_by: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Copied from the plan when the grant was issued
    pub max_members: u32,
    #[serde(default)]
    pub current_members: u32,
    #[serde(default)]
    pub status: GrantStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Counter view returned alongside roster mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacitySnapshot {
    pub max_members: u32,
    pub current_members: u32,
}

impl GymMembership {
    /// Issue a fresh grant of `plan` to `gym_id`, valid from `now`.
    pub fn issue(
        gym_id: &str,
        plan: &MembershipPlan,
        purchased_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            gym_id: gym_id.to_string(),
            plan_id: plan.id.clone(),
            purchased_by,
            start_date: now,
            end_date: Duration::try_days(plan.duration_in_days())
                .and_then(|span| now.checked_add_signed(span))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            max_members: plan.max_members,
            current_members: 0,
            status: GrantStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == GrantStatus::Active
    }

    /// Admission control: take one slot if one is free.
    ///
    /// Returns `false` without touching the counter when the grant is full.
    pub fn try_reserve(&mut self) -> bool {
        if self.current_members < self.max_members {
            self.current_members += 1;
            self.updated_at = Utc::now();
            true
        } else {
            false
        }
    }

    /// Give one slot back. Never goes below zero.
    pub fn release(&mut self) {
        self.current_members = self.current_members.saturating_sub(1);
        self.updated_at = Utc::now();
    }

    pub fn capacity(&self) -> CapacitySnapshot {
        CapacitySnapshot {
            max_members: self.max_members,
            current_members: self.current_members,
        }
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod grant;
pub mod gym;
pub mod member;
pub mod plan;
pub mod user;

pub use grant::{CapacitySnapshot, GrantStatus, GymMembership};
pub use gym::{GrantDetails, Gym, GymDetails, GymStatus, GymType};
pub use member::{Member, MemberStatus};
pub use plan::{BillingCycle, DurationUnit, MembershipPlan, PlanStatus, PlanType, PlanView};
pub use user::{OwnerSummary, PasswordHash, Role, User, UserProfile};

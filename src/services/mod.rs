// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod email;
pub mod grants;
pub mod gyms;
pub mod identity;
pub mod onboarding;
pub mod password;
pub mod plans;
pub mod roster;

pub use email::Mailer;
pub use grants::MembershipGrants;
pub use gyms::GymDirectory;
pub use identity::IdentityService;
pub use onboarding::Onboarding;
pub use plans::PlanCatalog;
pub use roster::MemberRoster;

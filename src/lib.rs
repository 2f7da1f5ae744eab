// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! GymHub: multi-tenant gym management backend
//!
//! Super-administrators onboard gym owners and grant them membership plans;
//! gym owners manage a member roster bounded by their plan's capacity.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Store;
use services::{
    GymDirectory, IdentityService, Mailer, MemberRoster, MembershipGrants, Onboarding,
    PlanCatalog,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub identity: IdentityService,
    pub plans: PlanCatalog,
    pub gyms: GymDirectory,
    pub grants: MembershipGrants,
    pub roster: MemberRoster,
    pub onboarding: Onboarding,
}

impl AppState {
    /// Wire every service to `store`.
    pub fn new(config: Config, store: Store, mailer: Mailer) -> Self {
        Self {
            identity: IdentityService::new(store.clone(), config.jwt_signing_key.clone()),
            plans: PlanCatalog::new(store.clone()),
            gyms: GymDirectory::new(store.clone()),
            grants: MembershipGrants::new(store.clone()),
            roster: MemberRoster::new(store.clone()),
            onboarding: Onboarding::new(store.clone(), mailer),
            config,
            store,
        }
    }
}

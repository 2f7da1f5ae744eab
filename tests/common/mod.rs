// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::Utc;
use gymhub::config::Config;
use gymhub::db::Store;
use gymhub::middleware::auth::create_jwt;
use gymhub::models::{PlanView, Role, User};
use gymhub::routes::create_router;
use gymhub::services::onboarding::{CreateGymOwnerRequest, OnboardedOwner};
use gymhub::services::plans::PlanInput;
use gymhub::services::{password, Mailer};
use gymhub::AppState;
use std::sync::Arc;

/// Password used for every seeded account.
#[allow(dead_code)]
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a store backed by the Firestore emulator.
#[allow(dead_code)]
pub async fn test_store() -> Store {
    Store::firestore("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app on a fresh in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        Config::test_default(),
        Store::in_memory(),
        Mailer::disabled(),
    ));
    (create_router(state.clone()), state)
}

/// Session token for `user`, signed with the test key.
#[allow(dead_code)]
pub fn token_for(state: &AppState, user: &User) -> String {
    create_jwt(&user.id, user.role, &state.config.jwt_signing_key).expect("Failed to create JWT")
}

/// Insert a user with `TEST_PASSWORD` directly into the store.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, role: Role, email: &str) -> User {
    let now = Utc::now();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: format!("Test {}", role),
        email: email.to_string(),
        password_hash: password::hash(TEST_PASSWORD).await.unwrap(),
        role,
        gym_id: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.store.insert_user(&user).await.unwrap();
    user
}

#[allow(dead_code)]
pub async fn seed_admin(state: &AppState) -> User {
    seed_user(state, Role::SuperAdmin, "admin@gymhub.test").await
}

/// Create an active plan through the catalog.
#[allow(dead_code)]
pub async fn seed_plan(state: &AppState, name: &str, max_members: u32) -> PlanView {
    let input = PlanInput {
        name: Some(name.to_string()),
        price: Some(1000.0),
        duration: Some(1),
        max_gyms: Some(1),
        max_staff: Some(5),
        max_members: Some(max_members),
        ..Default::default()
    };
    state.plans.create(input, "admin-1").await.unwrap()
}

/// Onboard a gym owner, granting `plan_id` when given.
#[allow(dead_code)]
pub async fn seed_owner(state: &AppState, email: &str, plan_id: Option<&str>) -> OnboardedOwner {
    let request = CreateGymOwnerRequest {
        name: "Olivia Owner".to_string(),
        email: email.to_string(),
        password: TEST_PASSWORD.to_string(),
        gym_name: format!("Gym of {}", email),
        membership_plan_id: plan_id.map(str::to_string),
    };
    state
        .onboarding
        .create_gym_owner(request, "admin-1")
        .await
        .unwrap()
}

/// Build a request with an optional bearer token and JSON body.
#[allow(dead_code)]
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Collect a response body as JSON.
#[allow(dead_code)]
pub async fn read_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

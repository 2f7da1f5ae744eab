// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication, role and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Each route group only admits its own role
//! 3. Login failures do not reveal which part was wrong
//! 4. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use gymhub::models::Role;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{create_test_app, json_request, read_json, seed_admin, seed_owner, token_for};

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(json_request("GET", "/api/gyms", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(json_request(
            "GET",
            "/api/membership",
            Some("invalid.token.here"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_deleted_user_is_rejected() {
    let (app, state) = create_test_app();
    let token = gymhub::middleware::auth::create_jwt(
        "no-such-user",
        Role::SuperAdmin,
        &state.config.jwt_signing_key,
    )
    .unwrap();

    let response = app
        .oneshot(json_request("GET", "/api/gyms", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_with_admin_token() {
    let (app, state) = create_test_app();
    let admin = seed_admin(&state).await;
    let token = token_for(&state, &admin);

    let response = app
        .oneshot(json_request("GET", "/api/gyms", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["totalGyms"], 0);
}

#[tokio::test]
async fn test_owner_cannot_reach_admin_routes() {
    let (app, state) = create_test_app();
    let onboarded = seed_owner(&state, "owner@gymhub.test", None).await;
    let token = token_for(&state, &onboarded.owner);

    for (method, uri) in [
        ("GET", "/api/gyms"),
        ("GET", "/api/membership"),
        ("POST", "/api/auth/create-gym-owner"),
    ] {
        let response = app
            .clone()
            .oneshot(json_request(method, uri, Some(&token), Some(json!({}))))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::FORBIDDEN,
            "{} {} should be forbidden for a gym owner",
            method,
            uri
        );
    }
}

#[tokio::test]
async fn test_admin_cannot_reach_owner_routes() {
    let (app, state) = create_test_app();
    let admin = seed_admin(&state).await;
    let token = token_for(&state, &admin);

    let response = app
        .oneshot(json_request("GET", "/api/member", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Insufficient permissions");
}

#[tokio::test]
async fn test_login_success_returns_token_and_gym() {
    let (app, state) = create_test_app();
    let plan = common::seed_plan(&state, "Gold", 10).await;
    let onboarded = seed_owner(&state, "owner@gymhub.test", Some(&plan.plan.id)).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({
                "email": "  Owner@GymHub.test ",
                "password": common::TEST_PASSWORD,
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["id"], onboarded.owner.id.as_str());
    assert_eq!(body["user"]["role"], "GYM_OWNER");
    assert_eq!(body["user"]["gym"]["id"], onboarded.gym.id.as_str());
    assert_eq!(body["user"]["gym"]["membership"]["maxMembers"], 10);
    assert!(body["user"].get("passwordHash").is_none());

    // The issued token works on the owner's routes
    let token = body["token"].as_str().unwrap();
    let response = app
        .oneshot(json_request("GET", "/api/member", Some(token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (app, state) = create_test_app();
    seed_admin(&state).await;

    let wrong_password = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "admin@gymhub.test", "password": "not-the-password"})),
        ))
        .await
        .unwrap();
    let unknown_email = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "nobody@gymhub.test", "password": "not-the-password"})),
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(wrong_password).await, read_json(unknown_email).await);
}

#[tokio::test]
async fn test_deactivated_user_is_rejected() {
    let (app, state) = create_test_app();
    let mut user = common::seed_user(&state, Role::GymOwner, "active@gymhub.test").await;
    user.id = uuid::Uuid::new_v4().to_string();
    user.email = "inactive@gymhub.test".to_string();
    user.is_active = false;
    state.store.insert_user(&user).await.unwrap();

    // Correct password: the deactivation is reported
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "inactive@gymhub.test", "password": common::TEST_PASSWORD})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Wrong password: indistinguishable from any other failure
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "inactive@gymhub.test", "password": "wrong-password"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A token issued before deactivation no longer works
    let token = token_for(&state, &user);
    let response = app
        .oneshot(json_request("GET", "/api/member", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_login_body() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/membership/some-plan/toggle-status")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_public_route_no_auth_required() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(json_request("GET", "/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
    let body = read_json(response).await;
    assert_eq!(body["status"], "ok");
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login and gym owner onboarding routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{GrantDetails, Gym, GymDetails, Role, UserProfile};
use crate::services::onboarding::CreateGymOwnerRequest;
use crate::AppState;

/// Routes open to anyone.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/login", post(login))
}

/// Routes for super-administrators. Auth is applied in routes/mod.rs.
pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/create-gym-owner", post(create_gym_owner))
}

// ─── Login ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub gym_id: Option<String>,
    pub is_active: bool,
    /// Linked gym with owner and active membership
    pub gym: Option<GymDetails>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: LoginUser,
}

async fn login(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(request) = payload?;
    let (token, user) = state
        .identity
        .authenticate(&request.email, &request.password)
        .await?;

    let gym = match user.gym_id.as_deref() {
        Some(gym_id) => match state.store.get_gym(gym_id).await? {
            Some(gym) => Some(state.gyms.details(gym).await?),
            None => None,
        },
        None => None,
    };

    let profile = UserProfile::from(&user);
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: LoginUser {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            role: profile.role,
            gym_id: profile.gym_id,
            is_active: profile.is_active,
            gym,
        },
    }))
}

// ─── Onboarding ──────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardedGym {
    #[serde(flatten)]
    pub gym: Gym,
    pub membership: Option<GrantDetails>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGymOwnerResponse {
    pub success: bool,
    pub message: String,
    pub gym_owner: UserProfile,
    pub gym: OnboardedGym,
}

async fn create_gym_owner(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(admin)): Extension<AuthUser>,
    payload: std::result::Result<Json<CreateGymOwnerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateGymOwnerResponse>)> {
    let Json(request) = payload?;
    let created = state
        .onboarding
        .create_gym_owner(request, &admin.id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateGymOwnerResponse {
            success: true,
            message: "Gym Owner created".to_string(),
            gym_owner: UserProfile::from(&created.owner),
            gym: OnboardedGym {
                gym: created.gym,
                membership: created.membership,
            },
        }),
    ))
}

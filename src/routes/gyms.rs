// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym directory and membership grant routes (super-administrator).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{GrantDetails, Gym, GymDetails};
use crate::routes::MessageResponse;
use crate::services::gyms::UpdateGymRequest;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/gyms", get(list_gyms))
        .route(
            "/api/gyms/{gym_id}",
            get(get_gym).put(update_gym).delete(delete_gym),
        )
        .route("/api/gyms/{gym_id}/membership", post(grant_membership))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GymListResponse {
    pub success: bool,
    pub total_gyms: usize,
    pub gyms: Vec<GymDetails>,
}

async fn list_gyms(State(state): State<Arc<AppState>>) -> Result<Json<GymListResponse>> {
    let gyms = state.gyms.list().await?;
    Ok(Json(GymListResponse {
        success: true,
        total_gyms: gyms.len(),
        gyms,
    }))
}

#[derive(Serialize)]
pub struct GymResponse {
    pub success: bool,
    pub gym: GymDetails,
}

async fn get_gym(
    State(state): State<Arc<AppState>>,
    Path(gym_id): Path<String>,
) -> Result<Json<GymResponse>> {
    let gym = state.gyms.get(&gym_id).await?;
    Ok(Json(GymResponse { success: true, gym }))
}

#[derive(Serialize)]
pub struct UpdateGymResponse {
    pub success: bool,
    pub message: String,
    pub gym: Gym,
}

async fn update_gym(
    State(state): State<Arc<AppState>>,
    Path(gym_id): Path<String>,
    payload: std::result::Result<Json<UpdateGymRequest>, JsonRejection>,
) -> Result<Json<UpdateGymResponse>> {
    let Json(request) = payload?;
    let gym = state.gyms.update(&gym_id, request).await?;
    Ok(Json(UpdateGymResponse {
        success: true,
        message: "Gym updated successfully".to_string(),
        gym,
    }))
}

async fn delete_gym(
    State(state): State<Arc<AppState>>,
    Path(gym_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.gyms.delete(&gym_id).await?;
    Ok(Json(MessageResponse::ok("Gym deleted successfully")))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantMembershipRequest {
    plan_id: String,
}

#[derive(Serialize)]
pub struct GrantMembershipResponse {
    pub success: bool,
    pub message: String,
    pub membership: GrantDetails,
}

async fn grant_membership(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(admin)): Extension<AuthUser>,
    Path(gym_id): Path<String>,
    payload: std::result::Result<Json<GrantMembershipRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GrantMembershipResponse>)> {
    let Json(request) = payload?;
    let membership = state
        .grants
        .grant(&gym_id, &request.plan_id, Some(&admin.id))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GrantMembershipResponse {
            success: true,
            message: "Membership granted".to_string(),
            membership,
        }),
    ))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Membership plan catalog routes (super-administrator).

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{PlanStatus, PlanView};
use crate::routes::MessageResponse;
use crate::services::plans::{PlanInput, PlanPage, PlanQuery};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/membership", get(list_plans).post(create_plan))
        .route(
            "/api/membership/{plan_id}",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
        .route(
            "/api/membership/{plan_id}/toggle-status",
            patch(toggle_plan_status),
        )
}

#[derive(Serialize)]
pub struct PlanResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub plan: PlanView,
}

impl PlanResponse {
    fn new(message: Option<&str>, plan: PlanView) -> Self {
        Self {
            success: true,
            message: message.map(str::to_string),
            plan,
        }
    }
}

async fn create_plan(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(admin)): Extension<AuthUser>,
    payload: std::result::Result<Json<PlanInput>, JsonRejection>,
) -> Result<(StatusCode, Json<PlanResponse>)> {
    let Json(input) = payload?;
    let plan = state.plans.create(input, &admin.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(PlanResponse::new(
            Some("Membership plan created successfully"),
            plan,
        )),
    ))
}

async fn list_plans(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlanQuery>,
) -> Result<Json<PlanPage>> {
    Ok(Json(state.plans.list(&query).await?))
}

async fn get_plan(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<String>,
) -> Result<Json<PlanResponse>> {
    let plan = state.plans.get(&plan_id).await?;
    Ok(Json(PlanResponse::new(None, plan)))
}

async fn update_plan(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<String>,
    payload: std::result::Result<Json<PlanInput>, JsonRejection>,
) -> Result<Json<PlanResponse>> {
    let Json(input) = payload?;
    let plan = state.plans.update(&plan_id, input).await?;
    Ok(Json(PlanResponse::new(Some("Plan updated successfully"), plan)))
}

async fn delete_plan(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.plans.delete(&plan_id).await?;
    Ok(Json(MessageResponse::ok("Plan deleted successfully")))
}

async fn toggle_plan_status(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<String>,
) -> Result<Json<PlanResponse>> {
    let plan = state.plans.toggle_status(&plan_id).await?;
    let message = match plan.plan.status {
        PlanStatus::Active => "Plan activated successfully",
        PlanStatus::Inactive => "Plan deactivated successfully",
    };
    Ok(Json(PlanResponse::new(Some(message), plan)))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Member roster routes (gym owner, own gym only).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{CapacitySnapshot, Member};
use crate::routes::MessageResponse;
use crate::services::roster::{CreateMemberRequest, UpdateMemberRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/member", get(list_members).post(create_member))
        .route(
            "/api/member/{member_id}",
            put(update_member).delete(delete_member),
        )
}

#[derive(Serialize)]
pub struct CreateMemberResponse {
    pub success: bool,
    pub message: String,
    pub member: Member,
    pub membership: CapacitySnapshot,
}

async fn create_member(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(owner)): Extension<AuthUser>,
    payload: std::result::Result<Json<CreateMemberRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateMemberResponse>)> {
    let Json(request) = payload?;
    let (member, membership) = state.roster.create(&owner, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateMemberResponse {
            success: true,
            message: "Member created successfully".to_string(),
            member,
            membership,
        }),
    ))
}

#[derive(Serialize)]
pub struct MemberListResponse {
    pub success: bool,
    pub total: usize,
    pub members: Vec<Member>,
    /// Active grant's counter, if the gym has one
    pub membership: Option<CapacitySnapshot>,
}

async fn list_members(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(owner)): Extension<AuthUser>,
) -> Result<Json<MemberListResponse>> {
    let (members, membership) = state.roster.list(&owner).await?;
    Ok(Json(MemberListResponse {
        success: true,
        total: members.len(),
        members,
        membership,
    }))
}

#[derive(Serialize)]
pub struct UpdateMemberResponse {
    pub success: bool,
    pub message: String,
    pub member: Member,
}

async fn update_member(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(owner)): Extension<AuthUser>,
    Path(member_id): Path<String>,
    payload: std::result::Result<Json<UpdateMemberRequest>, JsonRejection>,
) -> Result<Json<UpdateMemberResponse>> {
    let Json(request) = payload?;
    let member = state.roster.update(&owner, &member_id, request).await?;
    Ok(Json(UpdateMemberResponse {
        success: true,
        message: "Member updated".to_string(),
        member,
    }))
}

async fn delete_member(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(owner)): Extension<AuthUser>,
    Path(member_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.roster.delete(&owner, &member_id).await?;
    Ok(Json(MessageResponse::ok("Member deleted")))
}

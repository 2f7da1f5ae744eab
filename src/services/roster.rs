// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Member roster for a gym owner's own gym.
//!
//! Creation and deletion go through the store's atomic member operations, so
//! the grant's counter and the roster always move together.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{CapacitySnapshot, Member, MemberStatus, User};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    #[validate(length(min = 1, max = 120, message = "Member name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid member email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Field-level member update. The gym and grant reference never change.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRequest {
    #[validate(length(min = 1, max = 120, message = "Member name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid member email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<MemberStatus>,
}

/// Gym a roster call applies to.
fn caller_gym(owner: &User) -> Result<&str> {
    owner
        .gym_id
        .as_deref()
        .ok_or_else(|| AppError::NotFound("No gym linked to this account".to_string()))
}

#[derive(Clone)]
pub struct MemberRoster {
    store: Store,
}

impl MemberRoster {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Admit a member against the gym's active grant.
    pub async fn create(
        &self,
        owner: &User,
        request: CreateMemberRequest,
    ) -> Result<(Member, CapacitySnapshot)> {
        if request.name.trim().is_empty() {
            return Err(AppError::invalid("Member name is required"));
        }
        request.validate()?;
        let gym_id = caller_gym(owner)?;

        let grant = self
            .store
            .active_grant_for_gym(gym_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Gym Membership not found".to_string()))?;

        let now = Utc::now();
        let member = Member {
            id: uuid::Uuid::new_v4().to_string(),
            gym_id: gym_id.to_string(),
            gym_membership_id: grant.id.clone(),
            name: request.name.trim().to_string(),
            email: request.email.map(|e| e.trim().to_lowercase()),
            phone: request.phone,
            start_date: request.start_date.unwrap_or(now),
            end_date: request.end_date,
            status: MemberStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let capacity = match self.store.create_member(&member).await {
            Ok(capacity) => capacity,
            Err(AppError::CapacityExceeded) => {
                tracing::info!(
                    gym_id,
                    grant_id = %grant.id,
                    max_members = grant.max_members,
                    "Member rejected: capacity reached"
                );
                return Err(AppError::CapacityExceeded);
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            gym_id,
            member_id = %member.id,
            current_members = capacity.current_members,
            max_members = capacity.max_members,
            "Member created"
        );
        Ok((member, capacity))
    }

    /// Members of the caller's gym and the active grant's counter.
    pub async fn list(&self, owner: &User) -> Result<(Vec<Member>, Option<CapacitySnapshot>)> {
        let gym_id = caller_gym(owner)?;

        let members = self.store.list_members_for_gym(gym_id).await?;
        let capacity = self
            .store
            .active_grant_for_gym(gym_id)
            .await?
            .map(|g| g.capacity());

        Ok((members, capacity))
    }

    pub async fn update(
        &self,
        owner: &User,
        member_id: &str,
        request: UpdateMemberRequest,
    ) -> Result<Member> {
        if request.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::invalid("Member name cannot be empty"));
        }
        request.validate()?;
        let mut member = self.load_own(owner, member_id).await?;

        if let Some(name) = request.name {
            member.name = name.trim().to_string();
        }
        if let Some(email) = request.email {
            member.email = Some(email.trim().to_lowercase());
        }
        if let Some(phone) = request.phone {
            member.phone = Some(phone);
        }
        if let Some(start) = request.start_date {
            member.start_date = start;
        }
        if request.end_date.is_some() {
            member.end_date = request.end_date;
        }
        if let Some(status) = request.status {
            member.status = status;
        }
        member.updated_at = Utc::now();

        self.store.update_member(&member).await?;
        tracing::info!(member_id, "Member updated");
        Ok(member)
    }

    /// Remove a member and free its slot on the grant it was counted against.
    pub async fn delete(&self, owner: &User, member_id: &str) -> Result<Member> {
        self.load_own(owner, member_id).await?;

        let member = self.store.delete_member(member_id).await?;
        tracing::info!(
            member_id,
            grant_id = %member.gym_membership_id,
            "Member deleted"
        );
        Ok(member)
    }

    /// Load a member of the caller's gym. Other gyms' members are `NotFound`.
    async fn load_own(&self, owner: &User, member_id: &str) -> Result<Member> {
        let gym_id = caller_gym(owner)?;
        self.store
            .get_member(member_id)
            .await?
            .filter(|m| m.gym_id == gym_id)
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))
    }
}

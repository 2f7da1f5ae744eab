// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym owner onboarding: owner account, gym and optional first grant.

use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{GrantDetails, Gym, GymMembership, PlanView, Role, User};
use crate::services::email::Mailer;
use crate::services::identity::normalize_email;
use crate::services::password;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGymOwnerRequest {
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 120, message = "Gym name is required"))]
    pub gym_name: String,
    pub membership_plan_id: Option<String>,
}

/// Everything committed by one onboarding.
#[derive(Debug, Clone)]
pub struct OnboardedOwner {
    pub owner: User,
    pub gym: Gym,
    pub membership: Option<GrantDetails>,
}

#[derive(Clone)]
pub struct Onboarding {
    store: Store,
    mailer: Mailer,
}

impl Onboarding {
    pub fn new(store: Store, mailer: Mailer) -> Self {
        Self { store, mailer }
    }

    /// Create a gym owner with their gym, and a grant if a plan is given.
    ///
    /// The plan is resolved before anything is written; the three records
    /// are then committed together. The welcome email goes out afterwards
    /// and its outcome never affects the result.
    pub async fn create_gym_owner(
        &self,
        request: CreateGymOwnerRequest,
        granted_by: &str,
    ) -> Result<OnboardedOwner> {
        let name = request.name.trim().to_string();
        let gym_name = request.gym_name.trim().to_string();
        if name.is_empty() || gym_name.is_empty() {
            return Err(AppError::invalid("Name and gym name are required"));
        }
        request.validate()?;

        let email = normalize_email(&request.email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let plan = match request
            .membership_plan_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            Some(plan_id) => Some(
                self.store
                    .get_plan(plan_id)
                    .await?
                    .ok_or_else(|| AppError::invalid("Invalid membership plan"))?,
            ),
            None => None,
        };

        let now = Utc::now();
        let owner_id = uuid::Uuid::new_v4().to_string();
        let gym = Gym::new(
            &gym_name,
            Some(owner_id.clone()),
            Some(granted_by.to_string()),
        );
        let owner = User {
            id: owner_id,
            name,
            email,
            password_hash: password::hash(&request.password).await?,
            role: Role::GymOwner,
            gym_id: Some(gym.id.clone()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let grant = plan.as_ref().map(|plan| {
            GymMembership::issue(&gym.id, plan, Some(granted_by.to_string()), now)
        });

        self.store
            .provision_owner(&owner, &gym, grant.as_ref())
            .await?;

        tracing::info!(
            user_id = %owner.id,
            gym_id = %gym.id,
            plan_id = ?plan.as_ref().map(|p| &p.id),
            "Gym owner onboarded"
        );

        self.mailer.send_welcome(&owner.email, &owner.name, &gym.name);

        Ok(OnboardedOwner {
            owner,
            gym,
            membership: grant.map(|grant| GrantDetails {
                grant,
                plan: plan.map(PlanView::from),
            }),
        })
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym directory: listing with owner and membership, edits, ownership moves.

use chrono::Utc;
use futures_util::{stream, StreamExt};
use serde::Deserialize;
use validator::Validate;

use crate::db::{OwnerChange, Store};
use crate::error::{AppError, Result};
use crate::models::{GrantDetails, Gym, GymDetails, GymStatus, GymType, OwnerSummary, PlanView};

const MAX_CONCURRENT_LOOKUPS: usize = 16;

/// Field-level gym update. Absent fields are left alone.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGymRequest {
    #[validate(length(min = 1, max = 120, message = "Gym name cannot be empty"))]
    pub name: Option<String>,
    pub gym_type: Option<GymType>,
    pub description: Option<String>,
    /// Move the gym to another `GYM_OWNER`
    pub owner_id: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
    #[validate(email(message = "Invalid gym email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
    pub is24x7: Option<bool>,
    pub status: Option<GymStatus>,
    pub is_active: Option<bool>,
}

impl UpdateGymRequest {
    fn apply_to(self, gym: &mut Gym) {
        fn set(field: &mut Option<String>, value: Option<String>) {
            if let Some(v) = value {
                *field = Some(v.trim().to_string());
            }
        }

        if let Some(name) = self.name {
            gym.name = name.trim().to_string();
        }
        if let Some(gym_type) = self.gym_type {
            gym.gym_type = gym_type;
        }
        set(&mut gym.description, self.description);
        set(&mut gym.address, self.address);
        set(&mut gym.city, self.city);
        set(&mut gym.state, self.state);
        if let Some(country) = self.country {
            gym.country = country.trim().to_string();
        }
        set(&mut gym.pincode, self.pincode);
        set(&mut gym.email, self.email.map(|e| e.to_lowercase()));
        set(&mut gym.phone, self.phone);
        set(&mut gym.website, self.website);
        if let Some(t) = self.opening_time {
            gym.opening_time = t;
        }
        if let Some(t) = self.closing_time {
            gym.closing_time = t;
        }
        if let Some(all_day) = self.is24x7 {
            gym.is24x7 = all_day;
        }
        if let Some(status) = self.status {
            gym.status = status;
        }
        if let Some(active) = self.is_active {
            gym.is_active = active;
        }
    }
}

#[derive(Clone)]
pub struct GymDirectory {
    store: Store,
}

impl GymDirectory {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Attach owner summary, active grant and its plan.
    pub async fn details(&self, gym: Gym) -> Result<GymDetails> {
        let owner = match gym.owner_id.as_deref() {
            Some(owner_id) => self
                .store
                .get_user(owner_id)
                .await?
                .map(|u| OwnerSummary::from(&u)),
            None => None,
        };

        let membership = match self.store.active_grant_for_gym(&gym.id).await? {
            Some(grant) => {
                let plan = self.store.get_plan(&grant.plan_id).await?.map(PlanView::from);
                Some(GrantDetails { grant, plan })
            }
            None => None,
        };

        Ok(GymDetails {
            operational_hours: gym.operational_hours(),
            gym,
            owner,
            membership,
        })
    }

    /// Every gym with its owner and active membership, newest first.
    pub async fn list(&self) -> Result<Vec<GymDetails>> {
        let gyms = self.store.list_gyms().await?;

        stream::iter(gyms)
            .map(|gym| self.details(gym))
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .collect::<Vec<Result<GymDetails>>>()
            .await
            .into_iter()
            .collect()
    }

    pub async fn get(&self, gym_id: &str) -> Result<GymDetails> {
        let gym = self.load(gym_id).await?;
        self.details(gym).await
    }

    /// Apply a field-level update, moving ownership when `ownerId` changes.
    pub async fn update(&self, gym_id: &str, request: UpdateGymRequest) -> Result<Gym> {
        if request.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::invalid("Gym name cannot be empty"));
        }
        request.validate()?;

        let mut gym = self.load(gym_id).await?;
        let new_owner = request
            .owner_id
            .clone()
            .filter(|id| gym.owner_id.as_deref() != Some(id.as_str()));

        request.apply_to(&mut gym);
        gym.updated_at = Utc::now();

        match new_owner {
            Some(new_owner_id) => {
                match self.store.reassign_gym_owner(&gym, &new_owner_id).await? {
                    OwnerChange::InvalidOwner => {
                        return Err(AppError::invalid("Invalid Gym Owner ID"));
                    }
                    OwnerChange::Reassigned { previous_owner } => {
                        tracing::info!(
                            gym_id = %gym.id,
                            new_owner = %new_owner_id,
                            previous_owner = ?previous_owner,
                            "Gym owner reassigned"
                        );
                        gym.owner_id = Some(new_owner_id);
                    }
                }
            }
            None => {
                self.store.update_gym(&gym).await?;
                tracing::info!(gym_id = %gym.id, "Gym updated");
            }
        }

        Ok(gym)
    }

    pub async fn delete(&self, gym_id: &str) -> Result<()> {
        let unlinked = self.store.delete_gym(gym_id).await?;
        tracing::info!(gym_id, unlinked, "Gym deleted");
        Ok(())
    }

    async fn load(&self, gym_id: &str) -> Result<Gym> {
        self.store
            .get_gym(gym_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Gym not found".to_string()))
    }
}

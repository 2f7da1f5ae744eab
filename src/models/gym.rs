// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym directory model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{GymMembership, OwnerSummary, PlanView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GymType {
    #[default]
    Standard,
    Premium,
    Boutique,
    CrossFit,
    Wellness,
    Sports,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GymStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
    Pending,
}

/// Gym stored in the `gyms` collection.
///
/// When `owner_id` is set, that user holds `GYM_OWNER` and its `gym_id`
/// points back here. Only the store's reassignment and deletion operations
/// touch both sides of the link.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gym {
    /// Document ID
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub gym_type: GymType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,

    // ─── Location ────────────────────────────────────────────────
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub pincode: Option<String>,

    // ─── Contact ─────────────────────────────────────────────────
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,

    // ─── Hours ───────────────────────────────────────────────────
    #[serde(default = "default_opening_time")]
    pub opening_time: String,
    #[serde(default = "default_closing_time")]
    pub closing_time: String,
    #[serde(default)]
    pub is24x7: bool,

    // ─── Status ──────────────────────────────────────────────────
    #[serde(default)]
    pub status: GymStatus,
    #[serde(default)]
    pub is_active: bool,

    // ─── Metadata ────────────────────────────────────────────────
    #[serde(default)]
    pub created_by: Option<String>,
    pub join_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_country() -> String {
    "India".to_string()
}

fn default_opening_time() -> String {
    "06:00".to_string()
}

fn default_closing_time() -> String {
    "22:00".to_string()
}

impl Gym {
    /// A new, active gym with directory defaults.
    pub fn new(name: &str, owner_id: Option<String>, created_by: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            gym_type: GymType::default(),
            description: None,
            owner_id,
            address: None,
            city: None,
            state: None,
            country: default_country(),
            pincode: None,
            email: None,
            phone: None,
            website: None,
            opening_time: default_opening_time(),
            closing_time: default_closing_time(),
            is24x7: false,
            status: GymStatus::Active,
            is_active: true,
            created_by,
            join_date: now,
            updated_at: now,
        }
    }

    /// "06:00 - 22:00", or "24/7".
    pub fn operational_hours(&self) -> String {
        if self.is24x7 {
            "24/7".to_string()
        } else {
            format!("{} - {}", self.opening_time, self.closing_time)
        }
    }
}

/// Active grant with its plan resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantDetails {
    #[serde(flatten)]
    pub grant: GymMembership,
    /// `None` if the plan was removed after the grant was issued
    pub plan: Option<PlanView>,
}

/// Gym as returned by directory listings and login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GymDetails {
    #[serde(flatten)]
    pub gym: Gym,
    pub operational_hours: String,
    pub owner: Option<OwnerSummary>,
    pub membership: Option<GrantDetails>,
}

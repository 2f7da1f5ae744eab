// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Membership plan templates and their derived pricing/duration fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Longest grant a plan may describe.
pub const MAX_DURATION_DAYS: i64 = 36_500;

/// Commercial tier of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlanType {
    #[default]
    Basic,
    Standard,
    Professional,
    Enterprise,
    Startup,
    Corporate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BillingCycle {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
    Biennial,
}

/// Unit for `MembershipPlan::duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Days,
    #[default]
    Months,
    Years,
}

impl DurationUnit {
    /// Calendar approximation used for grant windows.
    pub fn days(self) -> i64 {
        match self {
            DurationUnit::Days => 1,
            DurationUnit::Months => 30,
            DurationUnit::Years => 365,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    #[default]
    Active,
    Inactive,
}

impl PlanStatus {
    pub fn toggled(self) -> Self {
        match self {
            PlanStatus::Active => PlanStatus::Inactive,
            PlanStatus::Inactive => PlanStatus::Active,
        }
    }
}

/// Plan template stored in the `membership_plans` collection.
///
/// Grants copy `max_members` at issue time, so edits here never reach
/// grants that already exist.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_duration_span"))]
pub struct MembershipPlan {
    /// Document ID
    pub id: String,
    /// Unique plan name
    #[validate(length(min = 1, max = 100, message = "Plan name is required"))]
    pub name: String,
    #[serde(default)]
    pub plan_type: PlanType,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Original price cannot be negative"))]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
    #[validate(range(min = 1, message = "Duration must be at least 1"))]
    pub duration: u32,
    #[serde(default)]
    pub duration_unit: DurationUnit,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Setup fee cannot be negative"))]
    pub setup_fee: f64,
    #[serde(default)]
    pub features: Vec<String>,
    #[validate(range(min = 1, message = "Max gyms must be at least 1"))]
    pub max_gyms: u32,
    #[validate(range(min = 1, message = "Max staff must be at least 1"))]
    pub max_staff: u32,
    #[validate(range(min = 1, message = "Max members must be at least 1"))]
    pub max_members: u32,
    #[serde(default)]
    #[validate(range(max = 365, message = "Free trial cannot exceed 365 days"))]
    pub free_trial_days: u32,
    /// Percentage, 0–100
    #[serde(default)]
    #[validate(range(
        min = 0.0,
        max = 100.0,
        message = "Renewal discount must be between 0 and 100"
    ))]
    pub renewal_discount: f64,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub status: PlanStatus,
    /// Super-administrator who authored the plan
    #[serde(default)]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MembershipPlan {
    /// Price plus one-time setup fee.
    pub fn total_price(&self) -> f64 {
        self.price + self.setup_fee
    }

    /// Length of a grant issued from this plan.
    pub fn duration_in_days(&self) -> i64 {
        i64::from(self.duration) * self.duration_unit.days()
    }
}

fn validate_duration_span(plan: &MembershipPlan) -> Result<(), ValidationError> {
    if plan.duration_in_days() > MAX_DURATION_DAYS {
        let mut err = ValidationError::new("duration_span");
        err.message = Some("Duration cannot exceed 100 years".into());
        return Err(err);
    }
    Ok(())
}

/// A plan as returned by the API, with derived fields attached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    #[serde(flatten)]
    pub plan: MembershipPlan,
    pub total_price: f64,
    pub duration_in_days: i64,
}

impl From<MembershipPlan> for PlanView {
    fn from(plan: MembershipPlan) -> Self {
        Self {
            total_price: plan.total_price(),
            duration_in_days: plan.duration_in_days(),
            plan,
        }
    }
}

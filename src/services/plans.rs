// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Membership plan catalog.
//!
//! Listing filters, sorts and pages in memory. The catalog is small and
//! administrator-only, so there is no query cursor.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{
    BillingCycle, DurationUnit, MembershipPlan, PlanStatus, PlanType, PlanView,
};

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

/// Plan fields accepted on create and update.
///
/// Every field is optional here: create reports the missing required ones by
/// name, update merges whatever is present.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInput {
    pub name: Option<String>,
    pub plan_type: Option<PlanType>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub billing_cycle: Option<BillingCycle>,
    pub duration: Option<u32>,
    pub duration_unit: Option<DurationUnit>,
    pub setup_fee: Option<f64>,
    pub features: Option<Vec<String>>,
    pub max_gyms: Option<u32>,
    pub max_staff: Option<u32>,
    pub max_members: Option<u32>,
    pub free_trial_days: Option<u32>,
    pub renewal_discount: Option<f64>,
    pub is_featured: Option<bool>,
    pub is_popular: Option<bool>,
    pub status: Option<PlanStatus>,
}

impl PlanInput {
    fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            missing.push("name");
        }
        if self.price.is_none() {
            missing.push("price");
        }
        if self.duration.is_none() {
            missing.push("duration");
        }
        if self.max_gyms.is_none() {
            missing.push("maxGyms");
        }
        if self.max_staff.is_none() {
            missing.push("maxStaff");
        }
        if self.max_members.is_none() {
            missing.push("maxMembers");
        }
        missing
    }

    /// Overwrite the fields present in this input.
    fn apply_to(self, plan: &mut MembershipPlan) {
        if let Some(name) = self.name {
            plan.name = name.trim().to_string();
        }
        if let Some(plan_type) = self.plan_type {
            plan.plan_type = plan_type;
        }
        if let Some(description) = self.description {
            plan.description = description.trim().to_string();
        }
        if let Some(price) = self.price {
            plan.price = price;
        }
        if self.original_price.is_some() {
            plan.original_price = self.original_price;
        }
        if let Some(cycle) = self.billing_cycle {
            plan.billing_cycle = cycle;
        }
        if let Some(duration) = self.duration {
            plan.duration = duration;
        }
        if let Some(unit) = self.duration_unit {
            plan.duration_unit = unit;
        }
        if let Some(fee) = self.setup_fee {
            plan.setup_fee = fee;
        }
        if let Some(features) = self.features {
            plan.features = features
                .into_iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect();
        }
        if let Some(n) = self.max_gyms {
            plan.max_gyms = n;
        }
        if let Some(n) = self.max_staff {
            plan.max_staff = n;
        }
        if let Some(n) = self.max_members {
            plan.max_members = n;
        }
        if let Some(days) = self.free_trial_days {
            plan.free_trial_days = days;
        }
        if let Some(discount) = self.renewal_discount {
            plan.renewal_discount = discount;
        }
        if let Some(featured) = self.is_featured {
            plan.is_featured = featured;
        }
        if let Some(popular) = self.is_popular {
            plan.is_popular = popular;
        }
        if let Some(status) = self.status {
            plan.status = status;
        }
    }
}

/// Query parameters for plan listing.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanQuery {
    pub status: Option<PlanStatus>,
    pub plan_type: Option<PlanType>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// `createdAt`, `price` or `name`; leading `-` for descending
    pub sort: Option<String>,
}

/// One page of plans.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPage {
    pub success: bool,
    pub total: usize,
    pub current_page: u32,
    pub total_pages: u32,
    pub plans: Vec<PlanView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortKey {
    CreatedAt,
    Price,
    Name,
}

/// Parse `sort`, falling back to newest first.
fn parse_sort(sort: Option<&str>) -> (SortKey, bool) {
    let sort = sort.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("-createdAt");
    let (descending, field) = match sort.strip_prefix('-') {
        Some(field) => (true, field),
        None => (false, sort),
    };
    match field {
        "price" => (SortKey::Price, descending),
        "name" => (SortKey::Name, descending),
        "createdAt" => (SortKey::CreatedAt, descending),
        _ => (SortKey::CreatedAt, true),
    }
}

fn matches(plan: &MembershipPlan, query: &PlanQuery, needle: Option<&str>) -> bool {
    if query.status.is_some_and(|s| s != plan.status) {
        return false;
    }
    if query.plan_type.is_some_and(|t| t != plan.plan_type) {
        return false;
    }
    if query.min_price.is_some_and(|min| plan.price < min) {
        return false;
    }
    if query.max_price.is_some_and(|max| plan.price > max) {
        return false;
    }
    if let Some(needle) = needle {
        let in_name = plan.name.to_lowercase().contains(needle);
        let in_description = plan.description.to_lowercase().contains(needle);
        if !in_name && !in_description {
            return false;
        }
    }
    true
}

#[derive(Clone)]
pub struct PlanCatalog {
    store: Store,
}

impl PlanCatalog {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: PlanInput, created_by: &str) -> Result<PlanView> {
        let missing = input.missing_required();
        if !missing.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let now = Utc::now();
        let mut plan = MembershipPlan {
            id: uuid::Uuid::new_v4().to_string(),
            name: String::new(),
            plan_type: PlanType::default(),
            description: String::new(),
            price: 0.0,
            original_price: None,
            billing_cycle: BillingCycle::default(),
            duration: 0,
            duration_unit: DurationUnit::default(),
            setup_fee: 0.0,
            features: Vec::new(),
            max_gyms: 0,
            max_staff: 0,
            max_members: 0,
            free_trial_days: 0,
            renewal_discount: 0.0,
            is_featured: false,
            is_popular: false,
            status: PlanStatus::Active,
            created_by: Some(created_by.to_string()),
            created_at: now,
            updated_at: now,
        };
        input.apply_to(&mut plan);
        plan.validate()?;

        self.store.insert_plan(&plan).await?;
        tracing::info!(plan_id = %plan.id, name = %plan.name, "Membership plan created");

        Ok(plan.into())
    }

    pub async fn list(&self, query: &PlanQuery) -> Result<PlanPage> {
        let needle = query
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut plans: Vec<MembershipPlan> = self
            .store
            .list_plans()
            .await?
            .into_iter()
            .filter(|p| matches(p, query, needle.as_deref()))
            .collect();

        let (key, descending) = parse_sort(query.sort.as_deref());
        plans.sort_by(|a, b| {
            let ord = match key {
                SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                SortKey::Price => a.price.total_cmp(&b.price),
                SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            };
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });

        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let total = plans.len();
        let total_pages = total.div_ceil(limit as usize) as u32;

        let plans = plans
            .into_iter()
            .skip((page as usize - 1) * limit as usize)
            .take(limit as usize)
            .map(PlanView::from)
            .collect();

        Ok(PlanPage {
            success: true,
            total,
            current_page: page,
            total_pages,
            plans,
        })
    }

    pub async fn get(&self, plan_id: &str) -> Result<PlanView> {
        self.load(plan_id).await.map(PlanView::from)
    }

    /// Merge `input` into the stored plan and re-validate the result.
    ///
    /// Grants already issued keep their own `maxMembers`.
    pub async fn update(&self, plan_id: &str, input: PlanInput) -> Result<PlanView> {
        let mut plan = self.load(plan_id).await?;
        input.apply_to(&mut plan);
        plan.updated_at = Utc::now();
        plan.validate()?;

        self.store.update_plan(&plan).await?;
        tracing::info!(plan_id = %plan.id, "Membership plan updated");

        Ok(plan.into())
    }

    pub async fn delete(&self, plan_id: &str) -> Result<()> {
        self.store.delete_plan(plan_id).await?;
        tracing::info!(plan_id, "Membership plan deleted");
        Ok(())
    }

    pub async fn toggle_status(&self, plan_id: &str) -> Result<PlanView> {
        let mut plan = self.load(plan_id).await?;
        plan.status = plan.status.toggled();
        plan.updated_at = Utc::now();

        self.store.update_plan(&plan).await?;
        tracing::info!(plan_id = %plan.id, status = ?plan.status, "Membership plan status toggled");

        Ok(plan.into())
    }

    async fn load(&self, plan_id: &str) -> Result<MembershipPlan> {
        self.store
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Plan not found".to_string()))
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backed by concurrent maps.
//!
//! Used for local development and the test suite. Two lock scopes provide the
//! same all-or-nothing guarantees the Firestore backend gets from transactions:
//!
//! - a per-grant mutex, held across check → increment → insert for admission
//!   control and across lookup → release → delete for member removal;
//! - a directory mutex, serializing multi-document writes (provisioning, owner
//!   reassignment, gym deletion, grant supersession, plan-name uniqueness).
//!
//! Map guards are never held across an `.await` or across a second access to
//! the same map.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::db::{OwnerChange, StoreResult};
use crate::error::AppError;
use crate::models::{
    CapacitySnapshot, GrantStatus, Gym, GymMembership, Member, MembershipPlan, Role, User,
};

/// Shared per-key lock table.
type LockTable = DashMap<String, Arc<Mutex<()>>>;

#[derive(Default)]
struct Tables {
    users: DashMap<String, User>,
    gyms: DashMap<String, Gym>,
    plans: DashMap<String, MembershipPlan>,
    grants: DashMap<String, GymMembership>,
    members: DashMap<String, Member>,
    grant_locks: LockTable,
    directory_lock: Mutex<()>,
}

/// In-memory store. Cloning shares the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn grant_lock(&self, grant_id: &str) -> Arc<Mutex<()>> {
        self.tables
            .grant_locks
            .entry(grant_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn email_taken(&self, email: &str) -> bool {
        self.tables.users.iter().any(|u| u.email == email)
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        Ok(self.tables.users.get(user_id).map(|u| u.value().clone()))
    }

    pub async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.value().clone()))
    }

    pub async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let _guard = self.tables.directory_lock.lock().await;
        if self.email_taken(&user.email) {
            return Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }
        self.tables.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    // ─── Gym Operations ──────────────────────────────────────────

    pub async fn get_gym(&self, gym_id: &str) -> StoreResult<Option<Gym>> {
        Ok(self.tables.gyms.get(gym_id).map(|g| g.value().clone()))
    }

    pub async fn list_gyms(&self) -> StoreResult<Vec<Gym>> {
        let mut gyms: Vec<Gym> = self.tables.gyms.iter().map(|g| g.value().clone()).collect();
        gyms.sort_by(|a, b| b.join_date.cmp(&a.join_date));
        Ok(gyms)
    }

    pub async fn update_gym(&self, gym: &Gym) -> StoreResult<()> {
        let _guard = self.tables.directory_lock.lock().await;
        let stored_owner = self
            .tables
            .gyms
            .get(&gym.id)
            .map(|g| g.owner_id.clone())
            .ok_or_else(|| AppError::NotFound("Gym not found".to_string()))?;

        // Ownership only moves through reassign_gym_owner.
        let mut gym = gym.clone();
        gym.owner_id = stored_owner;
        self.tables.gyms.insert(gym.id.clone(), gym);
        Ok(())
    }

    pub async fn reassign_gym_owner(
        &self,
        gym: &Gym,
        new_owner_id: &str,
    ) -> StoreResult<OwnerChange> {
        let _guard = self.tables.directory_lock.lock().await;

        let previous_owner = match self.tables.gyms.get(&gym.id) {
            Some(stored) => stored.owner_id.clone(),
            None => return Err(AppError::NotFound("Gym not found".to_string())),
        };

        let mut new_owner = match self.tables.users.get(new_owner_id) {
            Some(u) if u.role == Role::GymOwner => u.value().clone(),
            _ => return Ok(OwnerChange::InvalidOwner),
        };

        // A gym points at exactly one owner and vice versa: detach the new
        // owner's old gym and the old owner's link before relinking.
        if let Some(old_gym_id) = new_owner.gym_id.clone().filter(|id| *id != gym.id) {
            if let Some(mut old_gym) = self.tables.gyms.get(&old_gym_id).map(|g| g.value().clone()) {
                old_gym.owner_id = None;
                self.tables.gyms.insert(old_gym_id, old_gym);
            }
        }
        if let Some(prev_id) = previous_owner.as_deref().filter(|id| *id != new_owner_id) {
            if let Some(mut prev) = self.tables.users.get(prev_id).map(|u| u.value().clone()) {
                prev.gym_id = None;
                prev.updated_at = chrono::Utc::now();
                self.tables.users.insert(prev.id.clone(), prev);
            }
        }

        new_owner.gym_id = Some(gym.id.clone());
        new_owner.updated_at = chrono::Utc::now();
        self.tables.users.insert(new_owner.id.clone(), new_owner);

        let mut gym = gym.clone();
        gym.owner_id = Some(new_owner_id.to_string());
        self.tables.gyms.insert(gym.id.clone(), gym);

        Ok(OwnerChange::Reassigned { previous_owner })
    }

    pub async fn delete_gym(&self, gym_id: &str) -> StoreResult<usize> {
        let _guard = self.tables.directory_lock.lock().await;

        if self.tables.gyms.remove(gym_id).is_none() {
            return Err(AppError::NotFound("Gym not found".to_string()));
        }

        let linked: Vec<String> = self
            .tables
            .users
            .iter()
            .filter(|u| u.gym_id.as_deref() == Some(gym_id))
            .map(|u| u.id.clone())
            .collect();

        for user_id in &linked {
            if let Some(mut user) = self.tables.users.get_mut(user_id) {
                user.gym_id = None;
                user.updated_at = chrono::Utc::now();
            }
        }

        Ok(linked.len())
    }

    // ─── Plan Operations ─────────────────────────────────────────

    pub async fn get_plan(&self, plan_id: &str) -> StoreResult<Option<MembershipPlan>> {
        Ok(self.tables.plans.get(plan_id).map(|p| p.value().clone()))
    }

    pub async fn list_plans(&self) -> StoreResult<Vec<MembershipPlan>> {
        Ok(self.tables.plans.iter().map(|p| p.value().clone()).collect())
    }

    fn plan_name_taken(&self, name: &str, except_id: &str) -> bool {
        self.tables
            .plans
            .iter()
            .any(|p| p.id != except_id && p.name == name)
    }

    pub async fn insert_plan(&self, plan: &MembershipPlan) -> StoreResult<()> {
        let _guard = self.tables.directory_lock.lock().await;
        if self.plan_name_taken(&plan.name, &plan.id) {
            return Err(AppError::Conflict(
                "Plan with this name already exists".to_string(),
            ));
        }
        self.tables.plans.insert(plan.id.clone(), plan.clone());
        Ok(())
    }

    pub async fn update_plan(&self, plan: &MembershipPlan) -> StoreResult<()> {
        let _guard = self.tables.directory_lock.lock().await;
        if !self.tables.plans.contains_key(&plan.id) {
            return Err(AppError::NotFound("Plan not found".to_string()));
        }
        if self.plan_name_taken(&plan.name, &plan.id) {
            return Err(AppError::Conflict(
                "Plan with this name already exists".to_string(),
            ));
        }
        self.tables.plans.insert(plan.id.clone(), plan.clone());
        Ok(())
    }

    pub async fn delete_plan(&self, plan_id: &str) -> StoreResult<()> {
        let _guard = self.tables.directory_lock.lock().await;

        let in_use = self
            .tables
            .grants
            .iter()
            .filter(|g| g.plan_id == plan_id && g.is_active())
            .count();
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Plan is assigned to {} active gym membership(s)",
                in_use
            )));
        }

        self.tables
            .plans
            .remove(plan_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Plan not found".to_string()))
    }

    // ─── Grant Operations ────────────────────────────────────────

    pub async fn get_grant(&self, grant_id: &str) -> StoreResult<Option<GymMembership>> {
        Ok(self.tables.grants.get(grant_id).map(|g| g.value().clone()))
    }

    pub async fn active_grant_for_gym(&self, gym_id: &str) -> StoreResult<Option<GymMembership>> {
        Ok(self
            .tables
            .grants
            .iter()
            .filter(|g| g.gym_id == gym_id && g.is_active())
            .max_by_key(|g| g.start_date)
            .map(|g| g.value().clone()))
    }

    /// Mark every active grant of `gym_id` superseded. Caller holds the
    /// directory lock.
    async fn supersede_active_grants(&self, gym_id: &str) -> usize {
        let active: Vec<String> = self
            .tables
            .grants
            .iter()
            .filter(|g| g.gym_id == gym_id && g.is_active())
            .map(|g| g.id.clone())
            .collect();

        for grant_id in &active {
            let lock = self.grant_lock(grant_id);
            let _grant_guard = lock.lock().await;
            if let Some(mut grant) = self.tables.grants.get_mut(grant_id) {
                grant.status = GrantStatus::Superseded;
                grant.updated_at = chrono::Utc::now();
            }
        }

        active.len()
    }

    pub async fn issue_grant(&self, grant: &GymMembership) -> StoreResult<usize> {
        let _guard = self.tables.directory_lock.lock().await;
        let superseded = self.supersede_active_grants(&grant.gym_id).await;
        self.tables.grants.insert(grant.id.clone(), grant.clone());
        Ok(superseded)
    }

    pub async fn reserve_capacity(&self, grant_id: &str) -> StoreResult<bool> {
        let lock = self.grant_lock(grant_id);
        let _guard = lock.lock().await;

        let mut grant = self
            .tables
            .grants
            .get(grant_id)
            .map(|g| g.value().clone())
            .ok_or_else(|| AppError::NotFound("Gym Membership not found".to_string()))?;

        if !grant.is_active() || !grant.try_reserve() {
            return Ok(false);
        }
        self.tables.grants.insert(grant.id.clone(), grant);
        Ok(true)
    }

    pub async fn release_capacity(&self, grant_id: &str) -> StoreResult<()> {
        let lock = self.grant_lock(grant_id);
        let _guard = lock.lock().await;

        match self.tables.grants.get_mut(grant_id) {
            Some(mut grant) => {
                grant.release();
                Ok(())
            }
            None => Err(AppError::NotFound("Gym Membership not found".to_string())),
        }
    }

    // ─── Member Operations ───────────────────────────────────────

    pub async fn get_member(&self, member_id: &str) -> StoreResult<Option<Member>> {
        Ok(self.tables.members.get(member_id).map(|m| m.value().clone()))
    }

    pub async fn list_members_for_gym(&self, gym_id: &str) -> StoreResult<Vec<Member>> {
        let mut members: Vec<Member> = self
            .tables
            .members
            .iter()
            .filter(|m| m.gym_id == gym_id)
            .map(|m| m.value().clone())
            .collect();
        members.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(members)
    }

    pub async fn update_member(&self, member: &Member) -> StoreResult<()> {
        match self.tables.members.get_mut(&member.id) {
            Some(mut stored) => {
                *stored = member.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Member not found".to_string())),
        }
    }

    pub async fn create_member(&self, member: &Member) -> StoreResult<CapacitySnapshot> {
        let lock = self.grant_lock(&member.gym_membership_id);
        let _guard = lock.lock().await;

        let mut grant = self
            .tables
            .grants
            .get(&member.gym_membership_id)
            .map(|g| g.value().clone())
            .ok_or_else(|| AppError::NotFound("Gym Membership not found".to_string()))?;

        if !grant.is_active() {
            return Err(AppError::Conflict(
                "Gym membership was replaced, please retry".to_string(),
            ));
        }
        if !grant.try_reserve() {
            return Err(AppError::CapacityExceeded);
        }

        let snapshot = grant.capacity();
        self.tables.members.insert(member.id.clone(), member.clone());
        self.tables.grants.insert(grant.id.clone(), grant);
        Ok(snapshot)
    }

    pub async fn delete_member(&self, member_id: &str) -> StoreResult<Member> {
        let grant_id = self
            .tables
            .members
            .get(member_id)
            .map(|m| m.gym_membership_id.clone())
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

        let lock = self.grant_lock(&grant_id);
        let _guard = lock.lock().await;

        // A concurrent delete may have won while we waited for the lock.
        let (_, member) = self
            .tables
            .members
            .remove(member_id)
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

        if let Some(mut grant) = self.tables.grants.get_mut(&grant_id) {
            grant.release();
        }

        Ok(member)
    }

    // ─── Owner Provisioning ──────────────────────────────────────

    pub async fn provision_owner(
        &self,
        owner: &User,
        gym: &Gym,
        grant: Option<&GymMembership>,
    ) -> StoreResult<()> {
        let _guard = self.tables.directory_lock.lock().await;

        if self.email_taken(&owner.email) {
            return Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        if let Some(grant) = grant {
            self.supersede_active_grants(&grant.gym_id).await;
            self.tables.grants.insert(grant.id.clone(), grant.clone());
        }
        self.tables.gyms.insert(gym.id.clone(), gym.clone());
        self.tables.users.insert(owner.id.clone(), owner.clone());
        Ok(())
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (login identities, linked to at most one gym)
//! - Gyms (tenant directory)
//! - Membership plans (catalog templates)
//! - Gym memberships (grants carrying the member counter)
//! - Members (per-gym roster)
//!
//! Every operation that reads a counter or a link and then writes it runs in
//! `run_transaction`, so Firestore retries it against fresh data on conflict.

use firestore::errors::{BackoffError, FirestoreError};
use firestore::FirestoreQueryDirection;

use crate::db::{collections, OwnerChange, StoreResult};
use crate::error::AppError;
use crate::models::{
    CapacitySnapshot, GrantStatus, Gym, GymMembership, Member, MembershipPlan, Role, User,
};

/// Field holding a document's gym reference.
const GYM_ID_FIELD: &str = "gymId";

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Option<firestore::FirestoreDb>,
}

enum ReserveOutcome {
    Reserved,
    Unavailable,
    MissingGrant,
}

enum AdmitOutcome {
    Admitted(CapacitySnapshot),
    MissingGrant,
    Replaced,
    Full,
}

enum RemoveOutcome {
    Removed(Box<Member>),
    MissingMember,
}

enum WriteOutcome {
    Written,
    Missing,
    Duplicate,
}

fn db_err(context: &str) -> impl Fn(FirestoreError) -> AppError + '_ {
    move |e| AppError::Database(format!("{}: {}", context, e))
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> StoreResult<Self> {
        // Emulator connections are unauthenticated.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> StoreResult<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a disconnected client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> StoreResult<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    async fn get_doc<T>(&self, collection: &str, id: &str) -> StoreResult<Option<T>>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        self.get_doc(collections::USERS, user_id).await
    }

    pub async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("email").eq(email)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    pub async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let user = user.clone();
        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let user = user.clone();
                Box::pin(async move {
                    let existing: Vec<User> = db
                        .fluent()
                        .select()
                        .from(collections::USERS)
                        .filter(|q| q.for_all([q.field("email").eq(user.email.as_str())]))
                        .limit(1)
                        .obj()
                        .query()
                        .await?;
                    if !existing.is_empty() {
                        return Ok(WriteOutcome::Duplicate);
                    }

                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&user.id)
                        .object(&user)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(WriteOutcome::Written)
                })
            })
            .await
            .map_err(db_err("Failed to insert user"))?;

        match outcome {
            WriteOutcome::Duplicate => Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            )),
            _ => Ok(()),
        }
    }

    // ─── Gym Operations ──────────────────────────────────────────

    pub async fn get_gym(&self, gym_id: &str) -> StoreResult<Option<Gym>> {
        self.get_doc(collections::GYMS, gym_id).await
    }

    pub async fn list_gyms(&self) -> StoreResult<Vec<Gym>> {
        let mut gyms: Vec<Gym> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::GYMS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        gyms.sort_by(|a, b| b.join_date.cmp(&a.join_date));
        Ok(gyms)
    }

    pub async fn update_gym(&self, gym: &Gym) -> StoreResult<()> {
        let gym = gym.clone();
        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let mut gym = gym.clone();
                Box::pin(async move {
                    let stored: Option<Gym> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::GYMS)
                        .obj()
                        .one(&gym.id)
                        .await?;
                    let Some(stored) = stored else {
                        return Ok(WriteOutcome::Missing);
                    };

                    // Ownership only moves through reassign_gym_owner.
                    gym.owner_id = stored.owner_id;
                    db.fluent()
                        .update()
                        .in_col(collections::GYMS)
                        .document_id(&gym.id)
                        .object(&gym)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(WriteOutcome::Written)
                })
            })
            .await
            .map_err(db_err("Failed to update gym"))?;

        match outcome {
            WriteOutcome::Missing => Err(AppError::NotFound("Gym not found".to_string())),
            _ => Ok(()),
        }
    }

    /// Move a gym to a new owner in one transaction.
    ///
    /// Reads the gym, the new owner, the new owner's previous gym and the
    /// gym's previous owner, then writes every changed link together.
    pub async fn reassign_gym_owner(
        &self,
        gym: &Gym,
        new_owner_id: &str,
    ) -> StoreResult<OwnerChange> {
        let gym = gym.clone();
        let new_owner_id = new_owner_id.to_string();

        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let mut gym = gym.clone();
                let new_owner_id = new_owner_id.clone();
                Box::pin(async move {
                    let stored: Option<Gym> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::GYMS)
                        .obj()
                        .one(&gym.id)
                        .await?;
                    let Some(stored) = stored else {
                        return Ok(None);
                    };

                    let new_owner: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&new_owner_id)
                        .await?;
                    let mut new_owner = match new_owner {
                        Some(u) if u.role == Role::GymOwner => u,
                        _ => return Ok(Some(OwnerChange::InvalidOwner)),
                    };

                    let now = chrono::Utc::now();
                    let previous_owner = stored.owner_id.clone();

                    // All reads happen before the first write.
                    let old_gym: Option<Gym> = match new_owner.gym_id.as_deref() {
                        Some(old_id) if old_id != gym.id => {
                            db.fluent()
                                .select()
                                .by_id_in(collections::GYMS)
                                .obj()
                                .one(old_id)
                                .await?
                        }
                        _ => None,
                    };
                    let previous: Option<User> = match previous_owner.as_deref() {
                        Some(prev_id) if prev_id != new_owner_id => {
                            db.fluent()
                                .select()
                                .by_id_in(collections::USERS)
                                .obj()
                                .one(prev_id)
                                .await?
                        }
                        _ => None,
                    };

                    if let Some(mut old_gym) = old_gym {
                        old_gym.owner_id = None;
                        old_gym.updated_at = now;
                        db.fluent()
                            .update()
                            .in_col(collections::GYMS)
                            .document_id(&old_gym.id)
                            .object(&old_gym)
                            .add_to_transaction(transaction)?;
                    }
                    if let Some(mut prev) = previous {
                        prev.gym_id = None;
                        prev.updated_at = now;
                        db.fluent()
                            .update()
                            .in_col(collections::USERS)
                            .document_id(&prev.id)
                            .object(&prev)
                            .add_to_transaction(transaction)?;
                    }

                    new_owner.gym_id = Some(gym.id.clone());
                    new_owner.updated_at = now;
                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&new_owner.id)
                        .object(&new_owner)
                        .add_to_transaction(transaction)?;

                    gym.owner_id = Some(new_owner_id.clone());
                    db.fluent()
                        .update()
                        .in_col(collections::GYMS)
                        .document_id(&gym.id)
                        .object(&gym)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(Some(OwnerChange::Reassigned {
                        previous_owner,
                    }))
                })
            })
            .await
            .map_err(db_err("Failed to reassign gym owner"))?;

        outcome.ok_or_else(|| AppError::NotFound("Gym not found".to_string()))
    }

    /// Delete a gym and clear `gymId` on every linked user.
    pub async fn delete_gym(&self, gym_id: &str) -> StoreResult<usize> {
        let gym_id = gym_id.to_string();

        let unlinked = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let gym_id = gym_id.clone();
                Box::pin(async move {
                    let stored: Option<Gym> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::GYMS)
                        .obj()
                        .one(&gym_id)
                        .await?;
                    if stored.is_none() {
                        return Ok(None);
                    }

                    let linked: Vec<User> = db
                        .fluent()
                        .select()
                        .from(collections::USERS)
                        .filter(|q| q.for_all([q.field(GYM_ID_FIELD).eq(gym_id.as_str())]))
                        .obj()
                        .query()
                        .await?;

                    let now = chrono::Utc::now();
                    for mut user in linked.iter().cloned() {
                        user.gym_id = None;
                        user.updated_at = now;
                        db.fluent()
                            .update()
                            .in_col(collections::USERS)
                            .document_id(&user.id)
                            .object(&user)
                            .add_to_transaction(transaction)?;
                    }

                    db.fluent()
                        .delete()
                        .from(collections::GYMS)
                        .document_id(&gym_id)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(Some(linked.len()))
                })
            })
            .await
            .map_err(db_err("Failed to delete gym"))?;

        unlinked.ok_or_else(|| AppError::NotFound("Gym not found".to_string()))
    }

    // ─── Plan Operations ─────────────────────────────────────────

    pub async fn get_plan(&self, plan_id: &str) -> StoreResult<Option<MembershipPlan>> {
        self.get_doc(collections::MEMBERSHIP_PLANS, plan_id).await
    }

    pub async fn list_plans(&self) -> StoreResult<Vec<MembershipPlan>> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::MEMBERSHIP_PLANS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Write a plan if no other plan uses its name.
    async fn write_plan(&self, plan: &MembershipPlan, must_exist: bool) -> StoreResult<()> {
        let plan = plan.clone();
        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let plan = plan.clone();
                Box::pin(async move {
                    if must_exist {
                        let stored: Option<MembershipPlan> = db
                            .fluent()
                            .select()
                            .by_id_in(collections::MEMBERSHIP_PLANS)
                            .obj()
                            .one(&plan.id)
                            .await?;
                        if stored.is_none() {
                            return Ok(WriteOutcome::Missing);
                        }
                    }

                    let same_name: Vec<MembershipPlan> = db
                        .fluent()
                        .select()
                        .from(collections::MEMBERSHIP_PLANS)
                        .filter(|q| q.for_all([q.field("name").eq(plan.name.as_str())]))
                        .obj()
                        .query()
                        .await?;
                    if same_name.iter().any(|p| p.id != plan.id) {
                        return Ok(WriteOutcome::Duplicate);
                    }

                    db.fluent()
                        .update()
                        .in_col(collections::MEMBERSHIP_PLANS)
                        .document_id(&plan.id)
                        .object(&plan)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(WriteOutcome::Written)
                })
            })
            .await
            .map_err(db_err("Failed to write plan"))?;

        match outcome {
            WriteOutcome::Written => Ok(()),
            WriteOutcome::Missing => Err(AppError::NotFound("Plan not found".to_string())),
            WriteOutcome::Duplicate => Err(AppError::Conflict(
                "Plan with this name already exists".to_string(),
            )),
        }
    }

    pub async fn insert_plan(&self, plan: &MembershipPlan) -> StoreResult<()> {
        self.write_plan(plan, false).await
    }

    pub async fn update_plan(&self, plan: &MembershipPlan) -> StoreResult<()> {
        self.write_plan(plan, true).await
    }

    pub async fn delete_plan(&self, plan_id: &str) -> StoreResult<()> {
        let plan_id = plan_id.to_string();

        // Ok(None): plan missing; Ok(Some(n)) with n > 0: still in use.
        let in_use = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let plan_id = plan_id.clone();
                Box::pin(async move {
                    let stored: Option<MembershipPlan> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::MEMBERSHIP_PLANS)
                        .obj()
                        .one(&plan_id)
                        .await?;
                    if stored.is_none() {
                        return Ok(None);
                    }

                    let grants: Vec<GymMembership> = db
                        .fluent()
                        .select()
                        .from(collections::GYM_MEMBERSHIPS)
                        .filter(|q| q.for_all([q.field("planId").eq(plan_id.as_str())]))
                        .obj()
                        .query()
                        .await?;
                    let active = grants.iter().filter(|g| g.is_active()).count();
                    if active > 0 {
                        return Ok(Some(active));
                    }

                    db.fluent()
                        .delete()
                        .from(collections::MEMBERSHIP_PLANS)
                        .document_id(&plan_id)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(Some(0))
                })
            })
            .await
            .map_err(db_err("Failed to delete plan"))?;

        match in_use {
            None => Err(AppError::NotFound("Plan not found".to_string())),
            Some(0) => Ok(()),
            Some(n) => Err(AppError::Conflict(format!(
                "Plan is assigned to {} active gym membership(s)",
                n
            ))),
        }
    }

    // ─── Grant Operations ────────────────────────────────────────

    pub async fn get_grant(&self, grant_id: &str) -> StoreResult<Option<GymMembership>> {
        self.get_doc(collections::GYM_MEMBERSHIPS, grant_id).await
    }

    pub async fn active_grant_for_gym(&self, gym_id: &str) -> StoreResult<Option<GymMembership>> {
        let grants: Vec<GymMembership> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::GYM_MEMBERSHIPS)
            .filter(|q| q.for_all([q.field(GYM_ID_FIELD).eq(gym_id)]))
            .order_by([("startDate", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(grants.into_iter().find(|g| g.is_active()))
    }

    pub async fn issue_grant(&self, grant: &GymMembership) -> StoreResult<usize> {
        let grant = grant.clone();
        self.get_client()?
            .run_transaction(|db, transaction| {
                let grant = grant.clone();
                Box::pin(async move {
                    let existing: Vec<GymMembership> = db
                        .fluent()
                        .select()
                        .from(collections::GYM_MEMBERSHIPS)
                        .filter(|q| q.for_all([q.field(GYM_ID_FIELD).eq(grant.gym_id.as_str())]))
                        .obj()
                        .query()
                        .await?;

                    let mut superseded = 0;
                    for mut old in existing.into_iter().filter(|g| g.is_active()) {
                        old.status = GrantStatus::Superseded;
                        old.updated_at = grant.created_at;
                        db.fluent()
                            .update()
                            .in_col(collections::GYM_MEMBERSHIPS)
                            .document_id(&old.id)
                            .object(&old)
                            .add_to_transaction(transaction)?;
                        superseded += 1;
                    }

                    db.fluent()
                        .update()
                        .in_col(collections::GYM_MEMBERSHIPS)
                        .document_id(&grant.id)
                        .object(&grant)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(superseded)
                })
            })
            .await
            .map_err(db_err("Failed to issue gym membership"))
    }

    pub async fn reserve_capacity(&self, grant_id: &str) -> StoreResult<bool> {
        let grant_id = grant_id.to_string();
        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let grant_id = grant_id.clone();
                Box::pin(async move {
                    let grant: Option<GymMembership> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::GYM_MEMBERSHIPS)
                        .obj()
                        .one(&grant_id)
                        .await?;
                    let Some(mut grant) = grant else {
                        return Ok(ReserveOutcome::MissingGrant);
                    };

                    if !grant.is_active() || !grant.try_reserve() {
                        return Ok(ReserveOutcome::Unavailable);
                    }

                    db.fluent()
                        .update()
                        .in_col(collections::GYM_MEMBERSHIPS)
                        .document_id(&grant.id)
                        .object(&grant)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(ReserveOutcome::Reserved)
                })
            })
            .await
            .map_err(db_err("Failed to reserve capacity"))?;

        match outcome {
            ReserveOutcome::Reserved => Ok(true),
            ReserveOutcome::Unavailable => Ok(false),
            ReserveOutcome::MissingGrant => {
                Err(AppError::NotFound("Gym Membership not found".to_string()))
            }
        }
    }

    pub async fn release_capacity(&self, grant_id: &str) -> StoreResult<()> {
        let grant_id = grant_id.to_string();
        let found = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let grant_id = grant_id.clone();
                Box::pin(async move {
                    let grant: Option<GymMembership> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::GYM_MEMBERSHIPS)
                        .obj()
                        .one(&grant_id)
                        .await?;
                    let Some(mut grant) = grant else {
                        return Ok(false);
                    };

                    grant.release();
                    db.fluent()
                        .update()
                        .in_col(collections::GYM_MEMBERSHIPS)
                        .document_id(&grant.id)
                        .object(&grant)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(true)
                })
            })
            .await
            .map_err(db_err("Failed to release capacity"))?;

        if found {
            Ok(())
        } else {
            Err(AppError::NotFound("Gym Membership not found".to_string()))
        }
    }

    // ─── Member Operations ───────────────────────────────────────

    pub async fn get_member(&self, member_id: &str) -> StoreResult<Option<Member>> {
        self.get_doc(collections::MEMBERS, member_id).await
    }

    pub async fn list_members_for_gym(&self, gym_id: &str) -> StoreResult<Vec<Member>> {
        let mut members: Vec<Member> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::MEMBERS)
            .filter(|q| q.for_all([q.field(GYM_ID_FIELD).eq(gym_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        members.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(members)
    }

    /// Overwrite an existing member. A member deleted concurrently stays
    /// deleted, so its released slot is never counted twice.
    pub async fn update_member(&self, member: &Member) -> StoreResult<()> {
        let member = member.clone();
        let found = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let member = member.clone();
                Box::pin(async move {
                    let stored: Option<Member> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::MEMBERS)
                        .obj()
                        .one(&member.id)
                        .await?;
                    if stored.is_none() {
                        return Ok(false);
                    }

                    db.fluent()
                        .update()
                        .in_col(collections::MEMBERS)
                        .document_id(&member.id)
                        .object(&member)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(true)
                })
            })
            .await
            .map_err(db_err("Failed to update member"))?;

        if !found {
            return Err(AppError::NotFound("Member not found".to_string()));
        }
        Ok(())
    }

    pub async fn create_member(&self, member: &Member) -> StoreResult<CapacitySnapshot> {
        let member = member.clone();
        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let member = member.clone();
                Box::pin(async move {
                    let grant: Option<GymMembership> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::GYM_MEMBERSHIPS)
                        .obj()
                        .one(&member.gym_membership_id)
                        .await?;
                    let Some(mut grant) = grant else {
                        return Ok(AdmitOutcome::MissingGrant);
                    };
                    if !grant.is_active() {
                        return Ok(AdmitOutcome::Replaced);
                    }
                    if !grant.try_reserve() {
                        return Ok(AdmitOutcome::Full);
                    }

                    db.fluent()
                        .update()
                        .in_col(collections::GYM_MEMBERSHIPS)
                        .document_id(&grant.id)
                        .object(&grant)
                        .add_to_transaction(transaction)?;
                    db.fluent()
                        .update()
                        .in_col(collections::MEMBERS)
                        .document_id(&member.id)
                        .object(&member)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(AdmitOutcome::Admitted(
                        grant.capacity(),
                    ))
                })
            })
            .await
            .map_err(db_err("Failed to create member"))?;

        match outcome {
            AdmitOutcome::Admitted(snapshot) => Ok(snapshot),
            AdmitOutcome::MissingGrant => {
                Err(AppError::NotFound("Gym Membership not found".to_string()))
            }
            AdmitOutcome::Replaced => Err(AppError::Conflict(
                "Gym membership was replaced, please retry".to_string(),
            )),
            AdmitOutcome::Full => Err(AppError::CapacityExceeded),
        }
    }

    pub async fn delete_member(&self, member_id: &str) -> StoreResult<Member> {
        let member_id = member_id.to_string();
        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let member_id = member_id.clone();
                Box::pin(async move {
                    let member: Option<Member> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::MEMBERS)
                        .obj()
                        .one(&member_id)
                        .await?;
                    let Some(member) = member else {
                        return Ok(RemoveOutcome::MissingMember);
                    };

                    let grant: Option<GymMembership> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::GYM_MEMBERSHIPS)
                        .obj()
                        .one(&member.gym_membership_id)
                        .await?;

                    db.fluent()
                        .delete()
                        .from(collections::MEMBERS)
                        .document_id(&member.id)
                        .add_to_transaction(transaction)?;

                    if let Some(mut grant) = grant {
                        grant.release();
                        db.fluent()
                            .update()
                            .in_col(collections::GYM_MEMBERSHIPS)
                            .document_id(&grant.id)
                            .object(&grant)
                            .add_to_transaction(transaction)?;
                    }

                    Ok::<_, BackoffError<FirestoreError>>(RemoveOutcome::Removed(Box::new(
                        member,
                    )))
                })
            })
            .await
            .map_err(db_err("Failed to delete member"))?;

        match outcome {
            RemoveOutcome::Removed(member) => Ok(*member),
            RemoveOutcome::MissingMember => Err(AppError::NotFound("Member not found".to_string())),
        }
    }

    // ─── Owner Provisioning ──────────────────────────────────────

    /// Write owner, gym and optional grant in one transaction.
    pub async fn provision_owner(
        &self,
        owner: &User,
        gym: &Gym,
        grant: Option<&GymMembership>,
    ) -> StoreResult<()> {
        let owner = owner.clone();
        let gym = gym.clone();
        let grant = grant.cloned();

        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let owner = owner.clone();
                let gym = gym.clone();
                let grant = grant.clone();
                Box::pin(async move {
                    let existing: Vec<User> = db
                        .fluent()
                        .select()
                        .from(collections::USERS)
                        .filter(|q| q.for_all([q.field("email").eq(owner.email.as_str())]))
                        .limit(1)
                        .obj()
                        .query()
                        .await?;
                    if !existing.is_empty() {
                        return Ok(WriteOutcome::Duplicate);
                    }

                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&owner.id)
                        .object(&owner)
                        .add_to_transaction(transaction)?;
                    db.fluent()
                        .update()
                        .in_col(collections::GYMS)
                        .document_id(&gym.id)
                        .object(&gym)
                        .add_to_transaction(transaction)?;
                    // The gym is new, so there is no earlier grant to supersede.
                    if let Some(grant) = &grant {
                        db.fluent()
                            .update()
                            .in_col(collections::GYM_MEMBERSHIPS)
                            .document_id(&grant.id)
                            .object(grant)
                            .add_to_transaction(transaction)?;
                    }

                    Ok::<_, BackoffError<FirestoreError>>(WriteOutcome::Written)
                })
            })
            .await
            .map_err(db_err("Failed to provision gym owner"))?;

        match outcome {
            WriteOutcome::Duplicate => Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            )),
            _ => {
                tracing::info!(
                    user_id = %owner.id,
                    gym_id = %gym.id,
                    with_membership = grant.is_some(),
                    "Gym owner provisioned"
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_client_reports_database_error() {
        let db = FirestoreStore::new_mock();

        let err = db.get_user("user-1").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        let err = db.reserve_capacity("grant-1").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}

//! Database layer.
//!
//! `Store` is the handle the rest of the application holds. It dispatches to
//! Firestore in production or to the in-memory backend for local development
//! and tests. Every multi-document operation on `Store` commits as one unit on
//! both backends.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{CapacitySnapshot, Gym, GymMembership, Member, MembershipPlan, User};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const GYMS: &str = "gyms";
    pub const MEMBERSHIP_PLANS: &str = "membership_plans";
    /// Grants of a plan to a gym
    pub const GYM_MEMBERSHIPS: &str = "gym_memberships";
    pub const MEMBERS: &str = "members";
}

pub type StoreResult<T> = Result<T, AppError>;

/// Outcome of an owner reassignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerChange {
    /// Links moved; carries the owner that was detached, if any.
    Reassigned { previous_owner: Option<String> },
    /// Target user is missing or does not hold `GYM_OWNER`. Nothing written.
    InvalidOwner,
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreStore),
    Memory(MemoryStore),
}

/// Persistent store handle. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    backend: Backend,
}

impl From<FirestoreStore> for Store {
    fn from(db: FirestoreStore) -> Self {
        Self {
            backend: Backend::Firestore(db),
        }
    }
}

impl From<MemoryStore> for Store {
    fn from(db: MemoryStore) -> Self {
        Self {
            backend: Backend::Memory(db),
        }
    }
}

impl Store {
    /// Connect to Firestore for `project_id`.
    pub async fn firestore(project_id: &str) -> StoreResult<Self> {
        Ok(FirestoreStore::new(project_id).await?.into())
    }

    /// Fresh, empty in-memory store.
    pub fn in_memory() -> Self {
        MemoryStore::new().into()
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            Backend::Firestore(_) => "firestore",
            Backend::Memory(_) => "memory",
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        match &self.backend {
            Backend::Firestore(db) => db.get_user(user_id).await,
            Backend::Memory(db) => db.get_user(user_id).await,
        }
    }

    /// Look up a user by (lowercased) email.
    pub async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        match &self.backend {
            Backend::Firestore(db) => db.find_user_by_email(email).await,
            Backend::Memory(db) => db.find_user_by_email(email).await,
        }
    }

    /// Insert a standalone user. `Conflict` if the email is taken.
    pub async fn insert_user(&self, user: &User) -> StoreResult<()> {
        match &self.backend {
            Backend::Firestore(db) => db.insert_user(user).await,
            Backend::Memory(db) => db.insert_user(user).await,
        }
    }

    // ─── Gym Operations ──────────────────────────────────────────

    pub async fn get_gym(&self, gym_id: &str) -> StoreResult<Option<Gym>> {
        match &self.backend {
            Backend::Firestore(db) => db.get_gym(gym_id).await,
            Backend::Memory(db) => db.get_gym(gym_id).await,
        }
    }

    /// All gyms, most recently joined first.
    pub async fn list_gyms(&self) -> StoreResult<Vec<Gym>> {
        match &self.backend {
            Backend::Firestore(db) => db.list_gyms().await,
            Backend::Memory(db) => db.list_gyms().await,
        }
    }

    /// Write a gym's descriptive fields. Does not move ownership.
    pub async fn update_gym(&self, gym: &Gym) -> StoreResult<()> {
        match &self.backend {
            Backend::Firestore(db) => db.update_gym(gym).await,
            Backend::Memory(db) => db.update_gym(gym).await,
        }
    }

    /// Move `gym` to `new_owner_id`, writing the gym, the new owner's link and
    /// the previous owner's unlink together.
    pub async fn reassign_gym_owner(
        &self,
        gym: &Gym,
        new_owner_id: &str,
    ) -> StoreResult<OwnerChange> {
        match &self.backend {
            Backend::Firestore(db) => db.reassign_gym_owner(gym, new_owner_id).await,
            Backend::Memory(db) => db.reassign_gym_owner(gym, new_owner_id).await,
        }
    }

    /// Delete a gym and unlink every user pointing at it.
    ///
    /// Returns the number of users unlinked.
    pub async fn delete_gym(&self, gym_id: &str) -> StoreResult<usize> {
        match &self.backend {
            Backend::Firestore(db) => db.delete_gym(gym_id).await,
            Backend::Memory(db) => db.delete_gym(gym_id).await,
        }
    }

    // ─── Plan Operations ─────────────────────────────────────────

    pub async fn get_plan(&self, plan_id: &str) -> StoreResult<Option<MembershipPlan>> {
        match &self.backend {
            Backend::Firestore(db) => db.get_plan(plan_id).await,
            Backend::Memory(db) => db.get_plan(plan_id).await,
        }
    }

    pub async fn list_plans(&self) -> StoreResult<Vec<MembershipPlan>> {
        match &self.backend {
            Backend::Firestore(db) => db.list_plans().await,
            Backend::Memory(db) => db.list_plans().await,
        }
    }

    /// `Conflict` if another plan has the same name.
    pub async fn insert_plan(&self, plan: &MembershipPlan) -> StoreResult<()> {
        match &self.backend {
            Backend::Firestore(db) => db.insert_plan(plan).await,
            Backend::Memory(db) => db.insert_plan(plan).await,
        }
    }

    /// `Conflict` if another plan has the same name.
    pub async fn update_plan(&self, plan: &MembershipPlan) -> StoreResult<()> {
        match &self.backend {
            Backend::Firestore(db) => db.update_plan(plan).await,
            Backend::Memory(db) => db.update_plan(plan).await,
        }
    }

    /// `Conflict` while an active grant references the plan.
    pub async fn delete_plan(&self, plan_id: &str) -> StoreResult<()> {
        match &self.backend {
            Backend::Firestore(db) => db.delete_plan(plan_id).await,
            Backend::Memory(db) => db.delete_plan(plan_id).await,
        }
    }

    // ─── Grant Operations ────────────────────────────────────────

    pub async fn get_grant(&self, grant_id: &str) -> StoreResult<Option<GymMembership>> {
        match &self.backend {
            Backend::Firestore(db) => db.get_grant(grant_id).await,
            Backend::Memory(db) => db.get_grant(grant_id).await,
        }
    }

    /// The gym's single active grant, if any.
    pub async fn active_grant_for_gym(&self, gym_id: &str) -> StoreResult<Option<GymMembership>> {
        match &self.backend {
            Backend::Firestore(db) => db.active_grant_for_gym(gym_id).await,
            Backend::Memory(db) => db.active_grant_for_gym(gym_id).await,
        }
    }

    /// Store a new grant, superseding the gym's previous active grant in the
    /// same commit. Returns how many grants were superseded.
    pub async fn issue_grant(&self, grant: &GymMembership) -> StoreResult<usize> {
        match &self.backend {
            Backend::Firestore(db) => db.issue_grant(grant).await,
            Backend::Memory(db) => db.issue_grant(grant).await,
        }
    }

    /// Atomically take one slot on an active grant. `false` when full or
    /// superseded; the counter is untouched in that case.
    pub async fn reserve_capacity(&self, grant_id: &str) -> StoreResult<bool> {
        match &self.backend {
            Backend::Firestore(db) => db.reserve_capacity(grant_id).await,
            Backend::Memory(db) => db.reserve_capacity(grant_id).await,
        }
    }

    /// Atomically give one slot back, flooring at zero.
    pub async fn release_capacity(&self, grant_id: &str) -> StoreResult<()> {
        match &self.backend {
            Backend::Firestore(db) => db.release_capacity(grant_id).await,
            Backend::Memory(db) => db.release_capacity(grant_id).await,
        }
    }

    // ─── Member Operations ───────────────────────────────────────

    pub async fn get_member(&self, member_id: &str) -> StoreResult<Option<Member>> {
        match &self.backend {
            Backend::Firestore(db) => db.get_member(member_id).await,
            Backend::Memory(db) => db.get_member(member_id).await,
        }
    }

    /// Members of a gym, newest first.
    pub async fn list_members_for_gym(&self, gym_id: &str) -> StoreResult<Vec<Member>> {
        match &self.backend {
            Backend::Firestore(db) => db.list_members_for_gym(gym_id).await,
            Backend::Memory(db) => db.list_members_for_gym(gym_id).await,
        }
    }

    pub async fn update_member(&self, member: &Member) -> StoreResult<()> {
        match &self.backend {
            Backend::Firestore(db) => db.update_member(member).await,
            Backend::Memory(db) => db.update_member(member).await,
        }
    }

    /// Reserve a slot on `member.gym_membership_id` and insert the member in
    /// one commit.
    ///
    /// Fails with `CapacityExceeded` when the grant is full and `NotFound`
    /// when the grant does not exist; nothing is written in either case.
    pub async fn create_member(&self, member: &Member) -> StoreResult<CapacitySnapshot> {
        match &self.backend {
            Backend::Firestore(db) => db.create_member(member).await,
            Backend::Memory(db) => db.create_member(member).await,
        }
    }

    /// Remove a member and release its slot on the grant it was counted
    /// against, in one commit. A missing grant is skipped.
    pub async fn delete_member(&self, member_id: &str) -> StoreResult<Member> {
        match &self.backend {
            Backend::Firestore(db) => db.delete_member(member_id).await,
            Backend::Memory(db) => db.delete_member(member_id).await,
        }
    }

    // ─── Owner Provisioning ──────────────────────────────────────

    /// Commit a new owner, their gym and an optional first grant together.
    /// `Conflict` if the owner's email is taken.
    pub async fn provision_owner(
        &self,
        owner: &User,
        gym: &Gym,
        grant: Option<&GymMembership>,
    ) -> StoreResult<()> {
        match &self.backend {
            Backend::Firestore(db) => db.provision_owner(owner, gym, grant).await,
            Backend::Memory(db) => db.provision_owner(owner, gym, grant).await,
        }
    }
}

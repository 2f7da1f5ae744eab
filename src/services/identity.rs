// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login, session checks and the first super-administrator.

use chrono::Utc;

use crate::config::BootstrapAdmin;
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, decode_jwt};
use crate::models::{Role, User};
use crate::services::password;

/// Normalized form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct IdentityService {
    store: Store,
    signing_key: Vec<u8>,
}

impl IdentityService {
    pub fn new(store: Store, signing_key: Vec<u8>) -> Self {
        Self { store, signing_key }
    }

    /// Check credentials and issue a session token.
    ///
    /// Unknown email and wrong password fail identically. Deactivation is only
    /// reported once the password has matched.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<(String, User)> {
        let user = self
            .store
            .find_user_by_email(&normalize_email(email))
            .await?;

        if !password::verify(password, user.as_ref().map(|u| &u.password_hash)).await {
            tracing::info!("Login rejected: invalid credentials");
            return Err(AppError::InvalidCredentials);
        }
        let Some(user) = user else {
            return Err(AppError::InvalidCredentials);
        };

        if !user.is_active {
            tracing::info!(user_id = %user.id, "Login rejected: user deactivated");
            return Err(AppError::Deactivated);
        }

        let token = create_jwt(&user.id, user.role, &self.signing_key)?;
        tracing::info!(user_id = %user.id, role = %user.role, "Login successful");
        Ok((token, user))
    }

    /// Resolve a bearer token to an active user holding `required`.
    pub async fn authorize(&self, token: Option<&str>, required: Role) -> Result<User> {
        let token = token.ok_or(AppError::Unauthenticated)?;
        let claims = decode_jwt(token, &self.signing_key)?;

        let user = self
            .store
            .get_user(&claims.sub)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        if !user.is_active {
            return Err(AppError::Deactivated);
        }
        if user.role != required {
            tracing::debug!(
                user_id = %user.id,
                role = %user.role,
                required = %required,
                "Role check failed"
            );
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Create the configured super-administrator if the email is unused.
    ///
    /// Returns `true` when a user was created.
    pub async fn bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<bool> {
        let email = normalize_email(&admin.email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            tracing::debug!("Bootstrap admin already present");
            return Ok(false);
        }

        let now = Utc::now();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: "Super Admin".to_string(),
            email,
            password_hash: password::hash(&admin.password).await?,
            role: Role::SuperAdmin,
            gym_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        match self.store.insert_user(&user).await {
            Ok(()) => {
                tracing::info!(user_id = %user.id, "Bootstrap super admin created");
                Ok(true)
            }
            // Another instance won the race.
            Err(AppError::Conflict(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

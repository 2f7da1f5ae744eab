// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Argon2 password hashing.
//!
//! Hashing and verification are CPU-bound, so the async wrappers run them on
//! the blocking pool.

use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::error::AppError;
use crate::models;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Hash checked when the email is unknown, so both login failures cost one
/// verification.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| match hash_password("gymhub-dummy-password") {
            Ok(hash) => Some(hash),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build dummy password hash");
                None
            }
        })
        .as_deref()
}

/// Spend one hashing round on `password` and fail.
fn reject_unknown(password: &str) -> bool {
    match dummy_hash() {
        Some(dummy) => {
            verify_password(password, dummy);
        }
        None => {
            let _ = hash_password(password);
        }
    }
    false
}

/// Hash `password` off the async executor.
pub async fn hash(password: &str) -> Result<models::PasswordHash, AppError> {
    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?;
    Ok(models::PasswordHash(hash))
}

/// Verify `password` against `stored`, or against a throwaway hash when there
/// is no stored hash. Always `false` in the latter case.
pub async fn verify(password: &str, stored: Option<&models::PasswordHash>) -> bool {
    let password = password.to_string();
    let stored = stored.map(|h| h.0.clone());

    tokio::task::spawn_blocking(move || match stored {
        Some(hash) => verify_password(&password, &hash),
        None => reject_unknown(&password),
    })
    .await
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "Password verification task failed");
        false
    })
}

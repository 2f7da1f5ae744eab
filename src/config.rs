// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets (JWT key, email API key, bootstrap admin password) are read once at
//! startup and kept in memory.

use std::env;

/// Session token lifetime.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Which persistence backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStore {
    Firestore,
    Memory,
}

impl std::str::FromStr for DataStore {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(DataStore::Firestore),
            "memory" => Ok(DataStore::Memory),
            _ => Err(ConfigError::Invalid("DATA_STORE", s.to_string())),
        }
    }
}

/// Outbound email API settings. Email is disabled when this is absent.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Endpoint accepting `{from, to, subject, html}` JSON
    pub api_url: String,
    /// Bearer key for the email API
    pub api_key: String,
    /// Sender address
    pub from: String,
}

/// Credentials for the super-administrator created on first start.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Persistence backend
    pub data_store: DataStore,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Email delivery settings
    pub email: Option<EmailConfig>,
    /// First super-administrator
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            data_store: DataStore::Memory,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            email: None,
            bootstrap_admin: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let email = match (env::var("EMAIL_API_URL"), env::var("EMAIL_API_KEY")) {
            (Ok(api_url), Ok(api_key)) => Some(EmailConfig {
                api_url: api_url.trim().to_string(),
                api_key: api_key.trim().to_string(),
                from: env::var("EMAIL_FROM")
                    .unwrap_or_else(|_| "no-reply@gymhub.local".to_string()),
            }),
            _ => None,
        };

        let bootstrap_admin = match (
            env::var("BOOTSTRAP_ADMIN_EMAIL"),
            env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(BootstrapAdmin {
                email: email.trim().to_lowercase(),
                password,
            }),
            _ => None,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            data_store: env::var("DATA_STORE")
                .unwrap_or_else(|_| "firestore".to_string())
                .parse()?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            email,
            bootstrap_admin,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GymHub API Server
//!
//! Multi-tenant gym management: plan catalog, gym directory, membership
//! grants and capacity-checked member rosters.

use gymhub::{
    config::{Config, DataStore},
    db::Store,
    services::Mailer,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, store = ?config.data_store, "Starting GymHub API");

    let store = match config.data_store {
        DataStore::Firestore => Store::firestore(&config.gcp_project_id).await?,
        DataStore::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Store::in_memory()
        }
    };

    tracing::info!(backend = store.backend_name(), "Store ready");

    let mailer = Mailer::new(config.email.clone());
    if !mailer.is_enabled() {
        tracing::warn!("EMAIL_API_URL/EMAIL_API_KEY not set, welcome emails disabled");
    }

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), store, mailer));

    if let Some(admin) = &config.bootstrap_admin {
        state.identity.bootstrap_admin(admin).await?;
    }

    // Build router
    let app = gymhub::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gymhub=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}

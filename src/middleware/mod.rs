// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (role guards, security headers).

pub mod auth;
pub mod security;

pub use auth::{require_gym_owner, require_super_admin};

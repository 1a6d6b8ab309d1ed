// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Accounts and authentication payloads.

use chrono::{DateTime, Utc};
use haven_core::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Stored account. The password hash never leaves the service.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id:         Uuid,
    pub email:      String,
    pub password:   String,
    pub name:       String,
    pub role:       Role,
    pub created_at: DateTime<Utc>
}

/// Validated registration handed to the store. `password` is already
/// hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email:    String,
    pub password: String,
    pub name:     String,
    pub role:     Role
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id:    Uuid,
    pub email: String,
    pub name:  String,
    pub role:  Role
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id:    user.id,
            email: user.email,
            name:  user.name,
            role:  user.role
        }
    }
}

/// `POST /api/auth/register` body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email:    Option<String>,
    pub password: Option<String>,
    pub name:     Option<String>,
    /// `BUYER` (default), `SELLER` or `ADMIN`, any case.
    pub role:     Option<String>
}

/// `POST /api/auth/login` body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email:    Option<String>,
    pub password: Option<String>
}

/// Token plus the account it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user:  UserResponse
}

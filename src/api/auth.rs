// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Registration, login and token refresh.

use axum::{extract::State, http::StatusCode};
use haven_core::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AppJson, AppState};
use crate::{
    auth::{AuthUser, hash_password, verify_password},
    error::{ApiError, ApiResult, StoreResultExt},
    model::{
        AuthResponse, LoginRequest, NewUser, RegisterRequest, User, UserResponse,
        product::non_blank
    },
    store::StoreError
};

/// Returned when registration asks for the ADMIN role.
const ADMIN_NOT_SELF_SERVICE: &str = "Admin accounts cannot be self-registered";

/// Same message for unknown email and wrong password.
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Freshly issued token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String
}

fn issue(state: &AppState, user: User) -> ApiResult<AuthResponse> {
    let token = state
        .tokens
        .issue(user.id, &user.email, user.role)
        .map_err(|e| ApiError::internal("Failed to issue token", e))?;
    Ok(AuthResponse {
        token,
        user: user.into()
    })
}

/// Create an account and sign in.
///
/// Buyers get an empty cart in the same transaction. Only BUYER and SELLER
/// may be requested; admins are provisioned in storage.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Missing fields or unknown role", body = crate::error::ErrorBody),
        (status = 403, description = "ADMIN role requested", body = crate::error::ErrorBody),
        (status = 409, description = "Email already registered", body = crate::error::ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>
) -> ApiResult<(StatusCode, AppJson<AuthResponse>)> {
    let (Some(email), Some(password), Some(name)) = (
        non_blank(req.email),
        req.password.filter(|p| !p.is_empty()),
        non_blank(req.name)
    ) else {
        return Err(ApiError::validation("Missing required fields"));
    };
    let role = match non_blank(req.role) {
        Some(role) => role
            .parse::<Role>()
            .map_err(|_| ApiError::validation("Invalid role"))?,
        None => Role::default()
    };
    if role == Role::Admin {
        return Err(ApiError::Forbidden(ADMIN_NOT_SELF_SERVICE.into()));
    }

    let password = hash_password(&password)
        .await
        .map_err(|e| ApiError::internal("Registration failed", e))?;
    let user = state
        .store
        .create_user(NewUser {
            email: email.to_lowercase(),
            password,
            name,
            role
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::conflict("Email already registered"),
            other => ApiError::internal("Registration failed", other)
        })?;

    tracing::info!(user_id = %user.id, role = %user.role, "user registered");
    Ok((StatusCode::CREATED, AppJson(issue(&state, user)?)))
}

/// Exchange credentials for a token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 400, description = "Missing fields", body = crate::error::ErrorBody),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>
) -> ApiResult<AppJson<AuthResponse>> {
    let (Some(email), Some(password)) = (non_blank(req.email), req.password) else {
        return Err(ApiError::validation("Email and password required"));
    };

    let user = state
        .store
        .find_user_by_email(&email.to_lowercase())
        .await
        .or_internal("Login failed")?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    let verified = verify_password(&password, &user.password)
        .await
        .map_err(|e| ApiError::internal("Login failed", e))?;
    if !verified {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    Ok(AppJson(issue(&state, user)?))
}

/// Current account.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, body = UserResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 404, description = "Account no longer exists", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    caller: AuthUser
) -> ApiResult<AppJson<UserResponse>> {
    let user = state
        .store
        .find_user(caller.id)
        .await
        .or_internal("Failed to load account")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(AppJson(user.into()))
}

/// Trade a valid token for one with a fresh expiry.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Auth",
    responses(
        (status = 200, body = TokenResponse),
        (status = 401, description = "Missing, invalid or expired token", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn refresh(
    State(state): State<AppState>,
    caller: AuthUser
) -> ApiResult<AppJson<TokenResponse>> {
    let token = state
        .tokens
        .issue(caller.id, &caller.email, caller.role)
        .map_err(|e| ApiError::internal("Failed to issue token", e))?;
    Ok(AppJson(TokenResponse {
        token
    }))
}

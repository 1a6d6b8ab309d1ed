// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Password hashing and bearer tokens.
//!
//! Passwords are hashed with Argon2id on the blocking pool. Tokens are HS256
//! JWTs carrying the user id, email and role; [`AuthUser`] extracts them from
//! the `Authorization: Bearer <token>` header.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng
    }
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts}
};
use chrono::{Duration, Utc};
use haven_core::Role;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::AuthSettings, error::ApiError};

/// Failure while hashing or signing.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError)
}

/// Hash a plaintext password with a fresh salt.
pub async fn hash_password(plain: &str) -> Result<String, AuthError> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hash(e.to_string()))
    })
    .await?
}

/// Check `plain` against a stored hash. Malformed hashes never verify.
pub async fn verify_password(plain: &str, hash: &str) -> Result<bool, AuthError> {
    let plain = plain.to_owned();
    let hash = hash.to_owned();
    let verified = tokio::task::spawn_blocking(move || {
        PasswordHash::new(&hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(plain.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    })
    .await?;
    Ok(verified)
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub:   Uuid,
    pub email: String,
    pub role:  Role,
    /// Issued at, seconds since the epoch.
    pub iat:   i64,
    /// Expiry, seconds since the epoch.
    pub exp:   i64
}

/// Issues and verifies bearer tokens.
pub struct TokenService {
    encoding:   EncodingKey,
    decoding:   DecodingKey,
    validation: Validation,
    ttl:        Duration
}

impl TokenService {
    /// Create a service signing with `secret`, issuing tokens valid for
    /// `ttl`.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl
        }
    }

    /// Build from configuration.
    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(
            settings.secret.as_bytes(),
            Duration::minutes(settings.token_ttl_minutes)
        )
    }

    /// Sign a token for the given user.
    pub fn issue(&self, user_id: Uuid, email: &str, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp()
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding
        )?)
    }

    /// Decode and validate a token. Any failure yields `None`.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .ok()
    }
}

/// Caller identity taken from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id:    Uuid,
    pub email: String,
    pub role:  Role
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id:    claims.sub,
            email: claims.email,
            role:  claims.role
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;
        let tokens = Arc::<TokenService>::from_ref(state);
        let claims = tokens
            .verify(token)
            .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;
        Ok(Self::from(claims))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[tokio::test]
    async fn password_round_trip() {
        let hash = hash_password("hunter22").await.unwrap();
        assert_ne!(hash, "hunter22");
        assert!(verify_password("hunter22", &hash).await.unwrap());
        assert!(!verify_password("hunter23", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_does_not_verify() {
        assert!(!verify_password("anything", "not-a-hash").await.unwrap());
    }

    #[test]
    fn token_carries_identity() {
        let tokens = TokenService::new(b"secret", Duration::minutes(60));
        let id = Uuid::now_v7();
        let token = tokens.issue(id, "maker@example.com", Role::Seller).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "maker@example.com");
        assert_eq!(claims.role, Role::Seller);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let ours = TokenService::new(b"ours", Duration::minutes(60));
        let theirs = TokenService::new(b"theirs", Duration::minutes(60));
        let token = theirs.issue(Uuid::now_v7(), "x@example.com", Role::Buyer).unwrap();
        assert!(ours.verify(&token).is_none());
        assert!(ours.verify("garbage").is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = TokenService::new(b"secret", Duration::minutes(-10));
        let token = tokens.issue(Uuid::now_v7(), "x@example.com", Role::Buyer).unwrap();
        assert!(tokens.verify(&token).is_none());
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}

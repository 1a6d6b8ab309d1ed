// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! # haven
//!
//! REST API for an artisan marketplace: buyers browse and buy handcrafted
//! goods, sellers list products and run a shop.
//!
//! ## Layers
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`config`] | Settings from `config/haven.*` and `HAVEN__*` variables |
//! | [`auth`] | Argon2 password hashing, JWT issue/verify, [`auth::AuthUser`] extractor |
//! | [`model`] | Stored entities, request bodies, response views |
//! | [`store`] | Repository traits with PostgreSQL and in-memory backends |
//! | [`api`] | axum router, handlers and OpenAPI document |
//! | [`error`] | [`error::ApiError`] rendered as `{ "error": string }` |
//!
//! Domain vocabulary shared with other tools (roles, order statuses,
//! pagination, policy checks) lives in the `haven-core` crate.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use haven::{
//!     api::{self, AppState},
//!     auth::TokenService,
//!     store::MemoryStore
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let tokens = TokenService::new(b"secret", chrono::Duration::minutes(60));
//! let app = api::router(AppState::new(Arc::new(MemoryStore::new()), tokens));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3001").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod store;

// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! HTTP surface.
//!
//! # Endpoints
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | POST | `/api/auth/register`, `/api/auth/login` | none |
//! | GET | `/api/auth/me` | bearer |
//! | POST | `/api/auth/refresh` | bearer |
//! | GET, POST | `/api/products` | none / seller |
//! | GET, PUT, DELETE | `/api/products/{id}` | none / owning seller |
//! | GET, POST | `/api/categories` | none / seller or admin |
//! | GET, POST | `/api/reviews` | none / bearer |
//! | GET, POST | `/api/cart` | bearer |
//! | PUT, DELETE | `/api/cart/{item_id}` | owning user |
//! | GET, POST | `/api/seller-profile` | none / seller |
//! | GET, POST | `/api/orders` | bearer |
//! | GET | `/api/orders/{id}` | owner, admin or involved seller |
//! | PUT | `/api/orders/{id}/status` | admin or involved seller |
//! | GET | `/api/seller/{products,orders,stats}` | seller |
//! | GET | `/health`, `/api-docs/openapi.json` | none |
//!
//! Every error is `{ "error": string }`; see [`crate::error`].

pub mod auth;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod seller;
pub mod seller_profile;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRef, FromRequest, FromRequestParts},
    http::{HeaderValue, Method, header},
    response::{IntoResponse, Response},
    routing::{get, post, put}
};
use haven_core::{
    Role,
    policy::{PolicyOperation, require_role}
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme}
};

use crate::{
    auth::{AuthUser, TokenService},
    config::CorsSettings,
    error::{ApiError, ApiResult, StoreResultExt},
    model::User,
    store::Store
};

/// Shared handler state.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub store:  Arc<dyn Store>,
    pub tokens: Arc<TokenService>
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens)
        }
    }
}

/// JSON body extractor and response whose rejections render as
/// [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

impl<T: Serialize> IntoResponse for AppJson<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

/// Query-string extractor rejecting with [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

/// Path extractor rejecting with [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

/// Load the caller's account and require one of `allowed` roles.
///
/// The role is read from storage rather than the token, so a stale token
/// cannot outlive a role change.
pub(crate) async fn require_account(
    state: &AppState,
    caller: &AuthUser,
    allowed: &'static [Role],
    operation: PolicyOperation,
    resource: &'static str
) -> ApiResult<User> {
    let user = state
        .store
        .find_user(caller.id)
        .await
        .or_internal("Failed to load account")?;
    let role = user.as_ref().map(|u| u.role).unwrap_or(caller.role);
    require_role(role, allowed, operation, resource)?;
    user.ok_or_else(|| ApiError::Unauthorized("Account no longer exists".into()))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct Health {
    status: &'static str
}

/// Liveness probe.
#[utoipa::path(get, path = "/health", tag = "Health", responses((status = 200, body = Health)))]
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok"
    })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/refresh", post(auth::refresh))
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product)
        )
        .route(
            "/api/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product)
        )
        .route(
            "/api/categories",
            get(categories::list_categories).post(categories::create_category)
        )
        .route(
            "/api/reviews",
            get(reviews::list_reviews).post(reviews::create_review)
        )
        .route("/api/cart", get(cart::get_cart).post(cart::add_item))
        .route(
            "/api/cart/{item_id}",
            put(cart::update_item).delete(cart::remove_item)
        )
        .route(
            "/api/seller-profile",
            get(seller_profile::get_profile).post(seller_profile::upsert_profile)
        )
        .route(
            "/api/orders",
            get(orders::list_orders).post(orders::place_order)
        )
        .route("/api/orders/{id}", get(orders::get_order))
        .route("/api/orders/{id}/status", put(orders::update_status))
        .route("/api/seller/products", get(seller::products))
        .route("/api/seller/orders", get(seller::orders))
        .route("/api/seller/stats", get(seller::stats))
        .fallback(not_found)
        .with_state(state)
}

/// CORS policy allowing the configured browser origins.
pub fn cors_layer(settings: &CorsSettings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Adds the `bearerAuth` scheme referenced by protected operations.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build()
            )
        );
    }
}

/// OpenAPI document for every endpoint.
#[derive(OpenApi)]
#[openapi(
    info(title = "Haven API", description = "Artisan marketplace"),
    paths(
        health,
        auth::register,
        auth::login,
        auth::me,
        auth::refresh,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        categories::list_categories,
        categories::create_category,
        reviews::list_reviews,
        reviews::create_review,
        cart::get_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        seller_profile::get_profile,
        seller_profile::upsert_profile,
        orders::place_order,
        orders::list_orders,
        orders::get_order,
        orders::update_status,
        seller::products,
        seller::orders,
        seller::stats
    ),
    components(schemas(crate::error::ErrorBody, crate::model::Message)),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and tokens"),
        (name = "Products", description = "Catalog"),
        (name = "Categories", description = "Product categories"),
        (name = "Reviews", description = "Product reviews"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Sellers", description = "Shop profiles and dashboard"),
        (name = "Health", description = "Liveness")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_path() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/register",
            "/api/products/{id}",
            "/api/cart/{item_id}",
            "/api/orders/{id}/status",
            "/api/seller/stats"
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn openapi_declares_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearerAuth"));
    }

    async fn preflight(origin: &str) -> axum::http::Response<axum::body::Body> {
        use tower::ServiceExt;

        let app = Router::new().route("/health", get(health)).layer(cors_layer(&CorsSettings {
            allowed_origins: vec!["http://localhost:3000".into(), "bad\norigin".into()]
        }));
        let req = axum::http::Request::builder()
            .method(Method::OPTIONS)
            .uri("/health")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(axum::body::Body::empty())
            .unwrap();
        app.oneshot(req).await.unwrap()
    }

    #[tokio::test]
    async fn cors_allows_configured_origin_and_skips_invalid_ones() {
        let resp = preflight("http://localhost:3000").await;
        let headers = resp.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );

        let resp = preflight("http://evil.example").await;
        assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}

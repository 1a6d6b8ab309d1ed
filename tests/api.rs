// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! End-to-end tests driving the router against the in-memory store.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header}
};
use haven::{
    api::{self, AppState},
    auth::{TokenService, hash_password},
    model::NewUser,
    store::{MemoryStore, UserRepository}
};
use haven_core::Role;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    app_with_store().0
}

fn app_with_store() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let tokens = TokenService::new(b"integration-secret", chrono::Duration::minutes(60));
    (api::router(AppState::new(store.clone(), tokens)), store)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => req.body(Body::empty())
    }
    .unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

struct Account {
    id:    String,
    token: String
}

async fn register(app: &Router, email: &str, role: Option<&str>) -> Account {
    let mut body = json!({ "email": email, "password": "hunter22", "name": "Test User" });
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    let (status, value) = send(app, Method::POST, "/api/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{value}");
    Account {
        id:    value["user"]["id"].as_str().unwrap().to_string(),
        token: value["token"].as_str().unwrap().to_string()
    }
}

/// Insert an admin straight into storage and sign in.
async fn seed_admin(app: &Router, store: &MemoryStore, email: &str) -> Account {
    store
        .create_user(NewUser {
            email:    email.into(),
            password: hash_password("hunter22").await.unwrap(),
            name:     "Admin".into(),
            role:     Role::Admin
        })
        .await
        .unwrap();
    let (status, value) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "hunter22" }))
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{value}");
    assert_eq!(value["user"]["role"], "ADMIN");
    Account {
        id:    value["user"]["id"].as_str().unwrap().to_string(),
        token: value["token"].as_str().unwrap().to_string()
    }
}

async fn category(app: &Router, seller: &Account, name: &str) -> String {
    let (status, value) = send(
        app,
        Method::POST,
        "/api/categories",
        Some(seller.token.as_str()),
        Some(json!({ "name": name }))
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{value}");
    value["id"].as_str().unwrap().to_string()
}

/// Create a product and publish it.
async fn listed_product(
    app: &Router,
    seller: &Account,
    category_id: &str,
    title: &str,
    price: f64,
    stock: i32
) -> String {
    let (status, value) = send(
        app,
        Method::POST,
        "/api/products",
        Some(seller.token.as_str()),
        Some(json!({
            "title": title,
            "description": "Made by hand",
            "price": price,
            "categoryId": category_id,
            "stock": stock
        }))
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{value}");
    assert_eq!(value["published"], json!(false));
    let id = value["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        app,
        Method::PUT,
        &format!("/api/products/{id}"),
        Some(seller.token.as_str()),
        Some(json!({ "published": true }))
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    id
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    let (status, body) = send(&app, Method::GET, "/api/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");

    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/products"].is_object());
}

#[tokio::test]
async fn register_assigns_requested_or_default_role() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": "Buyer@Example.com", "password": "pw", "name": "Bea" }))
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["role"], "BUYER");
    assert_eq!(body["user"]["email"], "buyer@example.com");
    assert!(body["user"].get("password").is_none());

    let seller = register(&app, "seller@example.com", Some("seller")).await;
    let (status, me) = send(&app, Method::GET, "/api/auth/me", Some(seller.token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "SELLER");
    assert_eq!(me["id"], seller.id.as_str());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": "x@example.com", "password": "pw", "name": "X", "role": "wizard" }))
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid role");
}

#[tokio::test]
async fn admin_role_cannot_be_self_registered() {
    let app = app();
    for role in ["ADMIN", "admin"] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "boss@example.com", "password": "pw", "name": "Boss", "role": role }))
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Admin accounts cannot be self-registered");
    }

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "boss@example.com", "password": "pw" }))
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_rejects_missing_fields_and_duplicates() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": "a@example.com" }))
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");

    register(&app, "taken@example.com", None).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": "TAKEN@example.com", "password": "pw", "name": "Again" }))
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = app();
    register(&app, "user@example.com", None).await;

    let (wrong_status, wrong_body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "user@example.com", "password": "nope" }))
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ghost@example.com", "password": "hunter22" }))
    )
    .await;
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "user@example.com", "password": "hunter22" }))
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    let (status, body) = send(&app, Method::POST, "/api/auth/refresh", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn protected_routes_require_valid_token() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, Method::GET, "/api/cart", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let app = app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
}

#[tokio::test]
async fn only_sellers_and_admins_create_categories() {
    let (app, store) = app_with_store();
    let buyer = register(&app, "b@example.com", None).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/categories",
        Some(buyer.token.as_str()),
        Some(json!({ "name": "Ceramics" }))
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only sellers and admins can create categories");

    let admin = seed_admin(&app, &store, "admin@example.com").await;
    category(&app, &admin, "Home Decor").await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/categories",
        Some(admin.token.as_str()),
        Some(json!({ "name": "home   decor" }))
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Category already exists");

    let (_, list) = send(&app, Method::GET, "/api/categories", None, None).await;
    assert_eq!(list[0]["slug"], "home-decor");
    assert_eq!(list[0]["productCount"], 0);
}

#[tokio::test]
async fn unpublished_products_stay_out_of_the_catalog() {
    let app = app();
    let seller = register(&app, "s@example.com", Some("SELLER")).await;
    let cat = category(&app, &seller, "Woodwork").await;

    let (status, draft) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(seller.token.as_str()),
        Some(json!({
            "title": "Draft Spoon",
            "description": "Not ready",
            "price": "12.50",
            "categoryId": cat
        }))
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(draft["price"], json!(12.5));
    assert_eq!(draft["stock"], 0);

    let (_, list) = send(&app, Method::GET, "/api/products", None, None).await;
    assert_eq!(list["products"], json!([]));
    assert_eq!(list["pagination"]["total"], 0);

    listed_product(&app, &seller, &cat, "Walnut Bowl", 45.0, 2).await;
    let (_, list) = send(&app, Method::GET, "/api/products", None, None).await;
    let products = list["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["title"], "Walnut Bowl");
    assert_eq!(products[0]["category"]["slug"], "woodwork");

    let (_, mine) = send(&app, Method::GET, "/api/seller/products", Some(seller.token.as_str()), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn product_creation_requires_seller_and_known_category() {
    let app = app();
    let buyer = register(&app, "b@example.com", None).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(buyer.token.as_str()),
        Some(json!({ "title": "Mug" }))
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only sellers can create products");

    let seller = register(&app, "s@example.com", Some("SELLER")).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(seller.token.as_str()),
        Some(json!({ "title": "Mug" }))
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(seller.token.as_str()),
        Some(json!({
            "title": "Mug",
            "description": "Stoneware",
            "price": 20,
            "categoryId": "00000000-0000-0000-0000-000000000000"
        }))
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn average_rating_is_the_rounded_mean() {
    let app = app();
    let seller = register(&app, "s@example.com", Some("SELLER")).await;
    let cat = category(&app, &seller, "Textiles").await;
    let rated = listed_product(&app, &seller, &cat, "Scarf", 30.0, 5).await;
    let unrated = listed_product(&app, &seller, &cat, "Hat", 25.0, 5).await;

    for (i, rating) in [5, 3, 4].into_iter().enumerate() {
        let buyer = register(&app, &format!("r{i}@example.com"), None).await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/reviews",
            Some(buyer.token.as_str()),
            Some(json!({ "productId": rated, "rating": rating, "text": "Lovely" }))
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, detail) = send(&app, Method::GET, &format!("/api/products/{rated}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["averageRating"], json!(4.0));
    assert_eq!(detail["reviewCount"], 3);
    assert_eq!(detail["reviews"].as_array().unwrap().len(), 3);
    assert_eq!(detail["reviews"][0]["user"]["name"], "Test User");

    let (_, detail) = send(&app, Method::GET, &format!("/api/products/{unrated}"), None, None).await;
    assert_eq!(detail["averageRating"], json!(0.0));
    assert_eq!(detail["reviewCount"], 0);

    let (status, reviews) = send(
        &app,
        Method::GET,
        &format!("/api/reviews?productId={rated}"),
        None,
        None
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviews.as_array().unwrap().len(), 3);

    let (status, body) = send(&app, Method::GET, "/api/reviews", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Product ID required");

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/products/00000000-0000-0000-0000-000000000000",
        None,
        None
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reviews_are_unique_and_bounded() {
    let app = app();
    let seller = register(&app, "s@example.com", Some("SELLER")).await;
    let cat = category(&app, &seller, "Glass").await;
    let product = listed_product(&app, &seller, &cat, "Vase", 60.0, 1).await;
    let buyer = register(&app, "b@example.com", None).await;

    let review = |rating: i32| json!({ "productId": product, "rating": rating });
    let (status, body) = send(&app, Method::POST, "/api/reviews", Some(buyer.token.as_str()), Some(review(6))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid product ID or rating");

    let (status, _) = send(&app, Method::POST, "/api/reviews", Some(buyer.token.as_str()), Some(review(5))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(&app, Method::POST, "/api/reviews", Some(buyer.token.as_str()), Some(review(1))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "You already reviewed this product");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(buyer.token.as_str()),
        Some(json!({ "productId": "00000000-0000-0000-0000-000000000000", "rating": 3 }))
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cart_line_quantity_cannot_overflow() {
    let app = app();
    let seller = register(&app, "s@example.com", Some("SELLER")).await;
    let cat = category(&app, &seller, "Candles").await;
    let product = listed_product(&app, &seller, &cat, "Taper", 6.0, 10).await;
    let buyer = register(&app, "b@example.com", None).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/cart",
        Some(buyer.token.as_str()),
        Some(json!({ "productId": product, "quantity": i32::MAX }))
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/cart",
        Some(buyer.token.as_str()),
        Some(json!({ "productId": product, "quantity": 1 }))
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Quantity too large");

    let (_, cart) = send(&app, Method::GET, "/api/cart", Some(buyer.token.as_str()), None).await;
    assert_eq!(cart["items"][0]["quantity"], i32::MAX);
    assert_eq!(cart["itemCount"], i64::from(i32::MAX));
}

#[tokio::test]
async fn adding_a_product_twice_merges_the_cart_line() {
    let app = app();
    let seller = register(&app, "s@example.com", Some("SELLER")).await;
    let cat = category(&app, &seller, "Paper").await;
    let product = listed_product(&app, &seller, &cat, "Notebook", 12.5, 20).await;
    let buyer = register(&app, "b@example.com", None).await;

    for quantity in [2, 3] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/cart",
            Some(buyer.token.as_str()),
            Some(json!({ "productId": product, "quantity": quantity }))
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, cart) = send(&app, Method::GET, "/api/cart", Some(buyer.token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(cart["itemCount"], 5);
    assert_eq!(cart["total"], json!(62.5));

    let item_id = items[0]["id"].as_str().unwrap().to_string();
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/cart/{item_id}"),
        Some(buyer.token.as_str()),
        Some(json!({ "quantity": 0 }))
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid quantity");

    let other = register(&app, "o@example.com", None).await;
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/cart/{item_id}"),
        Some(other.token.as_str()),
        None
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, line) = send(
        &app,
        Method::PUT,
        &format!("/api/cart/{item_id}"),
        Some(buyer.token.as_str()),
        Some(json!({ "quantity": 1 }))
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(line["quantity"], 1);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/cart/{item_id}"),
        Some(buyer.token.as_str()),
        None
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Item removed from cart");

    let (_, cart) = send(&app, Method::GET, "/api/cart", Some(buyer.token.as_str()), None).await;
    assert_eq!(cart["items"], json!([]));
    assert_eq!(cart["total"], json!(0.0));
}

#[tokio::test]
async fn only_the_owning_seller_changes_a_product() {
    let app = app();
    let owner = register(&app, "owner@example.com", Some("SELLER")).await;
    let rival = register(&app, "rival@example.com", Some("SELLER")).await;
    let cat = category(&app, &owner, "Metal").await;
    let product = listed_product(&app, &owner, &cat, "Copper Cup", 40.0, 3).await;
    let uri = format!("/api/products/{product}");

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(rival.token.as_str()),
        Some(json!({ "price": 1 }))
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You cannot update this product");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(rival.token.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        Some(owner.token.as_str()),
        Some(json!({ "price": 42.5 }))
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], json!(42.5));
    assert_eq!(updated["title"], "Copper Cup");
    assert_eq!(updated["stock"], 3);
    assert_eq!(updated["published"], json!(true));

    let (status, body) = send(&app, Method::DELETE, &uri, Some(owner.token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product deleted");
    let (status, _) = send(&app, Method::DELETE, &uri, Some(owner.token.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_paginates_filters_and_sorts() {
    let app = app();
    let seller = register(&app, "s@example.com", Some("SELLER")).await;
    let cat = category(&app, &seller, "Jewelry").await;
    for i in 1..=15 {
        listed_product(&app, &seller, &cat, &format!("Ring {i}"), f64::from(i), 1).await;
    }

    let (_, page) = send(&app, Method::GET, "/api/products?page=2&limit=12", None, None).await;
    assert_eq!(page["products"].as_array().unwrap().len(), 3);
    assert_eq!(page["pagination"], json!({ "total": 15, "page": 2, "pages": 2 }));

    let (_, cheap) = send(
        &app,
        Method::GET,
        "/api/products?sort=price-low&maxPrice=3",
        None,
        None
    )
    .await;
    let titles: Vec<_> = cheap["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Ring 1", "Ring 2", "Ring 3"]);

    let (_, newest) = send(&app, Method::GET, "/api/products?limit=1", None, None).await;
    assert_eq!(newest["products"][0]["title"], "Ring 15");

    let (_, found) = send(&app, Method::GET, "/api/products?search=ring%2012", None, None).await;
    assert_eq!(found["pagination"]["total"], 1);

    let (_, none) = send(&app, Method::GET, "/api/products?category=ceramics", None, None).await;
    assert_eq!(none["pagination"]["total"], 0);
    assert_eq!(none["pagination"]["pages"], 0);
}

#[tokio::test]
async fn pages_past_the_end_are_empty() {
    let app = app();
    let seller = register(&app, "s@example.com", Some("SELLER")).await;
    let cat = category(&app, &seller, "Glass").await;
    listed_product(&app, &seller, &cat, "Marble", 4.0, 1).await;

    for page in ["2", "9223372036854775807"] {
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/products?page={page}&limit=100"),
            None,
            None
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["products"], json!([]));
        assert_eq!(body["pagination"]["page"].to_string(), page);
        assert_eq!(body["pagination"]["total"], 1);
        assert_eq!(body["pagination"]["pages"], 1);
    }
}

#[tokio::test]
async fn price_high_and_rating_sorts_break_ties_by_newest() {
    let app = app();
    let seller = register(&app, "s@example.com", Some("SELLER")).await;
    let cat = category(&app, &seller, "Pottery").await;
    let mut ids = Vec::new();
    for (title, price) in [("Vase A", 20.0), ("Vase B", 40.0), ("Vase C", 40.0), ("Vase D", 10.0)] {
        ids.push(listed_product(&app, &seller, &cat, title, price, 3).await);
    }

    for (i, product) in [&ids[0], &ids[0], &ids[1], &ids[3]].into_iter().enumerate() {
        let buyer = register(&app, &format!("r{i}@example.com"), None).await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/reviews",
            Some(buyer.token.as_str()),
            Some(json!({ "productId": product, "rating": 4, "text": "Solid" }))
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let titles = |body: &Value| -> Vec<String> {
        body["products"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap().to_string())
            .collect()
    };

    let (_, priced) = send(&app, Method::GET, "/api/products?sort=price-high", None, None).await;
    assert_eq!(titles(&priced), ["Vase C", "Vase B", "Vase A", "Vase D"]);

    let (_, rated) = send(&app, Method::GET, "/api/products?sort=rating", None, None).await;
    assert_eq!(titles(&rated), ["Vase A", "Vase D", "Vase B", "Vase C"]);
    assert_eq!(rated["products"][0]["reviewCount"], 2);
    assert_eq!(rated["products"][3]["reviewCount"], 0);
}

#[tokio::test]
async fn checkout_turns_the_cart_into_an_order() {
    let app = app();
    let seller = register(&app, "s@example.com", Some("SELLER")).await;
    let cat = category(&app, &seller, "Leather").await;
    let wallet = listed_product(&app, &seller, &cat, "Wallet", 35.0, 4).await;
    let buyer = register(&app, "b@example.com", None).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(buyer.token.as_str()),
        Some(json!({ "shippingAddress": "1 Main St" }))
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cart is empty");

    send(
        &app,
        Method::POST,
        "/api/cart",
        Some(buyer.token.as_str()),
        Some(json!({ "productId": wallet, "quantity": 5 }))
    )
    .await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(buyer.token.as_str()),
        Some(json!({ "shippingAddress": "1 Main St" }))
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Insufficient stock for Wallet");

    let (_, cart) = send(&app, Method::GET, "/api/cart", Some(buyer.token.as_str()), None).await;
    let item_id = cart["items"][0]["id"].as_str().unwrap().to_string();
    send(
        &app,
        Method::PUT,
        &format!("/api/cart/{item_id}"),
        Some(buyer.token.as_str()),
        Some(json!({ "quantity": 2 }))
    )
    .await;

    let (status, order) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(buyer.token.as_str()),
        Some(json!({ "shippingAddress": "1 Main St" }))
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["total"], json!(70.0));
    assert_eq!(order["billingAddress"], "1 Main St");
    assert_eq!(order["orderItems"].as_array().unwrap().len(), 1);
    let order_id = order["id"].as_str().unwrap().to_string();

    let (_, cart) = send(&app, Method::GET, "/api/cart", Some(buyer.token.as_str()), None).await;
    assert_eq!(cart["items"], json!([]));
    let (_, product) = send(&app, Method::GET, &format!("/api/products/{wallet}"), None, None).await;
    assert_eq!(product["stock"], 2);

    let (_, mine) = send(&app, Method::GET, "/api/orders", Some(buyer.token.as_str()), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let stranger = register(&app, "x@example.com", None).await;
    let order_uri = format!("/api/orders/{order_id}");
    let (status, _) = send(&app, Method::GET, &order_uri, Some(stranger.token.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::GET, &order_uri, Some(seller.token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);

    let status_uri = format!("/api/orders/{order_id}/status");
    let (status, _) = send(
        &app,
        Method::PUT,
        &status_uri,
        Some(buyer.token.as_str()),
        Some(json!({ "status": "SHIPPED" }))
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(
        &app,
        Method::PUT,
        &status_uri,
        Some(seller.token.as_str()),
        Some(json!({ "status": "LOST" }))
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid order status");
    let (status, updated) = send(
        &app,
        Method::PUT,
        &status_uri,
        Some(seller.token.as_str()),
        Some(json!({ "status": "SHIPPED" }))
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "SHIPPED");

    let (status, stats) = send(&app, Method::GET, "/api/seller/stats", Some(seller.token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalProducts"], 1);
    assert_eq!(stats["activeProducts"], 1);
    assert_eq!(stats["totalOrders"], 1);
    assert_eq!(stats["totalEarnings"], json!(70.0));

    let (_, seller_orders) = send(&app, Method::GET, "/api/seller/orders", Some(seller.token.as_str()), None).await;
    assert_eq!(seller_orders.as_array().unwrap().len(), 1);
    let (status, _) = send(&app, Method::GET, "/api/seller/orders", Some(buyer.token.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn seller_profile_upsert_and_lookup() {
    let app = app();
    let seller = register(&app, "s@example.com", Some("SELLER")).await;
    let buyer = register(&app, "b@example.com", None).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/seller-profile",
        Some(buyer.token.as_str()),
        Some(json!({ "shopName": "Nope" }))
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only sellers can create profiles");

    let uri = format!("/api/seller-profile?userId={}", seller.id);
    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/seller-profile",
        Some(seller.token.as_str()),
        Some(json!({ "shopName": "Kiln & Co", "bio": "Pottery" }))
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["shopName"], "Kiln & Co");
    assert_eq!(created["verified"], json!(false));

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/seller-profile",
        Some(seller.token.as_str()),
        Some(json!({ "bio": "Stoneware pottery" }))
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, view) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["shopName"], "Kiln & Co");
    assert_eq!(view["bio"], "Stoneware pottery");
    assert_eq!(view["user"]["email"], "s@example.com");

    let (status, body) = send(&app, Method::GET, "/api/seller-profile", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User ID required");
}

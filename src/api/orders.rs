// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Checkout and order history.
//!
//! # Access
//!
//! | Operation | Allowed |
//! |-----------|---------|
//! | Place, list own | Any signed-in user with a cart |
//! | View one | Buyer who placed it, admins, sellers with a line in it |
//! | Change status | Admins, sellers with a line in it |

use axum::{extract::State, http::StatusCode};
use haven_core::{
    Role,
    policy::{PolicyError, PolicyOperation}
};
use uuid::Uuid;

use super::{AppJson, AppPath, AppState};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult, StoreResultExt},
    model::{OrderWithItems, PlaceOrderRequest, UpdateOrderStatusRequest, User},
    store::StoreError
};

const NOT_FOUND: &str = "Order not found";

async fn load_account(state: &AppState, caller: &AuthUser) -> ApiResult<User> {
    state
        .store
        .find_user(caller.id)
        .await
        .or_internal("Failed to load account")?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".into()))
}

async fn load_order(state: &AppState, id: Uuid) -> ApiResult<OrderWithItems> {
    state
        .store
        .find_order(id)
        .await
        .or_internal("Failed to fetch order")?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

fn denied(operation: PolicyOperation) -> ApiError {
    PolicyError::NotOwner {
        operation,
        resource: "order"
    }
    .into()
}

/// Turn the caller's cart into an order.
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderWithItems),
        (status = 400, description = "Address missing or cart empty", body = crate::error::ErrorBody),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 404, description = "Caller has no cart", body = crate::error::ErrorBody),
        (status = 409, description = "Insufficient stock", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn place_order(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(req): AppJson<PlaceOrderRequest>
) -> ApiResult<(StatusCode, AppJson<OrderWithItems>)> {
    let checkout = req.into_checkout(caller.id).map_err(ApiError::validation)?;
    let order = state.store.place_order(checkout).await.map_err(|e| match e {
        StoreError::NotFound => ApiError::not_found("Cart not found"),
        StoreError::EmptyCart => ApiError::validation("Cart is empty"),
        StoreError::InsufficientStock {
            title, ..
        } => ApiError::conflict(format!("Insufficient stock for {title}")),
        other => ApiError::internal("Failed to place order", other)
    })?;
    Ok((StatusCode::CREATED, AppJson(order)))
}

/// Orders placed by the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    responses(
        (status = 200, body = [OrderWithItems]),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    caller: AuthUser
) -> ApiResult<AppJson<Vec<OrderWithItems>>> {
    let orders = state
        .store
        .list_orders(caller.id)
        .await
        .or_internal("Failed to fetch orders")?;
    Ok(AppJson(orders))
}

/// One order with its lines.
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, body = OrderWithItems),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 403, description = "Not a party to the order", body = crate::error::ErrorBody),
        (status = 404, description = "Order not found", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_order(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<Uuid>
) -> ApiResult<AppJson<OrderWithItems>> {
    let user = load_account(&state, &caller).await?;
    let order = load_order(&state, id).await?;
    let allowed = order.order.user_id == user.id
        || user.role == Role::Admin
        || (user.role == Role::Seller && order.involves_seller(user.id));
    if !allowed {
        return Err(denied(PolicyOperation::Read));
    }
    Ok(AppJson(order))
}

/// Move an order to another status.
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OrderWithItems),
        (status = 400, description = "Unknown status", body = crate::error::ErrorBody),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 403, description = "Neither admin nor involved seller", body = crate::error::ErrorBody),
        (status = 404, description = "Order not found", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_status(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateOrderStatusRequest>
) -> ApiResult<AppJson<OrderWithItems>> {
    let status = req.status().map_err(ApiError::validation)?;
    let user = load_account(&state, &caller).await?;
    let order = load_order(&state, id).await?;
    let allowed = user.role == Role::Admin
        || (user.role == Role::Seller && order.involves_seller(user.id));
    if !allowed {
        return Err(denied(PolicyOperation::Update));
    }

    let updated = state
        .store
        .update_order_status(id, status)
        .await
        .or_internal("Failed to update order")?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    tracing::info!(order_id = %id, %status, actor = %user.id, "order status changed");
    Ok(AppJson(updated))
}

// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! The caller's shopping cart.
//!
//! | Method | Path | Effect |
//! |--------|------|--------|
//! | GET | `/api/cart` | Cart with lines and computed totals |
//! | POST | `/api/cart` | Add a product, merging with an existing line |
//! | PUT | `/api/cart/{item_id}` | Set a line's quantity |
//! | DELETE | `/api/cart/{item_id}` | Remove a line |

use axum::{extract::State, http::StatusCode};
use haven_core::policy::{PolicyOperation, require_owner};
use uuid::Uuid;

use super::{AppJson, AppPath, AppState};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult, StoreResultExt},
    model::{AddCartItemRequest, Cart, CartLine, CartView, Message, UpdateCartItemRequest},
    store::StoreError
};

const CART_NOT_FOUND: &str = "Cart not found";
const ITEM_NOT_FOUND: &str = "Cart item not found";

async fn caller_cart(state: &AppState, caller: &AuthUser) -> ApiResult<Cart> {
    state
        .store
        .find_cart(caller.id)
        .await
        .or_internal("Failed to fetch cart")?
        .ok_or_else(|| ApiError::not_found(CART_NOT_FOUND))
}

/// Check that `item_id` exists and sits in the caller's cart.
async fn ensure_item_owner(
    state: &AppState,
    caller: &AuthUser,
    item_id: Uuid,
    operation: PolicyOperation
) -> ApiResult<()> {
    let owned = state
        .store
        .find_cart_item(item_id)
        .await
        .or_internal("Failed to fetch cart item")?
        .ok_or_else(|| ApiError::not_found(ITEM_NOT_FOUND))?;
    require_owner(&owned.owner_id, &caller.id, operation, "cart item")?;
    Ok(())
}

/// The caller's cart.
#[utoipa::path(
    get,
    path = "/api/cart",
    tag = "Cart",
    responses(
        (status = 200, body = CartView),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 404, description = "Caller has no cart", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_cart(
    State(state): State<AppState>,
    caller: AuthUser
) -> ApiResult<AppJson<CartView>> {
    let cart = caller_cart(&state, &caller).await?;
    let lines = state
        .store
        .cart_lines(cart.id)
        .await
        .or_internal("Failed to fetch cart")?;
    Ok(AppJson(CartView::new(cart, lines)))
}

/// Add a product. Adding a product already in the cart raises its quantity.
#[utoipa::path(
    post,
    path = "/api/cart",
    tag = "Cart",
    request_body = AddCartItemRequest,
    responses(
        (status = 201, description = "Line added or merged", body = CartLine),
        (status = 400, description = "Product or quantity invalid, or merged quantity too large", body = crate::error::ErrorBody),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 404, description = "Cart or product not found", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn add_item(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(req): AppJson<AddCartItemRequest>
) -> ApiResult<(StatusCode, AppJson<CartLine>)> {
    let (product_id, quantity) = req.into_parts().map_err(ApiError::validation)?;
    let cart = caller_cart(&state, &caller).await?;

    let line = state
        .store
        .add_cart_item(cart.id, product_id, quantity)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::not_found("Product not found"),
            StoreError::QuantityOverflow => ApiError::validation("Quantity too large"),
            other => ApiError::internal("Failed to add item to cart", other)
        })?;
    Ok((StatusCode::CREATED, AppJson(line)))
}

/// Set the quantity of a line in the caller's cart.
#[utoipa::path(
    put,
    path = "/api/cart/{item_id}",
    tag = "Cart",
    params(("item_id" = Uuid, Path, description = "Cart item id")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity updated", body = CartLine),
        (status = 400, description = "Quantity below 1", body = crate::error::ErrorBody),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 403, description = "Item belongs to another cart", body = crate::error::ErrorBody),
        (status = 404, description = "Cart item not found", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_item(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(item_id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateCartItemRequest>
) -> ApiResult<AppJson<CartLine>> {
    let quantity = req.quantity().map_err(ApiError::validation)?;
    ensure_item_owner(&state, &caller, item_id, PolicyOperation::Update).await?;

    state
        .store
        .set_cart_item_quantity(item_id, quantity)
        .await
        .or_internal("Failed to update cart item")?
        .map(AppJson)
        .ok_or_else(|| ApiError::not_found(ITEM_NOT_FOUND))
}

/// Remove a line from the caller's cart.
#[utoipa::path(
    delete,
    path = "/api/cart/{item_id}",
    tag = "Cart",
    params(("item_id" = Uuid, Path, description = "Cart item id")),
    responses(
        (status = 200, description = "Line removed", body = Message),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 403, description = "Item belongs to another cart", body = crate::error::ErrorBody),
        (status = 404, description = "Cart item not found", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn remove_item(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(item_id): AppPath<Uuid>
) -> ApiResult<AppJson<Message>> {
    ensure_item_owner(&state, &caller, item_id, PolicyOperation::Delete).await?;
    if !state
        .store
        .remove_cart_item(item_id)
        .await
        .or_internal("Failed to remove cart item")?
    {
        return Err(ApiError::not_found(ITEM_NOT_FOUND));
    }
    Ok(AppJson(Message::new("Item removed from cart")))
}

// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Seller dashboard.

use axum::extract::State;
use haven_core::{Role, policy::PolicyOperation};

use super::{AppJson, AppState, require_account};
use crate::{
    auth::AuthUser,
    error::{ApiResult, StoreResultExt},
    model::{OrderWithItems, ProductSummary, SellerStats}
};

/// Every product of the caller, unpublished included.
#[utoipa::path(
    get,
    path = "/api/seller/products",
    tag = "Sellers",
    responses(
        (status = 200, body = [ProductSummary]),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not a seller", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn products(
    State(state): State<AppState>,
    caller: AuthUser
) -> ApiResult<AppJson<Vec<ProductSummary>>> {
    let seller = require_account(
        &state,
        &caller,
        &[Role::Seller],
        PolicyOperation::List,
        "seller products"
    )
    .await?;
    let products = state
        .store
        .list_seller_products(seller.id)
        .await
        .or_internal("Failed to fetch products")?;
    Ok(AppJson(products))
}

/// Orders containing the caller's products, limited to the caller's lines.
#[utoipa::path(
    get,
    path = "/api/seller/orders",
    tag = "Sellers",
    responses(
        (status = 200, body = [OrderWithItems]),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not a seller", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn orders(
    State(state): State<AppState>,
    caller: AuthUser
) -> ApiResult<AppJson<Vec<OrderWithItems>>> {
    let seller = require_account(
        &state,
        &caller,
        &[Role::Seller],
        PolicyOperation::List,
        "seller orders"
    )
    .await?;
    let orders = state
        .store
        .list_seller_orders(seller.id)
        .await
        .or_internal("Failed to fetch orders")?;
    Ok(AppJson(orders))
}

#[utoipa::path(
    get,
    path = "/api/seller/stats",
    tag = "Sellers",
    responses(
        (status = 200, body = SellerStats),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not a seller", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn stats(
    State(state): State<AppState>,
    caller: AuthUser
) -> ApiResult<AppJson<SellerStats>> {
    let seller = require_account(
        &state,
        &caller,
        &[Role::Seller],
        PolicyOperation::Read,
        "seller stats"
    )
    .await?;
    let stats = state
        .store
        .seller_stats(seller.id)
        .await
        .or_internal("Failed to fetch stats")?;
    Ok(AppJson(stats))
}

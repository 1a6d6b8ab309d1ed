// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Catalog endpoints.
//!
//! Reads are public and only ever see published products. Writes belong to
//! sellers, and only the seller who listed a product may change it.

use axum::{extract::State, http::StatusCode};
use haven_core::{
    Role,
    policy::{PolicyOperation, require_owner}
};
use uuid::Uuid;

use super::{AppJson, AppPath, AppQuery, AppState, require_account};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult, StoreResultExt},
    model::{
        CreateProductRequest, Message, Product, ProductDetail, ProductListParams,
        ProductListResponse, ProductQuery, UpdateProductRequest
    }
};

const NOT_FOUND: &str = "Product not found";

async fn ensure_category(state: &AppState, category_id: Uuid) -> ApiResult<()> {
    state
        .store
        .find_category(category_id)
        .await
        .or_internal("Failed to load category")?
        .map(|_| ())
        .ok_or_else(|| ApiError::validation("Category not found"))
}

/// Load a product the caller is allowed to modify.
async fn owned_product(
    state: &AppState,
    caller: &AuthUser,
    id: Uuid,
    operation: PolicyOperation
) -> ApiResult<Product> {
    require_account(state, caller, &[Role::Seller], operation, "products").await?;
    let product = state
        .store
        .find_product(id)
        .await
        .or_internal("Failed to load product")?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    require_owner(&product.seller_id, &caller.id, operation, "product")?;
    Ok(product)
}

/// Published products matching the filters, one page at a time.
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(ProductListParams),
    responses(
        (status = 200, body = ProductListResponse),
        (status = 400, description = "Malformed query", body = crate::error::ErrorBody)
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ProductListParams>
) -> ApiResult<AppJson<ProductListResponse>> {
    let query = ProductQuery::from(params);
    let page = state
        .store
        .list_products(&query)
        .await
        .or_internal("Failed to fetch products")?;
    Ok(AppJson(ProductListResponse {
        products:   page.products,
        pagination: query.pagination.page_info(page.total)
    }))
}

/// Product with seller, category and reviews.
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, body = ProductDetail),
        (status = 404, description = "Product not found", body = crate::error::ErrorBody)
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>
) -> ApiResult<AppJson<ProductDetail>> {
    state
        .store
        .product_detail(id)
        .await
        .or_internal("Failed to fetch product")?
        .map(AppJson)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

/// List a new, unpublished product.
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Missing fields or unknown category", body = crate::error::ErrorBody),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not a seller", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_product(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(req): AppJson<CreateProductRequest>
) -> ApiResult<(StatusCode, AppJson<Product>)> {
    require_account(
        &state,
        &caller,
        &[Role::Seller],
        PolicyOperation::Create,
        "products"
    )
    .await?;
    let new = req.into_new(caller.id).map_err(ApiError::validation)?;
    ensure_category(&state, new.category_id).await?;

    let product = state
        .store
        .create_product(new)
        .await
        .or_internal("Failed to create product")?;
    tracing::info!(product_id = %product.id, seller_id = %caller.id, "product created");
    Ok((StatusCode::CREATED, AppJson(product)))
}

/// Change the supplied fields of one of the caller's products.
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Invalid field", body = crate::error::ErrorBody),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 403, description = "Not the owning seller", body = crate::error::ErrorBody),
        (status = 404, description = "Product not found", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_product(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateProductRequest>
) -> ApiResult<AppJson<Product>> {
    owned_product(&state, &caller, id, PolicyOperation::Update).await?;
    let patch = req.into_patch().map_err(ApiError::validation)?;
    if let Some(category_id) = patch.category_id {
        ensure_category(&state, category_id).await?;
    }

    state
        .store
        .update_product(id, patch)
        .await
        .or_internal("Failed to update product")?
        .map(AppJson)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

/// Remove one of the caller's products.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted", body = Message),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 403, description = "Not the owning seller", body = crate::error::ErrorBody),
        (status = 404, description = "Product not found", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_product(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<Uuid>
) -> ApiResult<AppJson<Message>> {
    owned_product(&state, &caller, id, PolicyOperation::Delete).await?;
    if !state
        .store
        .delete_product(id)
        .await
        .or_internal("Failed to delete product")?
    {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    tracing::info!(product_id = %id, seller_id = %caller.id, "product deleted");
    Ok(AppJson(Message::new("Product deleted")))
}

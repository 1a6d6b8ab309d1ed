// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Product reviews. Any signed-in user may review a product once.

use axum::{extract::State, http::StatusCode};

use super::{AppJson, AppQuery, AppState};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult, StoreResultExt},
    model::{CreateReviewRequest, ReviewListParams, ReviewWithUser},
    store::StoreError
};

/// Reviews of one product, newest first.
#[utoipa::path(
    get,
    path = "/api/reviews",
    tag = "Reviews",
    params(ReviewListParams),
    responses(
        (status = 200, body = [ReviewWithUser]),
        (status = 400, description = "Product id missing", body = crate::error::ErrorBody)
    )
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ReviewListParams>
) -> ApiResult<AppJson<Vec<ReviewWithUser>>> {
    let product_id = params
        .product_id
        .ok_or_else(|| ApiError::validation("Product ID required"))?;
    let reviews = state
        .store
        .list_reviews(product_id)
        .await
        .or_internal("Failed to fetch reviews")?;
    Ok(AppJson(reviews))
}

/// Rate a product from 1 to 5.
#[utoipa::path(
    post,
    path = "/api/reviews",
    tag = "Reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewWithUser),
        (status = 400, description = "Product id or rating invalid", body = crate::error::ErrorBody),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 404, description = "Product not found", body = crate::error::ErrorBody),
        (status = 409, description = "Already reviewed", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_review(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(req): AppJson<CreateReviewRequest>
) -> ApiResult<(StatusCode, AppJson<ReviewWithUser>)> {
    let review = req.into_new(caller.id).map_err(ApiError::validation)?;
    let created = state.store.create_review(review).await.map_err(|e| match e {
        StoreError::Conflict(_) => ApiError::conflict("You already reviewed this product"),
        StoreError::NotFound => ApiError::not_found("Product not found"),
        other => ApiError::internal("Failed to create review", other)
    })?;
    Ok((StatusCode::CREATED, AppJson(created)))
}

// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use axum::{extract::State, http::StatusCode};
use haven_core::{Role, policy::PolicyOperation};

use super::{AppJson, AppQuery, AppState, require_account};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult, StoreResultExt},
    model::{SellerProfile, SellerProfileParams, SellerProfileView, UpsertSellerProfileRequest}
};

/// Public shop profile of a seller.
#[utoipa::path(
    get,
    path = "/api/seller-profile",
    tag = "Sellers",
    params(SellerProfileParams),
    responses(
        (status = 200, body = SellerProfileView),
        (status = 400, description = "User id missing", body = crate::error::ErrorBody),
        (status = 404, description = "Profile not found", body = crate::error::ErrorBody)
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SellerProfileParams>
) -> ApiResult<AppJson<SellerProfileView>> {
    let user_id = params
        .user_id
        .ok_or_else(|| ApiError::validation("User ID required"))?;
    state
        .store
        .find_seller_profile(user_id)
        .await
        .or_internal("Failed to fetch profile")?
        .map(AppJson)
        .ok_or_else(|| ApiError::not_found("Profile not found"))
}

/// Create the caller's shop profile or update the supplied fields.
#[utoipa::path(
    post,
    path = "/api/seller-profile",
    tag = "Sellers",
    request_body = UpsertSellerProfileRequest,
    responses(
        (status = 201, description = "Profile saved", body = SellerProfile),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not a seller", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn upsert_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(req): AppJson<UpsertSellerProfileRequest>
) -> ApiResult<(StatusCode, AppJson<SellerProfile>)> {
    require_account(
        &state,
        &caller,
        &[Role::Seller],
        PolicyOperation::Create,
        "profiles"
    )
    .await?;
    let profile = state
        .store
        .upsert_seller_profile(caller.id, req.into())
        .await
        .or_internal("Failed to save profile")?;
    Ok((StatusCode::CREATED, AppJson(profile)))
}

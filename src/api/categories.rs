// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use axum::{extract::State, http::StatusCode};
use haven_core::{Role, catalog::slugify, policy::PolicyOperation};

use super::{AppJson, AppState, require_account};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult, StoreResultExt},
    model::{Category, CategoryWithCount, CreateCategoryRequest, product::non_blank},
    store::StoreError
};

/// Every category with its published product count.
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Categories",
    responses((status = 200, body = [CategoryWithCount]))
)]
pub async fn list_categories(
    State(state): State<AppState>
) -> ApiResult<AppJson<Vec<CategoryWithCount>>> {
    let categories = state
        .store
        .list_categories()
        .await
        .or_internal("Failed to fetch categories")?;
    Ok(AppJson(categories))
}

/// Create a category; its slug is derived from the name.
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Name missing", body = crate::error::ErrorBody),
        (status = 401, description = "Authentication required", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is neither seller nor admin", body = crate::error::ErrorBody),
        (status = 409, description = "Slug taken", body = crate::error::ErrorBody)
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_category(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(req): AppJson<CreateCategoryRequest>
) -> ApiResult<(StatusCode, AppJson<Category>)> {
    require_account(
        &state,
        &caller,
        &[Role::Seller, Role::Admin],
        PolicyOperation::Create,
        "categories"
    )
    .await?;
    let name = non_blank(req.name).ok_or_else(|| ApiError::validation("Category name required"))?;
    let slug = slugify(&name);
    if slug.is_empty() {
        return Err(ApiError::validation("Category name required"));
    }

    let category = state
        .store
        .create_category(&name, &slug)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::conflict("Category already exists"),
            other => ApiError::internal("Failed to create category", other)
        })?;
    Ok((StatusCode::CREATED, AppJson(category)))
}

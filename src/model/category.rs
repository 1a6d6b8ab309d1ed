// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Product categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Category with its unique slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id:         Uuid,
    pub name:       String,
    pub slug:       String,
    pub created_at: DateTime<Utc>
}

/// Category listing entry with the number of published products in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCount {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub category:      Category,
    pub product_count: i64
}

/// `POST /api/categories` body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: Option<String>
}

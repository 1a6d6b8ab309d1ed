// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Seller shop profiles and dashboard statistics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::product::non_blank;

/// Shop profile. `rating` and `review_count` are computed over the reviews
/// of the seller's products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SellerProfile {
    pub user_id:      Uuid,
    pub shop_name:    Option<String>,
    pub bio:          Option<String>,
    pub image:        Option<String>,
    pub verified:     bool,
    pub rating:       f64,
    pub review_count: i64,
    pub created_at:   DateTime<Utc>,
    pub updated_at:   DateTime<Utc>
}

/// Account owning a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProfileOwner {
    pub name:  String,
    pub email: String
}

/// `GET /api/seller-profile` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SellerProfileView {
    #[serde(flatten)]
    pub profile: SellerProfile,
    pub user:    ProfileOwner
}

/// `GET /api/seller-profile` query string.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SellerProfileParams {
    pub user_id: Option<Uuid>
}

/// `POST /api/seller-profile` body. Blank or absent fields keep their
/// stored value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSellerProfileRequest {
    pub shop_name: Option<String>,
    pub bio:       Option<String>,
    pub image:     Option<String>
}

impl From<UpsertSellerProfileRequest> for SellerProfilePatch {
    fn from(req: UpsertSellerProfileRequest) -> Self {
        Self {
            shop_name: non_blank(req.shop_name),
            bio:       non_blank(req.bio),
            image:     non_blank(req.image)
        }
    }
}

/// Field-by-field profile update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SellerProfilePatch {
    pub shop_name: Option<String>,
    pub bio:       Option<String>,
    pub image:     Option<String>
}

/// `GET /api/seller/stats` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SellerStats {
    pub total_products:  i64,
    /// Published products.
    pub active_products: i64,
    /// Orders containing at least one of the seller's products.
    pub total_orders:    i64,
    /// Line totals over non-cancelled orders.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_earnings:  Decimal,
    pub average_rating:  f64
}

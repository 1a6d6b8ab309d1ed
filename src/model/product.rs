// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Products and catalog queries.
//!
//! # Read models
//!
//! | Type | Used by |
//! |------|---------|
//! | [`Product`] | Create/update responses, cart lines |
//! | [`ProductSummary`] | Catalog listing, seller dashboard |
//! | [`ProductDetail`] | `GET /api/products/{id}` |
//!
//! Summaries carry the seller, the category and review statistics
//! computed at read time; nothing derived is stored.

use chrono::{DateTime, Utc};
use haven_core::{PageInfo, Pagination, catalog::ProductSort};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{category::Category, money, review::ReviewWithUser};

/// Stored product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id:          Uuid,
    pub title:       String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price:       Decimal,
    pub stock:       i32,
    /// Image URLs in display order.
    pub images:      Vec<String>,
    /// Only published products appear in the public catalog.
    pub published:   bool,
    pub seller_id:   Uuid,
    pub category_id: Uuid,
    pub created_at:  DateTime<Utc>,
    pub updated_at:  DateTime<Utc>
}

/// `POST /api/products` body.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub title:       Option<String>,
    pub description: Option<String>,
    /// Number or numeric string.
    #[serde(default, deserialize_with = "money::deserialize")]
    #[schema(value_type = Option<f64>)]
    pub price:       Option<Decimal>,
    pub category_id: Option<Uuid>,
    #[validate(range(min = 0))]
    pub stock:       Option<i32>,
    pub images:      Option<Vec<String>>
}

impl CreateProductRequest {
    /// Check required fields and build the store input for `seller_id`.
    ///
    /// The product starts unpublished.
    pub fn into_new(self, seller_id: Uuid) -> Result<NewProduct, &'static str> {
        self.validate().map_err(|_| "Stock cannot be negative")?;
        let title = non_blank(self.title);
        let description = non_blank(self.description);
        let (Some(title), Some(description), Some(price), Some(category_id)) =
            (title, description, self.price, self.category_id)
        else {
            return Err("Missing required fields");
        };
        if price.is_sign_negative() {
            return Err("Price cannot be negative");
        }
        Ok(NewProduct {
            seller_id,
            category_id,
            title,
            description,
            price,
            stock: self.stock.unwrap_or(0),
            images: self.images.unwrap_or_default()
        })
    }
}

/// Validated product input.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub seller_id:   Uuid,
    pub category_id: Uuid,
    pub title:       String,
    pub description: String,
    pub price:       Decimal,
    pub stock:       i32,
    pub images:      Vec<String>
}

/// `PUT /api/products/{id}` body. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub title:       Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "money::deserialize")]
    #[schema(value_type = Option<f64>)]
    pub price:       Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub images:      Option<Vec<String>>,
    #[validate(range(min = 0))]
    pub stock:       Option<i32>,
    pub published:   Option<bool>
}

impl UpdateProductRequest {
    /// Drop blank text fields and reject negative numbers.
    pub fn into_patch(self) -> Result<ProductPatch, &'static str> {
        self.validate().map_err(|_| "Stock cannot be negative")?;
        if self.price.is_some_and(|p| p.is_sign_negative()) {
            return Err("Price cannot be negative");
        }
        Ok(ProductPatch {
            title:       non_blank(self.title),
            description: non_blank(self.description),
            price:       self.price,
            category_id: self.category_id,
            images:      self.images,
            stock:       self.stock,
            published:   self.published
        })
    }
}

/// Field-by-field product update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub title:       Option<String>,
    pub description: Option<String>,
    pub price:       Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub images:      Option<Vec<String>>,
    pub stock:       Option<i32>,
    pub published:   Option<bool>
}

impl ProductPatch {
    /// Apply the supplied fields to `product`.
    pub fn apply(self, product: &mut Product) {
        if let Some(title) = self.title {
            product.title = title;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
        if let Some(images) = self.images {
            product.images = images;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(published) = self.published {
            product.published = published;
        }
    }
}

/// `GET /api/products` query string.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductListParams {
    /// Category slug.
    pub category:  Option<String>,
    #[param(value_type = Option<f64>)]
    pub min_price: Option<Decimal>,
    #[param(value_type = Option<f64>)]
    pub max_price: Option<Decimal>,
    /// Case-insensitive match on title or description.
    pub search:    Option<String>,
    /// `newest` (default), `price-low`, `price-high` or `rating`.
    pub sort:      Option<String>,
    /// 1-based page, default 1.
    pub page:      Option<i64>,
    /// Page size, default 12, at most 100.
    pub limit:     Option<i64>
}

/// Normalized catalog filter. Only published products are ever matched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub category:   Option<String>,
    pub min_price:  Option<Decimal>,
    pub max_price:  Option<Decimal>,
    pub search:     Option<String>,
    pub sort:       ProductSort,
    pub pagination: Pagination
}

impl From<ProductListParams> for ProductQuery {
    fn from(params: ProductListParams) -> Self {
        Self {
            sort:       ProductSort::parse(params.sort.as_deref()),
            pagination: Pagination::from_query(params.page, params.limit),
            category:   non_blank(params.category),
            search:     non_blank(params.search),
            min_price:  params.min_price,
            max_price:  params.max_price
        }
    }
}

impl ProductQuery {
    /// Whether `product` in category `slug` passes every filter.
    pub fn matches(&self, product: &Product, slug: &str) -> bool {
        if !product.published {
            return false;
        }
        if self.category.as_deref().is_some_and(|c| c != slug) {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            return product.title.to_lowercase().contains(&term)
                || product.description.to_lowercase().contains(&term);
        }
        true
    }
}

/// Seller shown next to a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SellerSummary {
    pub id:        Uuid,
    pub name:      String,
    pub shop_name: Option<String>,
    pub verified:  bool
}

/// Product with seller, category and review statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    #[serde(flatten)]
    pub product:        Product,
    pub seller:         SellerSummary,
    pub category:       Category,
    /// Mean rating to one decimal, `0` without reviews.
    pub average_rating: f64,
    pub review_count:   i64
}

/// One page of catalog results as returned by a store.
#[derive(Debug, Clone, Default)]
pub struct ProductPage {
    pub products: Vec<ProductSummary>,
    /// Rows matching the filter across all pages.
    pub total:    i64
}

/// `GET /api/products` response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductListResponse {
    pub products:   Vec<ProductSummary>,
    pub pagination: PageInfo
}

/// `GET /api/products/{id}` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub summary: ProductSummary,
    /// Newest first.
    pub reviews: Vec<ReviewWithUser>
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        let now = Utc::now();
        Product {
            id:          Uuid::now_v7(),
            title:       "Walnut Bowl".into(),
            description: "Hand-turned from a single block".into(),
            price:       Decimal::new(4500, 2),
            stock:       3,
            images:      vec![],
            published:   true,
            seller_id:   Uuid::now_v7(),
            category_id: Uuid::now_v7(),
            created_at:  now,
            updated_at:  now
        }
    }

    #[test]
    fn create_requires_fields() {
        let err = CreateProductRequest {
            title: Some("Bowl".into()),
            ..Default::default()
        }
        .into_new(Uuid::now_v7())
        .unwrap_err();
        assert_eq!(err, "Missing required fields");
    }

    #[test]
    fn create_defaults_stock_and_images() {
        let new = CreateProductRequest {
            title:       Some(" Bowl ".into()),
            description: Some("Walnut".into()),
            price:       Some(Decimal::new(1999, 2)),
            category_id: Some(Uuid::now_v7()),
            ..Default::default()
        }
        .into_new(Uuid::now_v7())
        .unwrap();
        assert_eq!(new.title, "Bowl");
        assert_eq!(new.stock, 0);
        assert!(new.images.is_empty());
    }

    #[test]
    fn create_rejects_negative_numbers() {
        let base = CreateProductRequest {
            title:       Some("Bowl".into()),
            description: Some("Walnut".into()),
            price:       Some(Decimal::new(-1, 0)),
            category_id: Some(Uuid::now_v7()),
            ..Default::default()
        };
        assert_eq!(
            base.clone().into_new(Uuid::now_v7()).unwrap_err(),
            "Price cannot be negative"
        );
        let negative_stock = CreateProductRequest {
            price: Some(Decimal::ONE),
            stock: Some(-2),
            ..base
        };
        assert_eq!(
            negative_stock.into_new(Uuid::now_v7()).unwrap_err(),
            "Stock cannot be negative"
        );
    }

    #[test]
    fn patch_changes_only_supplied_fields() {
        let mut p = product();
        let before = p.clone();
        let patch = UpdateProductRequest {
            price: Some(Decimal::new(5000, 2)),
            title: Some("   ".into()),
            ..Default::default()
        }
        .into_patch()
        .unwrap();
        patch.apply(&mut p);
        assert_eq!(p.price, Decimal::new(5000, 2));
        assert_eq!(p.title, before.title);
        assert_eq!(p.description, before.description);
        assert_eq!(p.stock, before.stock);
    }

    #[test]
    fn query_normalizes_params() {
        let q = ProductQuery::from(ProductListParams {
            category: Some(String::new()),
            sort: Some("price-high".into()),
            page: Some(2),
            ..Default::default()
        });
        assert_eq!(q.category, None);
        assert_eq!(q.sort, ProductSort::PriceHigh);
        assert_eq!(q.pagination.offset(), 12);
    }

    #[test]
    fn query_filters() {
        let p = product();
        let all = ProductQuery::default();
        assert!(all.matches(&p, "woodwork"));

        let by_slug = ProductQuery {
            category: Some("ceramics".into()),
            ..Default::default()
        };
        assert!(!by_slug.matches(&p, "woodwork"));

        let by_price = ProductQuery {
            min_price: Some(Decimal::new(50, 0)),
            ..Default::default()
        };
        assert!(!by_price.matches(&p, "woodwork"));

        let by_text = ProductQuery {
            search: Some("HAND-TURNED".into()),
            ..Default::default()
        };
        assert!(by_text.matches(&p, "woodwork"));

        let mut hidden = p;
        hidden.published = false;
        assert!(!all.matches(&hidden, "woodwork"));
    }
}

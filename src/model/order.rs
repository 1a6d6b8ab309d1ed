// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Orders placed from a cart.
//!
//! Order items snapshot the product title, seller and unit price at
//! checkout so later catalog edits do not rewrite history.

use chrono::{DateTime, Utc};
use haven_core::OrderStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::product::non_blank;

/// Stored order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id:               Uuid,
    pub user_id:          Uuid,
    pub status:           OrderStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub total:            Decimal,
    pub shipping_address: String,
    pub billing_address:  String,
    pub created_at:       DateTime<Utc>,
    pub updated_at:       DateTime<Utc>
}

/// Stored order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id:         Uuid,
    pub order_id:   Uuid,
    /// `None` once the product has been deleted.
    pub product_id: Option<Uuid>,
    pub seller_id:  Uuid,
    pub title:      String,
    pub quantity:   i32,
    /// Unit price at checkout.
    #[serde(with = "rust_decimal::serde::float")]
    pub price:      Decimal
}

/// Order with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    #[serde(rename = "orderItems")]
    pub items: Vec<OrderItem>
}

impl OrderWithItems {
    /// Whether any line belongs to `seller_id`.
    pub fn involves_seller(&self, seller_id: Uuid) -> bool {
        self.items.iter().any(|item| item.seller_id == seller_id)
    }
}

/// `POST /api/orders` body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub shipping_address: Option<String>,
    /// Defaults to the shipping address.
    pub billing_address:  Option<String>
}

impl PlaceOrderRequest {
    /// Require a shipping address.
    pub fn into_checkout(self, user_id: Uuid) -> Result<Checkout, &'static str> {
        let shipping_address =
            non_blank(self.shipping_address).ok_or("Shipping address required")?;
        let billing_address =
            non_blank(self.billing_address).unwrap_or_else(|| shipping_address.clone());
        Ok(Checkout {
            user_id,
            shipping_address,
            billing_address
        })
    }
}

/// Validated checkout input.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub user_id:          Uuid,
    pub shipping_address: String,
    pub billing_address:  String
}

/// `PUT /api/orders/{id}/status` body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    /// `PENDING`, `PROCESSING`, `SHIPPED`, `DELIVERED` or `CANCELLED`.
    pub status: Option<String>
}

impl UpdateOrderStatusRequest {
    /// Parse the requested status.
    pub fn status(&self) -> Result<OrderStatus, &'static str> {
        self.status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .ok_or("Invalid order status")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_defaults_to_shipping() {
        let checkout = PlaceOrderRequest {
            shipping_address: Some("1 Kiln Lane".into()),
            billing_address:  None
        }
        .into_checkout(Uuid::nil())
        .unwrap();
        assert_eq!(checkout.billing_address, "1 Kiln Lane");
    }

    #[test]
    fn shipping_is_required() {
        let err = PlaceOrderRequest::default()
            .into_checkout(Uuid::nil())
            .unwrap_err();
        assert_eq!(err, "Shipping address required");
    }

    #[test]
    fn status_parses_any_case() {
        let req = UpdateOrderStatusRequest {
            status: Some("shipped".into())
        };
        assert_eq!(req.status().unwrap(), OrderStatus::Shipped);
        let req = UpdateOrderStatusRequest {
            status: Some("teleported".into())
        };
        assert!(req.status().is_err());
    }
}

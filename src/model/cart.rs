// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Shopping carts.
//!
//! A cart's `total` and `itemCount` are computed when the cart is read;
//! neither is stored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::product::Product;

/// Stored cart, one per buyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id:         Uuid,
    pub user_id:    Uuid,
    pub created_at: DateTime<Utc>
}

/// Stored cart row. Unique per (cart, product).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id:         Uuid,
    pub cart_id:    Uuid,
    pub product_id: Uuid,
    pub quantity:   i32
}

/// Cart item together with the id of the user owning its cart.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct OwnedCartItem {
    #[sqlx(flatten)]
    pub item:     CartItem,
    pub owner_id: Uuid
}

/// Cart item with its product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    #[serde(flatten)]
    pub item:    CartItem,
    pub product: Product
}

impl CartLine {
    /// `price * quantity`.
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.item.quantity)
    }
}

/// `GET /api/cart` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id:         Uuid,
    pub user_id:    Uuid,
    pub created_at: DateTime<Utc>,
    pub items:      Vec<CartLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total:      Decimal,
    /// Sum of quantities.
    pub item_count: i64
}

impl CartView {
    /// Assemble a view, computing totals from `items`.
    pub fn new(cart: Cart, items: Vec<CartLine>) -> Self {
        let total = items.iter().map(CartLine::line_total).sum();
        let item_count = items.iter().map(|line| i64::from(line.item.quantity)).sum();
        Self {
            id: cart.id,
            user_id: cart.user_id,
            created_at: cart.created_at,
            items,
            total,
            item_count
        }
    }
}

/// `POST /api/cart` body.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub quantity:   Option<i32>
}

impl AddCartItemRequest {
    /// Require a product and a positive quantity.
    pub fn into_parts(self) -> Result<(Uuid, i32), &'static str> {
        const INVALID: &str = "Invalid product or quantity";
        self.validate().map_err(|_| INVALID)?;
        match (self.product_id, self.quantity) {
            (Some(product_id), Some(quantity)) => Ok((product_id, quantity)),
            _ => Err(INVALID)
        }
    }
}

/// `PUT /api/cart/{itemId}` body.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCartItemRequest {
    #[validate(range(min = 1))]
    pub quantity: Option<i32>
}

impl UpdateCartItemRequest {
    /// Require a positive quantity.
    pub fn quantity(&self) -> Result<i32, &'static str> {
        self.validate().map_err(|_| "Invalid quantity")?;
        self.quantity.ok_or("Invalid quantity")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: Decimal, quantity: i32) -> CartLine {
        let now = Utc::now();
        let product_id = Uuid::now_v7();
        CartLine {
            item:    CartItem {
                id: Uuid::now_v7(),
                cart_id: Uuid::nil(),
                product_id,
                quantity
            },
            product: Product {
                id:          product_id,
                title:       "Mug".into(),
                description: "Stoneware".into(),
                price,
                stock:       10,
                images:      vec![],
                published:   true,
                seller_id:   Uuid::nil(),
                category_id: Uuid::nil(),
                created_at:  now,
                updated_at:  now
            }
        }
    }

    #[test]
    fn view_sums_lines() {
        let cart = Cart {
            id:         Uuid::nil(),
            user_id:    Uuid::nil(),
            created_at: Utc::now()
        };
        let view = CartView::new(
            cart,
            vec![line(Decimal::new(1250, 2), 2), line(Decimal::new(300, 2), 3)]
        );
        assert_eq!(view.total, Decimal::new(3400, 2));
        assert_eq!(view.item_count, 5);
    }

    #[test]
    fn empty_cart_totals_zero() {
        let cart = Cart {
            id:         Uuid::nil(),
            user_id:    Uuid::nil(),
            created_at: Utc::now()
        };
        let view = CartView::new(cart, vec![]);
        assert_eq!(view.total, Decimal::ZERO);
        assert_eq!(view.item_count, 0);
    }

    #[test]
    fn quantity_must_be_positive() {
        let add = AddCartItemRequest {
            product_id: Some(Uuid::now_v7()),
            quantity:   Some(0)
        };
        assert_eq!(add.into_parts().unwrap_err(), "Invalid product or quantity");

        let update = UpdateCartItemRequest {
            quantity: Some(-1)
        };
        assert_eq!(update.quantity().unwrap_err(), "Invalid quantity");
        assert_eq!(
            UpdateCartItemRequest {
                quantity: Some(4)
            }
            .quantity()
            .unwrap(),
            4
        );
    }
}

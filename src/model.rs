// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Marketplace data types.
//!
//! Each submodule follows the same split:
//!
//! | Kind | Naming | Purpose |
//! |------|--------|---------|
//! | Entity | `Product` | Stored row, `sqlx::FromRow` |
//! | Request | `CreateProductRequest` | JSON body, every field optional so that missing fields produce a domain message |
//! | Input | `NewProduct` | Validated input handed to the store |
//! | View | `ProductSummary` | Enriched read model returned to clients |
//!
//! All JSON uses `camelCase` keys. Money is a [`rust_decimal::Decimal`]
//! rendered as a JSON number.

pub mod cart;
pub mod category;
pub mod order;
pub mod product;
pub mod review;
pub mod seller;
pub mod user;

pub use cart::*;
pub use category::*;
pub use order::*;
pub use product::*;
pub use review::*;
pub use seller::*;
pub use user::*;

/// Plain acknowledgement body, e.g. `{ "message": "Product deleted" }`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct Message {
    pub message: String
}

impl Message {
    /// Wrap `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into()
        }
    }
}

/// Serde helpers for money fields.
pub mod money {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, de};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String)
    }

    /// Accept a price as a JSON number or numeric string, rounded to cents.
    ///
    /// `null`, a missing field and a blank string all yield `None`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>
    {
        let parsed = match Option::<Raw>::deserialize(deserializer)? {
            None => None,
            Some(Raw::Number(n)) => Some(
                Decimal::try_from(n).map_err(|_| de::Error::custom("price is not a finite number"))?
            ),
            Some(Raw::Text(s)) if s.trim().is_empty() => None,
            Some(Raw::Text(s)) => Some(
                s.trim()
                    .parse::<Decimal>()
                    .map_err(|_| de::Error::custom("price is not a number"))?
            )
        };
        Ok(parsed.map(|price| price.round_dp(2)))
    }
}

// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Core domain types for the haven marketplace.
//!
//! Vocabulary shared by the storage backends and the HTTP layer. Nothing
//! here performs I/O.
//!
//! # Overview
//!
//! - [`Role`]: Account role fixed at registration
//! - [`OrderStatus`]: Free-form order lifecycle label
//! - [`Pagination`] / [`PageInfo`]: Page-based listing parameters
//! - [`SortDirection`]: SQL ordering keyword
//! - [`catalog`]: Product sorting, slugs and rating math
//! - [`policy`]: Role and ownership checks
//!
//! # Features
//!
//! | Feature | Effect |
//! |---------|--------|
//! | `postgres` | Derives `sqlx::Type` for [`Role`] and [`OrderStatus`] |
//! | `api` | Derives `utoipa::ToSchema` for public types |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod policy;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Account role.
///
/// Stored as the PostgreSQL enum `user_role` and serialized in upper case
/// (`"BUYER"`, `"SELLER"`, `"ADMIN"`). Parsing is case-insensitive so that
/// clients sending `"seller"` are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum Role {
    /// Default role; owns a cart.
    #[default]
    Buyer,

    /// May list products and run a shop profile.
    Seller,

    /// Operator account.
    Admin
}

impl Role {
    /// Upper-case wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "BUYER",
            Self::Seller => "SELLER",
            Self::Admin => "ADMIN"
        }
    }

    /// Buyers get a cart created alongside their account.
    pub const fn has_cart(&self) -> bool {
        matches!(self, Self::Buyer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    /// Kind of value that failed to parse.
    pub kind:  &'static str,
    /// The rejected input.
    pub value: String
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUYER" => Ok(Self::Buyer),
            "SELLER" => Ok(Self::Seller),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(UnknownVariant {
                kind:  "role",
                value: s.to_string()
            })
        }
    }
}

/// Order lifecycle label.
///
/// There is no enforced transition graph: any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum OrderStatus {
    /// Placed, not yet handled.
    #[default]
    Pending,
    /// Being prepared by the seller.
    Processing,
    /// Handed to the carrier.
    Shipped,
    /// Received by the buyer.
    Delivered,
    /// Abandoned; excluded from earnings.
    Cancelled
}

impl OrderStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled
    ];

    /// Upper-case wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED"
        }
    }

    /// Whether revenue from this order counts toward seller earnings.
    pub const fn counts_toward_earnings(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| UnknownVariant {
                kind:  "order status",
                value: s.to_string()
            })
    }
}

/// Page-based pagination for list operations.
///
/// Pages are 1-indexed. Out-of-range input is clamped rather than rejected,
/// so `page=0` reads the first page and `limit=5000` reads
/// [`Pagination::MAX_LIMIT`] rows.
///
/// # Example
///
/// ```rust
/// use haven_core::Pagination;
///
/// let p = Pagination::from_query(Some(2), Some(12));
/// assert_eq!(p.offset(), 12);
/// assert_eq!(p.page_info(15).pages, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page number, starting at 1.
    pub page:  i64,
    /// Maximum number of results per page.
    pub limit: i64
}

impl Pagination {
    /// Page size used when the client does not ask for one.
    pub const DEFAULT_LIMIT: i64 = 12;

    /// Largest page size a client may request.
    pub const MAX_LIMIT: i64 = 100;

    /// Create pagination parameters without clamping.
    pub const fn new(page: i64, limit: i64) -> Self {
        Self {
            page,
            limit
        }
    }

    /// Build from optional query-string values, clamping into range.
    pub fn from_query(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page:  page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT)
        }
    }

    /// Number of rows to skip, saturating for pages far past the end.
    pub const fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Summarize a listing of `total` matching rows.
    pub const fn page_info(&self, total: i64) -> PageInfo {
        let pages = if self.limit > 0 {
            (total + self.limit - 1) / self.limit
        } else {
            0
        };
        PageInfo {
            total,
            page: self.page,
            pages
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page:  1,
            limit: Self::DEFAULT_LIMIT
        }
    }
}

/// Pagination block returned next to a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct PageInfo {
    /// Total rows matching the filters.
    pub total: i64,
    /// Page that was returned.
    pub page:  i64,
    /// Number of pages at the requested page size.
    pub pages: i64
}

/// Sort direction for ordered queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order (cheapest, oldest first).
    #[default]
    Asc,

    /// Descending order (most expensive, newest first).
    Desc
}

impl SortDirection {
    /// Convert to SQL keyword.
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("seller".parse::<Role>().unwrap(), Role::Seller);
        assert_eq!("BUYER".parse::<Role>().unwrap(), Role::Buyer);
        assert_eq!(" Admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("wizard".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_upper_case() {
        let json = serde_json::to_string(&Role::Seller).unwrap();
        assert_eq!(json, "\"SELLER\"");
        let parsed: Role = serde_json::from_str("\"BUYER\"").unwrap();
        assert_eq!(parsed, Role::Buyer);
    }

    #[test]
    fn only_buyers_have_carts() {
        assert!(Role::Buyer.has_cart());
        assert!(!Role::Seller.has_cart());
        assert!(!Role::Admin.has_cart());
    }

    #[test]
    fn order_status_round_trips_through_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        let err = "lost".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown order status: lost");
    }

    #[test]
    fn offset_saturates_on_huge_pages() {
        let p = Pagination::from_query(Some(i64::MAX), Some(50));
        assert_eq!(p.page, i64::MAX);
        assert_eq!(p.offset(), i64::MAX);
        assert_eq!(p.page_info(3).page, i64::MAX);
        assert_eq!(Pagination::from_query(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn cancelled_orders_do_not_earn() {
        assert!(OrderStatus::Delivered.counts_toward_earnings());
        assert!(!OrderStatus::Cancelled.counts_toward_earnings());
    }

    #[test]
    fn pagination_defaults() {
        let p = Pagination::from_query(None, None);
        assert_eq!(p, Pagination::default());
        assert_eq!(p.limit, 12);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn pagination_clamps_out_of_range_input() {
        let p = Pagination::from_query(Some(0), Some(5000));
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, Pagination::MAX_LIMIT);

        let p = Pagination::from_query(Some(-3), Some(0));
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 1);
    }

    #[test]
    fn page_info_rounds_pages_up() {
        let p = Pagination::new(2, 12);
        assert_eq!(p.offset(), 12);
        let info = p.page_info(15);
        assert_eq!(info.pages, 2);
        assert_eq!(info.total, 15);
        assert_eq!(info.page, 2);

        assert_eq!(Pagination::new(1, 12).page_info(24).pages, 2);
        assert_eq!(Pagination::new(1, 12).page_info(0).pages, 0);
    }

    #[test]
    fn sort_direction_sql() {
        assert_eq!(SortDirection::Asc.as_sql(), "ASC");
        assert_eq!(SortDirection::Desc.as_sql(), "DESC");
        assert_eq!(SortDirection::default(), SortDirection::Asc);
    }
}

// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Storage traits and backends.
//!
//! One repository trait per aggregate, all implemented by both backends:
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`PgStore`] | PostgreSQL via `sqlx` |
//! | [`MemoryStore`] | Development without a database, tests |
//!
//! Handlers depend on [`Store`], the union of every repository trait, as a
//! trait object so the backend is chosen once at startup.
//!
//! # Multi-row writes
//!
//! Operations touching several tables are atomic in both backends:
//!
//! | Operation | Writes |
//! |-----------|--------|
//! | [`UserRepository::create_user`] | user, cart for buyers |
//! | [`CartRepository::add_cart_item`] | single upsert on (cart, product) |
//! | [`OrderRepository::place_order`] | order, items, stock, cart |

mod memory;
mod postgres;

use async_trait::async_trait;
use haven_core::OrderStatus;
pub use memory::MemoryStore;
pub use postgres::PgStore;
use uuid::Uuid;

use crate::model::{
    Cart, CartLine, Category, CategoryWithCount, Checkout, NewProduct, NewReview, NewUser,
    OrderWithItems, OwnedCartItem, Product, ProductDetail, ProductPage, ProductPatch,
    ProductQuery, ProductSummary, ReviewWithUser, SellerProfile, SellerProfilePatch,
    SellerProfileView, SellerStats, User
};

/// Storage failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A referenced row does not exist.
    #[error("not found")]
    NotFound,

    /// A unique constraint was violated. Carries the constraint subject.
    #[error("{0} already exists")]
    Conflict(String),

    /// Checkout attempted on a cart without items.
    #[error("cart is empty")]
    EmptyCart,

    /// Checkout requested more units than are in stock.
    #[error("insufficient stock for {title} ({product_id})")]
    InsufficientStock { product_id: Uuid, title: String },

    /// A merged cart line would exceed the largest storable quantity.
    #[error("cart quantity out of range")]
    QuantityOverflow,

    #[error(transparent)]
    Database(#[from] sqlx::Error)
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user, plus an empty cart when the role has one.
    ///
    /// Fails with [`StoreError::Conflict`] on a taken email.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

/// Product categories.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories by name, with published product counts.
    async fn list_categories(&self) -> StoreResult<Vec<CategoryWithCount>>;

    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>>;

    /// Fails with [`StoreError::Conflict`] on a taken slug.
    async fn create_category(&self, name: &str, slug: &str) -> StoreResult<Category>;
}

/// Catalog.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// One page of published products matching `query`.
    async fn list_products(&self, query: &ProductQuery) -> StoreResult<ProductPage>;

    /// Every product of `seller_id`, published or not, newest first.
    async fn list_seller_products(&self, seller_id: Uuid) -> StoreResult<Vec<ProductSummary>>;

    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>>;

    /// Product with seller, category and reviews.
    async fn product_detail(&self, id: Uuid) -> StoreResult<Option<ProductDetail>>;

    async fn create_product(&self, product: NewProduct) -> StoreResult<Product>;

    /// Apply `patch`; `None` if the product does not exist.
    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> StoreResult<Option<Product>>;

    /// `false` if the product did not exist.
    async fn delete_product(&self, id: Uuid) -> StoreResult<bool>;
}

/// Reviews.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Fails with [`StoreError::Conflict`] if the user already reviewed the
    /// product.
    async fn create_review(&self, review: NewReview) -> StoreResult<ReviewWithUser>;

    /// Reviews of `product_id`, newest first.
    async fn list_reviews(&self, product_id: Uuid) -> StoreResult<Vec<ReviewWithUser>>;
}

/// Carts.
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find_cart(&self, user_id: Uuid) -> StoreResult<Option<Cart>>;

    /// Lines of `cart_id` in insertion order.
    async fn cart_lines(&self, cart_id: Uuid) -> StoreResult<Vec<CartLine>>;

    /// Insert the product or add `quantity` to the existing line.
    ///
    /// Fails with [`StoreError::QuantityOverflow`] if the merged quantity
    /// does not fit in an `i32`.
    async fn add_cart_item(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32
    ) -> StoreResult<CartLine>;

    async fn find_cart_item(&self, item_id: Uuid) -> StoreResult<Option<OwnedCartItem>>;

    async fn set_cart_item_quantity(
        &self,
        item_id: Uuid,
        quantity: i32
    ) -> StoreResult<Option<CartLine>>;

    /// `false` if the item did not exist.
    async fn remove_cart_item(&self, item_id: Uuid) -> StoreResult<bool>;
}

/// Orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Turn the user's cart into an order.
    ///
    /// # Errors
    ///
    /// | Error | When |
    /// |-------|------|
    /// | [`StoreError::NotFound`] | The user has no cart |
    /// | [`StoreError::EmptyCart`] | The cart has no items |
    /// | [`StoreError::InsufficientStock`] | A line exceeds product stock |
    ///
    /// Nothing is written when any of these occur.
    async fn place_order(&self, checkout: Checkout) -> StoreResult<OrderWithItems>;

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<OrderWithItems>>;

    /// Orders placed by `user_id`, newest first.
    async fn list_orders(&self, user_id: Uuid) -> StoreResult<Vec<OrderWithItems>>;

    /// Orders with a line sold by `seller_id`, newest first. Only that
    /// seller's lines are included.
    async fn list_seller_orders(&self, seller_id: Uuid) -> StoreResult<Vec<OrderWithItems>>;

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus
    ) -> StoreResult<Option<OrderWithItems>>;
}

/// Seller shops.
#[async_trait]
pub trait SellerProfileRepository: Send + Sync {
    async fn find_seller_profile(&self, user_id: Uuid) -> StoreResult<Option<SellerProfileView>>;

    /// Create the profile or update the supplied fields.
    async fn upsert_seller_profile(
        &self,
        user_id: Uuid,
        patch: SellerProfilePatch
    ) -> StoreResult<SellerProfile>;

    async fn seller_stats(&self, seller_id: Uuid) -> StoreResult<SellerStats>;
}

/// Every repository a handler may need.
pub trait Store:
    UserRepository
    + CategoryRepository
    + ProductRepository
    + ReviewRepository
    + CartRepository
    + OrderRepository
    + SellerProfileRepository
    + 'static
{
}

impl<T> Store for T where
    T: UserRepository
        + CategoryRepository
        + ProductRepository
        + ReviewRepository
        + CartRepository
        + OrderRepository
        + SellerProfileRepository
        + 'static
{
}

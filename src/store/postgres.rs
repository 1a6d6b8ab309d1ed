// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! PostgreSQL backend.
//!
//! Review statistics are aggregated in SQL on every read. Catalog listing
//! builds its `WHERE` clause with [`QueryBuilder`] so that only the filters
//! actually supplied are bound.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use haven_core::{
    OrderStatus,
    catalog::{ProductSort, round_rating}
};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, migrate::MigrateError};
use uuid::Uuid;

use super::{
    CartRepository, CategoryRepository, OrderRepository, ProductRepository, ReviewRepository,
    SellerProfileRepository, StoreError, StoreResult, UserRepository
};
use crate::model::{
    Cart, CartItem, CartLine, Category, CategoryWithCount, Checkout, NewProduct, NewReview,
    NewUser, Order, OrderItem, OrderWithItems, OwnedCartItem, Product, ProductDetail,
    ProductPage, ProductPatch, ProductQuery, ProductSummary, ProfileOwner, Review, Reviewer,
    ReviewWithUser, SellerProfile, SellerProfilePatch, SellerProfileView, SellerStats,
    SellerSummary, User
};

const SUMMARY_SELECT: &str = "\
SELECT p.id, p.title, p.description, p.price, p.stock, p.images, p.published, \
       p.seller_id, p.category_id, p.created_at, p.updated_at, \
       c.name AS category_name, c.slug AS category_slug, c.created_at AS category_created_at, \
       u.name AS seller_name, sp.shop_name AS seller_shop_name, \
       COALESCE(sp.verified, FALSE) AS seller_verified, \
       COALESCE(r.average_rating, 0)::float8 AS average_rating, \
       COALESCE(r.review_count, 0)::int8 AS review_count \
FROM products p \
JOIN categories c ON c.id = p.category_id \
JOIN users u ON u.id = p.seller_id \
LEFT JOIN seller_profiles sp ON sp.user_id = p.seller_id \
LEFT JOIN (SELECT product_id, AVG(rating)::float8 AS average_rating, COUNT(*) AS review_count \
           FROM reviews GROUP BY product_id) r ON r.product_id = p.id";

const SELLER_RATING_JOIN: &str = "\
LEFT JOIN LATERAL (SELECT AVG(r.rating)::float8 AS rating, COUNT(r.id) AS review_count \
                   FROM reviews r JOIN products p ON p.id = r.product_id \
                   WHERE p.seller_id = sp.user_id) stats ON TRUE";

const CART_LINE_COLUMNS: &str = "ci.id AS item_id, ci.cart_id, ci.quantity, p.*";

#[derive(sqlx::FromRow)]
struct ProductSummaryRow {
    #[sqlx(flatten)]
    product:             Product,
    category_name:       String,
    category_slug:       String,
    category_created_at: DateTime<Utc>,
    seller_name:         String,
    seller_shop_name:    Option<String>,
    seller_verified:     bool,
    average_rating:      f64,
    review_count:        i64
}

impl From<ProductSummaryRow> for ProductSummary {
    fn from(row: ProductSummaryRow) -> Self {
        Self {
            seller:         SellerSummary {
                id:        row.product.seller_id,
                name:      row.seller_name,
                shop_name: row.seller_shop_name,
                verified:  row.seller_verified
            },
            category:       Category {
                id:         row.product.category_id,
                name:       row.category_name,
                slug:       row.category_slug,
                created_at: row.category_created_at
            },
            average_rating: round_rating(row.average_rating),
            review_count:   row.review_count,
            product:        row.product
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    #[sqlx(flatten)]
    review:    Review,
    user_name: String
}

impl From<ReviewRow> for ReviewWithUser {
    fn from(row: ReviewRow) -> Self {
        Self {
            user:   Reviewer {
                id:   row.review.user_id,
                name: row.user_name
            },
            review: row.review
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    item_id:  Uuid,
    cart_id:  Uuid,
    quantity: i32,
    #[sqlx(flatten)]
    product:  Product
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            item:    CartItem {
                id:         row.item_id,
                cart_id:    row.cart_id,
                product_id: row.product.id,
                quantity:   row.quantity
            },
            product: row.product
        }
    }
}

#[derive(sqlx::FromRow)]
struct SellerProfileViewRow {
    #[sqlx(flatten)]
    profile:     SellerProfile,
    owner_name:  String,
    owner_email: String
}

impl From<SellerProfileViewRow> for SellerProfileView {
    fn from(row: SellerProfileViewRow) -> Self {
        let mut profile = row.profile;
        profile.rating = round_rating(profile.rating);
        Self {
            profile,
            user: ProfileOwner {
                name:  row.owner_name,
                email: row.owner_email
            }
        }
    }
}

#[derive(sqlx::FromRow)]
struct CheckoutLine {
    quantity:   i32,
    product_id: Uuid,
    title:      String,
    price:      Decimal,
    stock:      i32,
    seller_id:  Uuid
}

/// SQLSTATE raised when integer arithmetic overflows.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Map a unique violation to [`StoreError::Conflict`].
fn unique_as_conflict(err: sqlx::Error, subject: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(subject.to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::NotFound,
        _ => StoreError::Database(err)
    }
}

/// Escape `%`, `_` and `\` for use inside an `ILIKE` pattern.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_filters<'q>(qb: &mut QueryBuilder<'q, Postgres>, query: &'q ProductQuery) {
    qb.push(" WHERE p.published = TRUE");
    if let Some(slug) = &query.category {
        qb.push(" AND c.slug = ").push_bind(slug);
    }
    if let Some(min) = query.min_price {
        qb.push(" AND p.price >= ").push_bind(min);
    }
    if let Some(max) = query.max_price {
        qb.push(" AND p.price <= ").push_bind(max);
    }
    if let Some(term) = &query.search {
        let pattern = like_pattern(term);
        qb.push(" AND (p.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn order_clause(query: &ProductQuery) -> String {
    let dir = query.sort.direction().as_sql();
    match query.sort {
        ProductSort::Newest => format!(" ORDER BY p.created_at {dir}, p.id {dir}"),
        ProductSort::PriceLow | ProductSort::PriceHigh => {
            format!(" ORDER BY p.price {dir}, p.created_at DESC")
        }
        ProductSort::Rating => format!(" ORDER BY review_count {dir}, p.created_at DESC")
    }
}

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool
        }
    }

    /// Apply pending migrations from `migrations/`.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Load items for `orders`, keeping only `seller_id`'s lines when given.
    async fn attach_items(
        &self,
        orders: Vec<Order>,
        seller_id: Option<Uuid>
    ) -> StoreResult<Vec<OrderWithItems>> {
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items: Vec<OrderItem> = sqlx::query_as(
            "SELECT * FROM order_items \
             WHERE order_id = ANY($1) AND ($2::uuid IS NULL OR seller_id = $2) \
             ORDER BY id"
        )
        .bind(&ids)
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }
        Ok(orders
            .into_iter()
            .map(|order| OrderWithItems {
                items: by_order.remove(&order.id).unwrap_or_default(),
                order
            })
            .collect())
    }

    async fn order_with_items(&self, order: Option<Order>) -> StoreResult<Option<OrderWithItems>> {
        let Some(order) = order else {
            return Ok(None);
        };
        Ok(self.attach_items(vec![order], None).await?.pop())
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tx = self.pool.begin().await?;
        let created: User = sqlx::query_as(
            "INSERT INTO users (id, email, password, name, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *"
        )
        .bind(Uuid::now_v7())
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.name)
        .bind(user.role)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_as_conflict(e, "email"))?;

        if created.role.has_cart() {
            sqlx::query("INSERT INTO carts (id, user_id) VALUES ($1, $2)")
                .bind(Uuid::now_v7())
                .bind(created.id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[async_trait]
impl CategoryRepository for PgStore {
    async fn list_categories(&self) -> StoreResult<Vec<CategoryWithCount>> {
        Ok(sqlx::query_as(
            "SELECT c.id, c.name, c.slug, c.created_at, \
                    COUNT(p.id) FILTER (WHERE p.published) AS product_count \
             FROM categories c LEFT JOIN products p ON p.category_id = c.id \
             GROUP BY c.id ORDER BY c.name"
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(sqlx::query_as("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_category(&self, name: &str, slug: &str) -> StoreResult<Category> {
        sqlx::query_as("INSERT INTO categories (id, name, slug) VALUES ($1, $2, $3) RETURNING *")
            .bind(Uuid::now_v7())
            .bind(name)
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_as_conflict(e, "category"))
    }
}

#[async_trait]
impl ProductRepository for PgStore {
    async fn list_products(&self, query: &ProductQuery) -> StoreResult<ProductPage> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM products p JOIN categories c ON c.id = p.category_id"
        );
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        push_filters(&mut select, query);
        select.push(order_clause(query));
        select
            .push(" LIMIT ")
            .push_bind(query.pagination.limit)
            .push(" OFFSET ")
            .push_bind(query.pagination.offset());
        let rows: Vec<ProductSummaryRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok(ProductPage {
            products: rows.into_iter().map(ProductSummary::from).collect(),
            total
        })
    }

    async fn list_seller_products(&self, seller_id: Uuid) -> StoreResult<Vec<ProductSummary>> {
        let rows: Vec<ProductSummaryRow> = sqlx::query_as(&format!(
            "{SUMMARY_SELECT} WHERE p.seller_id = $1 ORDER BY p.created_at DESC, p.id DESC"
        ))
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ProductSummary::from).collect())
    }

    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(sqlx::query_as("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn product_detail(&self, id: Uuid) -> StoreResult<Option<ProductDetail>> {
        let row: Option<ProductSummaryRow> =
            sqlx::query_as(&format!("{SUMMARY_SELECT} WHERE p.id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let reviews = self.list_reviews(id).await?;
        Ok(Some(ProductDetail {
            summary: row.into(),
            reviews
        }))
    }

    async fn create_product(&self, product: NewProduct) -> StoreResult<Product> {
        Ok(sqlx::query_as(
            "INSERT INTO products \
                 (id, title, description, price, stock, images, published, seller_id, category_id) \
             VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, $8) RETURNING *"
        )
        .bind(Uuid::now_v7())
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.images)
        .bind(product.seller_id)
        .bind(product.category_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> StoreResult<Option<Product>> {
        Ok(sqlx::query_as(
            "UPDATE products SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 price = COALESCE($4, price), \
                 category_id = COALESCE($5, category_id), \
                 images = COALESCE($6, images), \
                 stock = COALESCE($7, stock), \
                 published = COALESCE($8, published), \
                 updated_at = now() \
             WHERE id = $1 RETURNING *"
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.price)
        .bind(patch.category_id)
        .bind(patch.images)
        .bind(patch.stock)
        .bind(patch.published)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ReviewRepository for PgStore {
    async fn create_review(&self, review: NewReview) -> StoreResult<ReviewWithUser> {
        let row: ReviewRow = sqlx::query_as(
            "WITH inserted AS ( \
                 INSERT INTO reviews (id, product_id, user_id, rating, text) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING *) \
             SELECT i.*, u.name AS user_name FROM inserted i JOIN users u ON u.id = i.user_id"
        )
        .bind(Uuid::now_v7())
        .bind(review.product_id)
        .bind(review.user_id)
        .bind(review.rating)
        .bind(&review.text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_as_conflict(e, "review"))?;
        Ok(row.into())
    }

    async fn list_reviews(&self, product_id: Uuid) -> StoreResult<Vec<ReviewWithUser>> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            "SELECT r.*, u.name AS user_name FROM reviews r JOIN users u ON u.id = r.user_id \
             WHERE r.product_id = $1 ORDER BY r.created_at DESC, r.id DESC"
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ReviewWithUser::from).collect())
    }
}

#[async_trait]
impl CartRepository for PgStore {
    async fn find_cart(&self, user_id: Uuid) -> StoreResult<Option<Cart>> {
        Ok(sqlx::query_as("SELECT * FROM carts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn cart_lines(&self, cart_id: Uuid) -> StoreResult<Vec<CartLine>> {
        let rows: Vec<CartLineRow> = sqlx::query_as(&format!(
            "SELECT {CART_LINE_COLUMNS} FROM cart_items ci \
             JOIN products p ON p.id = ci.product_id \
             WHERE ci.cart_id = $1 ORDER BY ci.id"
        ))
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    async fn add_cart_item(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32
    ) -> StoreResult<CartLine> {
        let row: CartLineRow = sqlx::query_as(&format!(
            "WITH ci AS ( \
                 INSERT INTO cart_items (id, cart_id, product_id, quantity) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (cart_id, product_id) \
                 DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity \
                 RETURNING *) \
             SELECT {CART_LINE_COLUMNS} FROM ci JOIN products p ON p.id = ci.product_id"
        ))
        .bind(Uuid::now_v7())
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) => {
                StoreError::QuantityOverflow
            }
            _ => unique_as_conflict(e, "cart item")
        })?;
        Ok(row.into())
    }

    async fn find_cart_item(&self, item_id: Uuid) -> StoreResult<Option<OwnedCartItem>> {
        Ok(sqlx::query_as(
            "SELECT ci.*, c.user_id AS owner_id FROM cart_items ci \
             JOIN carts c ON c.id = ci.cart_id WHERE ci.id = $1"
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn set_cart_item_quantity(
        &self,
        item_id: Uuid,
        quantity: i32
    ) -> StoreResult<Option<CartLine>> {
        let row: Option<CartLineRow> = sqlx::query_as(&format!(
            "WITH ci AS (UPDATE cart_items SET quantity = $2 WHERE id = $1 RETURNING *) \
             SELECT {CART_LINE_COLUMNS} FROM ci JOIN products p ON p.id = ci.product_id"
        ))
        .bind(item_id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(CartLine::from))
    }

    async fn remove_cart_item(&self, item_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn place_order(&self, checkout: Checkout) -> StoreResult<OrderWithItems> {
        let mut tx = self.pool.begin().await?;

        let cart: Cart = sqlx::query_as("SELECT * FROM carts WHERE user_id = $1 FOR UPDATE")
            .bind(checkout.user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound)?;

        let lines: Vec<CheckoutLine> = sqlx::query_as(
            "SELECT ci.quantity, p.id AS product_id, p.title, p.price, p.stock, p.seller_id \
             FROM cart_items ci JOIN products p ON p.id = ci.product_id \
             WHERE ci.cart_id = $1 ORDER BY ci.id FOR UPDATE OF p"
        )
        .bind(cart.id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(StoreError::EmptyCart);
        }
        if let Some(short) = lines.iter().find(|line| line.stock < line.quantity) {
            return Err(StoreError::InsufficientStock {
                product_id: short.product_id,
                title:      short.title.clone()
            });
        }
        let total: Decimal = lines
            .iter()
            .map(|line| line.price * Decimal::from(line.quantity))
            .sum();

        let order: Order = sqlx::query_as(
            "INSERT INTO orders (id, user_id, status, total, shipping_address, billing_address) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *"
        )
        .bind(Uuid::now_v7())
        .bind(checkout.user_id)
        .bind(OrderStatus::Pending)
        .bind(total)
        .bind(&checkout.shipping_address)
        .bind(&checkout.billing_address)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let item: OrderItem = sqlx::query_as(
                "INSERT INTO order_items \
                     (id, order_id, product_id, seller_id, title, quantity, price) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *"
            )
            .bind(Uuid::now_v7())
            .bind(order.id)
            .bind(line.product_id)
            .bind(line.seller_id)
            .bind(&line.title)
            .bind(line.quantity)
            .bind(line.price)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);

            sqlx::query("UPDATE products SET stock = stock - $2, updated_at = now() WHERE id = $1")
                .bind(line.product_id)
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(order_id = %order.id, %total, "order placed");
        Ok(OrderWithItems {
            order,
            items
        })
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<OrderWithItems>> {
        let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.order_with_items(order).await
    }

    async fn list_orders(&self, user_id: Uuid) -> StoreResult<Vec<OrderWithItems>> {
        let orders: Vec<Order> = sqlx::query_as(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.attach_items(orders, None).await
    }

    async fn list_seller_orders(&self, seller_id: Uuid) -> StoreResult<Vec<OrderWithItems>> {
        let orders: Vec<Order> = sqlx::query_as(
            "SELECT o.* FROM orders o \
             WHERE EXISTS (SELECT 1 FROM order_items oi \
                           WHERE oi.order_id = o.id AND oi.seller_id = $1) \
             ORDER BY o.created_at DESC, o.id DESC"
        )
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;
        self.attach_items(orders, Some(seller_id)).await
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus
    ) -> StoreResult<Option<OrderWithItems>> {
        let order: Option<Order> = sqlx::query_as(
            "UPDATE orders SET status = $2, updated_at = now() WHERE id = $1 RETURNING *"
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        self.order_with_items(order).await
    }
}

#[async_trait]
impl SellerProfileRepository for PgStore {
    async fn find_seller_profile(&self, user_id: Uuid) -> StoreResult<Option<SellerProfileView>> {
        let row: Option<SellerProfileViewRow> = sqlx::query_as(&format!(
            "SELECT sp.*, COALESCE(stats.rating, 0)::float8 AS rating, \
                    COALESCE(stats.review_count, 0)::int8 AS review_count, \
                    u.name AS owner_name, u.email AS owner_email \
             FROM seller_profiles sp JOIN users u ON u.id = sp.user_id \
             {SELLER_RATING_JOIN} \
             WHERE sp.user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SellerProfileView::from))
    }

    async fn upsert_seller_profile(
        &self,
        user_id: Uuid,
        patch: SellerProfilePatch
    ) -> StoreResult<SellerProfile> {
        let mut profile: SellerProfile = sqlx::query_as(&format!(
            "WITH sp AS ( \
                 INSERT INTO seller_profiles (user_id, shop_name, bio, image) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (user_id) DO UPDATE SET \
                     shop_name = COALESCE(EXCLUDED.shop_name, seller_profiles.shop_name), \
                     bio = COALESCE(EXCLUDED.bio, seller_profiles.bio), \
                     image = COALESCE(EXCLUDED.image, seller_profiles.image), \
                     updated_at = now() \
                 RETURNING *) \
             SELECT sp.*, COALESCE(stats.rating, 0)::float8 AS rating, \
                    COALESCE(stats.review_count, 0)::int8 AS review_count \
             FROM sp {SELLER_RATING_JOIN}"
        ))
        .bind(user_id)
        .bind(patch.shop_name)
        .bind(patch.bio)
        .bind(patch.image)
        .fetch_one(&self.pool)
        .await?;
        profile.rating = round_rating(profile.rating);
        Ok(profile)
    }

    async fn seller_stats(&self, seller_id: Uuid) -> StoreResult<SellerStats> {
        let (total_products, active_products): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE published) FROM products WHERE seller_id = $1"
        )
        .bind(seller_id)
        .fetch_one(&self.pool)
        .await?;

        let (total_orders, total_earnings): (i64, Decimal) = sqlx::query_as(
            "SELECT COUNT(DISTINCT oi.order_id), \
                    COALESCE(SUM(oi.price * oi.quantity) FILTER (WHERE o.status <> 'CANCELLED'), 0) \
             FROM order_items oi JOIN orders o ON o.id = oi.order_id \
             WHERE oi.seller_id = $1"
        )
        .bind(seller_id)
        .fetch_one(&self.pool)
        .await?;

        let (average,): (Option<f64>,) = sqlx::query_as(
            "SELECT AVG(r.rating)::float8 FROM reviews r \
             JOIN products p ON p.id = r.product_id WHERE p.seller_id = $1"
        )
        .bind(seller_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(SellerStats {
            total_products,
            active_products,
            total_orders,
            total_earnings,
            average_rating: average.map(round_rating).unwrap_or(0.0)
        })
    }
}

#[cfg(test)]
mod tests {
    use haven_core::Pagination;

    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("mug"), "%mug%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn order_clause_follows_sort() {
        let mut query = ProductQuery {
            pagination: Pagination::default(),
            ..Default::default()
        };
        assert_eq!(
            order_clause(&query),
            " ORDER BY p.created_at DESC, p.id DESC"
        );
        query.sort = ProductSort::PriceLow;
        assert_eq!(
            order_clause(&query),
            " ORDER BY p.price ASC, p.created_at DESC"
        );
        query.sort = ProductSort::Rating;
        assert_eq!(
            order_clause(&query),
            " ORDER BY review_count DESC, p.created_at DESC"
        );
    }

    #[test]
    fn filters_bind_only_supplied_values() {
        let query = ProductQuery {
            category: Some("ceramics".into()),
            search: Some("mug".into()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM products p");
        push_filters(&mut qb, &query);
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM products p WHERE p.published = TRUE AND c.slug = $1 \
             AND (p.title ILIKE $2 OR p.description ILIKE $3)"
        );
    }
}

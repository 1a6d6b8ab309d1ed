// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! In-memory backend.
//!
//! All tables sit behind one [`RwLock`]; every write operation holds the
//! write guard for its whole duration, which makes multi-row writes atomic.
//! Ids are UUIDv7, so `BTreeMap` iteration follows insertion order.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use haven_core::{
    OrderStatus,
    catalog::{ProductSort, average_rating}
};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
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

#[derive(Debug, Clone)]
struct StoredProfile {
    shop_name:  Option<String>,
    bio:        Option<String>,
    image:      Option<String>,
    verified:   bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>
}

#[derive(Debug, Default)]
struct Tables {
    users:       HashMap<Uuid, User>,
    categories:  HashMap<Uuid, Category>,
    products:    BTreeMap<Uuid, Product>,
    reviews:     BTreeMap<Uuid, Review>,
    carts:       HashMap<Uuid, Cart>,
    cart_items:  BTreeMap<Uuid, CartItem>,
    orders:      BTreeMap<Uuid, Order>,
    order_items: BTreeMap<Uuid, OrderItem>,
    profiles:    HashMap<Uuid, StoredProfile>
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, Uuid)) {
    items.sort_by_key(|item| std::cmp::Reverse(key(item)));
}

impl Tables {
    fn product_ratings(&self, product_id: Uuid) -> Vec<i32> {
        self.reviews
            .values()
            .filter(|r| r.product_id == product_id)
            .map(|r| r.rating)
            .collect()
    }

    fn seller_ratings(&self, seller_id: Uuid) -> Vec<i32> {
        self.reviews
            .values()
            .filter(|r| {
                self.products
                    .get(&r.product_id)
                    .is_some_and(|p| p.seller_id == seller_id)
            })
            .map(|r| r.rating)
            .collect()
    }

    fn summary(&self, product: &Product) -> Option<ProductSummary> {
        let category = self.categories.get(&product.category_id)?.clone();
        let seller = self.users.get(&product.seller_id)?;
        let profile = self.profiles.get(&product.seller_id);
        let ratings = self.product_ratings(product.id);
        Some(ProductSummary {
            seller: SellerSummary {
                id:        seller.id,
                name:      seller.name.clone(),
                shop_name: profile.and_then(|p| p.shop_name.clone()),
                verified:  profile.is_some_and(|p| p.verified)
            },
            category,
            review_count: ratings.len() as i64,
            average_rating: average_rating(ratings),
            product: product.clone()
        })
    }

    fn review_with_user(&self, review: &Review) -> ReviewWithUser {
        let name = self
            .users
            .get(&review.user_id)
            .map(|u| u.name.clone())
            .unwrap_or_default();
        ReviewWithUser {
            review: review.clone(),
            user:   Reviewer {
                id: review.user_id,
                name
            }
        }
    }

    fn reviews_of(&self, product_id: Uuid) -> Vec<ReviewWithUser> {
        let mut reviews: Vec<&Review> = self
            .reviews
            .values()
            .filter(|r| r.product_id == product_id)
            .collect();
        newest_first(&mut reviews, |r| (r.created_at, r.id));
        reviews.into_iter().map(|r| self.review_with_user(r)).collect()
    }

    fn cart_line(&self, item: &CartItem) -> Option<CartLine> {
        let product = self.products.get(&item.product_id)?.clone();
        Some(CartLine {
            item: item.clone(),
            product
        })
    }

    fn seller_profile(&self, user_id: Uuid) -> Option<SellerProfile> {
        let stored = self.profiles.get(&user_id)?;
        let ratings = self.seller_ratings(user_id);
        Some(SellerProfile {
            user_id,
            shop_name: stored.shop_name.clone(),
            bio: stored.bio.clone(),
            image: stored.image.clone(),
            verified: stored.verified,
            review_count: ratings.len() as i64,
            rating: average_rating(ratings),
            created_at: stored.created_at,
            updated_at: stored.updated_at
        })
    }

    fn with_items(&self, order: &Order, seller_id: Option<Uuid>) -> OrderWithItems {
        let items = self
            .order_items
            .values()
            .filter(|i| i.order_id == order.id)
            .filter(|i| seller_id.is_none_or(|s| i.seller_id == s))
            .cloned()
            .collect();
        OrderWithItems {
            order: order.clone(),
            items
        }
    }
}

/// Store keeping every table in process memory.
///
/// ```rust
/// use std::sync::Arc;
///
/// use haven::store::{MemoryStore, Store};
///
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("email".into()));
        }
        let now = Utc::now();
        let created = User {
            id:         Uuid::now_v7(),
            email:      user.email,
            password:   user.password,
            name:       user.name,
            role:       user.role,
            created_at: now
        };
        if created.role.has_cart() {
            let cart = Cart {
                id:         Uuid::now_v7(),
                user_id:    created.id,
                created_at: now
            };
            t.carts.insert(cart.id, cart);
        }
        t.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn list_categories(&self) -> StoreResult<Vec<CategoryWithCount>> {
        let t = self.tables.read().await;
        let mut categories: Vec<CategoryWithCount> = t
            .categories
            .values()
            .map(|c| CategoryWithCount {
                product_count: t
                    .products
                    .values()
                    .filter(|p| p.published && p.category_id == c.id)
                    .count() as i64,
                category:      c.clone()
            })
            .collect();
        categories.sort_by(|a, b| a.category.name.cmp(&b.category.name));
        Ok(categories)
    }

    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn create_category(&self, name: &str, slug: &str) -> StoreResult<Category> {
        let mut t = self.tables.write().await;
        if t.categories.values().any(|c| c.slug == slug) {
            return Err(StoreError::Conflict("category".into()));
        }
        let category = Category {
            id:         Uuid::now_v7(),
            name:       name.to_string(),
            slug:       slug.to_string(),
            created_at: Utc::now()
        };
        t.categories.insert(category.id, category.clone());
        Ok(category)
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn list_products(&self, query: &ProductQuery) -> StoreResult<ProductPage> {
        let t = self.tables.read().await;
        let mut matching: Vec<ProductSummary> = t
            .products
            .values()
            .filter(|p| {
                t.categories
                    .get(&p.category_id)
                    .is_some_and(|c| query.matches(p, &c.slug))
            })
            .filter_map(|p| t.summary(p))
            .collect();

        let newest = |s: &ProductSummary| std::cmp::Reverse((s.product.created_at, s.product.id));
        match query.sort {
            ProductSort::Newest => matching.sort_by_key(newest),
            ProductSort::PriceLow => {
                matching.sort_by_key(|s| (s.product.price, newest(s)));
            }
            ProductSort::PriceHigh => {
                matching.sort_by_key(|s| (std::cmp::Reverse(s.product.price), newest(s)));
            }
            ProductSort::Rating => {
                matching.sort_by_key(|s| (std::cmp::Reverse(s.review_count), newest(s)));
            }
        }

        let total = matching.len() as i64;
        let offset = usize::try_from(query.pagination.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.pagination.limit).unwrap_or(0);
        Ok(ProductPage {
            products: matching.into_iter().skip(offset).take(limit).collect(),
            total
        })
    }

    async fn list_seller_products(&self, seller_id: Uuid) -> StoreResult<Vec<ProductSummary>> {
        let t = self.tables.read().await;
        let mut products: Vec<ProductSummary> = t
            .products
            .values()
            .filter(|p| p.seller_id == seller_id)
            .filter_map(|p| t.summary(p))
            .collect();
        newest_first(&mut products, |s| (s.product.created_at, s.product.id));
        Ok(products)
    }

    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn product_detail(&self, id: Uuid) -> StoreResult<Option<ProductDetail>> {
        let t = self.tables.read().await;
        let Some(summary) = t.products.get(&id).and_then(|p| t.summary(p)) else {
            return Ok(None);
        };
        Ok(Some(ProductDetail {
            summary,
            reviews: t.reviews_of(id)
        }))
    }

    async fn create_product(&self, product: NewProduct) -> StoreResult<Product> {
        let mut t = self.tables.write().await;
        let now = Utc::now();
        let created = Product {
            id:          Uuid::now_v7(),
            title:       product.title,
            description: product.description,
            price:       product.price,
            stock:       product.stock,
            images:      product.images,
            published:   false,
            seller_id:   product.seller_id,
            category_id: product.category_id,
            created_at:  now,
            updated_at:  now
        };
        t.products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> StoreResult<Option<Product>> {
        let mut t = self.tables.write().await;
        let Some(product) = t.products.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(product);
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        if t.products.remove(&id).is_none() {
            return Ok(false);
        }
        t.reviews.retain(|_, r| r.product_id != id);
        t.cart_items.retain(|_, i| i.product_id != id);
        for item in t.order_items.values_mut() {
            if item.product_id == Some(id) {
                item.product_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn create_review(&self, review: NewReview) -> StoreResult<ReviewWithUser> {
        let mut t = self.tables.write().await;
        if !t.products.contains_key(&review.product_id) {
            return Err(StoreError::NotFound);
        }
        if t
            .reviews
            .values()
            .any(|r| r.product_id == review.product_id && r.user_id == review.user_id)
        {
            return Err(StoreError::Conflict("review".into()));
        }
        let created = Review {
            id:         Uuid::now_v7(),
            product_id: review.product_id,
            user_id:    review.user_id,
            rating:     review.rating,
            text:       review.text,
            created_at: Utc::now()
        };
        t.reviews.insert(created.id, created.clone());
        Ok(t.review_with_user(&created))
    }

    async fn list_reviews(&self, product_id: Uuid) -> StoreResult<Vec<ReviewWithUser>> {
        Ok(self.tables.read().await.reviews_of(product_id))
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn find_cart(&self, user_id: Uuid) -> StoreResult<Option<Cart>> {
        let t = self.tables.read().await;
        Ok(t.carts.values().find(|c| c.user_id == user_id).cloned())
    }

    async fn cart_lines(&self, cart_id: Uuid) -> StoreResult<Vec<CartLine>> {
        let t = self.tables.read().await;
        Ok(t.cart_items
            .values()
            .filter(|i| i.cart_id == cart_id)
            .filter_map(|i| t.cart_line(i))
            .collect())
    }

    async fn add_cart_item(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32
    ) -> StoreResult<CartLine> {
        let mut t = self.tables.write().await;
        if !t.products.contains_key(&product_id) || !t.carts.contains_key(&cart_id) {
            return Err(StoreError::NotFound);
        }
        let existing = t
            .cart_items
            .values_mut()
            .find(|i| i.cart_id == cart_id && i.product_id == product_id);
        let item = match existing {
            Some(item) => {
                item.quantity = item
                    .quantity
                    .checked_add(quantity)
                    .ok_or(StoreError::QuantityOverflow)?;
                item.clone()
            }
            None => {
                let item = CartItem {
                    id: Uuid::now_v7(),
                    cart_id,
                    product_id,
                    quantity
                };
                t.cart_items.insert(item.id, item.clone());
                item
            }
        };
        t.cart_line(&item).ok_or(StoreError::NotFound)
    }

    async fn find_cart_item(&self, item_id: Uuid) -> StoreResult<Option<OwnedCartItem>> {
        let t = self.tables.read().await;
        Ok(t.cart_items.get(&item_id).and_then(|item| {
            t.carts.get(&item.cart_id).map(|cart| OwnedCartItem {
                item:     item.clone(),
                owner_id: cart.user_id
            })
        }))
    }

    async fn set_cart_item_quantity(
        &self,
        item_id: Uuid,
        quantity: i32
    ) -> StoreResult<Option<CartLine>> {
        let mut t = self.tables.write().await;
        let Some(item) = t.cart_items.get_mut(&item_id) else {
            return Ok(None);
        };
        item.quantity = quantity;
        let item = item.clone();
        Ok(t.cart_line(&item))
    }

    async fn remove_cart_item(&self, item_id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.write().await.cart_items.remove(&item_id).is_some())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn place_order(&self, checkout: Checkout) -> StoreResult<OrderWithItems> {
        let mut t = self.tables.write().await;
        let cart_id = t
            .carts
            .values()
            .find(|c| c.user_id == checkout.user_id)
            .map(|c| c.id)
            .ok_or(StoreError::NotFound)?;

        let lines: Vec<CartLine> = t
            .cart_items
            .values()
            .filter(|i| i.cart_id == cart_id)
            .filter_map(|i| t.cart_line(i))
            .collect();
        if lines.is_empty() {
            return Err(StoreError::EmptyCart);
        }
        if let Some(short) = lines.iter().find(|l| l.product.stock < l.item.quantity) {
            return Err(StoreError::InsufficientStock {
                product_id: short.product.id,
                title:      short.product.title.clone()
            });
        }

        let now = Utc::now();
        let order = Order {
            id:               Uuid::now_v7(),
            user_id:          checkout.user_id,
            status:           OrderStatus::Pending,
            total:            lines.iter().map(CartLine::line_total).sum(),
            shipping_address: checkout.shipping_address,
            billing_address:  checkout.billing_address,
            created_at:       now,
            updated_at:       now
        };

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = OrderItem {
                id:         Uuid::now_v7(),
                order_id:   order.id,
                product_id: Some(line.product.id),
                seller_id:  line.product.seller_id,
                title:      line.product.title.clone(),
                quantity:   line.item.quantity,
                price:      line.product.price
            };
            if let Some(product) = t.products.get_mut(&line.product.id) {
                product.stock -= line.item.quantity;
                product.updated_at = now;
            }
            t.order_items.insert(item.id, item.clone());
            items.push(item);
        }
        t.cart_items.retain(|_, i| i.cart_id != cart_id);
        t.orders.insert(order.id, order.clone());

        tracing::info!(order_id = %order.id, total = %order.total, "order placed");
        Ok(OrderWithItems {
            order,
            items
        })
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<OrderWithItems>> {
        let t = self.tables.read().await;
        Ok(t.orders.get(&id).map(|o| t.with_items(o, None)))
    }

    async fn list_orders(&self, user_id: Uuid) -> StoreResult<Vec<OrderWithItems>> {
        let t = self.tables.read().await;
        let mut orders: Vec<&Order> = t.orders.values().filter(|o| o.user_id == user_id).collect();
        newest_first(&mut orders, |o| (o.created_at, o.id));
        Ok(orders.into_iter().map(|o| t.with_items(o, None)).collect())
    }

    async fn list_seller_orders(&self, seller_id: Uuid) -> StoreResult<Vec<OrderWithItems>> {
        let t = self.tables.read().await;
        let ids: HashSet<Uuid> = t
            .order_items
            .values()
            .filter(|i| i.seller_id == seller_id)
            .map(|i| i.order_id)
            .collect();
        let mut orders: Vec<&Order> = ids.iter().filter_map(|id| t.orders.get(id)).collect();
        newest_first(&mut orders, |o| (o.created_at, o.id));
        Ok(orders
            .into_iter()
            .map(|o| t.with_items(o, Some(seller_id)))
            .collect())
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus
    ) -> StoreResult<Option<OrderWithItems>> {
        let mut t = self.tables.write().await;
        let Some(order) = t.orders.get_mut(&id) else {
            return Ok(None);
        };
        order.status = status;
        order.updated_at = Utc::now();
        let order = order.clone();
        Ok(Some(t.with_items(&order, None)))
    }
}

#[async_trait]
impl SellerProfileRepository for MemoryStore {
    async fn find_seller_profile(&self, user_id: Uuid) -> StoreResult<Option<SellerProfileView>> {
        let t = self.tables.read().await;
        let (Some(profile), Some(user)) = (t.seller_profile(user_id), t.users.get(&user_id)) else {
            return Ok(None);
        };
        Ok(Some(SellerProfileView {
            profile,
            user: ProfileOwner {
                name:  user.name.clone(),
                email: user.email.clone()
            }
        }))
    }

    async fn upsert_seller_profile(
        &self,
        user_id: Uuid,
        patch: SellerProfilePatch
    ) -> StoreResult<SellerProfile> {
        let mut t = self.tables.write().await;
        let now = Utc::now();
        let stored = t.profiles.entry(user_id).or_insert_with(|| StoredProfile {
            shop_name:  None,
            bio:        None,
            image:      None,
            verified:   false,
            created_at: now,
            updated_at: now
        });
        if let Some(shop_name) = patch.shop_name {
            stored.shop_name = Some(shop_name);
        }
        if let Some(bio) = patch.bio {
            stored.bio = Some(bio);
        }
        if let Some(image) = patch.image {
            stored.image = Some(image);
        }
        stored.updated_at = now;
        t.seller_profile(user_id).ok_or(StoreError::NotFound)
    }

    async fn seller_stats(&self, seller_id: Uuid) -> StoreResult<SellerStats> {
        let t = self.tables.read().await;
        let products: Vec<&Product> = t
            .products
            .values()
            .filter(|p| p.seller_id == seller_id)
            .collect();

        let mut order_ids = HashSet::new();
        let mut total_earnings = Decimal::ZERO;
        for item in t.order_items.values().filter(|i| i.seller_id == seller_id) {
            order_ids.insert(item.order_id);
            let counts = t
                .orders
                .get(&item.order_id)
                .is_some_and(|o| o.status.counts_toward_earnings());
            if counts {
                total_earnings += item.price * Decimal::from(item.quantity);
            }
        }

        Ok(SellerStats {
            total_products: products.len() as i64,
            active_products: products.iter().filter(|p| p.published).count() as i64,
            total_orders: order_ids.len() as i64,
            total_earnings,
            average_rating: average_rating(t.seller_ratings(seller_id))
        })
    }
}

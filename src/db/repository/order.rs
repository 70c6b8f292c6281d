//! Order Repository
//!
//! Order persistence and read-side joins. Stock movement never happens
//! here — placement and cancellation go through
//! [`crate::orders::OrderEngine`], which uses the atomic stock primitive.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Order, OrderStatus, PaymentStatus, Product, UserPublic, Variant};

const ORDER_TABLE: &str = "order";

/// Order line with catalog references resolved
#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct OrderLineDetail {
    pub product: Option<Product>,
    pub variant: Option<Variant>,
    pub quantity: i64,
    pub price: f64,
}

/// Order with product/user joins, as returned by the read endpoints
#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: Option<RecordId>,
    pub user: UserPublic,
    pub products: Vec<OrderLineDetail>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: Option<DateTime<Utc>>,
}

/// Filter parameters for the admin order listing
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub user: Option<RecordId>,
    pub category: Option<RecordId>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, order: Order) -> RepoResult<Order> {
        let created: Option<Order> = self.base.db().create(ORDER_TABLE).content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    /// Find an order by id (soft-deleted orders are invisible)
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let rid = parse_record_id(ORDER_TABLE, id)?;
        let order: Option<Order> = self.base.db().select(rid).await?;
        Ok(order.filter(|o| !o.is_deleted))
    }

    /// Full order detail with products, variants and user fetched
    pub async fn get_detail(&self, id: &str) -> RepoResult<OrderDetail> {
        let rid = parse_record_id(ORDER_TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM order WHERE id = $id AND is_deleted = false \
                 FETCH products.product, products.variant, user",
            )
            .bind(("id", rid))
            .await?;
        let details: Vec<OrderDetail> = result.take(0)?;
        details
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))
    }

    /// All orders of one user, newest first, with joins
    pub async fn find_by_user(&self, user: &RecordId) -> RepoResult<Vec<OrderDetail>> {
        let orders: Vec<OrderDetail> = self
            .base
            .db()
            .query(
                "SELECT * FROM order WHERE user = $user AND is_deleted = false \
                 ORDER BY created_at DESC \
                 FETCH products.product, products.variant, user",
            )
            .bind(("user", user.clone()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Filtered admin listing. The category filter joins through the
    /// products' record links.
    pub async fn filter(&self, filter: OrderFilter) -> RepoResult<Vec<OrderDetail>> {
        let mut conditions: Vec<&str> = vec!["is_deleted = false"];

        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        if filter.user.is_some() {
            conditions.push("user = $user");
        }
        if filter.category.is_some() {
            conditions.push("products.product.category CONTAINS $category");
        }
        if filter.start_date.is_some() {
            conditions.push("created_at >= $start_date");
        }
        if filter.end_date.is_some() {
            conditions.push("created_at <= $end_date");
        }

        let query_str = format!(
            "SELECT * FROM order WHERE {} ORDER BY created_at DESC \
             FETCH products.product, products.variant, user",
            conditions.join(" AND ")
        );

        let mut query = self.base.db().query(query_str);
        if let Some(v) = filter.status {
            query = query.bind(("status", v));
        }
        if let Some(v) = filter.user {
            query = query.bind(("user", v));
        }
        if let Some(v) = filter.category {
            query = query.bind(("category", v));
        }
        if let Some(v) = filter.start_date {
            query = query.bind(("start_date", v));
        }
        if let Some(v) = filter.end_date {
            query = query.bind(("end_date", v));
        }

        let orders: Vec<OrderDetail> = query.await?.take(0)?;
        Ok(orders)
    }

    /// Atomically transition the order status: the write applies only while
    /// the stored status still equals `expected`, so of two concurrent
    /// writers exactly one wins. Returns `None` for the loser.
    pub async fn set_status_if(
        &self,
        id: &RecordId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> RepoResult<Option<Order>> {
        loop {
            let attempt = async {
                let mut result = self
                    .base
                    .db()
                    .query("UPDATE $id SET status = $next WHERE status = $expected RETURN AFTER")
                    .bind(("id", id.clone()))
                    .bind(("next", next))
                    .bind(("expected", expected))
                    .await?;
                let orders: Vec<Order> = result.take(0)?;
                Ok::<_, surrealdb::Error>(orders.into_iter().next())
            }
            .await;
            match attempt {
                Ok(order) => return Ok(order),
                Err(e) if super::is_retryable_conflict(&e) => tokio::task::yield_now().await,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Same conditional transition for the payment machine
    pub async fn set_payment_status_if(
        &self,
        id: &RecordId,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> RepoResult<Option<Order>> {
        loop {
            let attempt = async {
                let mut result = self
                    .base
                    .db()
                    .query(
                        "UPDATE $id SET payment_status = $next \
                         WHERE payment_status = $expected RETURN AFTER",
                    )
                    .bind(("id", id.clone()))
                    .bind(("next", next))
                    .bind(("expected", expected))
                    .await?;
                let orders: Vec<Order> = result.take(0)?;
                Ok::<_, surrealdb::Error>(orders.into_iter().next())
            }
            .await;
            match attempt {
                Ok(order) => return Ok(order),
                Err(e) if super::is_retryable_conflict(&e) => tokio::task::yield_now().await,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Soft-delete an order (orders are never hard-deleted)
    pub async fn soft_delete(&self, id: &str) -> RepoResult<()> {
        let rid = parse_record_id(ORDER_TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $id SET is_deleted = true, deleted_at = $now WHERE is_deleted = false RETURN AFTER")
            .bind(("id", rid))
            .bind(("now", Utc::now()))
            .await?;
        let updated: Vec<Order> = result.take(0)?;
        if updated.is_empty() {
            return Err(RepoError::NotFound(format!("Order {id} not found")));
        }
        Ok(())
    }
}

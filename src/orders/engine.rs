//! Order placement, cancellation and status transitions.
//!
//! Stock is the shared resource here. Placement never does read-then-write:
//! each line goes through one conditional decrement
//! (`decrement_stock_if_available`), and a line failing at write time rolls
//! back every decrement already applied, so a multi-line order is
//! all-or-nothing and concurrent placements cannot oversell. Cancellation is
//! the compensating transaction: it restores exactly the recorded
//! quantities, never re-deriving them from current catalog state.

use chrono::Utc;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use crate::db::models::{Order, OrderLine, OrderStatus, PaymentStatus};
use crate::db::repository::order::OrderDetail;
use crate::db::repository::product::{decrement_stock_if_available, restore_stock};
use crate::db::repository::{
    CartRepository, CouponRepository, OrderRepository, ProductRepository, VariantRepository,
};
use crate::pricing;
use crate::utils::{AppError, AppResult};

/// One requested line of a new order
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PlaceOrderItem {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: i64,
}

/// Which state machine a status update targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Order,
    Payment,
}

impl std::str::FromStr for StatusKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order" => Ok(Self::Order),
            "payment" => Ok(Self::Payment),
            other => Err(AppError::validation(format!(
                "Invalid status type '{other}': expected 'order' or 'payment'"
            ))),
        }
    }
}

/// A requested line resolved against the current catalog
struct ResolvedLine {
    product: RecordId,
    variant: Option<RecordId>,
    name: String,
    quantity: i64,
    /// Effective price at read time (offer price if present)
    price: f64,
}

impl ResolvedLine {
    /// The record whose `stock` field this line moves
    fn stock_target(&self) -> &RecordId {
        self.variant.as_ref().unwrap_or(&self.product)
    }
}

#[derive(Clone)]
pub struct OrderEngine {
    orders: OrderRepository,
    products: ProductRepository,
    variants: VariantRepository,
    carts: CartRepository,
    coupons: CouponRepository,
    db: Surreal<Db>,
}

impl OrderEngine {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            orders: OrderRepository::new(db.clone()),
            products: ProductRepository::new(db.clone()),
            variants: VariantRepository::new(db.clone()),
            carts: CartRepository::new(db.clone()),
            coupons: CouponRepository::new(db.clone()),
            db,
        }
    }

    // =========================================================================
    // PlaceOrder
    // =========================================================================

    /// Place an order from an explicit item list, or from the user's cart
    /// when `items` is `None`. On success the order is persisted with
    /// status=pending/payment=pending and, when placed from the cart, the
    /// cart is cleared.
    pub async fn place_order(
        &self,
        user: &RecordId,
        items: Option<Vec<PlaceOrderItem>>,
    ) -> AppResult<Order> {
        let (requested, source_cart) = match items {
            Some(items) if !items.is_empty() => (items, None),
            Some(_) => return Err(AppError::validation("Order must contain at least one item")),
            None => {
                let cart = self
                    .carts
                    .find_by_user(user)
                    .await?
                    .ok_or_else(|| AppError::not_found("Cart not found"))?;
                if cart.items.is_empty() {
                    return Err(AppError::validation("Cart is empty"));
                }
                let items = cart
                    .items
                    .iter()
                    .map(|i| PlaceOrderItem {
                        product_id: i.product.to_string(),
                        variant_id: i.variant.as_ref().map(|v| v.to_string()),
                        quantity: i.quantity,
                    })
                    .collect();
                (items, Some(cart))
            }
        };

        let lines = self.resolve_lines(requested).await?;

        // Stock phase: one conditional decrement per line, all-or-nothing.
        let mut applied: Vec<&ResolvedLine> = Vec::with_capacity(lines.len());
        for line in &lines {
            let ok = decrement_stock_if_available(&self.db, line.stock_target(), line.quantity)
                .await?;
            if !ok {
                self.compensate(&applied).await;
                return Err(AppError::InsufficientStock(line.name.clone()));
            }
            applied.push(line);
        }

        // Money phase: total at read-time prices, cart coupon on top.
        let mut total_amount = pricing::round_money(
            lines
                .iter()
                .map(|l| l.quantity as f64 * l.price)
                .sum(),
        );
        if let Some(cart) = &source_cart
            && let Some(snapshot) = &cart.coupon_applied
        {
            match self.reprice_with_coupon(total_amount, snapshot).await {
                Ok(final_amount) => total_amount = final_amount,
                Err(e) => {
                    self.compensate(&applied).await;
                    return Err(e);
                }
            }
        }

        let order = Order {
            id: None,
            user: user.clone(),
            products: lines
                .iter()
                .map(|l| OrderLine {
                    product: l.product.clone(),
                    variant: l.variant.clone(),
                    quantity: l.quantity,
                    price: l.price,
                })
                .collect(),
            total_amount,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            is_deleted: false,
            deleted_at: None,
            created_at: Some(Utc::now()),
        };

        let placed = match self.orders.create(order).await {
            Ok(o) => o,
            Err(e) => {
                // Persisting failed after stock moved: give the units back
                self.compensate(&applied).await;
                return Err(e.into());
            }
        };

        if source_cart.is_some() {
            // Reload under the version guard: a save racing a concurrent
            // cart mutation loses and the clear is reapplied on fresh state.
            loop {
                let Some(mut cart) = self.carts.find_by_user(user).await? else {
                    break;
                };
                cart.items.clear();
                cart.total_price = 0.0;
                cart.coupon_applied = None;
                if self.carts.save(cart).await?.is_some() {
                    break;
                }
            }
        }

        tracing::info!(
            order = %placed.id.as_ref().map(ToString::to_string).unwrap_or_default(),
            total = placed.total_amount,
            "order placed"
        );
        Ok(placed)
    }

    // =========================================================================
    // CancelOrder
    // =========================================================================

    /// Cancel a pending order owned by `user`, restoring the decremented
    /// stock from the order's own line items.
    ///
    /// The Pending→Cancelled flip is a conditional update: of two
    /// concurrent cancellations exactly one wins the flip, and only the
    /// winner restores stock, so the units come back exactly once.
    pub async fn cancel_order(&self, order_id: &str, user: &RecordId) -> AppResult<Order> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))?;

        if order.user != *user {
            return Err(AppError::forbidden(
                "You are not authorized to cancel this order",
            ));
        }
        if order.status != OrderStatus::Pending {
            return Err(AppError::BusinessRule(
                "Only pending orders can be cancelled".to_string(),
            ));
        }

        let id = order
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Order without id"))?;
        let cancelled = self
            .orders
            .set_status_if(&id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await?
            .ok_or_else(|| {
                AppError::BusinessRule("Only pending orders can be cancelled".to_string())
            })?;

        for line in &cancelled.products {
            let target = line.variant.as_ref().unwrap_or(&line.product);
            restore_stock(&self.db, target, line.quantity).await?;
        }

        tracing::info!(order = %id, "order cancelled, stock restored");
        Ok(cancelled)
    }

    // =========================================================================
    // UpdateStatus
    // =========================================================================

    /// Update the order or payment status, validating the enum value and the
    /// state-machine transition. The write itself is conditional on the
    /// status the transition was checked against, so a concurrent update
    /// cannot slip an invalid transition through. Returns the order with
    /// joins.
    pub async fn update_status(
        &self,
        order_id: &str,
        status: &str,
        kind: StatusKind,
    ) -> AppResult<OrderDetail> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))?;
        let id = order
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Order without id"))?;

        match kind {
            StatusKind::Order => {
                let next: OrderStatus = status.parse().map_err(AppError::Validation)?;
                if !order.status.can_transition_to(next) {
                    return Err(AppError::BusinessRule(format!(
                        "Invalid order status transition: {:?} -> {:?}",
                        order.status, next
                    )));
                }
                self.orders
                    .set_status_if(&id, order.status, next)
                    .await?
                    .ok_or_else(|| {
                        AppError::BusinessRule(format!(
                            "Invalid order status transition: {:?} -> {:?}",
                            order.status, next
                        ))
                    })?;
            }
            StatusKind::Payment => {
                let next: PaymentStatus = status.parse().map_err(AppError::Validation)?;
                if !order.payment_status.can_transition_to(next) {
                    return Err(AppError::BusinessRule(format!(
                        "Invalid payment status transition: {:?} -> {:?}",
                        order.payment_status, next
                    )));
                }
                self.orders
                    .set_payment_status_if(&id, order.payment_status, next)
                    .await?
                    .ok_or_else(|| {
                        AppError::BusinessRule(format!(
                            "Invalid payment status transition: {:?} -> {:?}",
                            order.payment_status, next
                        ))
                    })?;
            }
        }

        Ok(self.orders.get_detail(order_id).await?)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Resolve requested items against the catalog, merging duplicates on
    /// the composite key so each stock target is decremented exactly once.
    async fn resolve_lines(&self, requested: Vec<PlaceOrderItem>) -> AppResult<Vec<ResolvedLine>> {
        let mut lines: Vec<ResolvedLine> = Vec::with_capacity(requested.len());

        for item in requested {
            if item.quantity < 1 {
                return Err(AppError::validation("quantity must be at least 1"));
            }

            let product = self
                .products
                .find_by_id(&item.product_id)
                .await?
                .ok_or_else(|| {
                    AppError::validation(format!("Invalid product selection: {}", item.product_id))
                })?;
            let product_rid = product
                .id
                .clone()
                .ok_or_else(|| AppError::internal("Product without id"))?;

            let (variant_rid, price) = match &item.variant_id {
                Some(variant_id) => {
                    let variant =
                        self.variants.find_by_id(variant_id).await?.ok_or_else(|| {
                            AppError::validation(format!(
                                "Invalid variant selection: {variant_id}"
                            ))
                        })?;
                    if variant.product != product_rid {
                        return Err(AppError::validation(format!(
                            "Variant {variant_id} does not belong to product {}",
                            item.product_id
                        )));
                    }
                    (variant.id, variant.offer_price.unwrap_or(variant.price))
                }
                None => (None, product.offer_price.unwrap_or(product.price)),
            };

            match lines
                .iter_mut()
                .find(|l| l.product == product_rid && l.variant == variant_rid)
            {
                Some(line) => line.quantity += item.quantity,
                None => lines.push(ResolvedLine {
                    product: product_rid,
                    variant: variant_rid,
                    name: product.name.clone(),
                    quantity: item.quantity,
                    price,
                }),
            }
        }

        Ok(lines)
    }

    /// Undo already-applied decrements after a mid-order failure
    async fn compensate(&self, applied: &[&ResolvedLine]) {
        for line in applied {
            if let Err(e) = restore_stock(&self.db, line.stock_target(), line.quantity).await {
                // Failing to compensate is the one state we cannot repair
                // inline; log loudly for reconciliation.
                tracing::error!(
                    target = %line.stock_target(),
                    quantity = line.quantity,
                    error = %e,
                    "failed to restore stock while rolling back order placement"
                );
            }
        }
    }

    /// Re-apply the cart's coupon against the freshly computed total
    async fn reprice_with_coupon(
        &self,
        total: f64,
        snapshot: &crate::db::models::CouponApplied,
    ) -> AppResult<f64> {
        let coupon = self
            .coupons
            .find_by_id(&snapshot.coupon.to_string())
            .await?
            .ok_or_else(|| {
                AppError::CouponNotApplicable(format!("coupon {} no longer exists", snapshot.code))
            })?;
        let outcome = pricing::apply_coupon(total, &coupon, Utc::now())?;
        Ok(outcome.final_amount)
    }
}

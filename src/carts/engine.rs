//! Cart mutation and read logic.
//!
//! Invariants maintained here:
//! - line items are identified by the composite key `(product, variant|None)`
//! - after every mutation `total_price == Σ quantity × (offer_price ?? price)`
//! - quantities never reach zero or below: decrementing at 1 removes the line
//! - a stored coupon snapshot is re-applied against the new total after every
//!   mutation and dropped when it no longer qualifies
//!
//! Every mutation runs as read → apply → compare-and-swap save: the save is
//! guarded by the cart's `version` stamp, and a lost race reloads the cart
//! and reapplies the mutation, so two rapid calls for the same user cannot
//! drop each other's lines.
//!
//! Prices on a line item are captured at add-time and not refreshed on
//! later reads unless `refresh_price_on_read` is enabled in the config.

use chrono::Utc;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use crate::db::models::{Cart, CartItem, CartItemView, CartView, CouponApplied};
use crate::db::repository::{
    CartRepository, CouponRepository, ProductRepository, VariantRepository, parse_record_id,
};
use crate::pricing;
use crate::utils::{AppError, AppResult};

/// Quantity adjustment on an existing line item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityAction {
    Increment,
    Decrement,
}

impl std::str::FromStr for QuantityAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increment" => Ok(Self::Increment),
            "decrement" => Ok(Self::Decrement),
            other => Err(AppError::validation(format!(
                "Invalid action '{other}': expected 'increment' or 'decrement'"
            ))),
        }
    }
}

/// Catalog target of a cart line: variant takes precedence over the product
struct ResolvedTarget {
    product: RecordId,
    variant: Option<RecordId>,
    price: f64,
    offer_price: Option<f64>,
}

#[derive(Clone)]
pub struct CartEngine {
    carts: CartRepository,
    products: ProductRepository,
    variants: VariantRepository,
    coupons: CouponRepository,
    refresh_price_on_read: bool,
}

impl CartEngine {
    pub fn new(db: Surreal<Db>, refresh_price_on_read: bool) -> Self {
        Self {
            carts: CartRepository::new(db.clone()),
            products: ProductRepository::new(db.clone()),
            variants: VariantRepository::new(db.clone()),
            coupons: CouponRepository::new(db),
            refresh_price_on_read,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a product (or variant) to the user's cart. Merges into an
    /// existing line with the same composite key, otherwise appends a new
    /// line capturing the current catalog prices.
    pub async fn add_item(
        &self,
        user: &RecordId,
        product_id: &str,
        variant_id: Option<&str>,
        quantity: i64,
    ) -> AppResult<Cart> {
        if quantity < 1 {
            return Err(AppError::validation("quantity must be at least 1"));
        }

        let target = self.resolve_target(product_id, variant_id).await?;

        loop {
            let mut cart = self.carts.find_or_create(user).await?;

            match cart
                .items
                .iter_mut()
                .find(|i| i.matches(&target.product, target.variant.as_ref()))
            {
                Some(item) => item.quantity += quantity,
                None => cart.items.push(CartItem {
                    product: target.product.clone(),
                    variant: target.variant.clone(),
                    quantity,
                    price: target.price,
                    offer_price: target.offer_price,
                }),
            }

            if let Some(saved) = self.recalc_and_save(cart).await? {
                return Ok(saved);
            }
        }
    }

    /// Remove the line item matching `(product, variant|None)`
    pub async fn remove_item(
        &self,
        user: &RecordId,
        product_id: &str,
        variant_id: Option<&str>,
    ) -> AppResult<Cart> {
        let product = parse_record_id("product", product_id)?;
        let variant = variant_id
            .map(|v| parse_record_id("variant", v))
            .transpose()?;

        loop {
            let mut cart = self
                .carts
                .find_by_user(user)
                .await?
                .ok_or_else(|| AppError::not_found("Cart not found"))?;

            let before = cart.items.len();
            cart.items
                .retain(|i| !i.matches(&product, variant.as_ref()));
            if cart.items.len() == before {
                return Err(AppError::not_found("Product not found in cart"));
            }

            if let Some(saved) = self.recalc_and_save(cart).await? {
                return Ok(saved);
            }
        }
    }

    /// Adjust a line item's quantity by ±1. Decrementing at quantity 1
    /// removes the line entirely — a cart never holds a zero-quantity item.
    pub async fn update_quantity(
        &self,
        user: &RecordId,
        product_id: &str,
        variant_id: Option<&str>,
        action: QuantityAction,
    ) -> AppResult<Cart> {
        let product = parse_record_id("product", product_id)?;
        let variant = variant_id
            .map(|v| parse_record_id("variant", v))
            .transpose()?;

        loop {
            let mut cart = self
                .carts
                .find_by_user(user)
                .await?
                .ok_or_else(|| AppError::not_found("Cart not found"))?;

            let idx = cart
                .items
                .iter()
                .position(|i| i.matches(&product, variant.as_ref()))
                .ok_or_else(|| AppError::not_found("Item not found in cart"))?;

            match action {
                QuantityAction::Increment => cart.items[idx].quantity += 1,
                QuantityAction::Decrement => {
                    if cart.items[idx].quantity <= 1 {
                        cart.items.remove(idx);
                    } else {
                        cart.items[idx].quantity -= 1;
                    }
                }
            }

            if let Some(saved) = self.recalc_and_save(cart).await? {
                return Ok(saved);
            }
        }
    }

    /// Empty the cart: no items, zero total, no coupon
    pub async fn clear(&self, user: &RecordId) -> AppResult<Cart> {
        loop {
            let mut cart = self
                .carts
                .find_by_user(user)
                .await?
                .ok_or_else(|| AppError::not_found("Cart not found"))?;

            cart.items.clear();
            cart.total_price = 0.0;
            cart.coupon_applied = None;

            if let Some(saved) = self.carts.save(cart).await? {
                return Ok(saved);
            }
        }
    }

    /// Apply a coupon by code, storing the snapshot on the cart
    pub async fn apply_coupon(&self, user: &RecordId, code: &str) -> AppResult<Cart> {
        let coupon = self
            .coupons
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Coupon {code} not found")))?;
        let coupon_id = coupon
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Coupon without id"))?;

        loop {
            let mut cart = self
                .carts
                .find_by_user(user)
                .await?
                .ok_or_else(|| AppError::not_found("Cart not found"))?;

            let outcome = pricing::apply_coupon(cart.total_price, &coupon, Utc::now())?;
            cart.coupon_applied = Some(CouponApplied {
                coupon: coupon_id.clone(),
                code: coupon.code.clone(),
                discount_type: coupon.discount_type,
                original_amount: outcome.original_amount,
                discount_amount: outcome.discount_amount,
                final_amount: outcome.final_amount,
            });

            if let Some(saved) = self.carts.save(cart).await? {
                return Ok(saved);
            }
        }
    }

    /// Remove an applied coupon
    pub async fn remove_coupon(&self, user: &RecordId) -> AppResult<Cart> {
        loop {
            let mut cart = self
                .carts
                .find_by_user(user)
                .await?
                .ok_or_else(|| AppError::not_found("Cart not found"))?;

            cart.coupon_applied = None;
            if let Some(saved) = self.carts.save(cart).await? {
                return Ok(saved);
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Cart with catalog references resolved, plus total_quantity and the
    /// amount actually payable
    pub async fn get_cart(&self, user: &RecordId) -> AppResult<CartView> {
        let cart = if self.refresh_price_on_read {
            self.refresh_prices(user).await?
        } else {
            self.carts
                .find_by_user(user)
                .await?
                .ok_or_else(|| AppError::not_found("Cart not found"))?
        };

        let mut items = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            let product = self.products.find_by_id(&item.product.to_string()).await?;
            let variant = match &item.variant {
                Some(v) => self.variants.find_by_id(&v.to_string()).await?,
                None => None,
            };
            items.push(CartItemView {
                product,
                variant,
                quantity: item.quantity,
                price: item.price,
                offer_price: item.offer_price,
                item_total: pricing::round_money(item.quantity as f64 * item.effective_price()),
            });
        }

        let final_amount = cart
            .coupon_applied
            .as_ref()
            .map(|c| c.final_amount)
            .unwrap_or(cart.total_price);

        Ok(CartView {
            id: cart.id.clone(),
            user: cart.user.clone(),
            items,
            total_price: cart.total_price,
            total_quantity: cart.total_quantity(),
            coupon_applied: cart.coupon_applied.clone(),
            final_amount,
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn resolve_target(
        &self,
        product_id: &str,
        variant_id: Option<&str>,
    ) -> AppResult<ResolvedTarget> {
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product {product_id} not found")))?;
        let product_rid = product
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Product without id"))?;

        if let Some(variant_id) = variant_id {
            let variant = self
                .variants
                .find_by_id(variant_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Variant {variant_id} not found")))?;
            if variant.product != product_rid {
                return Err(AppError::validation(format!(
                    "Variant {variant_id} does not belong to product {product_id}"
                )));
            }
            return Ok(ResolvedTarget {
                product: product_rid,
                variant: variant.id,
                price: variant.price,
                offer_price: variant.offer_price,
            });
        }

        Ok(ResolvedTarget {
            product: product_rid,
            variant: None,
            price: product.price,
            offer_price: product.offer_price,
        })
    }

    /// Recompute the total, re-apply a stored coupon against it, save with
    /// the version guard. `None` means the save lost a race and the caller
    /// must reload and reapply.
    async fn recalc_and_save(&self, mut cart: Cart) -> AppResult<Option<Cart>> {
        cart.total_price = pricing::round_money(
            cart.items
                .iter()
                .map(|i| i.quantity as f64 * i.effective_price())
                .sum(),
        );

        if let Some(applied) = cart.coupon_applied.take() {
            let coupon = self.coupons.find_by_id(&applied.coupon.to_string()).await?;
            cart.coupon_applied = coupon.and_then(|c| {
                pricing::apply_coupon(cart.total_price, &c, Utc::now())
                    .ok()
                    .map(|outcome| CouponApplied {
                        coupon: applied.coupon.clone(),
                        code: c.code,
                        discount_type: c.discount_type,
                        original_amount: outcome.original_amount,
                        discount_amount: outcome.discount_amount,
                        final_amount: outcome.final_amount,
                    })
            });
            if cart.coupon_applied.is_none() {
                tracing::debug!("coupon no longer applicable after cart mutation, dropped");
            }
        }

        Ok(self.carts.save(cart).await?)
    }

    /// Re-capture current catalog prices into the line snapshots
    /// (`refresh_price_on_read = true` only)
    async fn refresh_prices(&self, user: &RecordId) -> AppResult<Cart> {
        loop {
            let mut cart = self
                .carts
                .find_by_user(user)
                .await?
                .ok_or_else(|| AppError::not_found("Cart not found"))?;

            for item in &mut cart.items {
                match &item.variant {
                    Some(v) => {
                        if let Some(variant) = self.variants.find_by_id(&v.to_string()).await? {
                            item.price = variant.price;
                            item.offer_price = variant.offer_price;
                        }
                    }
                    None => {
                        if let Some(product) =
                            self.products.find_by_id(&item.product.to_string()).await?
                        {
                            item.price = product.price;
                            item.offer_price = product.offer_price;
                        }
                    }
                }
            }

            if let Some(saved) = self.recalc_and_save(cart).await? {
                return Ok(saved);
            }
        }
    }
}

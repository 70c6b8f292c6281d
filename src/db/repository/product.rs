//! Product Repository
//!
//! Catalog reads/writes plus the atomic stock primitive shared with the
//! variant table. `offer_price` is captured on every catalog write; the
//! order engine only ever touches `stock` through the conditional
//! decrement/increment below.

use chrono::Utc;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use super::{BaseRepository, RepoError, RepoResult, is_retryable_conflict, parse_record_id};
use crate::db::models::{CategoryOffer, Product, ProductCreate, ProductUpdate};
use crate::pricing;

const PRODUCT_TABLE: &str = "product";

// =============================================================================
// Atomic stock primitive (product and variant records)
// =============================================================================

/// Decrement `stock` by `qty` only if the current stock covers it.
///
/// Single conditional UPDATE, never read-then-write: under concurrent order
/// placement only one caller can win the last unit. Returns `false` when the
/// record is missing or the stock predicate fails. The engine may abort the
/// statement with a retryable write conflict under contention; the update is
/// re-issued until it commits one way or the other.
pub async fn decrement_stock_if_available(
    db: &Surreal<Db>,
    target: &RecordId,
    qty: i64,
) -> RepoResult<bool> {
    loop {
        match try_conditional_decrement(db, target, qty).await {
            Ok(hit) => return Ok(hit),
            Err(e) if is_retryable_conflict(&e) => tokio::task::yield_now().await,
            Err(e) => return Err(e.into()),
        }
    }
}

async fn try_conditional_decrement(
    db: &Surreal<Db>,
    target: &RecordId,
    qty: i64,
) -> Result<bool, surrealdb::Error> {
    let mut result = db
        .query("UPDATE $target SET stock -= $qty WHERE stock >= $qty RETURN VALUE stock")
        .bind(("target", target.clone()))
        .bind(("qty", qty))
        .await?;
    // One remaining-stock value per updated record; empty means the
    // predicate failed or the record is gone.
    let remaining: Vec<i64> = result.take(0)?;
    Ok(!remaining.is_empty())
}

/// Put `qty` units back. Compensation for [`decrement_stock_if_available`];
/// also used by order cancellation. Retries on engine write conflicts like
/// the decrement does.
pub async fn restore_stock(db: &Surreal<Db>, target: &RecordId, qty: i64) -> RepoResult<()> {
    loop {
        match try_restore(db, target, qty).await {
            Ok(()) => return Ok(()),
            Err(e) if is_retryable_conflict(&e) => tokio::task::yield_now().await,
            Err(e) => return Err(e.into()),
        }
    }
}

async fn try_restore(
    db: &Surreal<Db>,
    target: &RecordId,
    qty: i64,
) -> Result<(), surrealdb::Error> {
    db.query("UPDATE $target SET stock += $qty RETURN VALUE stock")
        .bind(("target", target.clone()))
        .bind(("qty", qty))
        .await?
        .check()?;
    Ok(())
}

// =============================================================================
// Product Repository
// =============================================================================

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all products that are not soft-deleted
    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE is_deleted = false ORDER BY name")
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find products by category
    pub async fn find_by_category(&self, category_id: &str) -> RepoResult<Vec<Product>> {
        let cat = parse_record_id("category", category_id)?;
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE category = $cat AND is_deleted = false ORDER BY name")
            .bind(("cat", cat))
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find product by id (soft-deleted products are invisible)
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let rid = parse_record_id(PRODUCT_TABLE, id)?;
        let product: Option<Product> = self.base.db().select(rid).await?;
        Ok(product.filter(|p| !p.is_deleted))
    }

    /// Create a product, capturing `offer_price` from the category offer
    pub async fn create(
        &self,
        data: ProductCreate,
        offer: Option<&CategoryOffer>,
    ) -> RepoResult<Product> {
        let now = Utc::now();
        let captured = pricing::effective_price(data.price, offer, now);
        let product = Product {
            id: None,
            name: data.name,
            code: data.code,
            description: data.description.unwrap_or_default(),
            category: data.category,
            brand: data.brand,
            price: data.price,
            offer_price: (captured < data.price).then_some(captured),
            stock: data.stock.unwrap_or(0),
            has_variants: false,
            is_deleted: false,
            deleted_at: None,
            created_at: Some(now),
        };

        let created: Option<Product> = self.base.db().create(PRODUCT_TABLE).content(product).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Update a product, re-capturing `offer_price` against the (possibly
    /// changed) category offer
    pub async fn update(
        &self,
        id: &str,
        data: ProductUpdate,
        offer: Option<&CategoryOffer>,
    ) -> RepoResult<Product> {
        let rid = parse_record_id(PRODUCT_TABLE, id)?;
        let mut product = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))?;

        if let Some(v) = data.name {
            product.name = v;
        }
        if let Some(v) = data.description {
            product.description = v;
        }
        if let Some(v) = data.category {
            product.category = v;
        }
        if let Some(v) = data.brand {
            product.brand = Some(v);
        }
        if let Some(v) = data.price {
            product.price = v;
        }
        if let Some(v) = data.stock {
            product.stock = v;
        }

        let captured = pricing::effective_price(product.price, offer, Utc::now());
        product.offer_price = (captured < product.price).then_some(captured);

        let updated: Option<Product> = self.base.db().update(rid).content(product).await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
    }

    /// Soft-delete a product
    pub async fn soft_delete(&self, id: &str) -> RepoResult<()> {
        let rid = parse_record_id(PRODUCT_TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $id SET is_deleted = true, deleted_at = $now WHERE is_deleted = false RETURN AFTER")
            .bind(("id", rid))
            .bind(("now", Utc::now()))
            .await?;
        let updated: Vec<Product> = result.take(0)?;
        if updated.is_empty() {
            return Err(RepoError::NotFound(format!("Product {id} not found")));
        }
        Ok(())
    }

    /// Mark whether the product carries variants
    pub async fn set_has_variants(&self, id: &RecordId, has_variants: bool) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $id SET has_variants = $flag")
            .bind(("id", id.clone()))
            .bind(("flag", has_variants))
            .await?;
        Ok(())
    }

    /// Re-capture `offer_price` for every product and variant in a category.
    ///
    /// Called when the category offer is set, cleared, or swept after expiry.
    pub async fn recapture_offer_prices(
        &self,
        category: &RecordId,
        offer: Option<&CategoryOffer>,
    ) -> RepoResult<()> {
        let now = Utc::now();

        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE category = $cat AND is_deleted = false")
            .bind(("cat", category.clone()))
            .await?
            .take(0)?;

        for product in &products {
            let Some(id) = &product.id else { continue };
            let captured = pricing::effective_price(product.price, offer, now);
            let offer_price = (captured < product.price).then_some(captured);
            self.base
                .db()
                .query("UPDATE $id SET offer_price = $offer_price")
                .bind(("id", id.clone()))
                .bind(("offer_price", offer_price))
                .await?;
        }

        // Variants reach their category through the owning product
        let variants: Vec<crate::db::models::Variant> = self
            .base
            .db()
            .query("SELECT * FROM variant WHERE product.category = $cat")
            .bind(("cat", category.clone()))
            .await?
            .take(0)?;

        for variant in &variants {
            let Some(id) = &variant.id else { continue };
            let captured = pricing::effective_price(variant.price, offer, now);
            let offer_price = (captured < variant.price).then_some(captured);
            self.base
                .db()
                .query("UPDATE $id SET offer_price = $offer_price")
                .bind(("id", id.clone()))
                .bind(("offer_price", offer_price))
                .await?;
        }

        Ok(())
    }
}

//! Variant Repository

use chrono::Utc;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{CategoryOffer, Variant, VariantCreate, VariantUpdate};
use crate::pricing;

const VARIANT_TABLE: &str = "variant";

#[derive(Clone)]
pub struct VariantRepository {
    base: BaseRepository,
}

impl VariantRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Variant>> {
        let rid = parse_record_id(VARIANT_TABLE, id)?;
        let variant: Option<Variant> = self.base.db().select(rid).await?;
        Ok(variant)
    }

    /// All variants of a product
    pub async fn find_by_product(&self, product: &RecordId) -> RepoResult<Vec<Variant>> {
        let variants: Vec<Variant> = self
            .base
            .db()
            .query("SELECT * FROM variant WHERE product = $product ORDER BY sku")
            .bind(("product", product.clone()))
            .await?
            .take(0)?;
        Ok(variants)
    }

    /// Create a variant under a product, capturing `offer_price` from the
    /// product's category offer
    pub async fn create(
        &self,
        product: RecordId,
        data: VariantCreate,
        offer: Option<&CategoryOffer>,
    ) -> RepoResult<Variant> {
        if data.stock < 0 {
            return Err(RepoError::Validation("stock cannot be negative".into()));
        }
        let now = Utc::now();
        let captured = pricing::effective_price(data.price, offer, now);
        let variant = Variant {
            id: None,
            product,
            sku: data.sku,
            price: data.price,
            offer_price: (captured < data.price).then_some(captured),
            stock: data.stock,
            attributes: data.attributes.unwrap_or_default(),
            created_at: Some(now),
        };

        let created: Option<Variant> = self.base.db().create(VARIANT_TABLE).content(variant).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create variant".to_string()))
    }

    pub async fn update(
        &self,
        id: &str,
        data: VariantUpdate,
        offer: Option<&CategoryOffer>,
    ) -> RepoResult<Variant> {
        let rid = parse_record_id(VARIANT_TABLE, id)?;
        let mut variant = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Variant {id} not found")))?;

        if let Some(v) = data.price {
            variant.price = v;
        }
        if let Some(v) = data.stock {
            variant.stock = v;
        }
        if let Some(v) = data.attributes {
            variant.attributes = v;
        }

        let captured = pricing::effective_price(variant.price, offer, Utc::now());
        variant.offer_price = (captured < variant.price).then_some(captured);

        let updated: Option<Variant> = self.base.db().update(rid).content(variant).await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Variant {id} not found")))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let rid = parse_record_id(VARIANT_TABLE, id)?;
        let deleted: Option<Variant> = self.base.db().delete(rid).await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!("Variant {id} not found")));
        }
        Ok(())
    }
}

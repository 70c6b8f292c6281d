//! Coupon Repository

use chrono::Utc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Coupon, CouponCreate, CouponUpdate};

const COUPON_TABLE: &str = "coupon";

#[derive(Clone)]
pub struct CouponRepository {
    base: BaseRepository,
}

impl CouponRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Coupon>> {
        let coupons: Vec<Coupon> = self
            .base
            .db()
            .query("SELECT * FROM coupon ORDER BY code")
            .await?
            .take(0)?;
        Ok(coupons)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Coupon>> {
        let rid = parse_record_id(COUPON_TABLE, id)?;
        let coupon: Option<Coupon> = self.base.db().select(rid).await?;
        Ok(coupon)
    }

    /// Exact lookup by code (case-insensitive)
    pub async fn find_by_code(&self, code: &str) -> RepoResult<Option<Coupon>> {
        let coupons: Vec<Coupon> = self
            .base
            .db()
            .query("SELECT * FROM coupon WHERE string::lowercase(code) = string::lowercase($code)")
            .bind(("code", code.to_string()))
            .await?
            .take(0)?;
        Ok(coupons.into_iter().next())
    }

    /// Case-insensitive substring search on the code
    pub async fn search(&self, q: &str) -> RepoResult<Vec<Coupon>> {
        let coupons: Vec<Coupon> = self
            .base
            .db()
            .query("SELECT * FROM coupon WHERE string::contains(string::lowercase(code), string::lowercase($q)) ORDER BY code")
            .bind(("q", q.to_string()))
            .await?
            .take(0)?;
        Ok(coupons)
    }

    pub async fn create(&self, data: CouponCreate) -> RepoResult<Coupon> {
        let coupon = Coupon {
            id: None,
            code: data.code,
            discount_type: data.discount_type,
            discount_amount: data.discount_amount,
            min_purchase: data.min_purchase.unwrap_or(0.0),
            max_discount: data.max_discount,
            expiry_date: data.expiry_date,
            description: data.description.unwrap_or_default(),
            created_at: Some(Utc::now()),
        };
        let created: Option<Coupon> = self.base.db().create(COUPON_TABLE).content(coupon).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create coupon".to_string()))
    }

    pub async fn update(&self, id: &str, data: CouponUpdate) -> RepoResult<Coupon> {
        let rid = parse_record_id(COUPON_TABLE, id)?;
        let mut coupon = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Coupon {id} not found")))?;

        if let Some(v) = data.code {
            coupon.code = v;
        }
        if let Some(v) = data.discount_type {
            coupon.discount_type = v;
        }
        if let Some(v) = data.discount_amount {
            coupon.discount_amount = v;
        }
        if let Some(v) = data.min_purchase {
            coupon.min_purchase = v;
        }
        if let Some(v) = data.max_discount {
            coupon.max_discount = v;
        }
        if let Some(v) = data.expiry_date {
            coupon.expiry_date = v;
        }
        if let Some(v) = data.description {
            coupon.description = v;
        }

        let updated: Option<Coupon> = self.base.db().update(rid).content(coupon).await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Coupon {id} not found")))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let rid = parse_record_id(COUPON_TABLE, id)?;
        let deleted: Option<Coupon> = self.base.db().delete(rid).await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!("Coupon {id} not found")));
        }
        Ok(())
    }
}

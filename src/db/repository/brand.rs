//! Brand Repository

use chrono::Utc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Brand, BrandCreate, BrandUpdate};

const BRAND_TABLE: &str = "brand";

#[derive(Clone)]
pub struct BrandRepository {
    base: BaseRepository,
}

impl BrandRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Brand>> {
        let brands: Vec<Brand> = self
            .base
            .db()
            .query("SELECT * FROM brand ORDER BY name")
            .await?
            .take(0)?;
        Ok(brands)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Brand>> {
        let rid = parse_record_id(BRAND_TABLE, id)?;
        let brand: Option<Brand> = self.base.db().select(rid).await?;
        Ok(brand)
    }

    pub async fn create(&self, data: BrandCreate) -> RepoResult<Brand> {
        let brand = Brand {
            id: None,
            name: data.name,
            description: data.description.unwrap_or_default(),
            created_at: Some(Utc::now()),
        };
        let created: Option<Brand> = self.base.db().create(BRAND_TABLE).content(brand).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create brand".to_string()))
    }

    pub async fn update(&self, id: &str, data: BrandUpdate) -> RepoResult<Brand> {
        let rid = parse_record_id(BRAND_TABLE, id)?;
        let mut brand = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Brand {id} not found")))?;

        if let Some(v) = data.name {
            brand.name = v;
        }
        if let Some(v) = data.description {
            brand.description = v;
        }

        let updated: Option<Brand> = self.base.db().update(rid).content(brand).await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Brand {id} not found")))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let rid = parse_record_id(BRAND_TABLE, id)?;
        let deleted: Option<Brand> = self.base.db().delete(rid).await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!("Brand {id} not found")));
        }
        Ok(())
    }
}

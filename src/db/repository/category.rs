//! Category Repository

use chrono::{DateTime, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Category, CategoryCreate, CategoryOffer, CategoryUpdate};

const CATEGORY_TABLE: &str = "category";

#[derive(Clone)]
pub struct CategoryRepository {
    base: BaseRepository,
}

impl CategoryRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Category>> {
        let categories: Vec<Category> = self
            .base
            .db()
            .query("SELECT * FROM category ORDER BY name")
            .await?
            .take(0)?;
        Ok(categories)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Category>> {
        let rid = parse_record_id(CATEGORY_TABLE, id)?;
        let category: Option<Category> = self.base.db().select(rid).await?;
        Ok(category)
    }

    pub async fn create(&self, data: CategoryCreate) -> RepoResult<Category> {
        let category = Category {
            id: None,
            name: data.name,
            description: data.description.unwrap_or_default(),
            offer: None,
            created_at: Some(Utc::now()),
        };
        let created: Option<Category> = self
            .base
            .db()
            .create(CATEGORY_TABLE)
            .content(category)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create category".to_string()))
    }

    pub async fn update(&self, id: &str, data: CategoryUpdate) -> RepoResult<Category> {
        let rid = parse_record_id(CATEGORY_TABLE, id)?;
        let mut category = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Category {id} not found")))?;

        if let Some(v) = data.name {
            category.name = v;
        }
        if let Some(v) = data.description {
            category.description = v;
        }

        let updated: Option<Category> = self.base.db().update(rid).content(category).await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Category {id} not found")))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let rid = parse_record_id(CATEGORY_TABLE, id)?;
        let deleted: Option<Category> = self.base.db().delete(rid).await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!("Category {id} not found")));
        }
        Ok(())
    }

    /// Attach or replace the category offer
    pub async fn set_offer(&self, id: &str, offer: CategoryOffer) -> RepoResult<Category> {
        let rid = parse_record_id(CATEGORY_TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $id SET offer = $offer RETURN AFTER")
            .bind(("id", rid))
            .bind(("offer", offer))
            .await?;
        let updated: Vec<Category> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Category {id} not found")))
    }

    /// Remove the category offer
    pub async fn clear_offer(&self, id: &str) -> RepoResult<Category> {
        let rid = parse_record_id(CATEGORY_TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $id SET offer = NONE RETURN AFTER")
            .bind(("id", rid))
            .await?;
        let updated: Vec<Category> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Category {id} not found")))
    }

    /// Categories whose offer window has lapsed (for the expiry sweep)
    pub async fn find_expired_offers(&self, now: DateTime<Utc>) -> RepoResult<Vec<Category>> {
        let categories: Vec<Category> = self
            .base
            .db()
            .query("SELECT * FROM category WHERE offer != NONE")
            .await?
            .take(0)?;
        Ok(categories
            .into_iter()
            .filter(|c| c.offer.as_ref().is_some_and(|o| o.end_date < now))
            .collect())
    }
}

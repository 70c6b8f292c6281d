//! Cart Repository
//!
//! Persistence only — the cart rules (line identity, totals, coupon
//! snapshot) live in [`crate::carts::CartEngine`]. One cart per user is
//! enforced by the unique index on `cart.user`.

use chrono::Utc;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use super::{BaseRepository, RepoError, RepoResult, is_retryable_conflict};
use crate::db::models::Cart;

const CART_TABLE: &str = "cart";

#[derive(Clone)]
pub struct CartRepository {
    base: BaseRepository,
}

impl CartRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_user(&self, user: &RecordId) -> RepoResult<Option<Cart>> {
        let carts: Vec<Cart> = self
            .base
            .db()
            .query("SELECT * FROM cart WHERE user = $user")
            .bind(("user", user.clone()))
            .await?
            .take(0)?;
        Ok(carts.into_iter().next())
    }

    /// Load the user's cart, creating an empty one lazily. A concurrent
    /// creator losing to the unique index on `user` falls back to the
    /// winner's cart.
    pub async fn find_or_create(&self, user: &RecordId) -> RepoResult<Cart> {
        if let Some(cart) = self.find_by_user(user).await? {
            return Ok(cart);
        }
        let cart = Cart {
            id: None,
            user: user.clone(),
            items: Vec::new(),
            total_price: 0.0,
            coupon_applied: None,
            version: 0,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        match self.base.db().create(CART_TABLE).content(cart).await {
            Ok(Some(created)) => Ok(created),
            Ok(None) => Err(RepoError::Database("Failed to create cart".to_string())),
            Err(e) => {
                let err = RepoError::from(e);
                if matches!(err, RepoError::Duplicate(_)) {
                    self.find_by_user(user).await?.ok_or(err)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Compare-and-swap save: the write applies only while the stored
    /// `version` still matches the one this cart was read at, so a
    /// concurrent save cannot be silently overwritten. Returns `None` when
    /// another writer got in between; the caller reloads and reapplies.
    pub async fn save(&self, mut cart: Cart) -> RepoResult<Option<Cart>> {
        let id = cart
            .id
            .clone()
            .ok_or_else(|| RepoError::Validation("Cannot save a cart without an id".into()))?;
        let expected = cart.version;
        cart.version = expected + 1;
        cart.updated_at = Some(Utc::now());

        loop {
            let attempt = async {
                let mut result = self
                    .base
                    .db()
                    .query("UPDATE $id CONTENT $cart WHERE version = $expected RETURN AFTER")
                    .bind(("id", id.clone()))
                    .bind(("cart", cart.clone()))
                    .bind(("expected", expected))
                    .await?;
                let saved: Vec<Cart> = result.take(0)?;
                Ok::<_, surrealdb::Error>(saved.into_iter().next())
            }
            .await;
            match attempt {
                Ok(saved) => return Ok(saved),
                Err(e) if is_retryable_conflict(&e) => tokio::task::yield_now().await,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

//! Shared test fixtures: an in-memory database plus seed helpers.

#![allow(dead_code)]

use rand::Rng;
use surrealdb::{RecordId, Surreal, engine::local::Db};

use commerce_server::db::DbService;
use commerce_server::db::models::{
    Category, CategoryOffer, Product, ProductCreate, Role, Variant, VariantCreate,
};
use commerce_server::db::repository::{
    CategoryRepository, ProductRepository, UserRepository, VariantRepository,
};

pub async fn mem_db() -> Surreal<Db> {
    DbService::memory().await.expect("in-memory database").db
}

/// Random suffix so unique indexes (code, sku, username) never collide
/// across tests sharing a database
pub fn unique(prefix: &str) -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{prefix}-{n:06}")
}

pub async fn seed_user(db: &Surreal<Db>, name: &str) -> RecordId {
    let username = unique(name);
    let user = UserRepository::new(db.clone())
        .create(
            username.clone(),
            format!("{username}@test.local"),
            "hash".to_string(),
            Role::User,
        )
        .await
        .expect("seed user");
    user.id.expect("user id")
}

pub async fn seed_category(db: &Surreal<Db>, name: &str) -> Category {
    CategoryRepository::new(db.clone())
        .create(commerce_server::db::models::CategoryCreate {
            name: name.to_string(),
            description: None,
        })
        .await
        .expect("seed category")
}

pub async fn seed_product(
    db: &Surreal<Db>,
    category: &RecordId,
    price: f64,
    stock: i64,
    offer: Option<&CategoryOffer>,
) -> Product {
    ProductRepository::new(db.clone())
        .create(
            ProductCreate {
                name: unique("product"),
                code: unique("code"),
                description: None,
                category: category.clone(),
                brand: None,
                price,
                stock: Some(stock),
            },
            offer,
        )
        .await
        .expect("seed product")
}

pub async fn seed_variant(
    db: &Surreal<Db>,
    product: &RecordId,
    price: f64,
    stock: i64,
) -> Variant {
    VariantRepository::new(db.clone())
        .create(
            product.clone(),
            VariantCreate {
                sku: unique("sku"),
                price,
                stock,
                attributes: None,
            },
            None,
        )
        .await
        .expect("seed variant")
}

/// Current stock of a product or variant record
pub async fn stock_of(db: &Surreal<Db>, target: &RecordId) -> i64 {
    let mut result = db
        .query("SELECT VALUE stock FROM $id")
        .bind(("id", target.clone()))
        .await
        .expect("stock query");
    let stocks: Vec<i64> = result.take(0).expect("stock value");
    stocks.into_iter().next().expect("record exists")
}

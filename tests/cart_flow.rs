//! Cart engine integration tests against an in-memory database.

mod common;

use chrono::{Duration, Utc};

use commerce_server::carts::{CartEngine, QuantityAction};
use commerce_server::db::models::{CouponCreate, DiscountType};
use commerce_server::db::repository::{CartRepository, CouponRepository, ProductRepository};
use commerce_server::db::models::ProductUpdate;
use commerce_server::utils::AppError;

use common::{mem_db, seed_category, seed_product, seed_user, seed_variant, unique};

async fn seed_coupon(
    db: &surrealdb::Surreal<surrealdb::engine::local::Db>,
    amount: f64,
    min_purchase: f64,
    max_discount: f64,
) -> String {
    let code = unique("SAVE");
    CouponRepository::new(db.clone())
        .create(CouponCreate {
            code: code.clone(),
            discount_type: DiscountType::Percentage,
            discount_amount: amount,
            min_purchase: Some(min_purchase),
            max_discount,
            expiry_date: Utc::now() + Duration::days(7),
            description: None,
        })
        .await
        .expect("seed coupon");
    code
}

#[tokio::test]
async fn adding_same_product_merges_into_one_line() {
    let db = mem_db().await;
    let user = seed_user(&db, "alice").await;
    let category = seed_category(&db, "shoes").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 50.0, 100, None).await;
    let pid = product.id.unwrap().to_string();

    let engine = CartEngine::new(db.clone(), false);
    let cart = engine.add_item(&user, &pid, None, 2).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.total_price, 100.0);

    let cart = engine.add_item(&user, &pid, None, 3).await.unwrap();
    assert_eq!(cart.items.len(), 1, "same key must merge, not append");
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.total_price, 250.0);
}

#[tokio::test]
async fn same_product_different_variant_is_two_lines() {
    let db = mem_db().await;
    let user = seed_user(&db, "bob").await;
    let category = seed_category(&db, "shirts").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 30.0, 0, None).await;
    let prid = product.id.clone().unwrap();
    let red = seed_variant(&db, &prid, 32.0, 10).await;
    let blue = seed_variant(&db, &prid, 35.0, 10).await;

    let engine = CartEngine::new(db.clone(), false);
    let pid = prid.to_string();
    engine
        .add_item(&user, &pid, Some(&red.id.unwrap().to_string()), 1)
        .await
        .unwrap();
    let cart = engine
        .add_item(&user, &pid, Some(&blue.id.unwrap().to_string()), 1)
        .await
        .unwrap();

    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total_price, 67.0);
}

#[tokio::test]
async fn total_matches_sum_after_every_mutation() {
    let db = mem_db().await;
    let user = seed_user(&db, "carol").await;
    let category = seed_category(&db, "misc").await;
    let a = seed_product(&db, category.id.as_ref().unwrap(), 19.99, 50, None).await;
    let b = seed_product(&db, category.id.as_ref().unwrap(), 7.5, 50, None).await;
    let a_id = a.id.unwrap().to_string();
    let b_id = b.id.unwrap().to_string();

    let engine = CartEngine::new(db.clone(), false);

    let check = |cart: &commerce_server::db::models::Cart| {
        let expected: f64 = cart
            .items
            .iter()
            .map(|i| i.quantity as f64 * i.offer_price.unwrap_or(i.price))
            .sum();
        assert!((cart.total_price - expected).abs() < 0.005);
    };

    let cart = engine.add_item(&user, &a_id, None, 3).await.unwrap();
    check(&cart);
    let cart = engine.add_item(&user, &b_id, None, 2).await.unwrap();
    check(&cart);
    let cart = engine
        .update_quantity(&user, &a_id, None, QuantityAction::Increment)
        .await
        .unwrap();
    check(&cart);
    let cart = engine.remove_item(&user, &b_id, None).await.unwrap();
    check(&cart);
    assert_eq!(cart.items.len(), 1);
}

#[tokio::test]
async fn decrement_at_quantity_one_removes_the_line() {
    let db = mem_db().await;
    let user = seed_user(&db, "dave").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 10.0, 10, None).await;
    let pid = product.id.unwrap().to_string();

    let engine = CartEngine::new(db.clone(), false);
    engine.add_item(&user, &pid, None, 1).await.unwrap();
    let cart = engine
        .update_quantity(&user, &pid, None, QuantityAction::Decrement)
        .await
        .unwrap();

    assert!(cart.items.is_empty(), "line must be removed, never qty 0");
    assert_eq!(cart.total_price, 0.0);
}

#[tokio::test]
async fn mutations_on_missing_cart_or_item_fail_not_found() {
    let db = mem_db().await;
    let user = seed_user(&db, "erin").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 10.0, 10, None).await;
    let pid = product.id.unwrap().to_string();

    let engine = CartEngine::new(db.clone(), false);

    // No cart yet
    assert!(matches!(
        engine.remove_item(&user, &pid, None).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        engine.clear(&user).await,
        Err(AppError::NotFound(_))
    ));

    // Cart exists but the item does not
    let other = seed_product(&db, category.id.as_ref().unwrap(), 5.0, 10, None).await;
    engine
        .add_item(&user, &other.id.unwrap().to_string(), None, 1)
        .await
        .unwrap();
    assert!(matches!(
        engine
            .update_quantity(&user, &pid, None, QuantityAction::Increment)
            .await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn zero_quantity_add_is_rejected() {
    let db = mem_db().await;
    let user = seed_user(&db, "frank").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 10.0, 10, None).await;

    let engine = CartEngine::new(db.clone(), false);
    let result = engine
        .add_item(&user, &product.id.unwrap().to_string(), None, 0)
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn clear_empties_items_total_and_coupon() {
    let db = mem_db().await;
    let user = seed_user(&db, "gina").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 100.0, 10, None).await;
    let code = seed_coupon(&db, 10.0, 0.0, 50.0).await;

    let engine = CartEngine::new(db.clone(), false);
    engine
        .add_item(&user, &product.id.unwrap().to_string(), None, 2)
        .await
        .unwrap();
    engine.apply_coupon(&user, &code).await.unwrap();

    let cart = engine.clear(&user).await.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_price, 0.0);
    assert!(cart.coupon_applied.is_none());
}

#[tokio::test]
async fn get_cart_reports_final_amount_and_total_quantity() {
    let db = mem_db().await;
    let user = seed_user(&db, "hank").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 100.0, 10, None).await;
    let pid = product.id.unwrap().to_string();

    let engine = CartEngine::new(db.clone(), false);
    engine.add_item(&user, &pid, None, 3).await.unwrap();

    // Without a coupon, final_amount mirrors total_price
    let view = engine.get_cart(&user).await.unwrap();
    assert_eq!(view.total_quantity, 3);
    assert_eq!(view.total_price, 300.0);
    assert_eq!(view.final_amount, 300.0);

    // 10% of 300 = 30, under the 50 cap
    let code = seed_coupon(&db, 10.0, 0.0, 50.0).await;
    engine.apply_coupon(&user, &code).await.unwrap();
    let view = engine.get_cart(&user).await.unwrap();
    assert_eq!(view.final_amount, 270.0);
    assert_eq!(view.total_price, 300.0);
}

#[tokio::test]
async fn coupon_is_dropped_when_cart_falls_below_min_purchase() {
    let db = mem_db().await;
    let user = seed_user(&db, "iris").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 100.0, 10, None).await;
    let pid = product.id.unwrap().to_string();
    let code = seed_coupon(&db, 10.0, 250.0, 80.0).await;

    let engine = CartEngine::new(db.clone(), false);
    engine.add_item(&user, &pid, None, 3).await.unwrap();
    let cart = engine.apply_coupon(&user, &code).await.unwrap();
    assert!(cart.coupon_applied.is_some());

    // Dropping below min_purchase (300 -> 200) invalidates the snapshot
    let cart = engine
        .update_quantity(&user, &pid, None, QuantityAction::Decrement)
        .await
        .unwrap();
    assert!(cart.coupon_applied.is_none());
}

#[tokio::test]
async fn snapshot_prices_survive_catalog_changes_by_default() {
    let db = mem_db().await;
    let user = seed_user(&db, "judy").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 40.0, 10, None).await;
    let pid = product.id.unwrap().to_string();

    let engine = CartEngine::new(db.clone(), false);
    engine.add_item(&user, &pid, None, 1).await.unwrap();

    ProductRepository::new(db.clone())
        .update(
            &pid,
            ProductUpdate {
                name: None,
                description: None,
                category: None,
                brand: None,
                price: Some(60.0),
                stock: None,
            },
            None,
        )
        .await
        .unwrap();

    let view = engine.get_cart(&user).await.unwrap();
    assert_eq!(view.items[0].price, 40.0, "snapshot must not refresh");
    assert_eq!(view.total_price, 40.0);

    // With refresh enabled the same read re-captures the catalog price
    let refreshing = CartEngine::new(db.clone(), true);
    let view = refreshing.get_cart(&user).await.unwrap();
    assert_eq!(view.items[0].price, 60.0);
    assert_eq!(view.total_price, 60.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_of_different_products_keep_both_lines() {
    let db = mem_db().await;
    let user = seed_user(&db, "liam").await;
    let category = seed_category(&db, "misc").await;
    let a = seed_product(&db, category.id.as_ref().unwrap(), 10.0, 10, None).await;
    let b = seed_product(&db, category.id.as_ref().unwrap(), 20.0, 10, None).await;
    let a_id = a.id.unwrap().to_string();
    let b_id = b.id.unwrap().to_string();

    let engine = CartEngine::new(db.clone(), false);
    let mut handles = Vec::new();
    for pid in [a_id, b_id] {
        let engine = engine.clone();
        let user = user.clone();
        handles.push(tokio::spawn(async move {
            engine.add_item(&user, &pid, None, 1).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Neither save may overwrite the other's line
    let cart = CartRepository::new(db.clone())
        .find_by_user(&user)
        .await
        .unwrap()
        .expect("cart exists");
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total_price, 30.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_of_the_same_product_merge_both_quantities() {
    let db = mem_db().await;
    let user = seed_user(&db, "mona").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 10.0, 10, None).await;
    let pid = product.id.unwrap().to_string();

    let engine = CartEngine::new(db.clone(), false);
    let mut handles = Vec::new();
    for _ in 0..2 {
        let engine = engine.clone();
        let user = user.clone();
        let pid = pid.clone();
        handles.push(tokio::spawn(async move {
            engine.add_item(&user, &pid, None, 1).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let cart = CartRepository::new(db.clone())
        .find_by_user(&user)
        .await
        .unwrap()
        .expect("cart exists");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.total_price, 20.0);
}

#[tokio::test]
async fn variant_line_captures_variant_price() {
    let db = mem_db().await;
    let user = seed_user(&db, "kate").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 20.0, 0, None).await;
    let prid = product.id.clone().unwrap();
    let variant = seed_variant(&db, &prid, 25.0, 5).await;

    let engine = CartEngine::new(db.clone(), false);
    let cart = engine
        .add_item(
            &user,
            &prid.to_string(),
            Some(&variant.id.unwrap().to_string()),
            2,
        )
        .await
        .unwrap();

    assert_eq!(cart.items[0].price, 25.0);
    assert_eq!(cart.total_price, 50.0);
}

//! Order engine integration tests: placement, compensation, cancellation
//! and status transitions.

mod common;

use chrono::{Duration, Utc};

use commerce_server::carts::CartEngine;
use commerce_server::db::models::{CouponCreate, DiscountType, OrderStatus, PaymentStatus};
use commerce_server::db::repository::product::{decrement_stock_if_available, restore_stock};
use commerce_server::db::repository::{CartRepository, CouponRepository, OrderRepository};
use commerce_server::orders::{OrderEngine, PlaceOrderItem, StatusKind};
use commerce_server::utils::AppError;

use common::{mem_db, seed_category, seed_product, seed_user, seed_variant, stock_of, unique};

fn item(product_id: &str, quantity: i64) -> PlaceOrderItem {
    PlaceOrderItem {
        product_id: product_id.to_string(),
        variant_id: None,
        quantity,
    }
}

#[tokio::test]
async fn place_order_decrements_stock_and_snapshots_prices() {
    let db = mem_db().await;
    let user = seed_user(&db, "alice").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 25.0, 10, None).await;
    let prid = product.id.clone().unwrap();

    let engine = OrderEngine::new(db.clone());
    let order = engine
        .place_order(&user, Some(vec![item(&prid.to_string(), 3)]))
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.products.len(), 1);
    assert_eq!(order.products[0].quantity, 3);
    assert_eq!(order.products[0].price, 25.0);
    assert_eq!(order.total_amount, 75.0);
    assert_eq!(stock_of(&db, &prid).await, 7);
}

#[tokio::test]
async fn duplicate_request_lines_are_merged_before_stock_moves() {
    let db = mem_db().await;
    let user = seed_user(&db, "bob").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 10.0, 10, None).await;
    let prid = product.id.clone().unwrap();
    let pid = prid.to_string();

    let engine = OrderEngine::new(db.clone());
    let order = engine
        .place_order(&user, Some(vec![item(&pid, 1), item(&pid, 2)]))
        .await
        .unwrap();

    assert_eq!(order.products.len(), 1);
    assert_eq!(order.products[0].quantity, 3);
    assert_eq!(stock_of(&db, &prid).await, 7);
}

#[tokio::test]
async fn insufficient_stock_fails_the_whole_order_and_compensates() {
    let db = mem_db().await;
    let user = seed_user(&db, "carol").await;
    let category = seed_category(&db, "misc").await;
    let plenty = seed_product(&db, category.id.as_ref().unwrap(), 10.0, 100, None).await;
    let scarce = seed_product(&db, category.id.as_ref().unwrap(), 10.0, 2, None).await;
    let plenty_id = plenty.id.clone().unwrap();
    let scarce_id = scarce.id.clone().unwrap();

    let engine = OrderEngine::new(db.clone());
    let result = engine
        .place_order(
            &user,
            Some(vec![
                item(&plenty_id.to_string(), 5),
                item(&scarce_id.to_string(), 3),
            ]),
        )
        .await;

    assert!(matches!(result, Err(AppError::InsufficientStock(_))));
    // The already-applied decrement on the first line must be rolled back
    assert_eq!(stock_of(&db, &plenty_id).await, 100);
    assert_eq!(stock_of(&db, &scarce_id).await, 2);
}

#[tokio::test]
async fn cancel_is_the_exact_inverse_of_place_for_stock() {
    let db = mem_db().await;
    let user = seed_user(&db, "dave").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 10.0, 8, None).await;
    let variant_owner = seed_product(&db, category.id.as_ref().unwrap(), 10.0, 0, None).await;
    let vrid = seed_variant(&db, variant_owner.id.as_ref().unwrap(), 12.0, 4)
        .await
        .id
        .unwrap();
    let prid = product.id.clone().unwrap();

    let engine = OrderEngine::new(db.clone());
    let order = engine
        .place_order(
            &user,
            Some(vec![
                item(&prid.to_string(), 3),
                PlaceOrderItem {
                    product_id: variant_owner.id.as_ref().unwrap().to_string(),
                    variant_id: Some(vrid.to_string()),
                    quantity: 2,
                },
            ]),
        )
        .await
        .unwrap();

    assert_eq!(stock_of(&db, &prid).await, 5);
    assert_eq!(stock_of(&db, &vrid).await, 2);

    let order_id = order.id.unwrap().to_string();
    let cancelled = engine.cancel_order(&order_id, &user).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    // Stock after place + cancel equals stock before place, per line
    assert_eq!(stock_of(&db, &prid).await, 8);
    assert_eq!(stock_of(&db, &vrid).await, 4);
}

#[tokio::test]
async fn cancel_is_owner_only_and_pending_only() {
    let db = mem_db().await;
    let owner = seed_user(&db, "erin").await;
    let stranger = seed_user(&db, "mallory").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 10.0, 10, None).await;
    let pid = product.id.unwrap().to_string();

    let engine = OrderEngine::new(db.clone());
    let order = engine
        .place_order(&owner, Some(vec![item(&pid, 1)]))
        .await
        .unwrap();
    let order_id = order.id.unwrap().to_string();

    assert!(matches!(
        engine.cancel_order(&order_id, &stranger).await,
        Err(AppError::Forbidden(_))
    ));

    engine
        .update_status(&order_id, "processed", StatusKind::Order)
        .await
        .unwrap();
    assert!(matches!(
        engine.cancel_order(&order_id, &owner).await,
        Err(AppError::BusinessRule(_))
    ));
}

#[tokio::test]
async fn status_machines_reject_illegal_transitions() {
    let db = mem_db().await;
    let user = seed_user(&db, "frank").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 10.0, 10, None).await;
    let pid = product.id.unwrap().to_string();

    let engine = OrderEngine::new(db.clone());
    let order = engine
        .place_order(&user, Some(vec![item(&pid, 1)]))
        .await
        .unwrap();
    let order_id = order.id.unwrap().to_string();

    // pending -> shipped skips processed
    assert!(matches!(
        engine
            .update_status(&order_id, "shipped", StatusKind::Order)
            .await,
        Err(AppError::BusinessRule(_))
    ));

    // Unknown enum value
    assert!(matches!(
        engine
            .update_status(&order_id, "teleported", StatusKind::Order)
            .await,
        Err(AppError::Validation(_))
    ));

    // Full forward path, then a refund out of delivered
    for status in ["processed", "shipped", "delivered", "refunded"] {
        engine
            .update_status(&order_id, status, StatusKind::Order)
            .await
            .unwrap();
    }

    // Payment machine is independent
    let detail = engine
        .update_status(&order_id, "paid", StatusKind::Payment)
        .await
        .unwrap();
    assert_eq!(detail.payment_status, PaymentStatus::Paid);
    assert!(matches!(
        engine
            .update_status(&order_id, "pending", StatusKind::Payment)
            .await,
        Err(AppError::BusinessRule(_))
    ));
}

#[tokio::test]
async fn placing_from_cart_clears_it_and_applies_its_coupon() {
    let db = mem_db().await;
    let user = seed_user(&db, "gina").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 100.0, 10, None).await;
    let prid = product.id.clone().unwrap();

    let code = unique("SAVE");
    CouponRepository::new(db.clone())
        .create(CouponCreate {
            code: code.clone(),
            discount_type: DiscountType::Fixed,
            discount_amount: 50.0,
            min_purchase: Some(100.0),
            max_discount: 50.0,
            expiry_date: Utc::now() + Duration::days(7),
            description: None,
        })
        .await
        .unwrap();

    let carts = CartEngine::new(db.clone(), false);
    carts
        .add_item(&user, &prid.to_string(), None, 2)
        .await
        .unwrap();
    carts.apply_coupon(&user, &code).await.unwrap();

    let engine = OrderEngine::new(db.clone());
    let order = engine.place_order(&user, None).await.unwrap();

    // 2 × 100 − 50 fixed discount
    assert_eq!(order.total_amount, 150.0);
    assert_eq!(stock_of(&db, &prid).await, 8);

    let cart = CartRepository::new(db.clone())
        .find_by_user(&user)
        .await
        .unwrap()
        .expect("cart still exists");
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_price, 0.0);
    assert!(cart.coupon_applied.is_none());
}

#[tokio::test]
async fn placing_from_an_empty_or_missing_cart_fails() {
    let db = mem_db().await;
    let user = seed_user(&db, "hank").await;

    let engine = OrderEngine::new(db.clone());
    assert!(matches!(
        engine.place_order(&user, None).await,
        Err(AppError::NotFound(_))
    ));

    assert!(matches!(
        engine.place_order(&user, Some(Vec::new())).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn soft_deleted_orders_are_invisible_to_reads() {
    let db = mem_db().await;
    let user = seed_user(&db, "iris").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 10.0, 10, None).await;
    let pid = product.id.unwrap().to_string();

    let engine = OrderEngine::new(db.clone());
    let order = engine
        .place_order(&user, Some(vec![item(&pid, 1)]))
        .await
        .unwrap();
    let order_id = order.id.unwrap().to_string();

    let repo = OrderRepository::new(db.clone());
    repo.soft_delete(&order_id).await.unwrap();

    assert!(repo.find_by_id(&order_id).await.unwrap().is_none());
    assert!(repo.get_detail(&order_id).await.is_err());
    assert!(repo.find_by_user(&user).await.unwrap().is_empty());
}

#[tokio::test]
async fn conditional_decrement_only_writes_when_stock_covers_it() {
    let db = mem_db().await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 10.0, 3, None).await;
    let prid = product.id.unwrap();

    // Covered: the write lands and reports a hit
    assert!(decrement_stock_if_available(&db, &prid, 2).await.unwrap());
    assert_eq!(stock_of(&db, &prid).await, 1);

    // Not covered: a plain miss, not an error, and stock is untouched
    assert!(!decrement_stock_if_available(&db, &prid, 2).await.unwrap());
    assert_eq!(stock_of(&db, &prid).await, 1);

    restore_stock(&db, &prid, 2).await.unwrap();
    assert_eq!(stock_of(&db, &prid).await, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cancels_restore_stock_exactly_once() {
    let db = mem_db().await;
    let user = seed_user(&db, "kyle").await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 10.0, 5, None).await;
    let prid = product.id.clone().unwrap();

    let engine = OrderEngine::new(db.clone());
    let order = engine
        .place_order(&user, Some(vec![item(&prid.to_string(), 2)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&db, &prid).await, 3);
    let order_id = order.id.unwrap().to_string();

    let mut handles = Vec::new();
    for _ in 0..2 {
        let engine = engine.clone();
        let user = user.clone();
        let order_id = order_id.clone();
        handles.push(tokio::spawn(async move {
            engine.cancel_order(&order_id, &user).await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(order) => {
                assert_eq!(order.status, OrderStatus::Cancelled);
                wins += 1;
            }
            Err(AppError::BusinessRule(_)) => {}
            Err(e) => panic!("unexpected cancellation error: {e}"),
        }
    }

    // Only the winner of the status flip restores stock
    assert_eq!(wins, 1);
    assert_eq!(stock_of(&db, &prid).await, 5);
}

#[tokio::test]
async fn order_total_uses_captured_offer_prices() {
    let db = mem_db().await;
    let user = seed_user(&db, "judy").await;
    let category = seed_category(&db, "sale").await;

    let offer = commerce_server::db::models::CategoryOffer {
        title: "flash".to_string(),
        discount_percentage: 15.0,
        start_date: Utc::now() - Duration::days(1),
        end_date: Utc::now() + Duration::days(1),
        is_active: true,
    };
    let product = seed_product(&db, category.id.as_ref().unwrap(), 200.0, 5, Some(&offer)).await;
    assert_eq!(product.offer_price, Some(170.0));

    let engine = OrderEngine::new(db.clone());
    let order = engine
        .place_order(&user, Some(vec![item(&product.id.unwrap().to_string(), 2)]))
        .await
        .unwrap();
    assert_eq!(order.products[0].price, 170.0);
    assert_eq!(order.total_amount, 340.0);
}

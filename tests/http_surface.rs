//! HTTP surface tests: routing, method mapping and auth wiring, exercised
//! through the full router with `tower::ServiceExt::oneshot`.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use commerce_server::core::{Config, Server, ServerState};
use commerce_server::db::models::Role;
use commerce_server::db::repository::{UserRepository, VariantRepository};

use common::{mem_db, seed_category, seed_product, seed_variant, unique};

#[tokio::test]
async fn variant_update_is_put_and_post_is_rejected() {
    let db = mem_db().await;
    let category = seed_category(&db, "misc").await;
    let product = seed_product(&db, category.id.as_ref().unwrap(), 20.0, 0, None).await;
    let prid = product.id.clone().unwrap();
    let vrid = seed_variant(&db, &prid, 25.0, 5).await.id.unwrap();

    let username = unique("admin");
    let admin = UserRepository::new(db.clone())
        .create(
            username.clone(),
            format!("{username}@test.local"),
            "hash".to_string(),
            Role::Admin,
        )
        .await
        .unwrap();

    let state = ServerState::with_db(Config::from_env(), db.clone());
    let token = state
        .jwt_service
        .generate_token(&admin.id.unwrap().to_string(), &username, Role::Admin)
        .unwrap();
    let app = Server::router(state);

    let path = format!("/api/products/{prid}/variants/{vrid}");
    let request = |method: &str| {
        Request::builder()
            .method(method)
            .uri(&path)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"price": 30.0}"#))
            .unwrap()
    };

    let response = app.clone().oneshot(request("PUT")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let updated = VariantRepository::new(db.clone())
        .find_by_id(&vrid.to_string())
        .await
        .unwrap()
        .expect("variant exists");
    assert_eq!(updated.price, 30.0);

    // Variant updates go through PUT only
    let response = app.oneshot(request("POST")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

//! On-disk engine smoke test: data written through a repository is
//! readable after reopening the database directory.

mod common;

use commerce_server::db::DbService;
use commerce_server::db::models::ProductCreate;
use commerce_server::db::repository::ProductRepository;

#[tokio::test]
async fn rocksdb_storage_round_trips_a_product() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("commerce.db");
    let path_str = path.to_string_lossy().to_string();

    let code = common::unique("disk");
    let category: surrealdb::RecordId = "category:disk_smoke".parse().unwrap();

    {
        let service = DbService::new(&path_str).await.expect("open db");
        let repo = ProductRepository::new(service.db.clone());
        repo.create(
            ProductCreate {
                name: "persisted".to_string(),
                code: code.clone(),
                description: None,
                category: category.clone(),
                brand: None,
                price: 12.5,
                stock: Some(3),
            },
            None,
        )
        .await
        .expect("create product");
    }

    // Reopen the same directory
    let service = DbService::new(&path_str).await.expect("reopen db");
    let repo = ProductRepository::new(service.db.clone());
    let products = repo.find_all().await.expect("list products");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].code, code);
    assert_eq!(products[0].stock, 3);
}

//! Integration tests for the file-backed order repository
//!
//! Runs the shared `OrderRepository` contract against `FileOrderRepository`
//! and adds checks specific to the on-disk document.

#[macro_use]
mod repository_harness;

use kyctrust::prelude::*;
use kyctrust::storage::json_file::{read_document, write_document};
use repository_harness::*;
use tempfile::TempDir;

async fn file_repository() -> (FileOrderRepository, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let repo = FileOrderRepository::new(dir.path().join("data").join("orders.json"));
    (repo, dir)
}

order_repository_tests!(file_repository());

#[tokio::test]
async fn test_first_read_creates_empty_document() {
    let (repo, _dir) = file_repository().await;
    assert!(!repo.path().exists());

    assert!(repo.list().await.unwrap().is_empty());

    let text = std::fs::read_to_string(repo.path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value, serde_json::json!({ "orders": [] }));
}

#[tokio::test]
async fn test_document_uses_camel_case_fields() {
    let (repo, _dir) = file_repository().await;
    let order = repo.create(ahmed()).await.unwrap();

    let text = std::fs::read_to_string(repo.path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let stored = &value["orders"][0];
    assert_eq!(stored["id"], order.id.as_str());
    assert_eq!(stored["customerName"], "Ahmed");
    assert_eq!(stored["serviceId"], "kyc-basic");
    assert_eq!(stored["status"], "pending");
    assert!(stored.get("createdAt").is_some());
}

#[tokio::test]
async fn test_document_roundtrip_is_deep_equal() {
    let (repo, _dir) = file_repository().await;
    for i in 0..3 {
        repo.create(customer(i).with_notes(format!("note {i}")))
            .await
            .unwrap();
    }

    let original: OrdersDocument = read_document(repo.path(), OrdersDocument::default())
        .await
        .unwrap();
    let copy_path = repo.path().with_file_name("copy.json");
    write_document(&copy_path, &original).await.unwrap();
    let copy: OrdersDocument = read_document(&copy_path, OrdersDocument::default())
        .await
        .unwrap();

    assert_eq!(copy, original);
}

#[tokio::test]
async fn test_no_caching_between_instances() {
    let (repo, _dir) = file_repository().await;
    let other = FileOrderRepository::new(repo.path());

    let order = repo.create(ahmed()).await.unwrap();
    assert_eq!(other.get(&order.id).await.unwrap(), Some(order.clone()));

    other.delete(&order.id).await.unwrap();
    assert_eq!(repo.get(&order.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_corrupt_document_is_storage_error() {
    let (repo, _dir) = file_repository().await;
    std::fs::create_dir_all(repo.path().parent().unwrap()).unwrap();
    std::fs::write(repo.path(), "{\"orders\": [").unwrap();

    let err = repo.list().await.unwrap_err();
    assert!(matches!(err, AppError::Storage(StorageError::Serialization { .. })));
    assert_eq!(err.to_response().message, "internal server error");
}

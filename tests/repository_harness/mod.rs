//! Shared contract tests for `OrderRepository` backends
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod repository_harness;
//!
//! order_repository_tests!(async { (FileOrderRepository::new(path), guard) });
//! ```
//!
//! `$factory` is an expression evaluating to a future of `(repository, keep)`,
//! where `keep` is held for the duration of the test (a `TempDir`, a pool, or
//! `()`). It is re-evaluated for each test so every test starts from an empty
//! store.

#![allow(dead_code)]

use kyctrust::prelude::*;

pub fn ahmed() -> NewOrder {
    NewOrder::new("Ahmed", "+201000000000", "kyc-basic", 50.0)
}

pub fn customer(i: usize) -> NewOrder {
    NewOrder::new(format!("Customer {i}"), format!("+2010000000{i:02}"), "kyc-pro", i as f64)
}

/// Sleep long enough that consecutive `created_at` values differ on every backend
pub async fn tick() {
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
}

pub fn assert_newest_first(orders: &[Order]) {
    for pair in orders.windows(2) {
        assert!(
            pair[0].created_at >= pair[1].created_at,
            "orders not sorted newest first: {} before {}",
            pair[0].created_at,
            pair[1].created_at
        );
    }
}

#[macro_export]
macro_rules! order_repository_tests {
    ($factory:expr) => {
        mod order_repository_contract_tests {
            use super::*;
            use kyctrust::prelude::*;
            use std::collections::HashSet;

            #[tokio::test]
            async fn test_create_assigns_id_timestamps_and_pending() {
                let (repo, _keep) = $factory.await;
                let order = repo.create(repository_harness::ahmed()).await.unwrap();

                assert!(!order.id.is_empty());
                assert_eq!(order.status, OrderStatus::Pending);
                assert_eq!(order.created_at, order.updated_at);
                assert_eq!(order.customer_name, "Ahmed");
                assert_eq!(order.amount, 50.0);
                assert_eq!(order.notes, None);
            }

            #[tokio::test]
            async fn test_create_keeps_status_override_and_notes() {
                let (repo, _keep) = $factory.await;
                let order = repo
                    .create(
                        repository_harness::ahmed()
                            .with_notes("called twice")
                            .with_status(OrderStatus::Processing),
                    )
                    .await
                    .unwrap();
                assert_eq!(order.status, OrderStatus::Processing);
                assert_eq!(order.notes.as_deref(), Some("called twice"));
            }

            #[tokio::test]
            async fn test_ids_are_unique() {
                let (repo, _keep) = $factory.await;
                let mut ids = HashSet::new();
                for i in 0..10 {
                    let order = repo.create(repository_harness::customer(i)).await.unwrap();
                    assert!(ids.insert(order.id), "duplicate id");
                }
                assert_eq!(repo.list().await.unwrap().len(), 10);
            }

            #[tokio::test]
            async fn test_create_rejects_invalid_input() {
                let (repo, _keep) = $factory.await;
                let err = repo
                    .create(NewOrder::new("  ", "ab", "kyc-basic", -3.0))
                    .await
                    .unwrap_err();
                assert!(matches!(err, AppError::Validation(_)));
                assert!(repo.list().await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_get_roundtrip_and_missing() {
                let (repo, _keep) = $factory.await;
                let created = repo.create(repository_harness::ahmed()).await.unwrap();

                assert_eq!(repo.get(&created.id).await.unwrap(), Some(created));
                assert_eq!(
                    repo.get("00000000-0000-4000-8000-000000000000").await.unwrap(),
                    None
                );
                assert_eq!(repo.get("not-an-id").await.unwrap(), None);
            }

            #[tokio::test]
            async fn test_list_after_creates_and_deletes() {
                let (repo, _keep) = $factory.await;
                let mut created = Vec::new();
                for i in 0..5 {
                    created.push(repo.create(repository_harness::customer(i)).await.unwrap());
                    repository_harness::tick().await;
                }
                assert!(repo.delete(&created[1].id).await.unwrap());
                assert!(repo.delete(&created[3].id).await.unwrap());

                let orders = repo.list().await.unwrap();
                assert_eq!(orders.len(), 3);
                repository_harness::assert_newest_first(&orders);
                let names: Vec<&str> = orders.iter().map(|o| o.customer_name.as_str()).collect();
                assert_eq!(names, vec!["Customer 4", "Customer 2", "Customer 0"]);
            }

            #[tokio::test]
            async fn test_patch_changes_only_supplied_fields() {
                let (repo, _keep) = $factory.await;
                let created = repo
                    .create(repository_harness::ahmed().with_notes("first contact"))
                    .await
                    .unwrap();
                repository_harness::tick().await;

                let updated = repo
                    .update(&created.id, OrderPatch::status(OrderStatus::Completed))
                    .await
                    .unwrap()
                    .unwrap();

                assert_eq!(updated.status, OrderStatus::Completed);
                assert_eq!(updated.id, created.id);
                assert_eq!(updated.created_at, created.created_at);
                assert_eq!(updated.customer_name, created.customer_name);
                assert_eq!(updated.contact, created.contact);
                assert_eq!(updated.service_id, created.service_id);
                assert_eq!(updated.amount, created.amount);
                assert_eq!(updated.notes, created.notes);
                assert!(updated.updated_at > created.updated_at);

                assert_eq!(repo.get(&created.id).await.unwrap(), Some(updated));
            }

            #[tokio::test]
            async fn test_patch_multiple_fields() {
                let (repo, _keep) = $factory.await;
                let created = repo.create(repository_harness::ahmed()).await.unwrap();
                let patch = OrderPatch {
                    contact: Some("ahmed@example.com".to_string()),
                    amount: Some(75.5),
                    notes: Some("upgraded".to_string()),
                    ..OrderPatch::default()
                };

                let updated = repo.update(&created.id, patch).await.unwrap().unwrap();
                assert_eq!(updated.contact, "ahmed@example.com");
                assert_eq!(updated.amount, 75.5);
                assert_eq!(updated.notes.as_deref(), Some("upgraded"));
                assert_eq!(updated.status, OrderStatus::Pending);
                assert!(updated.updated_at >= created.updated_at);
            }

            #[tokio::test]
            async fn test_update_missing_is_none() {
                let (repo, _keep) = $factory.await;
                let result = repo
                    .update(
                        "00000000-0000-4000-8000-000000000000",
                        OrderPatch::status(OrderStatus::Cancelled),
                    )
                    .await
                    .unwrap();
                assert!(result.is_none());
            }

            #[tokio::test]
            async fn test_update_rejects_invalid_patch() {
                let (repo, _keep) = $factory.await;
                let created = repo.create(repository_harness::ahmed()).await.unwrap();
                let patch = OrderPatch {
                    customer_name: Some("   ".to_string()),
                    ..OrderPatch::default()
                };
                let err = repo.update(&created.id, patch).await.unwrap_err();
                assert!(matches!(err, AppError::Validation(_)));
                assert_eq!(repo.get(&created.id).await.unwrap(), Some(created));
            }

            #[tokio::test]
            async fn test_delete_missing_leaves_collection_alone() {
                let (repo, _keep) = $factory.await;
                repo.create(repository_harness::ahmed()).await.unwrap();
                let before = repo.list().await.unwrap();

                assert!(!repo.delete("00000000-0000-4000-8000-000000000000").await.unwrap());
                assert!(!repo.delete("not-an-id").await.unwrap());
                assert_eq!(repo.list().await.unwrap(), before);
            }

            #[tokio::test]
            async fn test_order_lifecycle() {
                let (repo, _keep) = $factory.await;
                let order = repo.create(repository_harness::ahmed()).await.unwrap();

                let completed = repo
                    .update(&order.id, OrderPatch::status(OrderStatus::Completed))
                    .await
                    .unwrap()
                    .unwrap();
                assert_eq!(completed.status, OrderStatus::Completed);

                assert!(repo.delete(&order.id).await.unwrap());
                assert_eq!(repo.get(&order.id).await.unwrap(), None);
                assert!(!repo.delete(&order.id).await.unwrap());
            }
        }
    };
}

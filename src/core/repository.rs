//! Repository trait for order storage

use super::error::AppResult;
use super::order::{NewOrder, Order, OrderPatch};
use async_trait::async_trait;

/// CRUD operations over the order collection
///
/// The repository is the only owner of stored orders; every method returns
/// owned copies. Implementations validate their inputs, so a
/// `ValidationError` can come back from `create` and `update` even when the
/// caller skipped validation.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// All orders, newest `created_at` first
    async fn list(&self) -> AppResult<Vec<Order>>;

    /// A single order, or `None` when no order has this id
    async fn get(&self, id: &str) -> AppResult<Option<Order>>;

    /// Validate `input`, assign id/timestamps/status and persist
    async fn create(&self, input: NewOrder) -> AppResult<Order>;

    /// Merge `patch` onto an existing order; `None` when the id is unknown
    async fn update(&self, id: &str, patch: OrderPatch) -> AppResult<Option<Order>>;

    /// Remove an order; `false` when nothing was removed
    async fn delete(&self, id: &str) -> AppResult<bool>;

    /// Short backend name for logs and the health endpoint
    fn backend(&self) -> &'static str;
}

/// Newest first; ties keep insertion order
pub(crate) fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

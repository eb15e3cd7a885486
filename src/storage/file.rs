//! File-backed order repository
//!
//! Every operation loads the whole `{ "orders": [...] }` document, works on
//! it in memory and, for mutations, writes the whole document back. Nothing
//! is cached between calls.

use super::json_file::{read_document, write_document};
use crate::core::error::AppResult;
use crate::core::order::{NewOrder, Order, OrderPatch, OrdersDocument};
use crate::core::repository::{OrderRepository, sort_newest_first};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Default location of the orders document
pub const DEFAULT_ORDERS_PATH: &str = ".data/orders.json";

/// Order repository stored in a single JSON file
#[derive(Debug, Clone)]
pub struct FileOrderRepository {
    path: PathBuf,
}

impl FileOrderRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> AppResult<OrdersDocument> {
        Ok(read_document(&self.path, OrdersDocument::default()).await?)
    }

    async fn save(&self, document: &OrdersDocument) -> AppResult<()> {
        Ok(write_document(&self.path, document).await?)
    }
}

impl Default for FileOrderRepository {
    fn default() -> Self {
        Self::new(DEFAULT_ORDERS_PATH)
    }
}

#[async_trait]
impl OrderRepository for FileOrderRepository {
    async fn list(&self) -> AppResult<Vec<Order>> {
        let mut orders = self.load().await?.orders;
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    async fn get(&self, id: &str) -> AppResult<Option<Order>> {
        let document = self.load().await?;
        Ok(document.orders.into_iter().find(|o| o.id == id))
    }

    async fn create(&self, input: NewOrder) -> AppResult<Order> {
        let input = input.validated()?;
        let order = Order::create(input, Utc::now());

        let mut document = self.load().await?;
        document.orders.push(order.clone());
        self.save(&document).await?;

        tracing::debug!(id = %order.id, "order created");
        Ok(order)
    }

    async fn update(&self, id: &str, patch: OrderPatch) -> AppResult<Option<Order>> {
        let patch = patch.validated()?;

        let mut document = self.load().await?;
        let Some(order) = document.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        order.apply(patch, Utc::now());
        let updated = order.clone();
        self.save(&document).await?;

        tracing::debug!(%id, status = %updated.status, "order updated");
        Ok(Some(updated))
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let mut document = self.load().await?;
        let before = document.orders.len();
        document.orders.retain(|o| o.id != id);

        let removed = document.orders.len() != before;
        if removed {
            self.save(&document).await?;
            tracing::debug!(%id, "order deleted");
        }
        Ok(removed)
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

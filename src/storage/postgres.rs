//! PostgreSQL order repository using sqlx.
//!
//! Orders live in an `orders` table with snake_case columns. Field names are
//! converted at this boundary; the rest of the crate only sees [`Order`].
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! kyctrust-admin = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! # Atomicity
//!
//! Unlike the file store, `update` runs inside a transaction with
//! `SELECT ... FOR UPDATE`, so concurrent patches to the same order are
//! serialized by the database.

use crate::core::error::{AppResult, StorageError};
use crate::core::order::{NewOrder, Order, OrderPatch, OrderStatus};
use crate::core::repository::OrderRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

const ORDER_COLUMNS: &str =
    "id, created_at, updated_at, customer_name, contact, service_id, amount, notes, status";

type OrderRow = (
    Uuid,
    DateTime<Utc>,
    DateTime<Utc>,
    String,
    String,
    String,
    f64,
    Option<String>,
    String,
);

/// Create the `orders` table and its index (idempotent).
///
/// Safe to call on every startup.
pub async fn ensure_schema(pool: &PgPool) -> AppResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS orders (
            id UUID PRIMARY KEY,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            customer_name TEXT NOT NULL,
            contact TEXT NOT NULL,
            service_id TEXT NOT NULL,
            amount DOUBLE PRECISION NOT NULL CHECK (amount >= 0),
            notes TEXT NULL,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'processing', 'completed', 'cancelled'))
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_created_at ON orders (created_at DESC)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Order repository backed by PostgreSQL
#[derive(Clone, Debug)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Create a repository over an existing connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect, then make sure the schema exists
    pub async fn connect(url: &str, max_connections: u32) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| StorageError::Connection {
                backend: "PostgreSQL".to_string(),
                message: e.to_string(),
            })?;
        ensure_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn from_row(row: OrderRow) -> Order {
        let (id, created_at, updated_at, customer_name, contact, service_id, amount, notes, status) =
            row;
        let status = status.parse().unwrap_or_else(|_| {
            tracing::warn!(%id, %status, "unknown order status in database, reading as pending");
            OrderStatus::Pending
        });
        Order {
            id: id.to_string(),
            created_at,
            updated_at,
            customer_name,
            contact,
            service_id,
            amount,
            notes,
            status,
        }
    }

    /// Ids are opaque to callers; anything that is not a UUID cannot exist here
    fn parse_id(id: &str) -> Option<Uuid> {
        Uuid::parse_str(id).ok()
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn list(&self) -> AppResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::from_row).collect())
    }

    async fn get(&self, id: &str) -> AppResult<Option<Order>> {
        let Some(uuid) = Self::parse_id(id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::from_row))
    }

    async fn create(&self, input: NewOrder) -> AppResult<Order> {
        let input = input.validated()?;
        let order = Order::create(input, Utc::now());
        let uuid = Self::parse_id(&order.id).unwrap_or_else(Uuid::new_v4);

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(uuid)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(&order.customer_name)
        .bind(&order.contact)
        .bind(&order.service_id)
        .bind(order.amount)
        .bind(&order.notes)
        .bind(order.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        let created = Self::from_row(row);
        tracing::debug!(id = %created.id, "order created");
        Ok(created)
    }

    async fn update(&self, id: &str, patch: OrderPatch) -> AppResult<Option<Order>> {
        let patch = patch.validated()?;
        let Some(uuid) = Self::parse_id(id) else {
            return Ok(None);
        };

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(uuid)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        let mut order = Self::from_row(row);
        order.apply(patch, Utc::now());

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders \
             SET updated_at = $2, customer_name = $3, contact = $4, service_id = $5, \
                 amount = $6, notes = $7, status = $8 \
             WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(uuid)
        .bind(order.updated_at)
        .bind(&order.customer_name)
        .bind(&order.contact)
        .bind(&order.service_id)
        .bind(order.amount)
        .bind(&order.notes)
        .bind(order.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let updated = Self::from_row(row);
        tracing::debug!(%id, status = %updated.status, "order updated");
        Ok(Some(updated))
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let Some(uuid) = Self::parse_id(id) else {
            return Ok(false);
        };

        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

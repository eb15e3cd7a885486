//! # KYC Trust Admin
//!
//! Order management for the KYC Trust admin dashboard: a small REST API
//! that lets signed-in administrators list, create, update and delete
//! customer orders for verification services.
//!
//! ## Features
//!
//! - **Order lifecycle**: `pending`, `processing`, `completed`, `cancelled`, with partial-patch updates
//! - **Interchangeable storage**: a local JSON document or PostgreSQL (`postgres` feature)
//! - **Admin sessions**: HMAC-signed `admin_token` cookies with per-route permissions
//! - **Typed errors**: every failure maps to one status code and a stable error code
//! - **Configuration**: YAML file plus environment overrides
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kyctrust::prelude::*;
//!
//! let config = AppConfig::load(None)?;
//! ServerBuilder::new(config).serve().await?;
//! ```
//!
//! Using the repository directly:
//!
//! ```rust,ignore
//! let repo = FileOrderRepository::new(".data/orders.json");
//! let order = repo
//!     .create(NewOrder::new("Ahmed", "+201000000000", "kyc-basic", 50.0))
//!     .await?;
//! repo.update(&order.id, OrderPatch::status(OrderStatus::Completed)).await?;
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{
            AdminAccount, AdminDirectory, AdminUser, DEFAULT_ADMIN_EMAIL, RoutePermission,
            RoutePermissions, SESSION_COOKIE, SessionGuard, SessionSigner, WILDCARD_PERMISSION,
            password_digest,
        },
        error::{
            AppError, AppResult, AuthError, ConfigError, ErrorResponse, OrderError, StorageError,
            ValidationError,
        },
        order::{NewOrder, Order, OrderPatch, OrderStatus, OrdersDocument},
        repository::OrderRepository,
    };

    // === Config ===
    pub use crate::config::{AppConfig, SessionConfig, StorageConfig};

    // === Storage ===
    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresOrderRepository;
    pub use crate::storage::{FileOrderRepository, connect_repository};

    // === Server ===
    pub use crate::server::{AppState, CookieSettings, ServerBuilder, build_router};

    // === Re-exports from external crates ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
}

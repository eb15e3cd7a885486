//! Storage implementations for the order repository

pub mod file;
pub mod json_file;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use file::{DEFAULT_ORDERS_PATH, FileOrderRepository};
#[cfg(feature = "postgres")]
pub use postgres::PostgresOrderRepository;

use crate::config::StorageConfig;
use crate::core::OrderRepository;
use crate::core::error::AppResult;
use std::sync::Arc;

/// Open the repository selected by the configuration
///
/// Asking for `postgres` in a build without the `postgres` feature is a
/// [`ConfigError::BackendDisabled`](crate::core::error::ConfigError::BackendDisabled).
pub async fn connect_repository(config: &StorageConfig) -> AppResult<Arc<dyn OrderRepository>> {
    match config {
        StorageConfig::File { path } => {
            tracing::info!(path = %path.display(), "using file-backed order storage");
            Ok(Arc::new(FileOrderRepository::new(path.clone())))
        }
        #[cfg(feature = "postgres")]
        StorageConfig::Postgres {
            url,
            max_connections,
        } => {
            tracing::info!("using PostgreSQL order storage");
            let repository = PostgresOrderRepository::connect(url, *max_connections).await?;
            Ok(Arc::new(repository))
        }
        #[cfg(not(feature = "postgres"))]
        StorageConfig::Postgres { .. } => {
            Err(crate::core::error::ConfigError::BackendDisabled {
                backend: "postgres".to_string(),
            }
            .into())
        }
    }
}

//! Core types: the order entity, the repository seam, auth and errors

pub mod auth;
pub mod error;
pub mod order;
pub mod repository;

pub use auth::{AdminDirectory, AdminUser, RoutePermissions, SessionGuard, SessionSigner};
pub use error::{AppError, AppResult};
pub use order::{NewOrder, Order, OrderPatch, OrderStatus, OrdersDocument};
pub use repository::OrderRepository;

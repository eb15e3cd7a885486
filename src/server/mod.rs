//! HTTP server for the admin API
//!
//! [`ServerBuilder`] turns an [`AppConfig`](crate::config::AppConfig) into an
//! axum `Router`:
//! - order CRUD under `/orders`, guarded by the admin session
//! - admin login, logout and session introspection under `/admin`
//! - an unauthenticated `/health` check

pub mod builder;
pub mod cookies;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use builder::ServerBuilder;
pub use extract::{AdminSession, ClientIp};
pub use router::build_router;
pub use state::{AppState, CookieSettings};

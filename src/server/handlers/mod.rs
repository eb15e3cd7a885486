//! HTTP handlers

pub mod admin;
pub mod orders;

pub use admin::{LoginRequest, health, login, logout, session};
pub use orders::{create_order, delete_order, get_order, list_orders, update_order};

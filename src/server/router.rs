//! Route table

use super::handlers::{
    create_order, delete_order, get_order, health, list_orders, login, logout, session,
    update_order,
};
use super::middleware::with_security_headers;
use super::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Build the full router
///
/// - `GET /health`
/// - `POST /admin/login`, `POST /admin/logout`, `GET /admin/session`
/// - `GET|POST /orders`
/// - `GET|PATCH|DELETE /orders/{id}`
pub fn build_router(state: AppState, production: bool) -> Router {
    let orders = Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/{id}",
            get(get_order).patch(update_order).delete(delete_order),
        );

    let admin = Router::new()
        .route("/admin/login", post(login))
        .route("/admin/logout", post(logout))
        .route("/admin/session", get(session));

    let app = Router::new()
        .route("/health", get(health))
        .merge(orders)
        .merge(admin)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    with_security_headers(app, production)
}

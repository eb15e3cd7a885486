//! HTTP handlers for `/orders`
//!
//! Every handler takes [`AdminSession`] first. Bodies are extracted as
//! `Result<Json<Value>, JsonRejection>` and read field by field, so a
//! mistyped field is a field error rather than a rejection. Validation
//! happens before the repository is called.

use crate::core::error::{AppError, AppResult, OrderError};
use crate::core::order::{NewOrder, OrderPatch};
use crate::server::extract::AdminSession;
use crate::server::state::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

fn not_found(id: String) -> AppError {
    OrderError::NotFound { id }.into()
}

/// `GET /orders`
pub async fn list_orders(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
) -> AppResult<Json<Value>> {
    let orders = state.repository.list().await?;
    Ok(Json(json!({ "orders": orders })))
}

/// `POST /orders`
pub async fn create_order(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Response> {
    let Json(body) = payload?;
    let input = NewOrder::from_json(&body)?;

    let order = state.repository.create(input).await?;
    tracing::info!(id = %order.id, by = %admin.email, "order created");

    Ok((StatusCode::CREATED, Json(json!({ "order": order }))).into_response())
}

/// `GET /orders/{id}`
pub async fn get_order(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let order = state
        .repository
        .get(&id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(json!({ "order": order })))
}

/// `PATCH /orders/{id}`
pub async fn update_order(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(body) = payload?;
    let patch = OrderPatch::from_json(&body)?;

    let order = state
        .repository
        .update(&id, patch)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(id = %order.id, status = %order.status, by = %admin.email, "order updated");

    Ok(Json(json!({ "order": order })))
}

/// `DELETE /orders/{id}`
pub async fn delete_order(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    if !state.repository.delete(&id).await? {
        return Err(not_found(id));
    }
    tracing::info!(%id, by = %admin.email, "order deleted");
    Ok(Json(json!({ "ok": true })))
}

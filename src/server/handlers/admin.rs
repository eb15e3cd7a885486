//! Admin login/logout/session handlers and the health check

use crate::core::error::AppResult;
use crate::server::cookies::{clear_session_cookie, session_cookie};
use crate::server::extract::{AdminSession, ClientIp};
use crate::server::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

/// Body of `POST /admin/login`
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

/// `POST /admin/login`
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = payload?;
    let outcome = state
        .guard
        .login(request.email.as_deref(), &request.password, &ip, Utc::now())?;

    let cookie = session_cookie(&outcome.token, &state.cookies);
    Ok(([(SET_COOKIE, cookie)], Json(json!({ "ok": true }))).into_response())
}

/// `POST /admin/logout`; works without a valid session
pub async fn logout(State(state): State<AppState>, ClientIp(ip): ClientIp) -> Response {
    tracing::info!(%ip, "admin logged out");
    let cookie = clear_session_cookie(&state.cookies);
    ([(SET_COOKIE, cookie)], Json(json!({ "ok": true }))).into_response()
}

/// `GET /admin/session`
pub async fn session(AdminSession(user): AdminSession) -> Json<Value> {
    Json(json!({ "user": user }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "service": env!("CARGO_PKG_NAME"),
        "storage": state.repository.backend(),
    }))
}

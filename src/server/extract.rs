//! Request extractors for the admin API
//!
//! [`AdminSession`] runs the session guard. Put it before any body
//! extractor so that unauthenticated requests are rejected before the body
//! is read or storage is touched.

use super::cookies::read_cookie;
use super::state::AppState;
use crate::core::auth::{AdminUser, SESSION_COOKIE};
use crate::core::error::AppError;
use axum::extract::{ConnectInfo, FromRequestParts, OriginalUri};
use axum::http::request::Parts;
use chrono::Utc;
use std::convert::Infallible;
use std::net::SocketAddr;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Client IP: first `X-Forwarded-For` entry, else the peer address, else `unknown`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(client_ip(parts)))
    }
}

pub(crate) fn client_ip(parts: &Parts) -> String {
    let forwarded = parts
        .headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// The admin behind a valid session that may access the requested path
#[derive(Debug, Clone)]
pub struct AdminSession(pub AdminUser);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, SESSION_COOKIE);
        let ip = client_ip(parts);
        // nested routers strip their prefix from `uri`
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| uri.path().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let user = state
            .guard
            .check(token.as_deref(), &ip, &path, Utc::now())?;
        Ok(AdminSession(user))
    }
}

//! Security response headers
//!
//! Every response gets the same browser hardening headers. HSTS is only sent
//! in production, where the service sits behind TLS.

use axum::Router;
use axum::http::header::{
    CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
    X_CONTENT_TYPE_OPTIONS, X_DNS_PREFETCH_CONTROL, X_FRAME_OPTIONS, X_XSS_PROTECTION,
};
use axum::http::{HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

pub const PERMISSIONS_POLICY: &str =
    "camera=(), microphone=(), geolocation=(), payment=(), usb=(), bluetooth=()";
pub const CONTENT_SECURITY: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-eval' 'unsafe-inline' https://va.vercel-scripts.com; \
    style-src 'self' 'unsafe-inline' https://fonts.googleapis.com; \
    font-src 'self' https://fonts.gstatic.com; \
    img-src 'self' data: https: blob:; \
    connect-src 'self' https://api.whatsapp.com https://wa.me; \
    frame-ancestors 'none'; base-uri 'self'; form-action 'self';";
pub const HSTS: &str = "max-age=31536000; includeSubDomains; preload";

const PERMISSIONS_POLICY_HEADER: HeaderName = HeaderName::from_static("permissions-policy");
const X_ROBOTS_TAG: HeaderName = HeaderName::from_static("x-robots-tag");

fn headers(production: bool) -> Vec<(HeaderName, HeaderValue)> {
    let mut headers = vec![
        (X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (
            REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ),
        (X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block")),
        (
            PERMISSIONS_POLICY_HEADER,
            HeaderValue::from_static(PERMISSIONS_POLICY),
        ),
        (X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("on")),
        (
            CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY),
        ),
        // admin and API responses are never cached or indexed
        (
            CACHE_CONTROL,
            HeaderValue::from_static("no-store, must-revalidate"),
        ),
        (X_ROBOTS_TAG, HeaderValue::from_static("noindex, nofollow")),
    ];
    if production {
        headers.push((STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS)));
    }
    headers
}

/// Wrap `router` so every response carries the security headers
pub fn with_security_headers<S>(router: Router<S>, production: bool) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    headers(production)
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::overriding(name, value))
        })
}

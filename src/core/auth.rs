//! Admin session guard
//!
//! Admin sessions are stateless signed tokens carried in the `admin_token`
//! cookie:
//!
//! ```text
//! hex(json(SessionClaims)) "." hex(HMAC-SHA256(secret, hex(json(SessionClaims))))
//! ```
//!
//! A token is accepted when the signature matches, it has not expired, and
//! its subject still exists in the [`AdminDirectory`]. Permissions are read
//! from the directory on every request, so revoking a permission takes
//! effect without waiting for the token to expire.
//!
//! Which permissions a route needs is plain data ([`RoutePermissions`]),
//! so the mapping can be tested without an HTTP server.

use super::error::AuthError;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use std::collections::BTreeSet;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Email used when a login request omits it
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@kyctrust.com";

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "admin_token";

/// Permission that satisfies every route requirement
pub const WILDCARD_PERMISSION: &str = "all";

// =============================================================================
// Admin directory
// =============================================================================

/// An authenticated administrative user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
    pub email: String,
    pub name: String,
    pub permissions: BTreeSet<String>,
}

impl AdminUser {
    /// True when the user holds at least one of `required`
    pub fn has_any(&self, required: &[String]) -> bool {
        required.iter().any(|p| self.permissions.contains(p))
    }
}

/// A configured admin account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminAccount {
    pub email: String,

    #[serde(default)]
    pub name: String,

    /// Lowercase hex SHA-256 of the password
    pub password_sha256: String,

    #[serde(default)]
    pub permissions: Vec<String>,
}

impl AdminAccount {
    pub fn new(email: impl Into<String>, password: &str, permissions: &[&str]) -> Self {
        Self {
            email: email.into(),
            name: String::new(),
            password_sha256: password_digest(password),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn user(&self) -> AdminUser {
        AdminUser {
            email: self.email.clone(),
            name: if self.name.is_empty() {
                self.email.clone()
            } else {
                self.name.clone()
            },
            permissions: self.permissions.iter().cloned().collect(),
        }
    }

    fn password_matches(&self, password: &str) -> bool {
        let Ok(expected) = hex::decode(self.password_sha256.trim()) else {
            return false;
        };
        let actual = Sha256::digest(password.as_bytes());
        bool::from(expected.as_slice().ct_eq(actual.as_slice()))
    }
}

/// Hex SHA-256 digest of a password, as stored in `password_sha256`
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// The set of admin accounts allowed to log in
#[derive(Debug, Clone, Default)]
pub struct AdminDirectory {
    accounts: Vec<AdminAccount>,
}

impl AdminDirectory {
    pub fn new(accounts: Vec<AdminAccount>) -> Self {
        Self { accounts }
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    fn account(&self, email: &str) -> Option<&AdminAccount> {
        let email = email.trim();
        self.accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
    }

    /// Look up a user by email (case-insensitive)
    pub fn find(&self, email: &str) -> Option<AdminUser> {
        self.account(email).map(AdminAccount::user)
    }

    /// Check a password and return the user on success
    pub fn verify(&self, email: &str, password: &str) -> Option<AdminUser> {
        self.account(email)
            .filter(|a| a.password_matches(password))
            .map(AdminAccount::user)
    }
}

// =============================================================================
// Session tokens
// =============================================================================

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Admin email
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
    /// Client IP the session is bound to, if binding is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Unique token id
    pub jti: String,
}

/// Issues and verifies HMAC-signed session tokens
#[derive(Clone)]
pub struct SessionSigner {
    key: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("key", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionSigner {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            key: secret.as_ref().to_vec(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length")
    }

    /// Issue a token for `subject`, valid for the signer's TTL from `now`
    pub fn issue(&self, subject: &str, ip: Option<&str>, now: DateTime<Utc>) -> String {
        let claims = SessionClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            ip: ip.map(str::to_string),
            jti: Uuid::new_v4().simple().to_string(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &SessionClaims) -> String {
        // Serializing a struct of strings and integers cannot fail
        let json = serde_json::to_vec(claims).unwrap_or_default();
        let payload = hex::encode(json);
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        format!("{payload}.{signature}")
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::Unauthenticated)?;
        let signature = hex::decode(signature).map_err(|_| AuthError::Unauthenticated)?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        if mac.verify_slice(&signature).is_err() {
            tracing::debug!("session token signature mismatch");
            return Err(AuthError::Unauthenticated);
        }

        let json = hex::decode(payload).map_err(|_| AuthError::Unauthenticated)?;
        let claims: SessionClaims =
            serde_json::from_slice(&json).map_err(|_| AuthError::Unauthenticated)?;

        if now.timestamp() >= claims.exp {
            tracing::debug!(sub = %claims.sub, "session token expired");
            return Err(AuthError::Unauthenticated);
        }

        Ok(claims)
    }
}

// =============================================================================
// Route permissions
// =============================================================================

/// Permissions required under a path prefix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePermission {
    pub prefix: String,
    pub permissions: Vec<String>,
}

impl RoutePermission {
    pub fn new(prefix: impl Into<String>, permissions: &[&str]) -> Self {
        Self {
            prefix: prefix.into(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// `/orders` matches `/orders` and `/orders/abc`, not `/ordersx`
    fn matches(&self, path: &str) -> bool {
        let prefix = self.prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return true;
        }
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Route → required permission map; the longest matching prefix applies
#[derive(Debug, Clone, Default)]
pub struct RoutePermissions {
    rules: Vec<RoutePermission>,
}

impl RoutePermissions {
    pub fn new(rules: Vec<RoutePermission>) -> Self {
        Self { rules }
    }

    /// Permissions required for `path`, or `None` when only a session is needed
    pub fn required_for(&self, path: &str) -> Option<&[String]> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(path))
            .max_by_key(|rule| rule.prefix.trim_end_matches('/').len())
            .map(|rule| rule.permissions.as_slice())
    }
}

// =============================================================================
// Guard
// =============================================================================

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: AdminUser,
}

/// Validates admin sessions and route permissions
#[derive(Debug, Clone)]
pub struct SessionGuard {
    signer: SessionSigner,
    directory: AdminDirectory,
    routes: RoutePermissions,
    bind_to_ip: bool,
}

impl SessionGuard {
    pub fn new(signer: SessionSigner, directory: AdminDirectory, routes: RoutePermissions) -> Self {
        Self {
            signer,
            directory,
            routes,
            bind_to_ip: false,
        }
    }

    /// Only accept a token from the IP that logged in
    pub fn with_ip_binding(mut self, bind_to_ip: bool) -> Self {
        self.bind_to_ip = bind_to_ip;
        self
    }

    pub fn signer(&self) -> &SessionSigner {
        &self.signer
    }

    pub fn directory(&self) -> &AdminDirectory {
        &self.directory
    }

    /// Check credentials and issue a fresh session token
    pub fn login(
        &self,
        email: Option<&str>,
        password: &str,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, AuthError> {
        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_ADMIN_EMAIL);

        if password.is_empty() {
            tracing::warn!(%email, %ip, "admin login rejected: empty password");
            return Err(AuthError::InvalidCredentials);
        }

        let Some(user) = self.directory.verify(email, password) else {
            tracing::warn!(%email, %ip, "admin login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let bound_ip = self.bind_to_ip.then_some(ip);
        let token = self.signer.issue(&user.email, bound_ip, now);
        tracing::info!(email = %user.email, %ip, "admin logged in");

        Ok(LoginOutcome { token, user })
    }

    /// Resolve a session token to its admin user
    pub fn authenticate(
        &self,
        token: Option<&str>,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<AdminUser, AuthError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthenticated)?;
        let claims = self.signer.verify(token, now)?;

        if self.bind_to_ip && claims.ip.as_deref() != Some(ip) {
            tracing::warn!(sub = %claims.sub, %ip, "session used from a different IP");
            return Err(AuthError::Unauthenticated);
        }

        self.directory.find(&claims.sub).ok_or_else(|| {
            tracing::warn!(sub = %claims.sub, "session subject no longer exists");
            AuthError::Unauthenticated
        })
    }

    /// Check the route permission map for `path`
    pub fn authorize(&self, user: &AdminUser, path: &str) -> Result<(), AuthError> {
        let Some(required) = self.routes.required_for(path) else {
            return Ok(());
        };
        if user.has_any(required) {
            Ok(())
        } else {
            tracing::warn!(email = %user.email, %path, ?required, "permission denied");
            Err(AuthError::Forbidden {
                required: required.to_vec(),
            })
        }
    }

    /// Authenticate then authorize
    pub fn check(
        &self,
        token: Option<&str>,
        ip: &str,
        path: &str,
        now: DateTime<Utc>,
    ) -> Result<AdminUser, AuthError> {
        let user = self.authenticate(token, ip, now)?;
        self.authorize(&user, path)?;
        Ok(user)
    }
}

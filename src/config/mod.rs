//! Configuration loading and management
//!
//! Configuration comes from an optional YAML file, then environment
//! variables override individual keys:
//!
//! ```yaml
//! bind: 0.0.0.0:3000
//! production: true
//! storage:
//!   backend: file
//!   path: /var/lib/kyctrust/orders.json
//! session:
//!   ttl_secs: 86400
//!   secure_cookie: true
//! admins:
//!   - email: admin@kyctrust.com
//!     name: Admin
//!     password_sha256: 5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8
//!     permissions: [all]
//! route_permissions:
//!   - prefix: /orders
//!     permissions: [orders, all]
//! ```

use crate::core::auth::{
    AdminAccount, AdminDirectory, DEFAULT_ADMIN_EMAIL, RoutePermission, RoutePermissions,
    SessionGuard, SessionSigner, WILDCARD_PERMISSION,
};
use crate::core::error::ConfigError;
use crate::storage::DEFAULT_ORDERS_PATH;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Default listen address
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Default session lifetime: 24 hours
pub const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;

/// Longest accepted session lifetime: 30 days
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 86_400;

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_orders_path() -> PathBuf {
    PathBuf::from(DEFAULT_ORDERS_PATH)
}

fn default_max_connections() -> u32 {
    5
}

fn default_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

fn default_true() -> bool {
    true
}

fn default_route_permissions() -> Vec<RoutePermission> {
    vec![RoutePermission::new("/orders", &["orders", WILDCARD_PERMISSION])]
}

/// Where orders are persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// A single JSON document on local disk
    File {
        #[serde(default = "default_orders_path")]
        path: PathBuf,
    },

    /// A PostgreSQL database (requires the `postgres` feature)
    Postgres {
        url: String,
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::File {
            path: default_orders_path(),
        }
    }
}

/// Admin session settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// HMAC key for session tokens; a random key is generated when unset
    #[serde(default)]
    pub secret: Option<String>,

    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Mark the cookie `Secure`. Turn off only for plain-HTTP local development.
    #[serde(default = "default_true")]
    pub secure_cookie: bool,

    /// Reject a token presented from a different IP than the one that logged in
    #[serde(default)]
    pub bind_to_ip: bool,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("ttl_secs", &self.ttl_secs)
            .field("secure_cookie", &self.secure_cookie)
            .field("bind_to_ip", &self.bind_to_ip)
            .finish()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: None,
            ttl_secs: DEFAULT_SESSION_TTL_SECS,
            secure_cookie: true,
            bind_to_ip: false,
        }
    }
}

impl SessionConfig {
    /// Build the token signer
    ///
    /// Without a configured secret, sessions only survive until restart.
    pub fn signer(&self) -> SessionSigner {
        let ttl = i64::try_from(self.ttl_secs.min(MAX_SESSION_TTL_SECS))
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(|| chrono::Duration::seconds(DEFAULT_SESSION_TTL_SECS as i64));
        match &self.secret {
            Some(secret) => SessionSigner::new(secret, ttl),
            None => {
                tracing::warn!(
                    "no session secret configured; generating a random one, sessions will not survive a restart"
                );
                let secret = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
                SessionSigner::new(secret, ttl)
            }
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Enables HSTS
    #[serde(default)]
    pub production: bool,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub admins: Vec<AdminAccount>,

    #[serde(default = "default_route_permissions")]
    pub route_permissions: Vec<RoutePermission>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            production: false,
            storage: StorageConfig::default(),
            session: SessionConfig::default(),
            admins: Vec::new(),
            route_permissions: default_route_permissions(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.display().to_string()),
            message: e.to_string(),
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: None,
            message: e.to_string(),
        })
    }

    /// File (if any), then process environment, then validation
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        let config = config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay the process environment
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`
    ///
    /// `DATABASE_URL` selects PostgreSQL and takes precedence over
    /// `ORDERS_DB_PATH`. The admin env pair adds an account with the
    /// wildcard permission, or replaces the digest of an existing one.
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(bind) = var("KYCTRUST_BIND") {
            self.bind = bind;
        }

        if let Some(production) = var("KYCTRUST_PRODUCTION") {
            self.production = parse_bool("KYCTRUST_PRODUCTION", &production)?;
        }

        if let Some(url) = var("DATABASE_URL") {
            let max_connections = match self.storage {
                StorageConfig::Postgres {
                    max_connections, ..
                } => max_connections,
                StorageConfig::File { .. } => default_max_connections(),
            };
            self.storage = StorageConfig::Postgres {
                url,
                max_connections,
            };
        } else if let Some(path) = var("ORDERS_DB_PATH") {
            self.storage = StorageConfig::File {
                path: PathBuf::from(path),
            };
        }

        if let Some(secret) = var("KYCTRUST_SESSION_SECRET") {
            self.session.secret = Some(secret);
        }

        if let Some(digest) = var("KYCTRUST_ADMIN_PASSWORD_SHA256") {
            let email = var("KYCTRUST_ADMIN_EMAIL").unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string());
            match self
                .admins
                .iter_mut()
                .find(|a| a.email.eq_ignore_ascii_case(&email))
            {
                Some(account) => account.password_sha256 = digest,
                None => self.admins.push(AdminAccount {
                    email,
                    name: "Admin".to_string(),
                    password_sha256: digest,
                    permissions: vec![WILDCARD_PERMISSION.to_string()],
                }),
            }
        }

        Ok(self)
    }

    /// Reject values that would only fail later at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "bind".to_string(),
                value: self.bind.clone(),
                message: e.to_string(),
            })?;

        if self.session.ttl_secs == 0 || self.session.ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::InvalidValue {
                field: "session.ttl_secs".to_string(),
                value: self.session.ttl_secs.to_string(),
                message: format!("must be between 1 and {MAX_SESSION_TTL_SECS}"),
            });
        }

        if let StorageConfig::Postgres { max_connections: 0, .. } = self.storage {
            return Err(ConfigError::InvalidValue {
                field: "storage.max_connections".to_string(),
                value: "0".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        for account in &self.admins {
            let digest = account.password_sha256.trim();
            if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::InvalidValue {
                    field: format!("admins[{}].password_sha256", account.email),
                    value: "<redacted>".to_string(),
                    message: "expected 64 hex characters (SHA-256)".to_string(),
                });
            }
        }

        for rule in &self.route_permissions {
            if !rule.prefix.starts_with('/') {
                return Err(ConfigError::InvalidValue {
                    field: "route_permissions.prefix".to_string(),
                    value: rule.prefix.clone(),
                    message: "must start with '/'".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Build the admin session guard described by this configuration
    pub fn session_guard(&self) -> SessionGuard {
        if self.admins.is_empty() {
            tracing::warn!("no admin accounts configured; every login will be rejected");
        }
        SessionGuard::new(
            self.session.signer(),
            AdminDirectory::new(self.admins.clone()),
            RoutePermissions::new(self.route_permissions.clone()),
        )
        .with_ip_binding(self.session.bind_to_ip)
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            message: "expected a boolean".to_string(),
        }),
    }
}

//! Typed error handling for the admin service
//!
//! Every failure a request can hit is one of a handful of categories, and
//! each category maps to exactly one HTTP status and a stable error code so
//! that the dashboard can branch on `code` instead of parsing messages.
//!
//! # Error Categories
//!
//! - [`AuthError`]: missing/invalid session, missing permission, bad credentials
//! - [`ValidationError`]: missing, mistyped or out-of-range fields, or a body
//!   that is not a JSON object
//! - [`OrderError`]: no order for the given id
//! - [`StorageError`]: file I/O or hosted store failures
//! - [`ConfigError`]: startup configuration problems
//!
//! Storage failures are rendered with a generic message; the underlying cause
//! is only written to the log.
//!
//! # Example
//!
//! ```rust,ignore
//! let order = repository
//!     .get(&id)
//!     .await?
//!     .ok_or_else(|| OrderError::NotFound { id: id.clone() })?;
//! ```

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type of the service
#[derive(Debug, Error)]
pub enum AppError {
    /// Session and credential errors
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Input validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Order lookup errors
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Storage backend errors
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(e) => e.status_code(),
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Order(OrderError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Auth(e) => e.error_code(),
            AppError::Validation(e) => e.error_code(),
            AppError::Order(OrderError::NotFound { .. }) => "ORDER_NOT_FOUND",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Convert to an error response
    ///
    /// Storage and config failures never expose their cause to the client.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            AppError::Storage(_) | AppError::Config(_) => "internal server error".to_string(),
            other => other.to_string(),
        };

        ErrorResponse {
            code: self.error_code().to_string(),
            message,
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            AppError::Order(OrderError::NotFound { id }) => Some(serde_json::json!({ "id": id })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Auth Errors
// =============================================================================

/// Errors raised by the admin session guard and the login flow
#[derive(Debug, Error)]
pub enum AuthError {
    /// No session, or the session token is invalid/expired/unknown
    #[error("authentication required")]
    Unauthenticated,

    /// Valid session, but none of the route's required permissions
    #[error("insufficient permissions")]
    Forbidden { required: Vec<String> },

    /// Login rejected; deliberately does not say which part was wrong
    #[error("invalid email or password")]
    InvalidCredentials,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "UNAUTHENTICATED",
            AuthError::Forbidden { .. } => "FORBIDDEN",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug, Error)]
pub enum ValidationError {
    /// One or more fields failed their constraints
    #[error("{}", describe_fields(.0))]
    FieldErrors(Vec<FieldValidationError>),

    /// Body is not valid JSON or does not have the expected shape
    #[error("invalid JSON: {message}")]
    InvalidJson { message: String },
}

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl FieldValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn describe_fields(errors: &[FieldValidationError]) -> String {
    let msgs: Vec<String> = errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect();
    format!("validation errors: {}", msgs.join(", "))
}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::FieldErrors(_) => "VALIDATION_ERROR",
            ValidationError::InvalidJson { .. } => "INVALID_JSON",
        }
    }

    /// Names of the fields that failed, in report order
    pub fn fields(&self) -> Vec<&str> {
        match self {
            ValidationError::FieldErrors(errors) => {
                errors.iter().map(|e| e.field.as_str()).collect()
            }
            ValidationError::InvalidJson { .. } => Vec::new(),
        }
    }

    pub fn into_fields(self) -> Vec<FieldValidationError> {
        match self {
            ValidationError::FieldErrors(errors) => errors,
            ValidationError::InvalidJson { .. } => Vec::new(),
        }
    }
}

// =============================================================================
// Order Errors
// =============================================================================

/// Errors related to order lookups
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order '{id}' not found")]
    NotFound { id: String },
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the orders document failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The orders document exists but is not valid JSON for its schema
    #[error("failed to (de)serialize {}: {source}", .path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Hosted store query failed
    #[error("{backend} query error: {message}")]
    Query { backend: String, message: String },

    /// Hosted store could not be reached
    #[error("failed to connect to {backend}: {message}")]
    Connection { backend: String, message: String },
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Failed to parse configuration
    #[error("failed to parse config{}: {message}", .file.as_deref().map(|f| format!(" file '{f}'")).unwrap_or_default())]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    #[error("invalid value '{value}' for '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Selected storage backend was not compiled in
    #[error("storage backend '{backend}' is not enabled in this build")]
    BackendDisabled { backend: String },
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(ValidationError::InvalidJson {
            message: rejection.body_text(),
        })
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldValidationError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = camel_case(&field.to_string());
                errs.iter()
                    .map(|e| {
                        let message = e
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string());
                        FieldValidationError::new(field.clone(), message)
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        ValidationError::FieldErrors(fields)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.into())
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Query {
            backend: "PostgreSQL".to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Storage(err.into())
    }
}

/// `customer_name` -> `customerName`, matching the wire field names
fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for service operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_not_found_status_and_code() {
        let err: AppError = OrderError::NotFound {
            id: "abc".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "ORDER_NOT_FOUND");
        assert_eq!(err.to_response().details.unwrap()["id"], "abc");
    }

    #[test]
    fn test_auth_errors_are_distinct() {
        let unauth: AppError = AuthError::Unauthenticated.into();
        let forbidden: AppError = AuthError::Forbidden {
            required: vec!["orders".to_string()],
        }
        .into();
        assert_eq!(unauth.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_ne!(unauth.error_code(), forbidden.error_code());
    }

    #[test]
    fn test_storage_error_hides_cause() {
        let err: AppError = StorageError::Io {
            path: PathBuf::from("/srv/secret/orders.json"),
            source: std::io::Error::other("disk on fire"),
        }
        .into();
        let response = err.to_response();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.code, "STORAGE_ERROR");
        assert!(!response.message.contains("secret"));
        assert!(!response.message.contains("disk on fire"));
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_field_errors_in_details() {
        let err: AppError = ValidationError::FieldErrors(vec![
            FieldValidationError::new("customerName", "required"),
            FieldValidationError::new("amount", "must be >= 0"),
        ])
        .into();
        let response = err.to_response();
        assert_eq!(response.code, "VALIDATION_ERROR");
        let fields = &response.details.unwrap()["fields"];
        assert_eq!(fields[0]["field"], "customerName");
        assert_eq!(fields[1]["message"], "must be >= 0");
        assert!(err.to_string().contains("customerName"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::ParseError {
            file: Some("kyctrust.yaml".to_string()),
            message: "bad indent".to_string(),
        };
        assert!(err.to_string().contains("kyctrust.yaml"));

        let err = ConfigError::ParseError {
            file: None,
            message: "bad indent".to_string(),
        };
        assert_eq!(err.to_string(), "failed to parse config: bad indent");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("customer_name"), "customerName");
        assert_eq!(camel_case("amount"), "amount");
        assert_eq!(camel_case("service_id"), "serviceId");
    }
}

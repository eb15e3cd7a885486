//! The `Order` entity and its creation/patch payloads

use super::error::{AppResult, FieldValidationError, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of an order
///
/// Any status may move to any other; only the set of values is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ValidationError::FieldErrors(vec![FieldValidationError::new(
                    "status",
                    format!("unknown status '{s}'"),
                )])
            })
    }
}

/// A customer's request for a verification service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer_name: String,
    pub contact: String,
    pub service_id: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
}

impl Order {
    /// Build a new record from validated input
    ///
    /// Assigns a fresh id and sets both timestamps to `now`.
    pub fn create(input: NewOrder, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            customer_name: input.customer_name,
            contact: input.contact,
            service_id: input.service_id,
            amount: input.amount,
            notes: input.notes,
            status: input.status.unwrap_or_default(),
        }
    }

    /// Merge a patch onto this record
    ///
    /// `id` and `created_at` never change. `updated_at` becomes `now`, but
    /// never moves backwards if the clock did.
    pub fn apply(&mut self, patch: OrderPatch, now: DateTime<Utc>) {
        if let Some(customer_name) = patch.customer_name {
            self.customer_name = customer_name;
        }
        if let Some(contact) = patch.contact {
            self.contact = contact;
        }
        if let Some(service_id) = patch.service_id {
            self.service_id = service_id;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = now.max(self.updated_at);
    }
}

/// Payload for `POST /orders`
///
/// Built from a request body with [`NewOrder::from_json`]. `status` is never
/// read from the wire; internal callers may set it with
/// [`NewOrder::with_status`].
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewOrder {
    #[validate(length(min = 1, message = "customer name is required"))]
    pub customer_name: String,

    #[validate(length(min = 3, message = "contact must be at least 3 characters"))]
    pub contact: String,

    #[validate(length(min = 1, message = "service id is required"))]
    pub service_id: String,

    #[validate(range(min = 0.0, message = "amount must not be negative"))]
    pub amount: f64,

    pub notes: Option<String>,

    pub status: Option<OrderStatus>,
}

impl NewOrder {
    pub fn new(
        customer_name: impl Into<String>,
        contact: impl Into<String>,
        service_id: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            customer_name: customer_name.into(),
            contact: contact.into(),
            service_id: service_id.into(),
            amount,
            notes: None,
            status: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Read and validate a request body
    ///
    /// Missing strings, a missing amount and wrongly typed values are all
    /// reported as field errors together with the range and length checks.
    /// Only a body that is not a JSON object is an `INVALID_JSON` error.
    pub fn from_json(body: &Value) -> AppResult<Self> {
        let mut form = FormReader::new(body)?;
        let customer_name = form.string("customerName").unwrap_or_default();
        let contact = form.string("contact").unwrap_or_default();
        let service_id = form.string("serviceId").unwrap_or_default();
        let amount = form.required_number("amount", "amount is required");
        let notes = form.string("notes");

        let input = Self {
            customer_name,
            contact,
            service_id,
            amount: amount.unwrap_or_default(),
            notes,
            status: None,
        }
        .trimmed();
        form.finish(input.validate())?;
        Ok(input)
    }

    /// Trim the string fields and check every constraint
    pub fn validated(self) -> AppResult<Self> {
        let input = self.trimmed();
        input.validate()?;
        Ok(input)
    }

    fn trimmed(mut self) -> Self {
        self.customer_name = trimmed(self.customer_name);
        self.contact = trimmed(self.contact);
        self.service_id = trimmed(self.service_id);
        self
    }
}

/// Payload for `PATCH /orders/{id}`; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct OrderPatch {
    #[validate(length(min = 1, message = "customer name must not be empty"))]
    pub customer_name: Option<String>,

    #[validate(length(min = 3, message = "contact must be at least 3 characters"))]
    pub contact: Option<String>,

    #[validate(length(min = 1, message = "service id must not be empty"))]
    pub service_id: Option<String>,

    #[validate(range(min = 0.0, message = "amount must not be negative"))]
    pub amount: Option<f64>,

    pub notes: Option<String>,

    pub status: Option<OrderStatus>,
}

impl OrderPatch {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Read and validate a request body; see [`NewOrder::from_json`]
    pub fn from_json(body: &Value) -> AppResult<Self> {
        let mut form = FormReader::new(body)?;
        let patch = Self {
            customer_name: form.string("customerName"),
            contact: form.string("contact"),
            service_id: form.string("serviceId"),
            amount: form.number("amount"),
            notes: form.string("notes"),
            status: form.status("status"),
        }
        .trimmed();
        form.finish(patch.validate())?;
        Ok(patch)
    }

    /// Trim the string fields and check every supplied value
    pub fn validated(self) -> AppResult<Self> {
        let patch = self.trimmed();
        patch.validate()?;
        Ok(patch)
    }

    fn trimmed(mut self) -> Self {
        self.customer_name = self.customer_name.map(trimmed);
        self.contact = self.contact.map(trimmed);
        self.service_id = self.service_id.map(trimmed);
        self
    }
}

fn trimmed(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.len() == value.len() {
        value
    } else {
        trimmed.to_string()
    }
}

/// Reads typed fields out of a JSON object body, collecting type errors
struct FormReader<'a> {
    body: &'a Map<String, Value>,
    errors: Vec<FieldValidationError>,
}

impl<'a> FormReader<'a> {
    fn new(body: &'a Value) -> Result<Self, ValidationError> {
        let body = body.as_object().ok_or_else(|| ValidationError::InvalidJson {
            message: "expected a JSON object".to_string(),
        })?;
        Ok(Self {
            body,
            errors: Vec::new(),
        })
    }

    fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldValidationError::new(field, message));
    }

    fn string(&mut self, field: &str) -> Option<String> {
        match self.body.get(field)? {
            Value::String(value) => Some(value.clone()),
            _ => {
                self.reject(field, "expected a string");
                None
            }
        }
    }

    fn number(&mut self, field: &str) -> Option<f64> {
        match self.body.get(field)? {
            Value::Number(value) => value.as_f64(),
            _ => {
                self.reject(field, "expected a number");
                None
            }
        }
    }

    fn required_number(&mut self, field: &str, message: &str) -> Option<f64> {
        if !self.body.contains_key(field) {
            self.reject(field, message);
            return None;
        }
        self.number(field)
    }

    fn status(&mut self, field: &str) -> Option<OrderStatus> {
        match self.string(field)?.parse::<OrderStatus>() {
            Ok(status) => Some(status),
            Err(err) => {
                self.errors.extend(err.into_fields());
                None
            }
        }
    }

    /// Merge collected type errors with the constraint check
    ///
    /// A field with a type error reports only that error.
    fn finish(
        self,
        checked: Result<(), validator::ValidationErrors>,
    ) -> Result<(), ValidationError> {
        let constraints = match checked {
            Ok(()) => Vec::new(),
            Err(failed) => ValidationError::from(failed).into_fields(),
        };
        let mut errors = self.errors;
        let mistyped: Vec<String> = errors.iter().map(|e| e.field.clone()).collect();
        errors.extend(
            constraints
                .into_iter()
                .filter(|e| !mistyped.contains(&e.field)),
        );
        if errors.is_empty() {
            return Ok(());
        }
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        Err(ValidationError::FieldErrors(errors))
    }
}

/// The on-disk document of the file-backed store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrdersDocument {
    #[serde(default)]
    pub orders: Vec<Order>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use chrono::Duration;

    fn ahmed() -> NewOrder {
        NewOrder::new("Ahmed", "+201000000000", "kyc-basic", 50.0)
    }

    fn validation_fields(err: AppError) -> Vec<String> {
        match err {
            AppError::Validation(v) => v.fields().into_iter().map(String::from).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_create_defaults() {
        let now = Utc::now();
        let order = Order::create(ahmed().validated().unwrap(), now);

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.created_at, order.updated_at);
        assert_eq!(order.amount, 50.0);
        assert!(Uuid::parse_str(&order.id).is_ok());
    }

    #[test]
    fn test_create_with_status_override() {
        let order = Order::create(ahmed().with_status(OrderStatus::Processing), Utc::now());
        assert_eq!(order.status, OrderStatus::Processing);
    }

    #[test]
    fn test_new_order_trims_and_rejects_blank() {
        let err = NewOrder::new("   ", "ab ", " ", -1.0).validated().unwrap_err();
        assert_eq!(
            validation_fields(err),
            vec!["amount", "contact", "customerName", "serviceId"]
        );

        let ok = NewOrder::new("  Ahmed ", " +20100 ", "kyc-basic", 0.0)
            .validated()
            .unwrap();
        assert_eq!(ok.customer_name, "Ahmed");
        assert_eq!(ok.contact, "+20100");
    }

    #[test]
    fn test_new_order_ignores_wire_status() {
        let input = NewOrder::from_json(&serde_json::json!({
            "customerName": " Ahmed ",
            "contact": "+201000000000",
            "serviceId": "kyc-basic",
            "amount": 50,
            "status": "completed"
        }))
        .unwrap();
        assert_eq!(input.status, None);
        assert_eq!(input.amount, 50.0);
        assert_eq!(input.customer_name, "Ahmed");
    }

    #[test]
    fn test_missing_strings_become_field_errors() {
        let err = NewOrder::from_json(&serde_json::json!({ "amount": 5 })).unwrap_err();
        assert_eq!(
            validation_fields(err),
            vec!["contact", "customerName", "serviceId"]
        );
    }

    #[test]
    fn test_missing_amount_reported_with_other_fields() {
        let err = NewOrder::from_json(&serde_json::json!({
            "customerName": "",
            "contact": "+2010",
            "serviceId": "kyc"
        }))
        .unwrap_err();
        assert_eq!(validation_fields(err), vec!["amount", "customerName"]);
    }

    #[test]
    fn test_mistyped_fields_report_one_error_each() {
        let err = NewOrder::from_json(&serde_json::json!({
            "customerName": 7,
            "contact": "+2010",
            "serviceId": "kyc",
            "amount": "fifty",
            "notes": ["vip"]
        }))
        .unwrap_err();
        let AppError::Validation(ValidationError::FieldErrors(errors)) = err else {
            panic!("expected field errors");
        };
        let reported: Vec<(&str, &str)> = errors
            .iter()
            .map(|e| (e.field.as_str(), e.message.as_str()))
            .collect();
        assert_eq!(
            reported,
            vec![
                ("amount", "expected a number"),
                ("customerName", "expected a string"),
                ("notes", "expected a string"),
            ]
        );
    }

    #[test]
    fn test_non_object_body_is_invalid_json() {
        for body in [serde_json::json!([1, 2]), serde_json::json!("order"), Value::Null] {
            let err = NewOrder::from_json(&body).unwrap_err();
            assert_eq!(err.error_code(), "INVALID_JSON");
            assert!(OrderPatch::from_json(&body).is_err());
        }
    }

    #[test]
    fn test_apply_only_touches_supplied_fields() {
        let now = Utc::now();
        let mut order = Order::create(ahmed().with_notes("vip"), now);
        let before = order.clone();

        let later = now + Duration::seconds(5);
        order.apply(OrderPatch::status(OrderStatus::Completed), later);

        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.updated_at, later);
        assert_eq!(order.id, before.id);
        assert_eq!(order.created_at, before.created_at);
        assert_eq!(order.customer_name, before.customer_name);
        assert_eq!(order.contact, before.contact);
        assert_eq!(order.service_id, before.service_id);
        assert_eq!(order.amount, before.amount);
        assert_eq!(order.notes, before.notes);
    }

    #[test]
    fn test_apply_never_rewinds_updated_at() {
        let now = Utc::now();
        let mut order = Order::create(ahmed(), now);
        order.apply(OrderPatch::default(), now - Duration::seconds(30));
        assert_eq!(order.updated_at, now);
        assert!(order.created_at <= order.updated_at);
    }

    #[test]
    fn test_patch_validation() {
        let patch = OrderPatch {
            contact: Some(" x ".to_string()),
            amount: Some(-0.5),
            ..OrderPatch::default()
        };
        assert_eq!(
            validation_fields(patch.validated().unwrap_err()),
            vec!["amount", "contact"]
        );
        assert!(OrderPatch::default().validated().unwrap().is_empty());
    }

    #[test]
    fn test_patch_rejects_unknown_status() {
        let err = OrderPatch::from_json(&serde_json::json!({ "status": "shipped" })).unwrap_err();
        assert_eq!(validation_fields(err), vec!["status"]);
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert_eq!("cancelled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);

        let patch =
            OrderPatch::from_json(&serde_json::json!({ "status": "completed", "amount": 0 }))
                .unwrap();
        assert_eq!(patch.status, Some(OrderStatus::Completed));
        assert_eq!(patch.amount, Some(0.0));
    }

    #[test]
    fn test_patch_from_empty_object_is_empty() {
        assert!(OrderPatch::from_json(&serde_json::json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_order_json_shape() {
        let order = Order::create(ahmed(), Utc::now());
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["customerName"], "Ahmed");
        assert_eq!(value["serviceId"], "kyc-basic");
        assert_eq!(value["status"], "pending");
        assert!(value.get("notes").is_none());
        assert!(value["createdAt"].as_str().unwrap().ends_with('Z'));
    }
}

use std::fmt;
use std::str::FromStr;

use lettre::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, Result};

/// Placeholders the front-end sends when the user left the notes box empty.
const EMPTY_NOTE_SENTINELS: [&str; 2] = ["無", "none"];

/// Who a notification is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Admin,
    User,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Admin => "admin",
            Audience::User => "user",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Audience {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "admin" => Ok(Audience::Admin),
            "user" => Ok(Audience::User),
            other => Err(AppError::Validation(format!(
                "type must be \"admin\" or \"user\", got \"{}\"",
                other
            ))),
        }
    }
}

/// The event a notification reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    UserRegistration,
    NewBooking,
    ApprovalResult,
    BookingConfirmation,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::UserRegistration => "user_registration",
            NotificationKind::NewBooking => "new_booking",
            NotificationKind::ApprovalResult => "approval_result",
            NotificationKind::BookingConfirmation => "booking_confirmation",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "user_registration" => Ok(NotificationKind::UserRegistration),
            "new_booking" => Ok(NotificationKind::NewBooking),
            "approval_result" => Ok(NotificationKind::ApprovalResult),
            "booking_confirmation" => Ok(NotificationKind::BookingConfirmation),
            other => Err(AppError::Template(format!(
                "unknown notification_type \"{}\"",
                other
            ))),
        }
    }
}

/// Outcome of an account review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalStatus {
    Approved,
    Rejected,
}

impl FromStr for ApprovalStatus {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(AppError::Validation(format!(
                "approval_status must be \"approved\" or \"rejected\", got \"{}\"",
                other
            ))),
        }
    }
}

/// Template data keyed by field name.
///
/// Values are JSON scalars. Numbers and booleans are used through their JSON
/// text so that e.g. a numeric `booking_id` renders the same as a string one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct TemplateFields(Map<String, Value>);

impl TemplateFields {
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    /// Field value, or `None` when it is absent, null or blank.
    pub fn get(&self, name: &str) -> Result<Option<String>> {
        let text = match self.0.get(name) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(_) => {
                return Err(AppError::Validation(format!(
                    "data.{} must be a string, number or boolean",
                    name
                )))
            }
        };

        Ok(Some(text).filter(|s| !s.trim().is_empty()))
    }

    pub fn require(&self, name: &str) -> Result<String> {
        self.get(name)?
            .ok_or_else(|| AppError::Validation(format!("data.{} is required", name)))
    }

    /// Free-text notes, treating the "nothing entered" placeholders as absent.
    pub fn note(&self, name: &str) -> Result<Option<String>> {
        Ok(self.get(name)?.filter(|note| !is_empty_note(note)))
    }
}

impl<K, V> FromIterator<(K, V)> for TemplateFields
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn is_empty_note(note: &str) -> bool {
    let note = note.trim();
    EMPTY_NOTE_SENTINELS
        .iter()
        .any(|sentinel| note.eq_ignore_ascii_case(sentinel))
}

/// Body of `POST /api/send-email` as sent by the front-end.
///
/// Every field is optional at this level so that missing fields are reported
/// through [`SendEmailRequest::validate`] instead of a bare deserializer error.
#[derive(Debug, Default, Deserialize)]
pub struct SendEmailRequest {
    pub to: Option<String>,
    #[serde(rename = "type")]
    pub audience: Option<String>,
    pub notification_type: Option<String>,
    #[serde(default)]
    pub data: TemplateFields,
}

/// A validated notification request
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub recipient: Address,
    pub audience: Audience,
    pub kind: NotificationKind,
    pub fields: TemplateFields,
}

impl SendEmailRequest {
    pub fn validate(self) -> Result<NotificationRequest> {
        let to = required(self.to, "to")?;
        let audience = required(self.audience, "type")?;
        let kind = required(self.notification_type, "notification_type")?;

        let recipient = to
            .parse::<Address>()
            .map_err(|e| AppError::Validation(format!("to is not a valid email address: {}", e)))?;

        Ok(NotificationRequest {
            recipient,
            audience: audience.parse()?,
            kind: kind.parse()?,
            fields: self.data,
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} is required", name)))
}

/// Success body of `POST /api/send-email`
#[derive(Debug, Serialize, Deserialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "messageId")]
    pub message_id: String,
}

/// Subject line and HTML body of a notification mail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body_html: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> SendEmailRequest {
        serde_json::from_value(body).expect("Should deserialize")
    }

    #[test]
    fn test_validate_complete_request() {
        let validated = request(json!({
            "to": " admin@club.example.com ",
            "type": "admin",
            "notification_type": "new_booking",
            "data": { "real_name": "王小明" }
        }))
        .validate()
        .expect("Should validate");

        assert_eq!(validated.recipient.to_string(), "admin@club.example.com");
        assert_eq!(validated.audience, Audience::Admin);
        assert_eq!(validated.kind, NotificationKind::NewBooking);
        assert_eq!(
            validated.fields.get("real_name").unwrap().as_deref(),
            Some("王小明")
        );
    }

    #[test]
    fn test_missing_recipient_is_validation_error() {
        let result = request(json!({
            "type": "admin",
            "notification_type": "new_booking",
            "data": {}
        }))
        .validate();

        assert!(matches!(result, Err(AppError::Validation(msg)) if msg.contains("to")));
    }

    #[test]
    fn test_invalid_recipient_is_validation_error() {
        let result = request(json!({
            "to": "not-an-address",
            "type": "user",
            "notification_type": "booking_confirmation"
        }))
        .validate();

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_unknown_audience_is_validation_error() {
        let result = request(json!({
            "to": "a@example.com",
            "type": "guest",
            "notification_type": "new_booking"
        }))
        .validate();

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_unknown_kind_is_template_error() {
        let result = request(json!({
            "to": "a@example.com",
            "type": "user",
            "notification_type": "password_reset"
        }))
        .validate();

        assert!(matches!(result, Err(AppError::Template(_))));
    }

    #[test]
    fn test_scalar_fields_are_stringified() {
        let fields: TemplateFields = [
            ("booking_id", json!(42)),
            ("flag", json!(true)),
            ("missing", Value::Null),
            ("blank", json!("  ")),
        ]
        .into_iter()
        .collect();

        assert_eq!(fields.get("booking_id").unwrap().as_deref(), Some("42"));
        assert_eq!(fields.get("flag").unwrap().as_deref(), Some("true"));
        assert_eq!(fields.get("missing").unwrap(), None);
        assert_eq!(fields.get("blank").unwrap(), None);
        assert!(fields.require("blank").is_err());
    }

    #[test]
    fn test_nested_values_are_rejected() {
        let fields: TemplateFields = [("real_name", json!({"first": "A"}))].into_iter().collect();
        assert!(matches!(
            fields.get("real_name"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_note_sentinels() {
        let fields: TemplateFields = [
            ("a", "無"),
            ("b", "None"),
            ("c", ""),
            ("d", "Bring your own cables"),
        ]
        .into_iter()
        .collect();

        assert_eq!(fields.note("a").unwrap(), None);
        assert_eq!(fields.note("b").unwrap(), None);
        assert_eq!(fields.note("c").unwrap(), None);
        assert_eq!(fields.note("absent").unwrap(), None);
        assert_eq!(
            fields.note("d").unwrap().as_deref(),
            Some("Bring your own cables")
        );
    }
}

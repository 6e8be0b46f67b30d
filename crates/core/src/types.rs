use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Raw contact-form body as received over HTTP.
///
/// Fields are kept as loose JSON values so that a missing field and a field
/// of the wrong type can both be reported as validation failures instead of
/// being rejected by the deserializer. The body itself must be a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct ContactFormInput {
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub message: Option<Value>,
}

/// The request body parsed as JSON but was not an object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected a JSON object, found {0}")]
pub struct NotAnObject(&'static str);

impl TryFrom<Value> for ContactFormInput {
    type Error = NotAnObject;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self::from(fields)),
            Value::Null => Err(NotAnObject("null")),
            Value::Bool(_) => Err(NotAnObject("a boolean")),
            Value::Number(_) => Err(NotAnObject("a number")),
            Value::String(_) => Err(NotAnObject("a string")),
            Value::Array(_) => Err(NotAnObject("an array")),
        }
    }
}

impl From<Map<String, Value>> for ContactFormInput {
    fn from(mut fields: Map<String, Value>) -> Self {
        Self {
            name: fields.remove("name"),
            email: fields.remove("email"),
            message: fields.remove("message"),
        }
    }
}

impl ContactFormInput {
    /// Convenience constructor used by tests and tooling.
    pub fn from_strs(name: &str, email: &str, message: &str) -> Self {
        Self {
            name: Some(Value::String(name.to_string())),
            email: Some(Value::String(email.to_string())),
            message: Some(Value::String(message.to_string())),
        }
    }

    pub fn name(&self) -> Option<&str> {
        as_text(&self.name)
    }

    pub fn email(&self) -> Option<&str> {
        as_text(&self.email)
    }

    pub fn message(&self) -> Option<&str> {
        as_text(&self.message)
    }
}

fn as_text(value: &Option<Value>) -> Option<&str> {
    value.as_ref().and_then(Value::as_str)
}

/// A submission that passed validation, with every field trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactDraft {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// A persisted contact-form entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

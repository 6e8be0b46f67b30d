use std::{fmt, sync::LazyLock};

use regex::Regex;
use thiserror::Error;

use crate::types::{ContactDraft, ContactFormInput};

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_MESSAGE_CHARS: usize = 10;

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// A single field rule that a submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    NameTooShort,
    InvalidEmail,
    MessageTooShort,
}

impl Violation {
    /// Returns the user-facing message for the violated rule.
    pub fn message(self) -> &'static str {
        match self {
            Self::NameTooShort => "Name must be at least 2 characters long",
            Self::InvalidEmail => "Please provide a valid email address",
            Self::MessageTooShort => "Message must be at least 10 characters long",
        }
    }

    /// Short label used for log fields and metrics.
    pub fn field(self) -> &'static str {
        match self {
            Self::NameTooShort => "name",
            Self::InvalidEmail => "email",
            Self::MessageTooShort => "message",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Every rule a submission failed, ordered name, email, message.
///
/// Never empty: [`validate`] only constructs it when at least one rule failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", joined(.0))]
pub struct ValidationErrors(Vec<Violation>);

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    /// Returns the user-facing messages in rule order.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|v| v.message().to_string()).collect()
    }
}

fn joined(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Checks every field rule and returns the trimmed draft when all pass.
///
/// Rules are evaluated independently so a caller receives every failure at
/// once. The email shape is checked against the value as submitted, while the
/// returned draft carries the trimmed value.
pub fn validate(input: &ContactFormInput) -> Result<ContactDraft, ValidationErrors> {
    let mut violations = Vec::new();

    let name = input.name().map(str::trim);
    if !name.is_some_and(|value| value.chars().count() >= MIN_NAME_CHARS) {
        violations.push(Violation::NameTooShort);
    }

    let email = input.email();
    if !email.is_some_and(|value| EMAIL_SHAPE.is_match(value)) {
        violations.push(Violation::InvalidEmail);
    }

    let message = input.message().map(str::trim);
    if !message.is_some_and(|value| value.chars().count() >= MIN_MESSAGE_CHARS) {
        violations.push(Violation::MessageTooShort);
    }

    match (name, email, message) {
        (Some(name), Some(email), Some(message)) if violations.is_empty() => Ok(ContactDraft {
            name: name.to_string(),
            email: email.trim().to_string(),
            message: message.to_string(),
        }),
        _ => Err(ValidationErrors(violations)),
    }
}

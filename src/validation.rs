//! Declarative per-field validation of inbound JSON bodies.
//!
//! Each payload type lists its rules as data. [`Valid`] runs them against the
//! raw JSON before deserializing, so every violation is reported at once
//! instead of failing on the first serde error.

use std::borrow::Cow;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::AppError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^[0-9]{10,15}$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
pub enum Check {
    Required,
    MinLen(usize),
    MaxLen(usize),
    Email,
    Phone,
    OneOf(&'static [&'static str]),
}

impl Check {
    fn passes(self, value: &Value) -> bool {
        let text: Cow<'_, str> = match value {
            Value::String(s) => Cow::Borrowed(s.as_str()),
            Value::Number(n) => Cow::Owned(n.to_string()),
            Value::Bool(b) => Cow::Owned(b.to_string()),
            _ => return false,
        };
        match self {
            Check::Required => !text.trim().is_empty(),
            Check::MinLen(min) => text.trim().chars().count() >= min,
            Check::MaxLen(max) => text.chars().count() <= max,
            Check::Email => EMAIL_RE.is_match(text.trim()),
            Check::Phone => PHONE_RE.is_match(&text),
            Check::OneOf(options) => options.iter().any(|o| *o == &*text),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub field: &'static str,
    pub check: Check,
    pub message: &'static str,
    pub optional: bool,
}

impl Rule {
    pub const fn new(field: &'static str, check: Check, message: &'static str) -> Self {
        Self {
            field,
            check,
            message,
            optional: false,
        }
    }

    /// Skip the rule when the field is absent or null.
    pub const fn optional(self) -> Self {
        Rule {
            optional: true,
            ..self
        }
    }
}

/// Payload types that carry their own rule list.
pub trait Validate {
    const RULES: &'static [Rule];
}

/// Runs `rules` in order. Only the first failure per field is reported.
pub fn check(body: &Value, rules: &[Rule]) -> Vec<FieldError> {
    let mut errors: Vec<FieldError> = Vec::new();
    for rule in rules {
        if errors.iter().any(|e| e.field == rule.field) {
            continue;
        }
        let passed = match body.get(rule.field).filter(|v| !v.is_null()) {
            Some(value) => rule.check.passes(value),
            None => rule.optional,
        };
        if !passed {
            errors.push(FieldError {
                field: rule.field.to_string(),
                message: rule.message.to_string(),
            });
        }
    }
    errors
}

/// JSON body extractor that validates against `T::RULES` and then deserializes.
pub struct Valid<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(req, state).await?;
        let errors = check(&body, T::RULES);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        let payload = serde_json::from_value(body)
            .map_err(|e| AppError::bad_request(format!("Invalid request body: {e}")))?;
        Ok(Valid(payload))
    }
}

//! Field-level validation errors shared by every request payload
//!
//! Messages are accumulated per field instead of stopping at the first
//! failure, so a single 422 response lists every problem with the request.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Mapping of field name to the messages describing why it was rejected.
///
/// Nested fields use dotted paths, e.g. `payouts.1.country`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to a field, keeping earlier messages for that field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str, message: &str) -> bool {
        self.get(field)
            .map(|messages| messages.iter().any(|m| m == message))
            .unwrap_or(false)
    }

    /// `Ok(())` when nothing was recorded, otherwise the accumulated errors.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                let message = match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("The {} field is invalid.", humanize(&field)),
                };
                fields.add(field.to_string(), message);
            }
        }
        fields
    }
}

/// Turn a snake_case attribute into the words used in messages.
pub fn humanize(field: &str) -> String {
    field.replace('_', " ")
}

/// Keep an explicit `null` apart from an absent member.
///
/// Use with `#[serde(default, deserialize_with = "present")]`: an absent
/// member stays `None`, while `null` becomes `Some(Value::Null)`.
pub fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Whether a member must be supplied or is only checked when present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Sometimes,
}

/// Read a string member, trimming it. Blank strings count as `null`.
///
/// A missing or null required member is "required"; a null optional member
/// or any non-string value "must be a string".
pub fn string_field(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<&Value>,
    presence: Presence,
) -> Option<String> {
    read_string(errors, field, raw, presence, true)
}

/// Same as [`string_field`] but keeps surrounding whitespace, for passwords.
pub fn secret_field(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<&Value>,
    presence: Presence,
) -> Option<String> {
    read_string(errors, field, raw, presence, false)
}

fn read_string(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<&Value>,
    presence: Presence,
    trim: bool,
) -> Option<String> {
    let blank = match raw {
        None if presence == Presence::Sometimes => return None,
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => {
            let value = if trim { s.trim() } else { s.as_str() };
            if !value.is_empty() {
                return Some(value.to_string());
            }
            true
        }
        Some(_) => false,
    };

    let label = humanize(field);
    if blank && presence == Presence::Required {
        errors.add(field, format!("The {} field is required.", label));
    } else {
        errors.add(field, format!("The {} field must be a string.", label));
    }
    None
}

//! User domain model

use super::common::StringUuid;
use super::validation::{present, secret_field, string_field, FieldErrors, Presence};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: StringUuid,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            name: String::new(),
            email: String::new(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

pub const PASSWORD_MISMATCH_MESSAGE: &str = "The password field confirmation does not match.";

/// Request body for registering a new account
///
/// Members stay untyped until [`RegisterInput::check`] so a wrongly typed
/// value is reported per field alongside every other violation.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RegisterInput {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = String, example = "Ann Advertiser")]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = String, example = "ann@example.com")]
    pub email: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = String, format = Password)]
    pub password: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = String, format = Password)]
    pub password_confirmation: Option<Value>,
}

#[derive(Debug, Validate)]
struct RegisterRules {
    #[validate(length(max = 255, message = "The name field must not be greater than 255 characters."))]
    name: Option<String>,
    #[validate(
        email(message = "The email field must be a valid email address."),
        length(max = 255, message = "The email field must not be greater than 255 characters.")
    )]
    email: Option<String>,
    #[validate(length(min = 6, message = "The password field must be at least 6 characters."))]
    password: Option<String>,
}

/// Registration values that passed every field rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(name: &str, email: &str, password: &str, password_confirmation: &str) -> Self {
        Self {
            name: Some(Value::from(name)),
            email: Some(Value::from(email)),
            password: Some(Value::from(password)),
            password_confirmation: Some(Value::from(password_confirmation)),
        }
    }

    /// Trimmed email, when one was sent as a string
    pub fn email(&self) -> Option<&str> {
        self.email.as_ref().and_then(Value::as_str).map(str::trim)
    }

    pub fn check(&self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::new();
        let rules = RegisterRules {
            name: string_field(&mut errors, "name", self.name.as_ref(), Presence::Required),
            email: string_field(&mut errors, "email", self.email.as_ref(), Presence::Required),
            password: secret_field(
                &mut errors,
                "password",
                self.password.as_ref(),
                Presence::Required,
            ),
        };
        if let Err(e) = rules.validate() {
            errors.merge(e.into());
        }

        if let Some(password) = rules.password.as_deref() {
            let confirmation = self.password_confirmation.as_ref().and_then(Value::as_str);
            if confirmation != Some(password) {
                errors.add("password", PASSWORD_MISMATCH_MESSAGE);
            }
        }

        errors.into_result()?;
        Ok(Registration {
            name: rules.name.unwrap_or_default(),
            email: rules.email.unwrap_or_default(),
            password: rules.password.unwrap_or_default(),
        })
    }
}

/// Request body for exchanging credentials for a token
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LoginInput {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = String, example = "ann@example.com")]
    pub email: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = String, format = Password)]
    pub password: Option<Value>,
}

#[derive(Debug, Validate)]
struct LoginRules {
    #[validate(email(message = "The email field must be a valid email address."))]
    email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: Some(Value::from(email)),
            password: Some(Value::from(password)),
        }
    }

    pub fn check(&self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::new();
        let rules = LoginRules {
            email: string_field(&mut errors, "email", self.email.as_ref(), Presence::Required),
        };
        let password = secret_field(
            &mut errors,
            "password",
            self.password.as_ref(),
            Presence::Required,
        );
        if let Err(e) = rules.validate() {
            errors.merge(e.into());
        }

        errors.into_result()?;
        Ok(Credentials {
            email: rules.email.unwrap_or_default(),
            password: password.unwrap_or_default(),
        })
    }
}

/// Row values for a user about to be inserted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

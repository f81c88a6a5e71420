//! Per-country payout rules attached to a campaign

use super::common::StringUuid;
use super::validation::FieldErrors;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::collections::HashSet;
use std::str::FromStr;
use utoipa::ToSchema;

/// Upper bound on payout rows per campaign
pub const MAX_PAYOUTS_PER_CAMPAIGN: usize = 3;

/// Largest value that fits DECIMAL(8,2)
pub fn max_payout_value() -> Decimal {
    Decimal::new(99_999_999, 2)
}

/// Countries a payout can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Country {
    Estonia,
    Spain,
    Bulgaria,
}

impl Country {
    pub const ALL: [Country; 3] = [Country::Estonia, Country::Spain, Country::Bulgaria];

    pub fn as_str(&self) -> &'static str {
        match self {
            Country::Estonia => "Estonia",
            Country::Spain => "Spain",
            Country::Bulgaria => "Bulgaria",
        }
    }
}

/// Exact, case-sensitive match against the canonical names.
impl FromStr for Country {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Country::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown country: {}", s))
    }
}

impl std::fmt::Display for Country {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl sqlx::Type<sqlx::MySql> for Country {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for Country {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for Country {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> std::result::Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// Stored payout row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payout {
    pub id: StringUuid,
    pub campaign_id: StringUuid,
    pub country: Country,
    #[schema(value_type = String, example = "100.00")]
    pub payout_value: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A payout accepted by [`validate_payouts`], ready to persist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewPayout {
    pub country: Country,
    #[schema(value_type = String, example = "100.00")]
    pub payout_value: Decimal,
}

/// Validate the raw `payouts` member of a request body.
///
/// Collection rules (shape, count, country uniqueness) report under
/// `payouts`; entry rules report under `payouts.<index>.<field>`. Every rule
/// is evaluated, so one response carries all violations.
pub fn validate_payouts(raw: &Value) -> std::result::Result<Vec<NewPayout>, FieldErrors> {
    let mut errors = FieldErrors::new();

    let entries = match raw {
        Value::Array(entries) => entries,
        _ => {
            errors.add("payouts", "The payouts field must be an array.");
            return Err(errors);
        }
    };

    if entries.is_empty() {
        errors.add("payouts", "The payouts field must have at least 1 items.");
        return Err(errors);
    }

    if entries.len() > MAX_PAYOUTS_PER_CAMPAIGN {
        errors.add(
            "payouts",
            format!(
                "A maximum of {} payouts are allowed.",
                MAX_PAYOUTS_PER_CAMPAIGN
            ),
        );
    }

    let mut seen = HashSet::new();
    let has_duplicates = entries
        .iter()
        .map(normalized_country)
        .any(|country| !seen.insert(country));
    if has_duplicates {
        errors.add("payouts", "Each payout must have a unique country.");
    }

    let mut accepted = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let country = validate_country(index, entry.get("country"), &mut errors);
        let value = validate_payout_value(index, entry.get("payout_value"), &mut errors);
        if let (Some(country), Some(payout_value)) = (country, value) {
            accepted.push(NewPayout {
                country,
                payout_value,
            });
        }
    }

    errors.into_result().map(|_| accepted)
}

/// Country key used for the uniqueness check; missing or non-text countries
/// collapse to their string form or the empty string.
fn normalized_country(entry: &Value) -> String {
    match entry.get("country") {
        Some(Value::String(s)) => s.trim().to_lowercase(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn validate_country(index: usize, raw: Option<&Value>, errors: &mut FieldErrors) -> Option<Country> {
    let field = format!("payouts.{}.country", index);
    match raw {
        None | Some(Value::Null) => {
            errors.add(&field, format!("The {} field is required.", field));
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.add(&field, format!("The {} field is required.", field));
            None
        }
        Some(Value::String(s)) => match s.trim().parse::<Country>() {
            Ok(country) => Some(country),
            Err(_) => {
                errors.add(&field, format!("The selected {} is invalid.", field));
                None
            }
        },
        Some(_) => {
            errors.add(&field, format!("The selected {} is invalid.", field));
            None
        }
    }
}

fn validate_payout_value(
    index: usize,
    raw: Option<&Value>,
    errors: &mut FieldErrors,
) -> Option<Decimal> {
    let field = format!("payouts.{}.payout_value", index);

    let parsed = match raw {
        None | Some(Value::Null) => {
            errors.add(&field, format!("The {} field is required.", field));
            return None;
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.add(&field, format!("The {} field is required.", field));
            return None;
        }
        Some(Value::String(s)) => parse_decimal(s.trim()),
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(_) => None,
    };

    let Some(value) = parsed else {
        errors.add(&field, format!("The {} field must be a number.", field));
        return None;
    };

    if value.is_sign_negative() && !value.is_zero() {
        errors.add(&field, format!("The {} field must be at least 0.", field));
        return None;
    }
    if value > max_payout_value() {
        errors.add(
            &field,
            format!(
                "The {} field must not be greater than {}.",
                field,
                max_payout_value()
            ),
        );
        return None;
    }

    let mut value = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(2);
    Some(value)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

//! Campaign domain model

use super::common::StringUuid;
use super::payout::{validate_payouts, NewPayout, Payout};
use super::validation::{present, string_field, FieldErrors, Presence};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Whether a campaign is currently serving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Active,
    #[default]
    Paused,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Active => "active",
            ActivityStatus::Paused => "paused",
        }
    }
}

/// Strict lowercase match; the column is an ENUM of exactly these values.
impl std::str::FromStr for ActivityStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(ActivityStatus::Active),
            "paused" => Ok(ActivityStatus::Paused),
            _ => Err(format!("Unknown activity status: {}", s)),
        }
    }
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for ActivityStatus {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl sqlx::Type<sqlx::MySql> for ActivityStatus {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for ActivityStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> std::result::Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// Campaign entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Campaign {
    pub id: StringUuid,
    pub advertiser_id: StringUuid,
    pub title: String,
    pub landing_page_url: String,
    pub activity_status: ActivityStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Campaign {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            advertiser_id: StringUuid::new_v4(),
            title: String::new(),
            landing_page_url: String::new(),
            activity_status: ActivityStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Campaign with its payout rows embedded (API representation)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CampaignWithPayouts {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub payouts: Vec<Payout>,
}

/// Request body for `POST /api/campaigns`
///
/// Members stay untyped until checked so a wrongly typed value becomes a
/// field error next to every other violation in the body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateCampaignInput {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = String)]
    pub title: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = String)]
    pub landing_page_url: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<NewPayout>>)]
    pub payouts: Option<Value>,
}

/// Request body for `PUT /api/campaigns/{id}`; every member is optional.
///
/// A member that is sent must carry a value: `null` or a blank string is
/// rejected rather than treated as absent.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateCampaignInput {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub title: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub landing_page_url: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<NewPayout>>)]
    pub payouts: Option<Value>,
}

/// Request body for `PATCH /api/campaigns/{id}/status`
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateStatusInput {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = ActivityStatus)]
    pub activity_status: Option<Value>,
}

/// Validated values for a campaign insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewCampaign {
    pub title: String,
    pub landing_page_url: String,
    pub payouts: Vec<NewPayout>,
}

/// Validated partial update; `payouts: Some(..)` replaces the whole set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignChanges {
    pub title: Option<String>,
    pub landing_page_url: Option<String>,
    pub payouts: Option<Vec<NewPayout>>,
}

impl CampaignChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.landing_page_url.is_none() && self.payouts.is_none()
    }
}

/// Listing filter for an advertiser's campaigns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignFilter {
    /// Case-insensitive substring of the title
    pub title_contains: Option<String>,
    pub status: Option<ActivityStatus>,
}

#[derive(Validate)]
struct CampaignRules {
    #[validate(length(max = 255, message = "The title field must not be greater than 255 characters."))]
    title: Option<String>,
    #[validate(url(message = "The landing page url field must be a valid URL."))]
    landing_page_url: Option<String>,
}

/// Field rules and payout rules reported together
fn check_campaign(
    title: Option<&Value>,
    landing_page_url: Option<&Value>,
    payouts: Option<&Value>,
    presence: Presence,
) -> std::result::Result<(CampaignRules, Option<Vec<NewPayout>>), FieldErrors> {
    let mut errors = FieldErrors::new();
    let rules = CampaignRules {
        title: string_field(&mut errors, "title", title, presence),
        landing_page_url: string_field(&mut errors, "landing_page_url", landing_page_url, presence),
    };
    if let Err(e) = rules.validate() {
        errors.merge(FieldErrors::from(e));
    }

    let accepted = match payouts.map(validate_payouts) {
        Some(Ok(accepted)) => Some(accepted),
        Some(Err(payout_errors)) => {
            errors.merge(payout_errors);
            None
        }
        None => None,
    };

    errors.into_result()?;
    Ok((rules, accepted))
}

impl CreateCampaignInput {
    pub fn into_new_campaign(self) -> std::result::Result<NewCampaign, FieldErrors> {
        let (rules, payouts) = check_campaign(
            self.title.as_ref(),
            self.landing_page_url.as_ref(),
            self.payouts.as_ref(),
            Presence::Required,
        )?;

        Ok(NewCampaign {
            title: rules.title.unwrap_or_default(),
            landing_page_url: rules.landing_page_url.unwrap_or_default(),
            payouts: payouts.unwrap_or_default(),
        })
    }
}

impl UpdateCampaignInput {
    pub fn into_changes(self) -> std::result::Result<CampaignChanges, FieldErrors> {
        let (rules, payouts) = check_campaign(
            self.title.as_ref(),
            self.landing_page_url.as_ref(),
            self.payouts.as_ref(),
            Presence::Sometimes,
        )?;

        Ok(CampaignChanges {
            title: rules.title,
            landing_page_url: rules.landing_page_url,
            payouts,
        })
    }
}

impl UpdateStatusInput {
    pub fn into_status(self) -> std::result::Result<ActivityStatus, FieldErrors> {
        let mut errors = FieldErrors::new();
        match self.activity_status.as_ref() {
            None | Some(Value::Null) => errors.add(
                "activity_status",
                "The activity status field is required.",
            ),
            Some(Value::String(raw)) if raw.trim().is_empty() => errors.add(
                "activity_status",
                "The activity status field is required.",
            ),
            Some(raw) => match raw.as_str().map(|s| s.trim().parse::<ActivityStatus>()) {
                Some(Ok(status)) => return Ok(status),
                _ => errors.add(
                    "activity_status",
                    "The selected activity status is invalid.",
                ),
            },
        }
        Err(errors)
    }
}

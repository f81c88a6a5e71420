//! Advertiser domain model

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Advertiser entity, one-to-one with the user that registered it
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Advertiser {
    pub id: StringUuid,
    pub user_id: StringUuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Advertiser {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            user_id: StringUuid::new_v4(),
            name: String::new(),
            email: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

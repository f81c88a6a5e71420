//! Advertiser repository

use crate::domain::{Advertiser, StringUuid};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdvertiserRepository: Send + Sync {
    async fn find_by_user_id(&self, user_id: StringUuid) -> Result<Option<Advertiser>>;
}

pub struct AdvertiserRepositoryImpl {
    pool: MySqlPool,
}

impl AdvertiserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdvertiserRepository for AdvertiserRepositoryImpl {
    async fn find_by_user_id(&self, user_id: StringUuid) -> Result<Option<Advertiser>> {
        let advertiser = sqlx::query_as::<_, Advertiser>(
            r#"
            SELECT id, user_id, name, email, created_at, updated_at
            FROM advertisers
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(advertiser)
    }
}

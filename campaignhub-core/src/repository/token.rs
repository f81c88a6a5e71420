//! Personal access token repository

use crate::domain::{PersonalAccessToken, StringUuid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn create(&self, token: &PersonalAccessToken) -> Result<PersonalAccessToken>;
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<PersonalAccessToken>>;
    async fn touch_last_used(&self, id: StringUuid) -> Result<()>;
    async fn delete(&self, id: StringUuid) -> Result<()>;
}

pub struct TokenRepositoryImpl {
    pool: MySqlPool,
}

impl TokenRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for TokenRepositoryImpl {
    async fn create(&self, token: &PersonalAccessToken) -> Result<PersonalAccessToken> {
        sqlx::query(
            r#"
            INSERT INTO personal_access_tokens (id, user_id, name, token_hash, token_prefix, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, NOW())
            "#,
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.name)
        .bind(&token.token_hash)
        .bind(&token.token_prefix)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await?;

        self.find_by_hash(&token.token_hash)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create access token")))
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<PersonalAccessToken>> {
        let token = sqlx::query_as::<_, PersonalAccessToken>(
            r#"
            SELECT id, user_id, name, token_hash, token_prefix, last_used_at, expires_at, created_at
            FROM personal_access_tokens
            WHERE token_hash = ?
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn touch_last_used(&self, id: StringUuid) -> Result<()> {
        sqlx::query("UPDATE personal_access_tokens SET last_used_at = NOW() WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: StringUuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM personal_access_tokens WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Access token {} not found", id)));
        }
        Ok(())
    }
}

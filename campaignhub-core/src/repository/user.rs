//! User repository

use crate::domain::{Advertiser, NewUser, StringUuid, User};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and its advertiser in one transaction.
    async fn create_with_advertiser(&self, input: &NewUser) -> Result<(User, Advertiser)>;
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
}

pub struct UserRepositoryImpl {
    pool: MySqlPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create_with_advertiser(&self, input: &NewUser) -> Result<(User, Advertiser)> {
        let user_id = StringUuid::new_v4();
        let advertiser_id = StringUuid::new_v4();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.password_hash)
        .execute(&mut *tx)
        .await
        .map_err(map_duplicate_email)?;

        sqlx::query(
            r#"
            INSERT INTO advertisers (id, user_id, name, email, created_at, updated_at)
            VALUES (?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(advertiser_id)
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.email)
        .execute(&mut *tx)
        .await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let advertiser = sqlx::query_as::<_, Advertiser>(
            r#"
            SELECT id, user_id, name, email, created_at, updated_at
            FROM advertisers
            WHERE id = ?
            "#,
        )
        .bind(advertiser_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((user, advertiser))
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

fn map_duplicate_email(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &error {
        if db_err.is_unique_violation() {
            return AppError::Conflict("Email already registered".to_string());
        }
    }
    AppError::Database(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::*;

    #[tokio::test]
    async fn test_mock_find_by_email() {
        let mut mock = MockUserRepository::new();
        mock.expect_find_by_email()
            .with(eq("ann@example.com"))
            .returning(|email| {
                Ok(Some(User {
                    email: email.to_string(),
                    ..Default::default()
                }))
            });

        let user = mock.find_by_email("ann@example.com").await.unwrap().unwrap();
        assert_eq!(user.email, "ann@example.com");
    }

    #[tokio::test]
    async fn test_mock_find_by_id_not_found() {
        let mut mock = MockUserRepository::new();
        mock.expect_find_by_id().returning(|_| Ok(None));

        assert!(mock.find_by_id(StringUuid::new_v4()).await.unwrap().is_none());
    }
}

//! Account registration, login and personal access token handling

use crate::domain::{
    Advertiser, Credentials, FieldErrors, LoginInput, NewUser, PersonalAccessToken, RegisterInput,
    Registration, StringUuid, User,
};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::repository::{AdvertiserRepository, TokenRepository, UserRepository};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use metrics::counter;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;

const TOKEN_PREFIX: &str = "chp_";
const TOKEN_RANDOM_BYTES: usize = 40;
const TOKEN_NAME: &str = "auth_token";

pub const EMAIL_TAKEN_MESSAGE: &str = "The email has already been taken.";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "The provided credentials are incorrect.";

/// A freshly registered account and its first token
#[derive(Debug, Clone)]
pub struct RegisteredAccount {
    pub user: User,
    pub advertiser: Advertiser,
    pub token: String,
}

pub struct AuthService<U: UserRepository, A: AdvertiserRepository, T: TokenRepository + 'static> {
    user_repo: Arc<U>,
    advertiser_repo: Arc<A>,
    token_repo: Arc<T>,
    token_ttl: Option<Duration>,
}

impl<U: UserRepository, A: AdvertiserRepository, T: TokenRepository + 'static>
    AuthService<U, A, T>
{
    pub fn new(
        user_repo: Arc<U>,
        advertiser_repo: Arc<A>,
        token_repo: Arc<T>,
        token_ttl_secs: Option<i64>,
    ) -> Self {
        Self {
            user_repo,
            advertiser_repo,
            token_repo,
            token_ttl: token_ttl_secs.map(Duration::seconds),
        }
    }

    /// Create a user together with its advertiser and issue a token.
    pub async fn register(&self, input: RegisterInput) -> Result<RegisteredAccount> {
        let checked = input.check();
        let mut errors = checked.as_ref().err().cloned().unwrap_or_default();

        if let Some(email) = input.email() {
            if errors.get("email").is_none()
                && self.user_repo.find_by_email(email).await?.is_some()
            {
                errors.add("email", EMAIL_TAKEN_MESSAGE);
            }
        }
        errors.into_result()?;
        let Registration {
            name,
            email,
            password,
        } = checked?;

        let new_user = NewUser {
            name,
            email,
            password_hash: hash_password(&password)?,
        };

        let (user, advertiser) = self
            .user_repo
            .create_with_advertiser(&new_user)
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => email_taken(),
                other => other,
            })?;

        let token = self.issue_token(user.id).await?;
        counter!("campaignhub_auth_registrations_total").increment(1);
        tracing::info!(user_id = %user.id, advertiser_id = %advertiser.id, "Registered account");

        Ok(RegisteredAccount {
            user,
            advertiser,
            token,
        })
    }

    /// Exchange credentials for a new token.
    pub async fn login(&self, input: LoginInput) -> Result<(User, String)> {
        let Credentials { email, password } = input.check()?;

        let user = match self.user_repo.find_by_email(&email).await? {
            Some(user) if verify_password(&password, &user.password_hash)? => user,
            _ => {
                counter!("campaignhub_auth_login_total", "result" => "failure").increment(1);
                return Err(invalid_credentials());
            }
        };

        let token = self.issue_token(user.id).await?;
        counter!("campaignhub_auth_login_total", "result" => "success").increment(1);
        Ok((user, token))
    }

    /// Revoke the token that authenticated the current request.
    pub async fn logout(&self, token_id: StringUuid) -> Result<()> {
        self.token_repo.delete(token_id).await
    }

    /// Resolve a raw bearer token to the request principal.
    pub async fn authenticate(&self, raw_token: &str) -> Result<AuthUser> {
        let token = self
            .token_repo
            .find_by_hash(&hash_token(raw_token))
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

        if token.is_expired(Utc::now()) {
            return Err(AppError::Unauthorized("Token has expired".to_string()));
        }

        let user = self
            .user_repo
            .find_by_id(token.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;
        let advertiser = self.advertiser_repo.find_by_user_id(user.id).await?;

        // Fire and forget
        let repo = self.token_repo.clone();
        let token_id = token.id;
        tokio::spawn(async move {
            if let Err(e) = repo.touch_last_used(token_id).await {
                tracing::warn!(%token_id, "Failed to update token last_used_at: {}", e);
            }
        });

        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
            advertiser_id: advertiser.map(|a| a.id),
            token_id: token.id,
        })
    }

    pub async fn current_user(&self, user_id: StringUuid) -> Result<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn profile(&self, user_id: StringUuid) -> Result<(User, Option<Advertiser>)> {
        let user = self.current_user(user_id).await?;
        let advertiser = self.advertiser_repo.find_by_user_id(user.id).await?;
        Ok((user, advertiser))
    }

    async fn issue_token(&self, user_id: StringUuid) -> Result<String> {
        let mut random_bytes = vec![0u8; TOKEN_RANDOM_BYTES];
        rand::thread_rng().fill_bytes(&mut random_bytes);
        let raw_token = format!("{}{}", TOKEN_PREFIX, URL_SAFE_NO_PAD.encode(&random_bytes));

        let now = Utc::now();
        let token = PersonalAccessToken {
            id: StringUuid::new_v4(),
            user_id,
            name: TOKEN_NAME.to_string(),
            token_hash: hash_token(&raw_token),
            token_prefix: raw_token[..raw_token.len().min(12)].to_string(),
            last_used_at: None,
            expires_at: self.token_ttl.map(|ttl| now + ttl),
            created_at: now,
        };

        self.token_repo.create(&token).await?;
        Ok(raw_token)
    }
}

fn hash_token(raw_token: &str) -> String {
    hex::encode(Sha256::digest(raw_token.as_bytes()))
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn email_taken() -> AppError {
    let mut errors = FieldErrors::new();
    errors.add("email", EMAIL_TAKEN_MESSAGE);
    AppError::Validation(errors)
}

fn invalid_credentials() -> AppError {
    let mut errors = FieldErrors::new();
    errors.add("email", INVALID_CREDENTIALS_MESSAGE);
    AppError::Validation(errors)
}

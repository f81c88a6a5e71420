//! HTTP API test infrastructure
//!
//! - `TestAppState` implements `HasServices` over in-memory repositories
//! - Tests drive the production `build_router()` with `tower::ServiceExt::oneshot`
//! - JSON request helpers that attach a bearer token when given

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use campaignhub_core::config::{
    AuthConfig, Config, DatabaseConfig, PaginationConfig, TelemetryConfig,
};
use campaignhub_core::domain::{
    ActivityStatus, Advertiser, Campaign, CampaignChanges, CampaignFilter, NewCampaign, NewPayout,
    NewUser, Payout, PersonalAccessToken, StringUuid, User,
};
use campaignhub_core::error::{AppError, Result};
use campaignhub_core::repository::{
    AdvertiserRepository, CampaignRepository, TokenRepository, UserRepository,
};
use campaignhub_core::server::build_router;
use campaignhub_core::service::{AuthService, CampaignService};
use campaignhub_core::state::HasServices;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

// ============================================================================
// Test Configuration
// ============================================================================

pub fn create_test_config() -> Config {
    Config {
        http_host: "127.0.0.1".to_string(),
        http_port: 0,
        environment: "test".to_string(),
        database: DatabaseConfig {
            url: "mysql://localhost/campaignhub_test".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        auth: AuthConfig::default(),
        pagination: PaginationConfig::default(),
        request_timeout_secs: 30,
        cors_allowed_origins: vec!["*".to_string()],
        telemetry: TelemetryConfig {
            metrics_enabled: false,
            ..Default::default()
        },
    }
}

// ============================================================================
// In-memory repositories
// ============================================================================

/// Users and advertisers share one store, like the two tables behind a
/// registration transaction.
#[derive(Default)]
pub struct AccountStore {
    users: RwLock<Vec<User>>,
    advertisers: RwLock<Vec<Advertiser>>,
}

pub struct TestUserRepository {
    store: Arc<AccountStore>,
}

#[async_trait]
impl UserRepository for TestUserRepository {
    async fn create_with_advertiser(&self, input: &NewUser) -> Result<(User, Advertiser)> {
        let mut users = self.store.users.write().await;
        if users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&input.email))
        {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: StringUuid::new_v4(),
            name: input.name.clone(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        let advertiser = Advertiser {
            id: StringUuid::new_v4(),
            user_id: user.id,
            name: input.name.clone(),
            email: input.email.clone(),
            created_at: now,
            updated_at: now,
        };

        users.push(user.clone());
        self.store.advertisers.write().await.push(advertiser.clone());
        Ok((user, advertiser))
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>> {
        let users = self.store.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.store.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

pub struct TestAdvertiserRepository {
    store: Arc<AccountStore>,
}

#[async_trait]
impl AdvertiserRepository for TestAdvertiserRepository {
    async fn find_by_user_id(&self, user_id: StringUuid) -> Result<Option<Advertiser>> {
        let advertisers = self.store.advertisers.read().await;
        Ok(advertisers.iter().find(|a| a.user_id == user_id).cloned())
    }
}

#[derive(Default)]
pub struct TestTokenRepository {
    tokens: RwLock<Vec<PersonalAccessToken>>,
}

#[async_trait]
impl TokenRepository for TestTokenRepository {
    async fn create(&self, token: &PersonalAccessToken) -> Result<PersonalAccessToken> {
        self.tokens.write().await.push(token.clone());
        Ok(token.clone())
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<PersonalAccessToken>> {
        let tokens = self.tokens.read().await;
        Ok(tokens.iter().find(|t| t.token_hash == token_hash).cloned())
    }

    async fn touch_last_used(&self, id: StringUuid) -> Result<()> {
        let mut tokens = self.tokens.write().await;
        if let Some(token) = tokens.iter_mut().find(|t| t.id == id) {
            token.last_used_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn delete(&self, id: StringUuid) -> Result<()> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|t| t.id != id);
        if tokens.len() == before {
            return Err(AppError::NotFound("Token not found".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct TestCampaignRepository {
    campaigns: RwLock<Vec<Campaign>>,
    payouts: RwLock<Vec<Payout>>,
}

impl TestCampaignRepository {
    pub async fn count(&self) -> usize {
        self.campaigns.read().await.len()
    }

    async fn write_payouts(&self, campaign_id: StringUuid, payouts: &[NewPayout]) -> Vec<Payout> {
        let now = Utc::now();
        let rows: Vec<Payout> = payouts
            .iter()
            .map(|p| Payout {
                id: StringUuid::new_v4(),
                campaign_id,
                country: p.country,
                payout_value: p.payout_value,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let mut stored = self.payouts.write().await;
        stored.retain(|p| p.campaign_id != campaign_id);
        stored.extend(rows.iter().cloned());
        rows
    }
}

fn matches_filter(campaign: &Campaign, advertiser_id: StringUuid, filter: &CampaignFilter) -> bool {
    campaign.advertiser_id == advertiser_id
        && filter.status.map_or(true, |s| campaign.activity_status == s)
        && filter.title_contains.as_ref().map_or(true, |needle| {
            campaign
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase())
        })
}

#[async_trait]
impl CampaignRepository for TestCampaignRepository {
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Campaign>> {
        let campaigns = self.campaigns.read().await;
        Ok(campaigns.iter().find(|c| c.id == id).cloned())
    }

    async fn list_payouts(&self, campaign_ids: &[StringUuid]) -> Result<Vec<Payout>> {
        let payouts = self.payouts.read().await;
        Ok(payouts
            .iter()
            .filter(|p| campaign_ids.contains(&p.campaign_id))
            .cloned()
            .collect())
    }

    async fn list_for_advertiser(
        &self,
        advertiser_id: StringUuid,
        filter: &CampaignFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Campaign>> {
        let campaigns = self.campaigns.read().await;
        // Insertion order stands in for created_at; newest first.
        Ok(campaigns
            .iter()
            .rev()
            .filter(|c| matches_filter(c, advertiser_id, filter))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_for_advertiser(
        &self,
        advertiser_id: StringUuid,
        filter: &CampaignFilter,
    ) -> Result<i64> {
        let campaigns = self.campaigns.read().await;
        Ok(campaigns
            .iter()
            .filter(|c| matches_filter(c, advertiser_id, filter))
            .count() as i64)
    }

    async fn create(&self, advertiser_id: StringUuid, input: &NewCampaign) -> Result<Campaign> {
        let now = Utc::now();
        let campaign = Campaign {
            id: StringUuid::new_v4(),
            advertiser_id,
            title: input.title.clone(),
            landing_page_url: input.landing_page_url.clone(),
            activity_status: ActivityStatus::Paused,
            created_at: now,
            updated_at: now,
        };
        self.campaigns.write().await.push(campaign.clone());
        self.write_payouts(campaign.id, &input.payouts).await;
        Ok(campaign)
    }

    async fn update(&self, id: StringUuid, changes: &CampaignChanges) -> Result<Campaign> {
        let updated = {
            let mut campaigns = self.campaigns.write().await;
            let campaign = campaigns
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))?;
            if let Some(title) = &changes.title {
                campaign.title = title.clone();
            }
            if let Some(url) = &changes.landing_page_url {
                campaign.landing_page_url = url.clone();
            }
            campaign.updated_at = Utc::now();
            campaign.clone()
        };

        if let Some(payouts) = &changes.payouts {
            self.write_payouts(id, payouts).await;
        }
        Ok(updated)
    }

    async fn update_status(&self, id: StringUuid, status: ActivityStatus) -> Result<Campaign> {
        let mut campaigns = self.campaigns.write().await;
        let campaign = campaigns
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))?;
        campaign.activity_status = status;
        campaign.updated_at = Utc::now();
        Ok(campaign.clone())
    }

    async fn replace_payouts(
        &self,
        campaign_id: StringUuid,
        payouts: &[NewPayout],
    ) -> Result<Vec<Payout>> {
        Ok(self.write_payouts(campaign_id, payouts).await)
    }

    async fn delete(&self, id: StringUuid) -> Result<()> {
        let mut campaigns = self.campaigns.write().await;
        let before = campaigns.len();
        campaigns.retain(|c| c.id != id);
        if campaigns.len() == before {
            return Err(AppError::NotFound("Campaign not found".to_string()));
        }
        self.payouts.write().await.retain(|p| p.campaign_id != id);
        Ok(())
    }
}

// ============================================================================
// Test application state
// ============================================================================

#[derive(Clone)]
pub struct TestAppState {
    pub config: Arc<Config>,
    pub auth_service:
        Arc<AuthService<TestUserRepository, TestAdvertiserRepository, TestTokenRepository>>,
    pub campaign_service: Arc<CampaignService<TestCampaignRepository>>,
    // Raw stores for test setup and assertions
    pub accounts: Arc<AccountStore>,
    pub token_repo: Arc<TestTokenRepository>,
    pub campaign_repo: Arc<TestCampaignRepository>,
}

impl TestAppState {
    pub fn new() -> Self {
        Self::with_config(create_test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let accounts = Arc::new(AccountStore::default());
        let token_repo = Arc::new(TestTokenRepository::default());
        let campaign_repo = Arc::new(TestCampaignRepository::default());

        let auth_service = Arc::new(AuthService::new(
            Arc::new(TestUserRepository {
                store: accounts.clone(),
            }),
            Arc::new(TestAdvertiserRepository {
                store: accounts.clone(),
            }),
            token_repo.clone(),
            config.auth.token_ttl_secs,
        ));
        let campaign_service = Arc::new(CampaignService::new(campaign_repo.clone()));

        Self {
            config: Arc::new(config),
            auth_service,
            campaign_service,
            accounts,
            token_repo,
            campaign_repo,
        }
    }

    /// Detach the advertiser from a user, leaving the user able to log in.
    pub async fn remove_advertiser(&self, user_id: &str) {
        self.accounts
            .advertisers
            .write()
            .await
            .retain(|a| a.user_id.to_string() != user_id);
    }
}

impl HasServices for TestAppState {
    type UserRepo = TestUserRepository;
    type AdvertiserRepo = TestAdvertiserRepository;
    type TokenRepo = TestTokenRepository;
    type CampaignRepo = TestCampaignRepository;

    fn config(&self) -> &Config {
        &self.config
    }

    fn auth_service(&self) -> &AuthService<Self::UserRepo, Self::AdvertiserRepo, Self::TokenRepo> {
        &self.auth_service
    }

    fn campaign_service(&self) -> &CampaignService<Self::CampaignRepo> {
        &self.campaign_service
    }

    async fn check_ready(&self) -> bool {
        true
    }
}

/// Production router over the in-memory state
pub fn build_test_router(state: TestAppState) -> Router {
    build_router(state)
}

// ============================================================================
// HTTP Test Helpers
// ============================================================================

/// Send a request and parse the JSON response (`Value::Null` for empty bodies)
pub async fn send_json(
    app: &Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();

    if body_bytes.is_empty() {
        return (status, Value::Null);
    }

    (
        status,
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null),
    )
}

/// POST a body verbatim, for payloads that are not valid JSON
pub async fn post_raw(app: &Router, path: &str, token: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();

    (
        status,
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null),
    )
}

pub async fn get_json(app: &Router, path: &str, token: Option<&str>) -> (StatusCode, Value) {
    send_json(app, Method::GET, path, token, None).await
}

pub async fn post_json(
    app: &Router,
    path: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    send_json(app, Method::POST, path, token, Some(body)).await
}

pub async fn put_json(
    app: &Router,
    path: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    send_json(app, Method::PUT, path, token, Some(body)).await
}

pub async fn patch_json(
    app: &Router,
    path: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    send_json(app, Method::PATCH, path, token, Some(body)).await
}

pub async fn delete_json(app: &Router, path: &str, token: Option<&str>) -> (StatusCode, Value) {
    send_json(app, Method::DELETE, path, token, None).await
}

/// Register an account and return `(token, response body)`
pub async fn register(app: &Router, name: &str, email: &str) -> (String, Value) {
    let (status, body) = post_json(
        app,
        "/api/register",
        None,
        json!({
            "name": name,
            "email": email,
            "password": "secret123",
            "password_confirmation": "secret123"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let token = body["token"].as_str().unwrap().to_string();
    (token, body)
}

/// Create a campaign and return its JSON
pub async fn create_campaign(app: &Router, token: &str, title: &str, payouts: Value) -> Value {
    let (status, body) = post_json(
        app,
        "/api/campaigns",
        Some(token),
        json!({
            "title": title,
            "landing_page_url": "https://example.com/landing",
            "payouts": payouts
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    body
}

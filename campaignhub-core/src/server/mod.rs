//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::middleware::{normalize_error_response, ObservabilityLayer};
use crate::openapi::ApiDoc;
use crate::repository::{
    advertiser::AdvertiserRepositoryImpl, campaign::CampaignRepositoryImpl,
    token::TokenRepositoryImpl, user::UserRepositoryImpl,
};
use crate::service::{AuthService, CampaignService};
use crate::state::HasServices;
use anyhow::Result;
use axum::{
    http::HeaderValue,
    routing::{get, patch, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: MySqlPool,
    pub auth_service:
        Arc<AuthService<UserRepositoryImpl, AdvertiserRepositoryImpl, TokenRepositoryImpl>>,
    pub campaign_service: Arc<CampaignService<CampaignRepositoryImpl>>,
}

impl AppState {
    /// Wire repositories and services onto an existing pool
    pub fn new(config: Config, db_pool: MySqlPool) -> Self {
        let user_repo = Arc::new(UserRepositoryImpl::new(db_pool.clone()));
        let advertiser_repo = Arc::new(AdvertiserRepositoryImpl::new(db_pool.clone()));
        let token_repo = Arc::new(TokenRepositoryImpl::new(db_pool.clone()));
        let campaign_repo = Arc::new(CampaignRepositoryImpl::new(db_pool.clone()));

        let auth_service = Arc::new(AuthService::new(
            user_repo,
            advertiser_repo,
            token_repo,
            config.auth.token_ttl_secs,
        ));
        let campaign_service = Arc::new(CampaignService::new(campaign_repo));

        Self {
            config: Arc::new(config),
            db_pool,
            auth_service,
            campaign_service,
        }
    }
}

/// Implement HasServices trait for production AppState
impl HasServices for AppState {
    type UserRepo = UserRepositoryImpl;
    type AdvertiserRepo = AdvertiserRepositoryImpl;
    type TokenRepo = TokenRepositoryImpl;
    type CampaignRepo = CampaignRepositoryImpl;

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
        sqlx::query("SELECT 1").execute(&self.db_pool).await.is_ok()
    }
}

/// Open the MySQL pool described by `config`
pub async fn connect_pool(config: &Config) -> Result<MySqlPool> {
    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;
    Ok(db_pool)
}

/// Run the HTTP server until Ctrl-C
pub async fn run(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    let db_pool = connect_pool(&config).await?;
    info!("Connected to database");

    let http_addr = config.http_addr();
    let state = AppState::new(config, db_pool);

    let metrics_router = Router::new()
        .route("/metrics", get(api::metrics::metrics_handler))
        .with_state(Arc::new(prometheus_handle));
    let app = build_router(state).merge(metrics_router);

    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}

/// Build the HTTP router with generic state type
///
/// This function is generic over the state type, allowing it to work with
/// both production `AppState` and test implementations that implement `HasServices`.
pub fn build_router<S: HasServices>(state: S) -> Router {
    let config = state.config().clone();

    let mut app = Router::new()
        // Health endpoints
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        // Auth endpoints
        .route("/api/register", post(api::auth::register::<S>))
        .route("/api/login", post(api::auth::login::<S>))
        .route("/api/logout", post(api::auth::logout::<S>))
        .route("/api/profile", get(api::auth::profile::<S>))
        .route("/api/user", get(api::auth::current_user::<S>))
        // Campaign endpoints
        .route(
            "/api/campaigns",
            get(api::campaign::list::<S>).post(api::campaign::create::<S>),
        )
        .route(
            "/api/campaigns/{id}",
            get(api::campaign::get::<S>)
                .put(api::campaign::update::<S>)
                .delete(api::campaign::delete::<S>),
        )
        .route(
            "/api/campaigns/{id}/status",
            patch(api::campaign::update_status::<S>),
        )
        .with_state(state);

    if !config.is_production() {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::build()));
    }

    app.layer(ObservabilityLayer)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(axum::middleware::from_fn(normalize_error_response))
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}


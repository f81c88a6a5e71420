//! Configuration management for CampaignHub Core

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Deployment environment ("development", "production", ...)
    pub environment: String,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Personal access token configuration
    pub auth: AuthConfig,
    /// Campaign listing page sizes
    pub pagination: PaginationConfig,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Allowed CORS origins; `*` allows any
    pub cors_allowed_origins: Vec<String>,
    /// Logging and metrics
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Token lifetime; `None` means tokens never expire
    pub token_ttl_secs: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct PaginationConfig {
    pub default_per_page: i64,
    pub max_per_page: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_per_page: 10,
            max_per_page: 100,
        }
    }
}

impl PaginationConfig {
    /// Resolve a requested page size against the configured default and cap.
    pub fn per_page(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_per_page)
            .clamp(1, self.max_per_page.max(1))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "json" or "pretty"
    pub log_format: String,
    pub metrics_enabled: bool,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            service_name: "campaignhub-core".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
            },
            auth: AuthConfig {
                token_ttl_secs: env::var("AUTH_TOKEN_TTL_SECS")
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| v.trim().parse())
                    .transpose()
                    .context("Invalid AUTH_TOKEN_TTL_SECS")?,
            },
            pagination: PaginationConfig {
                default_per_page: env::var("PAGINATION_DEFAULT_PER_PAGE")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("Invalid PAGINATION_DEFAULT_PER_PAGE")?,
                max_per_page: env::var("PAGINATION_MAX_PER_PAGE")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()
                    .context("Invalid PAGINATION_MAX_PER_PAGE")?,
            },
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid REQUEST_TIMEOUT_SECS")?,
            cors_allowed_origins: parse_origins(
                &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
            ),
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
                metrics_enabled: env::var("METRICS_ENABLED")
                    .map(|v| v.to_lowercase() != "false" && v != "0")
                    .unwrap_or(true),
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "campaignhub-core".to_string()),
            },
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

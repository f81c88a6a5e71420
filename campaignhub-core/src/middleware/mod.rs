//! HTTP middleware for CampaignHub Core
//!
//! - Bearer token `AuthUser` extractor
//! - JSON normalization of framework error responses
//! - Request id and HTTP metrics layer

pub mod auth;
pub mod error_response;
pub mod metrics;

pub use auth::AuthUser;
pub use error_response::normalize_error_response;
pub use metrics::ObservabilityLayer;

//! Business logic layer

pub mod auth;
pub mod campaign;

pub use auth::{AuthService, RegisteredAccount};
pub use campaign::CampaignService;

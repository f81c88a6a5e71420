//! Application state traits for dependency injection
//!
//! Handlers are generic over `HasServices`, so the production `AppState`
//! and the in-memory test state share the same router.

use crate::config::Config;
use crate::repository::{
    AdvertiserRepository, CampaignRepository, TokenRepository, UserRepository,
};
use crate::service::{AuthService, CampaignService};

/// Trait for application state that provides access to all services.
pub trait HasServices: Clone + Send + Sync + 'static {
    /// The user repository type
    type UserRepo: UserRepository + 'static;
    /// The advertiser repository type
    type AdvertiserRepo: AdvertiserRepository + 'static;
    /// The personal access token repository type
    type TokenRepo: TokenRepository + 'static;
    /// The campaign repository type
    type CampaignRepo: CampaignRepository + 'static;

    /// Get the application configuration
    fn config(&self) -> &Config;

    /// Get the authentication service
    fn auth_service(&self) -> &AuthService<Self::UserRepo, Self::AdvertiserRepo, Self::TokenRepo>;

    /// Get the campaign service
    fn campaign_service(&self) -> &CampaignService<Self::CampaignRepo>;

    /// Check if the backing store is reachable
    fn check_ready(&self) -> impl std::future::Future<Output = bool> + Send;
}

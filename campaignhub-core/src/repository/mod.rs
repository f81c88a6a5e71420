//! Data access layer (Repository pattern)

pub mod advertiser;
pub mod campaign;
pub mod token;
pub mod user;

pub use advertiser::AdvertiserRepository;
pub use campaign::CampaignRepository;
pub use token::TokenRepository;
pub use user::UserRepository;

//! Domain models for CampaignHub Core

pub mod advertiser;
pub mod campaign;
pub mod common;
pub mod payout;
pub mod token;
pub mod user;
pub mod validation;

pub use advertiser::*;
pub use campaign::*;
pub use common::*;
pub use payout::*;
pub use token::*;
pub use user::*;
pub use validation::*;

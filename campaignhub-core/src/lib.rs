//! CampaignHub Core - Campaign Management Backend
//!
//! REST API for advertisers to manage campaigns and their per-country
//! payouts, authenticated with personal access tokens.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod openapi;
pub mod policy;
pub mod repository;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};

use anyhow::Result;
use campaignhub_core::{config::Config, migration, server, telemetry};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "campaignhub-core")]
#[command(about = "Campaign management backend for advertisers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create the database if missing and apply migrations
    Migrate,
    /// Insert demo advertisers with campaigns and payouts
    Seed {
        /// Number of demo accounts to create
        #[arg(long, default_value_t = 3)]
        accounts: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let prometheus_handle = telemetry::init(&config.telemetry)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            info!(
                environment = %config.environment,
                "Starting CampaignHub Core on {}",
                config.http_addr()
            );
            server::run(config, prometheus_handle).await
        }
        Command::Migrate => migration::run_migrations(&config).await,
        Command::Seed { accounts } => migration::seed_demo_data(&config, accounts).await,
    }
}

//! Shopfront CLI - migrations, catalog seeding, and a text view of the shop.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (needs SHOPFRONT_DATABASE_URL)
//! shopfront migrate
//!
//! # Seed the demo catalog and list it
//! shopfront seed
//!
//! # Scripted sign-in, cart edits, checkout and sign-out
//! shopfront demo
//!
//! # Interactive shell
//! shopfront shell
//! ```
//!
//! The backend is picked by `SHOPFRONT_BACKEND` (`memory` or `postgres`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use shopfront_storefront::{ShopConfig, telemetry};

mod commands;

#[derive(Parser)]
#[command(name = "shopfront")]
#[command(author, version, about = "Shopfront cart and checkout tools")]
struct Cli {
    /// Write logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the product catalog if it is empty and print it
    Seed,
    /// Walk through a scripted shopping session
    Demo,
    /// Start an interactive shell
    Shell,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.json_logs);

    let config = match ShopConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };
    let sentry_guard = telemetry::init_sentry(&config);

    let result = run(cli.command, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &ShopConfig) -> Result<(), commands::CliError> {
    match command {
        Commands::Migrate => commands::migrate::run(config).await,
        Commands::Seed => commands::seed::run(config).await,
        Commands::Demo => commands::demo::run(config).await,
        Commands::Shell => commands::shell::run(config).await,
    }
}

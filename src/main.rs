//! Chatlabs dashboard - analytics backend for chatbot interaction data
//!
//! Serves per-tenant dashboard aggregates built from rows in the tenant's warehouse:
//! - Headline metrics and conversion against matched counterpart rows
//! - Button, interaction-type, topic and country breakdowns
//! - Hourly activity histogram

mod analytics;
mod cli;
mod config;
mod countries;
mod dates;
mod db;
mod error;
mod service;
mod warehouse;
mod web;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use warehouse::token::{HttpTokenSource, TokenCache};

fn init_logging(config: &config::LoggingConfig) {
    // RUST_LOG wins over the configured level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // Use format = "gcp" for structured GCP Cloud Logging
    if config.format == "gcp" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before any other initialization)
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();
    let config = config::Config::load()?;
    init_logging(&config.logging);

    // SQLite creates the file but not its directory
    if let Some(parent) = std::path::Path::new(&config.database.url).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating database directory {}", parent.display()))?;
        }
    }

    let db = db::Database::new(&config.database).await?;
    db.run_migrations().await?;
    info!("Database initialized");

    match cli.command {
        None | Some(cli::Commands::Serve) => {}
        Some(command) => return cli::run_admin(&db, command).await,
    }
    info!("Starting Chatlabs dashboard...");

    let http = reqwest::Client::builder()
        .timeout(config.warehouse.request_timeout())
        .build()?;

    let token_source = Arc::new(HttpTokenSource::new(
        http.clone(),
        &config.warehouse.auth_token_url,
    ));
    let tokens = Arc::new(TokenCache::new(
        token_source,
        config.warehouse.token_lifetime(),
        config.warehouse.token_safety_margin(),
    ));
    let rows = Arc::new(warehouse::WarehouseClient::new(http, &config.warehouse, tokens));
    info!("Warehouse client ready for {}", config.warehouse.api_base_url);

    let dashboard = service::DashboardService::new(Arc::new(db), rows, config.utc_offset());

    web::start_server(&config, dashboard).await?;

    Ok(())
}

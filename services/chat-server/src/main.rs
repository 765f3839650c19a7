//! Chat server for CipherChat
//!
//! Serves the REST interface and the live WebSocket channels over one
//! relay engine backed by Postgres.

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use cipherchat_relay::{ConnectionRegistry, RelayEngine};

mod api;
mod config;
mod error;
mod storage;
mod ws;

use config::ServerConfig;
use storage::PgStorage;

/// Chat server CLI arguments
#[derive(Parser, Debug)]
#[command(name = "chat-server")]
#[command(about = "CipherChat encrypted message relay server")]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Postgres connection string
    #[arg(short, long, env = "DATABASE_URL")]
    database_url: String,

    /// Maximum database connections in the pool
    #[arg(long, default_value = "10")]
    max_db_connections: u32,

    /// Keep plaintext alongside ciphertext in storage
    #[arg(long)]
    retain_plaintext: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Application state
pub struct AppState {
    pub engine: Arc<RelayEngine>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        database_url: args.database_url,
        max_db_connections: args.max_db_connections,
        retain_plaintext: args.retain_plaintext,
        ..Default::default()
    };
    config
        .validate()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    info!("Starting chat server on {}:{}", config.host, config.port);

    // Connect storage (retries while the database comes up)
    let storage = Arc::new(
        PgStorage::connect(&config)
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?,
    );

    let engine = Arc::new(
        RelayEngine::new(storage.clone(), storage, ConnectionRegistry::new())
            .with_plaintext_retention(config.retain_plaintext),
    );

    let app_state = web::Data::new(AppState { engine });

    let (host, port) = (config.host.clone(), config.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .configure(api::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

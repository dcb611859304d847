// ABOUTME: Command-line entry point for key provisioning, JWKS export and the login HTTP adapter
// ABOUTME: Fails fast when signing keys are unavailable in production
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info};
use warden::auth::AuthenticationManager;
use warden::config::ServerConfig;
use warden::database::Database;
use warden::key_management::KeyManager;
use warden::logging;
use warden::routes::{router, AppState};
use warden::session::InMemorySessionStore;

/// Shortest interval between expired-session sweeps
const SESSION_CLEANUP_FLOOR: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "warden")]
#[command(version)]
#[command(about = "Warden identity verification and token issuance core")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load or generate the signing key pair and print its key id
    Keys,
    /// Print the public JWK set
    Jwks,
    /// Serve the login HTTP adapter
    Serve {
        /// Override `HTTP_PORT`
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_from_env()?;

    let config = ServerConfig::from_env()?;
    info!("{}", config.summary());

    let keys = match KeyManager::load_or_generate(&config.keys) {
        Ok(keys) => keys,
        Err(e) => {
            error!("signing keys unavailable, refusing to start: {e}");
            return Err(e).context("failed to load signing keys");
        }
    };

    match cli.command {
        Command::Keys => {
            println!("{}", keys.signing_key_pair().kid());
        }
        Command::Jwks => {
            println!("{}", serde_json::to_string_pretty(&keys.jwks())?);
        }
        Command::Serve { port } => serve(config, keys, port).await?,
    }

    Ok(())
}

async fn serve(config: ServerConfig, keys: KeyManager, port: Option<u16>) -> Result<()> {
    let database = Arc::new(Database::new(&config.database_url).await?);
    let sessions = Arc::new(InMemorySessionStore::new(config.session_ttl));
    let cleanup_period = config
        .session_ttl
        .to_std()
        .unwrap_or(SESSION_CLEANUP_FLOOR)
        .max(SESSION_CLEANUP_FLOOR);
    let session_cleanup = sessions.spawn_cleanup(cleanup_period);
    let auth = AuthenticationManager::new(
        database.clone(),
        database,
        sessions,
        config.bcrypt_cost,
    )
    .context("invalid bcrypt cost")?;

    let state = AppState {
        auth: Arc::new(auth),
        keys: Arc::new(keys),
        secure_cookies: config.environment.is_production(),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.http_port)));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on {addr}");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for shutdown signal: {e}");
        }
    })
    .await?;

    session_cleanup.abort();
    Ok(())
}

use crate::server::{ServerState, cache::ResponseCache};
use federwerk_db::client::{DbClient, DbError, MigrateError};
use serde::Deserialize;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod server;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Error connecting to the database: {0}")]
    Database(#[from] DbError),
    #[error("Error running migrations: {0}")]
    Migrate(#[from] MigrateError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
    database_url: String,
    #[serde(default = "default_posts_per_page")]
    posts_per_page: u32,
    #[serde(default = "default_home_cache_ttl_seconds")]
    home_cache_ttl_seconds: u64,
}

fn default_posts_per_page() -> u32 {
    10
}

fn default_home_cache_ttl_seconds() -> u64 {
    20
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "federwerk_api=debug,federwerk_common=debug,federwerk_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "Failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let db_client = DbClient::connect(&env.database_url, env.posts_per_page).await?;
    db_client.run_migrations().await?;

    let state = ServerState {
        db_client: Arc::new(db_client),
        home_cache: ResponseCache::new(Duration::from_secs(env.home_cache_ttl_seconds)),
    };

    let tracing_layer = TraceLayer::new_for_http();
    let app = server::routes().with_state(state).layer(tracing_layer);

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}

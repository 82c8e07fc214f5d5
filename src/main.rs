use std::net::SocketAddr;
use std::{str::FromStr, sync::Arc};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::{RoleRights, TokenService};
use crate::models::AppState;
use crate::system::{Config, SqliteUserStore};

mod api;
mod core;
mod models;
mod system;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::from_str(&config.log_level)?)
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Log level: {}", config.log_level);
    info!("DB url: {}", config.database_url);

    let pool = system::connect(&config.database_url).await?;
    system::init_db(&pool).await?;

    let state = Arc::new(AppState {
        users: Arc::new(SqliteUserStore::new(pool.clone())),
        tokens: TokenService::new(&config.jwt_secret, config.access_ttl, config.refresh_ttl),
        rights: Arc::new(RoleRights::default()),
        bcrypt_cost: config.bcrypt_cost,
    });

    let app = api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Notes API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(system::shutdown_signal())
        .await?;

    pool.close().await;
    info!("Server closed");
    Ok(())
}

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower::make::Shared;
use tracing_subscriber::EnvFilter;

use inspections_backend::auth::jwt::JwtService;
use inspections_backend::config::AppConfig;
use inspections_backend::routes::create_router;
use inspections_backend::state::AppState;
use inspections_backend::store::FileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "server",
        data_path = %config.data_path,
        server_host = %config.server_host,
        server_port = config.server_port,
        cors_configured = config.cors_allowed_origin.is_some(),
        "loaded backend configuration"
    );

    let store = Arc::new(FileStore::open(&config.data_path)?);
    let jwt = JwtService::from_config(&config)?;
    let state = AppState::new(store, config, jwt);

    // First read seeds the default manager account on a fresh data file.
    let users = state.users().list().await?;
    tracing::info!(user_count = users.len(), "user store ready");

    let listen_addr: SocketAddr = {
        let config = state.config.clone();
        format!("{}:{}", config.server_host, config.server_port).parse()?
    };
    let router = create_router(state);

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(listener, Shared::new(router)).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

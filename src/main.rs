use tienda_admin::{
    app::{app, AppState},
    config,
    database::DatabaseManager,
    is_development,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and friends
    let _ = dotenvy::dotenv();

    let default_filter = if is_development!() {
        "info,tienda_admin=debug,tower_http=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let config = config::config();
    info!("Starting tienda-admin in {:?} mode", config.environment);

    if config.database.run_migrations {
        if let Err(e) = DatabaseManager::migrate().await {
            warn!("Startup migrations failed, continuing without them: {}", e);
        }
    }

    let state = AppState::from_config(config, DatabaseManager::main_pool()?);
    state.uploads.ensure_directory().await?;
    info!("Serving uploads from {}", state.uploads.upload_directory().display());

    let router = app(state, config);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Tienda admin API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    DatabaseManager::close_all().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

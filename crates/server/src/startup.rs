use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Build the router and its store from configuration. No I/O happens here;
/// the store connects on its first request.
pub fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let store = service::storage::build_store(&cfg.store)?;
    info!(backend = ?cfg.store.backend, key_prefix = %cfg.store.key_prefix, "group store configured");
    Ok(routes::build_router(AppState::new(store), build_cors()))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("received Ctrl+C, shutting down");
    }
}

/// Public entry: build the app and serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg)?;
    let addr = cfg.server.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

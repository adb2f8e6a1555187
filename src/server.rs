use crate::config::ServerConfig;
use crate::constants::COMPRESS_ROUTE;
use crate::endpoint::{compress, EndpointState};
use crate::error::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Builds the router for the compression endpoint.
pub fn build_router(state: EndpointState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route(COMPRESS_ROUTE, post(compress))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn run_server(config: &ServerConfig, state: EndpointState) -> Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %listener.local_addr()?,
        max_upload_bytes = config.max_upload_bytes,
        "Compression endpoint listening"
    );

    let router = build_router(state, config.max_upload_bytes);
    serve_with_shutdown(listener, router, shutdown_signal()).await
}

/// Serves `router` on an already bound listener until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Compression endpoint stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

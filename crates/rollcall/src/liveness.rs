//! Keep-alive HTTP endpoint for external uptime monitors.
//!
//! Shares nothing with the bot; it only proves the process is up.

use std::net::SocketAddr;

use axum::{
    extract::ConnectInfo,
    http::{header::USER_AGENT, HeaderMap},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub const ALIVE_BODY: &str = "Bot is running!";

pub fn router() -> Router {
    Router::new().route("/", get(home))
}

/// GET / - plain-text liveness confirmation.
async fn home(peer: Option<ConnectInfo<SocketAddr>>, headers: HeaderMap) -> &'static str {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("Unknown");
    let ip = peer
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    tracing::info!(%ip, user_agent, "liveness ping");
    ALIVE_BODY
}

/// Bind `0.0.0.0:port` and serve until `shutdown` is cancelled.
pub async fn serve(port: u16, shutdown: CancellationToken) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "liveness endpoint listening");
    serve_on(listener, shutdown).await
}

pub async fn serve_on(listener: TcpListener, shutdown: CancellationToken) -> anyhow::Result<()> {
    axum::serve(
        listener,
        router().into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.cancelled_owned())
    .await?;
    Ok(())
}

//! Photostudio liveness endpoint
//!
//! Hosting platforms probe the bot over HTTP to decide whether it is alive.
//! Every probe gets the same fixed plain-text answer; no bot state is exposed.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{Router, routing::get};
use tokio::net::TcpListener;

/// Body returned by every liveness probe.
pub const LIVENESS_BODY: &str = "AI Professional Photographer is LIVE";

/// Default port when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 10000;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

async fn live() -> &'static str {
    LIVENESS_BODY
}

/// Create the application router
pub fn create_app() -> Router {
    Router::new()
        .route("/", get(live))
        .route("/healthz", get(live))
}

/// Bind `config.addr()` and serve until `shutdown` resolves.
pub async fn serve<F>(config: Config, shutdown: F) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(config.addr()).await?;
    serve_on(listener, shutdown).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_on<F>(listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "Liveness endpoint listening");

    axum::serve(listener, create_app())
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Liveness endpoint stopped");
    Ok(())
}

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{routing::head, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers::{self, AppState};
use super::shutdown::ShutdownToken;
use crate::config::ServerConfig;
use crate::queue::SharedQueueBroker;

#[derive(Clone)]
pub struct WebServer {
    pub port: u16,
    pub host: String,
    pub state: AppState,
}

impl WebServer {
    pub fn new(config: &ServerConfig, broker: SharedQueueBroker, enqueue_timeout: Duration) -> Self {
        Self {
            port: config.port,
            host: config.host.clone(),
            state: AppState {
                broker,
                enqueue_timeout,
            },
        }
    }

    /// Bind the listening socket; failure here is fatal to the process
    pub async fn bind(&self) -> Result<TcpListener> {
        // Convert localhost to 127.0.0.1 for proper parsing
        let host = if self.host == "localhost" {
            "127.0.0.1"
        } else {
            &self.host
        };
        let addr: SocketAddr = format!("{}:{}", host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        info!("🌐 Listening on http://{}", listener.local_addr()?);
        Ok(listener)
    }

    /// Serve requests until `shutdown` fires and open connections drain
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownToken) -> Result<()> {
        let app = self.create_app();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                info!("🛑 Shutdown requested, draining in-flight requests");
            })
            .await
            .context("HTTP server failed")?;

        info!("HTTP server stopped");
        Ok(())
    }

    pub fn create_app(&self) -> Router {
        Router::new()
            .route(
                "/:key",
                // Explicit HEAD so it never falls through to the consuming GET
                head(handlers::bad_request)
                    .get(handlers::dequeue)
                    .put(handlers::enqueue)
                    .fallback(handlers::bad_request),
            )
            .fallback(handlers::bad_request)
            .with_state(self.state.clone())
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }
}

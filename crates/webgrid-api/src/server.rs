//! Grid server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::http::routes::create_router;
use crate::state::AppState;

/// Listening socket and request limits.
#[derive(Debug, Clone)]
pub struct GridServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
}

impl GridServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }
}

impl Default for GridServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4444,
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Serves the grid's HTTP surface.
pub struct GridServer {
    config: GridServerConfig,
    state: Arc<AppState>,
}

impl GridServer {
    pub fn new(config: GridServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Serve until Ctrl-C.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let addr: SocketAddr = self.addr().parse()?;
        let listener = TcpListener::bind(addr).await?;
        info!("Grid listening on {}", addr);
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let app = create_router(self.state.clone(), self.config.max_body_bytes);
        axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
        info!("Grid server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

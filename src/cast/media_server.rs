//! Ephemeral HTTP server the device fetches the clip from

use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::{Error, Result};

/// Serves a single file until dropped
pub struct MediaServer {
    url: String,
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MediaServer {
    /// Serve `file` on an ephemeral port of `bind_ip`
    ///
    /// The file is published under a random path that keeps its extension,
    /// so other hosts on the network cannot guess it.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be bound
    pub async fn start(bind_ip: IpAddr, file: &Path) -> Result<Self> {
        let extension = file
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("wav");
        let route = format!("/{}.{extension}", Uuid::new_v4().simple());

        let listener = TcpListener::bind(SocketAddr::new(bind_ip, 0))
            .await
            .map_err(|e| Error::Connection(format!("failed to bind media server on {bind_ip}: {e}")))?;
        let addr = listener.local_addr()?;

        let router = Router::new()
            .route_service(&route, ServeFile::new(file))
            .layer(TraceLayer::new_for_http());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                tracing::warn!(error = %e, "media server error");
            }
        });

        let url = format!("http://{addr}{route}");
        tracing::debug!(%url, "serving media");

        Ok(Self {
            url,
            addr,
            shutdown: Some(shutdown_tx),
        })
    }

    /// URL the device should load
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Bound address
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for MediaServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

//! `RelayServer` builder and accept loop.

use std::path::PathBuf;
use std::sync::Arc;

use faceoff_protocol::{JsonCodec, MatchId};
use faceoff_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::catalog::CatalogLog;
use crate::handler::handle_connection;
use crate::registry::RoomRegistry;
use crate::room::RoomInfo;
use crate::{RelayConfig, RelayError};

/// Shared relay state passed to each connection handler task.
pub(crate) struct RelayState {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) catalog: Option<CatalogLog>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a relay.
///
/// ```rust,ignore
/// let server = RelayServer::builder()
///     .bind("0.0.0.0:8080")
///     .catalog_path("catalog.jsonl")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct RelayServerBuilder {
    config: RelayConfig,
}

impl RelayServerBuilder {
    pub fn new() -> Self {
        Self {
            config: RelayConfig::default(),
        }
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Enables the ability catalog, appending to `path`.
    pub fn catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.catalog_path = Some(path.into());
        self
    }

    pub fn room_buffer(mut self, size: usize) -> Self {
        self.config.room_buffer = size;
        self
    }

    /// Binds the listener and opens the catalog log, if any.
    pub async fn build(self) -> Result<RelayServer, RelayError> {
        let catalog = match &self.config.catalog_path {
            Some(path) => Some(CatalogLog::open(path).await?),
            None => None,
        };
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(RelayState {
            registry: Mutex::new(RoomRegistry::new(self.config.room_buffer)),
            catalog,
            codec: JsonCodec,
        });

        Ok(RelayServer { transport, state })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound relay. Call [`run()`](Self::run) to start accepting connections.
pub struct RelayServer {
    transport: WebSocketTransport,
    state: Arc<RelayState>,
}

impl RelayServer {
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// A read-only view of the rooms that stays valid while the server runs.
    pub fn monitor(&self) -> RelayMonitor {
        RelayMonitor {
            state: Arc::clone(&self.state),
        }
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(mut self) -> Result<(), RelayError> {
        tracing::info!(
            catalog = self.state.catalog.is_some(),
            "faceoff relay running"
        );

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Inspects a running relay's rooms.
#[derive(Clone)]
pub struct RelayMonitor {
    state: Arc<RelayState>,
}

impl RelayMonitor {
    pub async fn room_count(&self) -> usize {
        self.state.registry.lock().await.room_count()
    }

    pub async fn room_info(&self, match_id: &MatchId) -> Option<RoomInfo> {
        let room = self.state.registry.lock().await.room(match_id)?;
        room.get_info().await.ok()
    }
}

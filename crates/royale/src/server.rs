//! `RoyaleServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → coordinator.

use std::sync::Arc;

use royale_protocol::JsonCodec;
use royale_transport::{Transport, WebSocketTransport};
use tracing::{debug, error, info};

use crate::handler::handle_connection;
use crate::{CoordinatorHandle, MatchConfig, RoyaleError};

/// Builder for configuring and starting a server.
///
/// # Example
///
/// ```rust,no_run
/// use royale::{MatchConfig, RoyaleServer};
///
/// # async fn start() -> Result<(), royale::RoyaleError> {
/// let server = RoyaleServer::builder()
///     .bind("0.0.0.0:8080")
///     .match_config(MatchConfig::default())
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RoyaleServerBuilder {
    bind_addr: String,
    match_config: MatchConfig,
}

impl RoyaleServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            match_config: MatchConfig::default(),
        }
    }

    /// Sets the address to listen on. Port 0 picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn match_config(mut self, config: MatchConfig) -> Self {
        self.match_config = config;
        self
    }

    /// Binds the listener and starts the coordinator task.
    pub async fn build(self) -> Result<RoyaleServer, RoyaleError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let coordinator = CoordinatorHandle::spawn(self.match_config);

        Ok(RoyaleServer {
            transport,
            coordinator,
            codec: Arc::new(JsonCodec),
        })
    }
}

impl Default for RoyaleServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server. Call [`run()`](Self::run) to start accepting.
pub struct RoyaleServer {
    transport: WebSocketTransport,
    coordinator: CoordinatorHandle,
    codec: Arc<JsonCodec>,
}

impl RoyaleServer {
    pub fn builder() -> RoyaleServerBuilder {
        RoyaleServerBuilder::new()
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle for querying the coordinator (status, leaderboard) while
    /// the server runs.
    pub fn coordinator(&self) -> CoordinatorHandle {
        self.coordinator.clone()
    }

    /// Accepts connections forever, one task per connection.
    pub async fn run(mut self) -> Result<(), RoyaleError> {
        info!(addr = ?self.local_addr().ok(), "royale server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let coordinator = self.coordinator.clone();
                    let codec = Arc::clone(&self.codec);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, coordinator, codec).await {
                            debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "accept failed");
                }
            }
        }
    }
}

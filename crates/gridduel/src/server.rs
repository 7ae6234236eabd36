//! `GridduelServer` builder and accept loop.
//!
//! This is the entry point for running a gridduel server. It ties the
//! layers together: transport → protocol → session → lobby → game.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use gridduel_lobby::{Matchmaker, PlayerRegistry};
use gridduel_session::CredentialStore;
use gridduel_transport::{TcpLineTransport, Transport};

use crate::handler::handle_connection;
use crate::{GridduelError, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry and matchmaker carry their own synchronization; the
/// connection counter is a plain atomic.
pub(crate) struct ServerState<S: CredentialStore> {
    pub(crate) registry: Arc<PlayerRegistry>,
    pub(crate) matchmaker: Matchmaker,
    pub(crate) credentials: S,
    pub(crate) connected: AtomicUsize,
    pub(crate) max_players: usize,
}

impl<S: CredentialStore> ServerState<S> {
    /// Atomically reserves a connection slot. Returns `false` when the
    /// server is at capacity; the slot is released by `SlotGuard`.
    pub(crate) fn try_reserve_slot(&self) -> bool {
        self.connected
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                (n < self.max_players).then_some(n + 1)
            })
            .is_ok()
    }

    pub(crate) fn release_slot(&self) {
        self.connected.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Builder for configuring and starting a gridduel server.
///
/// # Example
///
/// ```rust,no_run
/// use gridduel::GridduelServerBuilder;
/// use gridduel_session::MemoryCredentialStore;
///
/// # async fn run() -> Result<(), gridduel::GridduelError> {
/// let server = GridduelServerBuilder::new()
///     .bind("127.0.0.1:0")
///     .max_players(4)
///     .build(MemoryCredentialStore::new())
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GridduelServerBuilder {
    bind_addr: String,
    max_players: usize,
}

impl GridduelServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        let defaults = ServerConfig::default();
        Self {
            bind_addr: format!("127.0.0.1:{}", defaults.port),
            max_players: defaults.max_players,
        }
    }

    /// Creates a builder pre-filled from a [`ServerConfig`].
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            bind_addr: config.socket_addr(),
            max_players: config.max_players,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the concurrent-connection limit.
    pub fn max_players(mut self, max_players: usize) -> Self {
        self.max_players = max_players;
        self
    }

    /// Builds the server with the given credential store.
    pub async fn build<S: CredentialStore>(
        self,
        credentials: S,
    ) -> Result<GridduelServer<S>, GridduelError> {
        let transport = TcpLineTransport::bind(&self.bind_addr).await?;

        let registry = Arc::new(PlayerRegistry::new());
        let state = Arc::new(ServerState {
            matchmaker: Matchmaker::new(Arc::clone(&registry)),
            registry,
            credentials,
            connected: AtomicUsize::new(0),
            max_players: self.max_players,
        });

        Ok(GridduelServer { transport, state })
    }
}

impl Default for GridduelServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running gridduel server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GridduelServer<S: CredentialStore> {
    transport: TcpLineTransport,
    state: Arc<ServerState<S>>,
}

impl<S: CredentialStore> GridduelServer<S> {
    /// Creates a new builder.
    pub fn builder() -> GridduelServerBuilder {
        GridduelServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// The capacity check happens inside the handler so over-limit
    /// clients still receive the `ERROR` greeting. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), GridduelError> {
        tracing::info!(max_players = self.state.max_players, "gridduel server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
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

//! Transport abstraction layer for gridduel.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract the
//! line-oriented network layer, and the TCP implementation
//! ([`TcpLineTransport`]) that frames newline-terminated UTF-8 text over
//! `tokio::net::TcpStream`.
//!
//! The rest of the server only ever sees whole lines; framing, buffering,
//! and socket errors stay inside this crate.

#![allow(async_fn_in_trait)]

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{TcpLineConnection, TcpLineTransport};

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that exchanges whole text lines.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one line to the remote peer. The terminator is appended
    /// here; `line` must not contain one.
    async fn send_line(&self, line: &str) -> Result<(), Self::Error>;

    /// Receives the next line from the remote peer, without its
    /// terminator.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv_line(&self) -> Result<Option<String>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

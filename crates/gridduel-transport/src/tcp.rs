//! TCP implementation of the line transport.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A TCP [`Transport`] that accepts newline-framed connections.
pub struct TcpLineTransport {
    listener: TcpListener,
}

impl TcpLineTransport {
    /// Binds a new line transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "line transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for TcpLineTransport {
    type Connection = TcpLineConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let conn = TcpLineConnection::from_stream(stream);
        tracing::debug!(id = %conn.id(), %addr, "accepted connection");
        Ok(conn)
    }
}

/// A single newline-framed TCP connection.
///
/// The stream is split so reads and writes never contend: the buffered
/// reader half and the writer half sit behind separate locks.
pub struct TcpLineConnection {
    id: ConnectionId,
    reader: Mutex<BufReader<OwnedReadHalf>>,
    writer: Mutex<OwnedWriteHalf>,
}

impl TcpLineConnection {
    /// Wraps an already-connected stream.
    ///
    /// Also usable on the client side: connect a `TcpStream` and wrap it
    /// to speak the same line framing as the server.
    pub fn from_stream(stream: TcpStream) -> Self {
        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        let (read_half, write_half) = stream.into_split();
        Self {
            id,
            reader: Mutex::new(BufReader::new(read_half)),
            writer: Mutex::new(write_half),
        }
    }
}

impl Connection for TcpLineConnection {
    type Error = TransportError;

    async fn send_line(&self, line: &str) -> Result<(), Self::Error> {
        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(TransportError::SendFailed)?;
        writer
            .write_all(b"\n")
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv_line(&self) -> Result<Option<String>, Self::Error> {
        let mut reader = self.reader.lock().await;
        let mut line = String::new();
        let read = reader.read_line(&mut line).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                TransportError::InvalidEncoding
            } else {
                TransportError::ReceiveFailed(e)
            }
        })?;

        if read == 0 {
            return Ok(None); // EOF — peer closed cleanly
        }

        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

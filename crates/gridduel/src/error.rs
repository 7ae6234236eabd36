//! Unified error type for the gridduel server.

use gridduel_lobby::LobbyError;
use gridduel_protocol::ProtocolError;
use gridduel_session::CredentialError;
use gridduel_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `gridduel` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate. The
/// `#[from]` attribute on each variant auto-generates `From` impls, so
/// the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GridduelError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (malformed line).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A credential-store error (login file I/O).
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// A lobby-level error (registry, matchmaking).
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// The server configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

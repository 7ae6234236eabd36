//! Error types for the lobby layer.

/// Errors that can occur during registry and matchmaking operations.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The named player is not connected. Surfaced to the challenger as
    /// error code 1.
    #[error("player {0} not found")]
    PlayerNotFound(String),

    /// The named player cannot be challenged right now (already in a
    /// game, or is the challenger themselves). Surfaced as error code 2.
    #[error("player {0} is unavailable")]
    PlayerUnavailable(String),

    /// The username already has a connected player. Surfaced to the
    /// login attempt as error code 1.
    #[error("player {0} is already connected")]
    AlreadyConnected(String),
}

//! Wire protocol for gridduel.
//!
//! This crate defines the "language" that clients and the server speak:
//! newline-terminated UTF-8 text frames made of space-separated tokens,
//! where the first token names the message and the rest are positional
//! arguments.
//!
//! - **Types** ([`ClientCommand`], [`ServerMessage`], [`GameOverCode`],
//!   [`PlayerEntry`]) — the messages that travel on the wire.
//! - **Codes** ([`codes`]) — the numeric error codes carried by
//!   `ERROR <code>` replies.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while parsing.
//!
//! The protocol layer sits between transport (raw lines) and the session
//! state machine (player context). It doesn't know about connections,
//! players, or games — it only knows how to parse and format messages.

mod error;
mod types;

pub use error::ProtocolError;
pub use types::{
    ClientCommand, GameOverCode, PlayerEntry, ServerMessage, TurnOrder,
    FIELD_SEPARATOR, LIST_SEPARATOR,
};

/// Numeric codes carried by `ERROR <code>` replies.
///
/// The meaning of a code depends on the state the connection is in —
/// the wire only ever shows the number.
pub mod codes {
    /// Malformed or out-of-state command (lobby). Connection stays open.
    pub const PROTOCOL: u8 = 0;

    /// Login rejected: the username is already connected.
    pub const LOGIN_ALREADY_CONNECTED: u8 = 1;

    /// Login rejected: wrong password.
    pub const LOGIN_WRONG_PASSWORD: u8 = 2;

    /// Challenge rejected: no such player in the lobby.
    pub const CHALLENGE_NOT_FOUND: u8 = 1;

    /// Challenge rejected: the target is already in a game.
    pub const CHALLENGE_UNAVAILABLE: u8 = 2;

    /// Move rejected: out of range, cell taken, or not your turn.
    pub const MOVE_REJECTED: u8 = 1;
}

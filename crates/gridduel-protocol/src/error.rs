//! Error types for the protocol layer.

/// Errors that can occur while parsing a protocol line.
///
/// These cover malformed input only — a line that parses but is sent in
/// the wrong session state is a higher-layer concern.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The line was empty (or whitespace only).
    #[error("empty line")]
    Empty,

    /// The first token is not a known command name.
    /// Command names are case-sensitive (`LOGIN`, not `login`).
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The first token is not a known server message name.
    #[error("unknown message: {0}")]
    UnknownMessage(String),

    /// The command was recognized but an argument is missing.
    #[error("{command} is missing an argument")]
    MissingArgument { command: &'static str },

    /// An argument was present but could not be interpreted
    /// (e.g. a non-numeric row in `PLAY`).
    #[error("invalid argument for {command}: {value:?}")]
    InvalidArgument {
        command: &'static str,
        value: String,
    },
}

//! Error types for the game layer.

/// Reasons a submitted move is rejected. No state changes on rejection;
/// the wire collapses all of these into one generic error reply.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MoveError {
    /// The game already ended.
    #[error("game is over")]
    Finished,

    /// It is the other seat's turn.
    #[error("not your turn")]
    NotYourTurn,

    /// Row or column outside `0..=2`.
    #[error("row and col must be 0-2")]
    OutOfRange,

    /// The target cell already holds a mark.
    #[error("cell is occupied")]
    CellOccupied,
}

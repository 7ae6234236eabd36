//! The 3×3 board, marks, and seats.

use std::fmt;

/// A mark on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// One of the two sides of a match.
///
/// `Seat::One` is the player who accepted the challenge and plays X;
/// `Seat::Two` is the challenger and plays O. Seats are ordered, not
/// symmetric — results are always reported per seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    One,
    Two,
}

impl Seat {
    /// The opposing seat.
    pub fn other(self) -> Self {
        match self {
            Seat::One => Seat::Two,
            Seat::Two => Seat::One,
        }
    }

    /// The mark this seat places.
    pub fn mark(self) -> Mark {
        match self {
            Seat::One => Mark::X,
            Seat::Two => Mark::O,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seat::One => write!(f, "1"),
            Seat::Two => write!(f, "2"),
        }
    }
}

/// The eight winning lines: three rows, three columns, two diagonals.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// A 3×3 board stored as nine cells in row-major order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    cells: [Option<Mark>; 9],
}

impl Board {
    /// An empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Row-major cell index for `(row, col)`.
    pub fn index(row: u8, col: u8) -> usize {
        usize::from(row) * 3 + usize::from(col)
    }

    /// The mark at `index`, if any.
    pub fn cell(&self, index: usize) -> Option<Mark> {
        self.cells[index]
    }

    /// Places `mark` at `index`. The caller has already validated that
    /// the cell is empty and in range.
    pub fn place(&mut self, index: usize, mark: Mark) {
        debug_assert!(self.cells[index].is_none(), "cell {index} already taken");
        self.cells[index] = Some(mark);
    }

    /// Returns the mark owning a completed line, if any.
    pub fn winning_mark(&self) -> Option<Mark> {
        for [a, b, c] in LINES {
            if let Some(mark) = self.cells[a] {
                if self.cells[b] == Some(mark) && self.cells[c] == Some(mark) {
                    return Some(mark);
                }
            }
        }
        None
    }

    /// Returns `true` when every cell holds a mark.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }
}

// =========================================================================
// Tests
// =========================================================================

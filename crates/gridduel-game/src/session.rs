//! The game session: one shared authority per active match.
//!
//! Both connection handlers drive the same `GameSession` from opposite
//! sides. All shared state lives behind one lock; every mutation wakes
//! the waiting side through a [`Notify`], so neither handler ever polls.

use std::sync::{Mutex, MutexGuard};

use rand::Rng;
use tokio::sync::Notify;

use crate::{Board, MoveError, Seat};

/// The outcome of a finished match, from one seat's perspective.
///
/// The two sides never share a verbatim result — each computes its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// The board filled with no line.
    Draw,
    /// This seat completed a line.
    Won,
    /// The other seat completed a line.
    Lost,
    /// The other seat disconnected; this seat is credited the win.
    OpponentLeft,
}

/// What a successful [`GameSession::submit_move`] did to the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The mark was placed; the match continues on the other seat.
    Placed,
    /// The mark was placed and ended the match.
    Ended(MatchResult),
}

/// What [`GameSession::await_update`] observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnUpdate {
    /// The opponent moved and the turn came back to this seat; the
    /// coordinates are relayed so the client's view stays in sync.
    OpponentMoved { row: u8, col: u8 },
    /// The match ended (on the opponent's move, or by disconnect).
    Ended(MatchResult),
}

/// State shared between the two participants. Only ever touched under
/// the session lock.
#[derive(Debug)]
struct Shared {
    board: Board,
    turn: Seat,
    over: bool,
    winner: Option<Seat>,
    /// Row-major index of the last applied move, for relaying.
    last_move: Option<usize>,
    /// Set when a participant quit or its transport died mid-match.
    abandoned: bool,
}

/// One active (or finished) match between two players.
///
/// Created when a challenge is accepted; both handlers hold an `Arc` to
/// it and drop their reference once their side has been notified of the
/// outcome.
#[derive(Debug)]
pub struct GameSession {
    /// Usernames by seat: `[Seat::One, Seat::Two]`.
    seats: [String; 2],
    /// The seat that opens the game. Fixed at construction so both
    /// sides can announce it without racing the first move.
    opening: Seat,
    shared: Mutex<Shared>,
    changed: Notify,
}

impl GameSession {
    /// Creates a match between `player_one` (the acceptor, X) and
    /// `player_two` (the challenger, O). The opening seat is chosen by
    /// coin flip.
    pub fn new(
        player_one: impl Into<String>,
        player_two: impl Into<String>,
    ) -> Self {
        let opening = if rand::rng().random_bool(0.5) {
            Seat::One
        } else {
            Seat::Two
        };
        Self::with_opening_seat(player_one, player_two, opening)
    }

    /// Like [`new`](Self::new) with an explicit opening seat. Used by
    /// tests that need a deterministic first mover.
    pub fn with_opening_seat(
        player_one: impl Into<String>,
        player_two: impl Into<String>,
        opening: Seat,
    ) -> Self {
        Self {
            seats: [player_one.into(), player_two.into()],
            opening,
            shared: Mutex::new(Shared {
                board: Board::new(),
                turn: opening,
                over: false,
                winner: None,
                last_move: None,
                abandoned: false,
            }),
            changed: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        // Nothing panics while holding this lock, so poisoning cannot
        // occur in practice.
        self.shared.lock().expect("game state lock poisoned")
    }

    /// The username seated at `seat`.
    pub fn username(&self, seat: Seat) -> &str {
        match seat {
            Seat::One => &self.seats[0],
            Seat::Two => &self.seats[1],
        }
    }

    /// The seat of `username`, if they participate in this match.
    pub fn seat_of(&self, username: &str) -> Option<Seat> {
        if self.seats[0] == username {
            Some(Seat::One)
        } else if self.seats[1] == username {
            Some(Seat::Two)
        } else {
            None
        }
    }

    /// The seat that moves first.
    pub fn opening_seat(&self) -> Seat {
        self.opening
    }

    /// Whether it is currently `seat`'s turn (false once the match is
    /// over).
    pub fn is_turn(&self, seat: Seat) -> bool {
        let shared = self.lock();
        !shared.over && !shared.abandoned && shared.turn == seat
    }

    /// Whether the match has ended.
    pub fn is_over(&self) -> bool {
        let shared = self.lock();
        shared.over || shared.abandoned
    }

    /// Applies a move for `seat`.
    ///
    /// Validates turn ownership, range, and cell vacancy; on success
    /// places the mark, runs the win/draw check, flips the turn, and
    /// wakes the other seat.
    ///
    /// # Errors
    /// [`MoveError`] when any check fails — no state changes.
    pub fn submit_move(
        &self,
        seat: Seat,
        row: u8,
        col: u8,
    ) -> Result<MoveOutcome, MoveError> {
        let mut shared = self.lock();

        if shared.over || shared.abandoned {
            return Err(MoveError::Finished);
        }
        if shared.turn != seat {
            return Err(MoveError::NotYourTurn);
        }
        if row > 2 || col > 2 {
            return Err(MoveError::OutOfRange);
        }
        let index = Board::index(row, col);
        if shared.board.cell(index).is_some() {
            return Err(MoveError::CellOccupied);
        }

        shared.board.place(index, seat.mark());
        shared.last_move = Some(index);

        let outcome = if shared.board.winning_mark() == Some(seat.mark()) {
            shared.over = true;
            shared.winner = Some(seat);
            MoveOutcome::Ended(MatchResult::Won)
        } else if shared.board.is_full() {
            shared.over = true;
            MoveOutcome::Ended(MatchResult::Draw)
        } else {
            shared.turn = seat.other();
            MoveOutcome::Placed
        };

        drop(shared);
        self.changed.notify_waiters();

        if let MoveOutcome::Ended(result) = outcome {
            tracing::debug!(
                result = ?result,
                player = self.username(seat),
                "match ended"
            );
        }
        Ok(outcome)
    }

    /// Marks the match abandoned by `seat`: the other seat becomes the
    /// winner and is woken to collect its disconnect win.
    ///
    /// No-op when the match already ended — the outcome never reverses.
    pub fn abandon(&self, seat: Seat) {
        let mut shared = self.lock();
        if shared.over || shared.abandoned {
            return;
        }
        shared.abandoned = true;
        shared.winner = Some(seat.other());
        shared.over = true;
        drop(shared);

        tracing::info!(player = self.username(seat), "match abandoned");
        self.changed.notify_waiters();
    }

    /// Waits until something happens that concerns `seat`: the opponent
    /// moved and the turn came back, the match ended on the opponent's
    /// move, or the opponent disconnected.
    pub async fn await_update(&self, seat: Seat) -> TurnUpdate {
        loop {
            // Arm the notification *before* inspecting state, so a
            // wakeup between the check and the await is never lost.
            let notified = self.changed.notified();

            {
                let shared = self.lock();
                if shared.abandoned {
                    return TurnUpdate::Ended(MatchResult::OpponentLeft);
                }
                if shared.over {
                    return TurnUpdate::Ended(result_of(&shared, seat));
                }
                if shared.turn == seat {
                    let index = shared
                        .last_move
                        .expect("turn handed over without a move");
                    return TurnUpdate::OpponentMoved {
                        row: (index / 3) as u8,
                        col: (index % 3) as u8,
                    };
                }
            }

            notified.await;
        }
    }

    /// The final result from `seat`'s perspective, once the match is
    /// over.
    pub fn result_for(&self, seat: Seat) -> Option<MatchResult> {
        let shared = self.lock();
        (shared.over || shared.abandoned).then(|| result_of(&shared, seat))
    }
}

fn result_of(shared: &Shared, seat: Seat) -> MatchResult {
    if shared.abandoned {
        return MatchResult::OpponentLeft;
    }
    match shared.winner {
        None => MatchResult::Draw,
        Some(winner) if winner == seat => MatchResult::Won,
        Some(_) => MatchResult::Lost,
    }
}

// =========================================================================
// Tests
// =========================================================================

//! The player model: identity, status, stats, and incoming challenges.

use std::sync::{Arc, Mutex, MutexGuard};

use gridduel_game::MatchResult;
use gridduel_protocol::PlayerEntry;

use crate::Challenge;

/// Whether a player is free in the lobby or tied up in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Online,
    InGame,
}

/// Cumulative per-player statistics. In memory only — they live as long
/// as the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub win_streak: u32,
}

impl Stats {
    /// Records a finished match. Wins (including disconnect wins)
    /// extend the streak; losses and draws reset it.
    pub fn record(&mut self, result: MatchResult) {
        match result {
            MatchResult::Won | MatchResult::OpponentLeft => {
                self.wins += 1;
                self.win_streak += 1;
            }
            MatchResult::Lost => {
                self.losses += 1;
                self.win_streak = 0;
            }
            MatchResult::Draw => {
                self.draws += 1;
                self.win_streak = 0;
            }
        }
    }
}

/// A connected player.
///
/// Shared as `Arc<Player>`: the registry owns one reference for the
/// player's connected lifetime, and challenges/games hold more. The
/// mutable fields sit behind their own short-lived locks, so a stat
/// update made by the owning connection is immediately visible to every
/// snapshot holder — observers see live values, never copies.
#[derive(Debug)]
pub struct Player {
    username: String,
    status: Mutex<Status>,
    stats: Mutex<Stats>,
    /// Incoming challenges, oldest first.
    challenges: Mutex<Vec<Arc<Challenge>>>,
}

impl Player {
    /// Creates a freshly logged-in player: online, zeroed stats, no
    /// challenges.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            status: Mutex::new(Status::Online),
            stats: Mutex::new(Stats::default()),
            challenges: Mutex::new(Vec::new()),
        }
    }

    /// The unique, immutable username.
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn status(&self) -> Status {
        *lock(&self.status)
    }

    pub fn set_status(&self, status: Status) {
        *lock(&self.status) = status;
    }

    /// A copy of the current statistics.
    pub fn stats(&self) -> Stats {
        *lock(&self.stats)
    }

    /// Records a finished match in this player's stats.
    ///
    /// Only the connection owning this player calls this (at its own
    /// game end), so stat updates never race each other.
    pub fn record_result(&self, result: MatchResult) {
        lock(&self.stats).record(result);
    }

    /// The listing entry (`name,wins,losses,draws,streak`).
    pub fn entry(&self) -> PlayerEntry {
        let stats = self.stats();
        PlayerEntry {
            username: self.username.clone(),
            wins: stats.wins,
            losses: stats.losses,
            draws: stats.draws,
            win_streak: stats.win_streak,
        }
    }

    // -- Challenge list -----------------------------------------------------

    /// Appends an incoming challenge.
    pub fn add_challenge(&self, challenge: Arc<Challenge>) {
        lock(&self.challenges).push(challenge);
    }

    /// Usernames of the still-pending challengers, oldest first.
    pub fn pending_challengers(&self) -> Vec<String> {
        lock(&self.challenges)
            .iter()
            .filter(|c| c.is_pending())
            .map(|c| c.challenger().username().to_string())
            .collect()
    }

    /// Finds the pending challenge issued by `challenger`, if any.
    pub fn find_pending(&self, challenger: &str) -> Option<Arc<Challenge>> {
        lock(&self.challenges)
            .iter()
            .find(|c| {
                c.is_pending() && c.challenger().username() == challenger
            })
            .cloned()
    }

    /// Removes one specific challenge from the list.
    pub fn remove_challenge(&self, challenge: &Arc<Challenge>) {
        lock(&self.challenges).retain(|c| !Arc::ptr_eq(c, challenge));
    }

    /// Empties the challenge list, refusing everything still pending so
    /// no challenger stays blocked. Called when a match starts, when a
    /// match ends, and when the player disconnects.
    pub fn refuse_all_pending(&self) {
        let drained: Vec<_> = std::mem::take(&mut *lock(&self.challenges));
        for challenge in drained {
            challenge.refuse();
        }
    }
}

/// Nothing panics while holding these locks, so poisoning cannot occur.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("player lock poisoned")
}

// =========================================================================
// Tests
// =========================================================================

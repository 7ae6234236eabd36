//! Challenges: unresolved match requests between two players.

use std::sync::{Arc, Mutex, MutexGuard};

use gridduel_game::GameSession;
use tokio::sync::Notify;

use crate::Player;

/// The lifecycle of a challenge. Transitions are monotonic:
/// `Pending → Accepted` or `Pending → Refused`, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeStatus {
    Pending,
    Accepted,
    Refused,
}

/// The resolution a waiting challenger receives.
#[derive(Debug, Clone)]
pub enum ChallengeReply {
    /// The target accepted; both sides now share this game.
    Accepted(Arc<GameSession>),
    /// The target refused (explicitly, or implicitly by accepting
    /// someone else or disconnecting).
    Refused,
}

#[derive(Debug)]
struct State {
    status: ChallengeStatus,
    game: Option<Arc<GameSession>>,
}

/// One unresolved request from a challenger to a target.
///
/// Lives in the target's challenge list. The challenger's connection
/// task parks on [`resolution`](Challenge::resolution); whoever resolves
/// the challenge wakes it through the embedded [`Notify`] — there is no
/// polling.
#[derive(Debug)]
pub struct Challenge {
    challenger: Arc<Player>,
    state: Mutex<State>,
    resolved: Notify,
}

impl Challenge {
    /// Creates a pending challenge from `challenger`.
    pub fn new(challenger: Arc<Player>) -> Self {
        Self {
            challenger,
            state: Mutex::new(State {
                status: ChallengeStatus::Pending,
                game: None,
            }),
            resolved: Notify::new(),
        }
    }

    /// The player who issued this challenge.
    pub fn challenger(&self) -> &Arc<Player> {
        &self.challenger
    }

    pub fn status(&self) -> ChallengeStatus {
        self.lock().status
    }

    pub fn is_pending(&self) -> bool {
        self.status() == ChallengeStatus::Pending
    }

    /// Resolves the challenge as accepted, attaching the spawned game,
    /// and wakes the challenger.
    ///
    /// No-op unless still pending — a resolved challenge never changes
    /// again.
    pub fn accept(&self, game: Arc<GameSession>) {
        let mut state = self.lock();
        if state.status != ChallengeStatus::Pending {
            return;
        }
        state.status = ChallengeStatus::Accepted;
        state.game = Some(game);
        drop(state);
        self.resolved.notify_waiters();
    }

    /// Resolves the challenge as refused and wakes the challenger.
    /// No-op unless still pending.
    pub fn refuse(&self) {
        let mut state = self.lock();
        if state.status != ChallengeStatus::Pending {
            return;
        }
        state.status = ChallengeStatus::Refused;
        drop(state);
        self.resolved.notify_waiters();
    }

    /// Waits until the challenge stops being pending.
    ///
    /// Returns immediately when it already resolved. There is no
    /// timeout: a challenger waits indefinitely, and only the target's
    /// decision or a disconnect (which refuses all pending challenges)
    /// unblocks it.
    pub async fn resolution(&self) -> ChallengeReply {
        loop {
            // Arm the notification before inspecting state, so a
            // resolution between the check and the await is never lost.
            let notified = self.resolved.notified();

            {
                let state = self.lock();
                match state.status {
                    ChallengeStatus::Pending => {}
                    ChallengeStatus::Accepted => {
                        let game = state
                            .game
                            .clone()
                            .expect("accepted challenge carries a game");
                        return ChallengeReply::Accepted(game);
                    }
                    ChallengeStatus::Refused => {
                        return ChallengeReply::Refused;
                    }
                }
            }

            notified.await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Nothing panics while holding this lock.
        self.state.lock().expect("challenge lock poisoned")
    }
}

// =========================================================================
// Tests
// =========================================================================

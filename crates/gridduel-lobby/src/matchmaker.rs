//! The challenge coordinator.
//!
//! Bridges two independently-scheduled connection handlers: the
//! challenger's task parks inside [`Matchmaker::challenge`] until the
//! target's task resolves the challenge through
//! [`Matchmaker::accept`] or [`Matchmaker::refuse`].

use std::sync::Arc;

use gridduel_game::GameSession;

use crate::{Challenge, ChallengeReply, LobbyError, Player, PlayerRegistry, Status};

/// Issues, accepts, and refuses challenges against a shared registry.
pub struct Matchmaker {
    registry: Arc<PlayerRegistry>,
}

impl Matchmaker {
    /// Creates a coordinator over the given registry.
    pub fn new(registry: Arc<PlayerRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this coordinator resolves targets against.
    pub fn registry(&self) -> &Arc<PlayerRegistry> {
        &self.registry
    }

    /// Issues a challenge and waits for the target to resolve it.
    ///
    /// Suspends the calling task until the challenge stops being
    /// pending — there is no timeout; a disconnecting target refuses
    /// its pending challenges and unblocks the caller that way.
    ///
    /// # Errors
    /// - [`LobbyError::PlayerNotFound`] — no such player (code 1).
    /// - [`LobbyError::PlayerUnavailable`] — target is in a game, or is
    ///   the challenger themselves (code 2).
    pub async fn challenge(
        &self,
        challenger: &Arc<Player>,
        target_name: &str,
    ) -> Result<ChallengeReply, LobbyError> {
        let target = self
            .registry
            .find(target_name)
            .ok_or_else(|| LobbyError::PlayerNotFound(target_name.to_string()))?;

        // Challenging yourself would park this task waiting for a
        // resolution only this task could produce.
        if target.status() == Status::InGame
            || target.username() == challenger.username()
        {
            return Err(LobbyError::PlayerUnavailable(target_name.to_string()));
        }

        let challenge = Arc::new(Challenge::new(Arc::clone(challenger)));
        target.add_challenge(Arc::clone(&challenge));
        tracing::info!(
            challenger = challenger.username(),
            target = target_name,
            "challenge issued"
        );

        Ok(challenge.resolution().await)
    }

    /// Accepts the pending challenge from `challenger_name`.
    ///
    /// Creates the game (acceptor is seat one), resolves the challenge,
    /// marks the acceptor in-game, and refuses every other pending
    /// challenge so no competing challenger stays parked.
    ///
    /// Returns `None` when no pending challenge from that name exists —
    /// a no-op, with no reply on the wire.
    pub fn accept(
        &self,
        player: &Arc<Player>,
        challenger_name: &str,
    ) -> Option<Arc<GameSession>> {
        let challenge = player.find_pending(challenger_name)?;

        let game = Arc::new(GameSession::new(
            player.username(),
            challenger_name,
        ));
        challenge.accept(Arc::clone(&game));
        player.set_status(Status::InGame);
        // Drains the whole list; the accepted challenge is already
        // resolved, so only the competing ones flip to Refused.
        player.refuse_all_pending();

        tracing::info!(
            acceptor = player.username(),
            challenger = challenger_name,
            "challenge accepted, match starting"
        );
        Some(game)
    }

    /// Refuses the pending challenge from `challenger_name`, waking the
    /// challenger. Returns whether such a challenge existed.
    pub fn refuse(&self, player: &Arc<Player>, challenger_name: &str) -> bool {
        let Some(challenge) = player.find_pending(challenger_name) else {
            return false;
        };
        challenge.refuse();
        player.remove_challenge(&challenge);

        tracing::info!(
            target = player.username(),
            challenger = challenger_name,
            "challenge refused"
        );
        true
    }
}

// =========================================================================
// Tests
// =========================================================================

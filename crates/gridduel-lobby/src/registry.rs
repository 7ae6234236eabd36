//! The player registry: every currently-connected player.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use gridduel_protocol::PlayerEntry;

use crate::{LobbyError, Player};

/// The process-wide set of connected players.
///
/// Explicitly owned and injected — never a global — so tests can spin up
/// isolated instances. Insertion order is preserved for listings.
///
/// Entries are `Arc<Player>`: a snapshot hands out live references, and
/// stat/status mutations made through them are visible to every holder.
/// The internal `RwLock` is only ever held for the list operation
/// itself (no await points), so readers never block writers for long
/// and never observe a partially-inserted entry.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: RwLock<Vec<Arc<Player>>>,
}

impl PlayerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly logged-in player.
    ///
    /// The uniqueness check and the insertion happen under one write
    /// lock, so two racing logins of the same username cannot both
    /// succeed.
    ///
    /// # Errors
    /// [`LobbyError::AlreadyConnected`] when the username is present.
    pub fn insert(&self, player: Arc<Player>) -> Result<(), LobbyError> {
        let mut players = self.write();
        if players.iter().any(|p| p.username() == player.username()) {
            return Err(LobbyError::AlreadyConnected(
                player.username().to_string(),
            ));
        }
        tracing::info!(username = player.username(), "player joined lobby");
        players.push(player);
        Ok(())
    }

    /// Removes and returns the player with `username`, if connected.
    pub fn remove(&self, username: &str) -> Option<Arc<Player>> {
        let mut players = self.write();
        let index = players.iter().position(|p| p.username() == username)?;
        let player = players.remove(index);
        tracing::info!(%username, "player left lobby");
        Some(player)
    }

    /// Looks up a connected player by username.
    pub fn find(&self, username: &str) -> Option<Arc<Player>> {
        self.read()
            .iter()
            .find(|p| p.username() == username)
            .cloned()
    }

    /// All connected players, in insertion order. The returned
    /// references are live, not copies.
    pub fn snapshot(&self) -> Vec<Arc<Player>> {
        self.read().clone()
    }

    /// Listing entries for every connected player, in insertion order.
    pub fn entries(&self) -> Vec<PlayerEntry> {
        self.read().iter().map(|p| p.entry()).collect()
    }

    /// Number of connected players.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` when nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<Player>>> {
        // Nothing panics while holding this lock.
        self.players.read().expect("registry lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<Player>>> {
        self.players.write().expect("registry lock poisoned")
    }
}

// =========================================================================
// Tests
// =========================================================================

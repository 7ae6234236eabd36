//! Player registry and challenge matchmaking for gridduel.
//!
//! This crate is the synchronization point between independently
//! scheduled connection handlers:
//!
//! - [`PlayerRegistry`] — the injected, process-wide set of connected
//!   players. Handlers add on login, remove on disconnect, and look up
//!   challenge targets here.
//! - [`Challenge`] — one unresolved request from a challenger to a
//!   target, resolved exactly once (accepted or refused) and waking the
//!   challenger's waiting task when it is.
//! - [`Matchmaker`] — the challenge coordinator: issue, accept, refuse.
//!
//! # How it fits in the stack
//!
//! ```text
//! Session state machine (above)  ← drives logins, lobby commands
//!     ↕
//! Lobby layer (this crate)       ← who is here, who challenged whom
//!     ↕
//! Game layer (below)             ← the match a successful challenge spawns
//! ```

mod challenge;
mod error;
mod matchmaker;
mod player;
mod registry;

pub use challenge::{Challenge, ChallengeReply, ChallengeStatus};
pub use error::LobbyError;
pub use matchmaker::Matchmaker;
pub use player::{Player, Stats, Status};
pub use registry::PlayerRegistry;

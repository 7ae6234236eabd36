//! # gridduel
//!
//! A multiplayer session server for a two-player turn-based grid game,
//! reachable over a persistent TCP connection speaking a line protocol.
//!
//! Clients connect, log in against a credential store, meet in a shared
//! lobby, challenge each other, and play 3×3 matches with strictly
//! alternating moves. Each accepted connection runs its own task through
//! the session state machine:
//!
//! ```text
//! Connecting → LoggingIn → InLobby ⇄ InMatch
//!                              │
//!                              ▼
//!                           Closed
//! ```
//!
//! Connections never talk to each other directly — they meet only in the
//! shared [`PlayerRegistry`](gridduel_lobby::PlayerRegistry), the
//! [`Matchmaker`](gridduel_lobby::Matchmaker), and the
//! [`GameSession`](gridduel_game::GameSession) they both hold.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gridduel::GridduelServerBuilder;
//! use gridduel_session::FileCredentialStore;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = FileCredentialStore::open("logins.txt").await?;
//! let server = GridduelServerBuilder::new()
//!     .bind("0.0.0.0:42069")
//!     .max_players(12)
//!     .build(credentials)
//!     .await?;
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::GridduelError;
pub use server::{GridduelServer, GridduelServerBuilder};

//! Server configuration.
//!
//! Intentionally simple: defaults, overridable via a few environment
//! variables:
//!
//! - `GRIDDUEL_BIND_ADDR`   (default: "0.0.0.0")
//! - `GRIDDUEL_PORT`        (default: "42069")
//! - `GRIDDUEL_MAX_PLAYERS` (default: "12")
//! - `GRIDDUEL_LOGIN_FILE`  (default: "logins.txt")

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::GridduelError;

/// Configuration for the server binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// IP address / interface to bind to.
    pub bind_addr: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Maximum number of simultaneously connected players. Connections
    /// past this limit are greeted with `ERROR` and closed.
    pub max_players: usize,

    /// Path of the credential file (`username password` per line).
    pub login_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 42069,
            max_players: 12,
            login_file: "logins.txt".to_string(),
        }
    }
}

impl ServerConfig {
    /// Constructs a config from environment variables, falling back to
    /// the defaults above.
    ///
    /// # Errors
    /// [`GridduelError::Config`] when a set variable fails to parse.
    pub fn from_env() -> Result<Self, GridduelError> {
        let defaults = Self::default();
        Ok(Self {
            bind_addr: env::var("GRIDDUEL_BIND_ADDR")
                .unwrap_or(defaults.bind_addr),
            port: read_env_or("GRIDDUEL_PORT", defaults.port)?,
            max_players: read_env_or(
                "GRIDDUEL_MAX_PLAYERS",
                defaults.max_players,
            )?,
            login_file: env::var("GRIDDUEL_LOGIN_FILE")
                .unwrap_or(defaults.login_file),
        })
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn read_env_or<T: FromStr>(key: &str, default: T) -> Result<T, GridduelError> {
    match env::var(key) {
        Ok(value) => value.parse().map_err(|_| {
            GridduelError::Config(format!("{key}: cannot parse {value:?}"))
        }),
        Err(_) => Ok(default),
    }
}

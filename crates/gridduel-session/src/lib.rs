//! Credential resolution for gridduel.
//!
//! Login is a single three-way question: given `(username, password)`,
//! is this a new account, a returning user, or a wrong password? This
//! crate answers it behind the [`CredentialStore`] trait:
//!
//! 1. **The seam** — [`CredentialStore`], one async method.
//! 2. **The real store** — [`FileCredentialStore`], plain
//!    `username password` lines on disk, auto-creating unknown users.
//! 3. **The test store** — [`MemoryCredentialStore`], same semantics,
//!    no disk.
//!
//! Whether a username is *currently connected* is not answered here —
//! that's the player registry's job.

#![allow(async_fn_in_trait)]

mod error;
mod store;

pub use error::CredentialError;
pub use store::{FileCredentialStore, MemoryCredentialStore};

/// The three-way outcome of a credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The username was unknown; an account was created and accepted.
    AcceptedNew,

    /// The username exists and the password matches.
    AcceptedExisting,

    /// The username exists but the password does not match.
    WrongPassword,
}

impl LoginOutcome {
    /// Returns `true` for either accepted variant.
    pub fn is_accepted(self) -> bool {
        !matches!(self, LoginOutcome::WrongPassword)
    }
}

/// Resolves a username/password pair against persisted credentials.
///
/// Implementations must be shareable across connection handler tasks
/// (`Send + Sync + 'static`).
pub trait CredentialStore: Send + Sync + 'static {
    /// Checks the pair and creates the account when the username is new.
    ///
    /// # Errors
    /// Only infrastructure failures (I/O) — a wrong password is a
    /// regular [`LoginOutcome`], not an error.
    fn resolve(
        &self,
        username: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<LoginOutcome, CredentialError>> + Send;
}

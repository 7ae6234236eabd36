//! Credential store implementations.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::{CredentialError, CredentialStore, LoginOutcome};

// ---------------------------------------------------------------------------
// FileCredentialStore
// ---------------------------------------------------------------------------

/// A credential store backed by a plain text file.
///
/// One account per line, `username password`, space-separated. The file
/// is read once at [`open`](Self::open); new accounts are appended as
/// they are created. The in-memory map is the source of truth for
/// lookups, the file only has to survive restarts.
///
/// Passwords are stored in the clear — this store guards access to a
/// game lobby, not to anything that deserves a KDF.
pub struct FileCredentialStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileCredentialStore {
    /// Opens (creating it if missing) the credential file at `path` and
    /// loads every account in it.
    ///
    /// Lines that don't split into two fields are skipped with a warning
    /// rather than poisoning the whole store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CredentialError> {
        let path = path.into();

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tokio::fs::File::create(&path).await?;
                tracing::info!(path = %path.display(), "created credential file");
                String::new()
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = HashMap::new();
        for line in contents.lines() {
            match line.split_once(' ') {
                Some((username, password)) if !username.is_empty() => {
                    entries.insert(username.to_string(), password.to_string());
                }
                _ => {
                    if !line.trim().is_empty() {
                        tracing::warn!(line, "skipping malformed credential line");
                    }
                }
            }
        }

        tracing::debug!(
            path = %path.display(),
            accounts = entries.len(),
            "credential store loaded"
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Number of known accounts.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns `true` if no accounts exist yet.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl CredentialStore for FileCredentialStore {
    async fn resolve(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, CredentialError> {
        // The lock is held across the append so two racing first-time
        // logins of the same username create exactly one account.
        let mut entries = self.entries.lock().await;

        if let Some(stored) = entries.get(username) {
            return Ok(if stored == password {
                LoginOutcome::AcceptedExisting
            } else {
                LoginOutcome::WrongPassword
            });
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{username} {password}\n").as_bytes())
            .await?;
        file.flush().await?;

        entries.insert(username.to_string(), password.to_string());
        tracing::info!(%username, "created account");
        Ok(LoginOutcome::AcceptedNew)
    }
}

// ---------------------------------------------------------------------------
// MemoryCredentialStore
// ---------------------------------------------------------------------------

/// An in-memory credential store with the same semantics as the file
/// store, for tests and local development. Nothing survives the process.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn resolve(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, CredentialError> {
        let mut entries = self.entries.lock().await;
        match entries.get(username) {
            Some(stored) if stored == password => Ok(LoginOutcome::AcceptedExisting),
            Some(_) => Ok(LoginOutcome::WrongPassword),
            None => {
                entries.insert(username.to_string(), password.to_string());
                Ok(LoginOutcome::AcceptedNew)
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

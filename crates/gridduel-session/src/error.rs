//! Error types for the credential layer.

/// Errors that can occur while resolving credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Reading or writing the credential file failed.
    #[error("credential store I/O: {0}")]
    Io(#[from] std::io::Error),
}

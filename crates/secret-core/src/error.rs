//! Error types for secret-core

use thiserror::Error;

/// Result type alias for protection and locking operations
pub type Result<T> = std::result::Result<T, ProtectError>;

/// Error types shared by the protection and synchronization components
#[derive(Error, Debug)]
pub enum ProtectError {
    #[error("Value out of range: {0}")]
    Range(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Crypto operation failed: {0}")]
    CryptoFailure(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0} has already been released")]
    UseAfterRelease(&'static str),

    #[error("Operation was cancelled before the lock was acquired")]
    OperationCancelled,

    #[error("Lock recursion is not allowed: {0}")]
    LockRecursion(String),

    #[error("Keychain error: {0}")]
    KeychainError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ProtectError {
    /// Whether this error came from the crypto layer (bad key, entropy, or ciphertext)
    pub fn is_crypto_failure(&self) -> bool {
        matches!(self, Self::CryptoFailure(_))
    }
}

impl From<base64::DecodeError> for ProtectError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Format(format!("Invalid base64: {}", e))
    }
}

//! # secret-core
//!
//! In-memory secret protection and lock primitives:
//! - Protected byte arrays and strings that hold only ciphertext
//! - Scoped (per-user / per-machine) and password-based protectors
//! - Scope keys in the OS keychain with key-file fallback
//! - A read/write lock with upgradeable reads and an async mutex

pub mod crypto;
pub mod error;
pub mod facility;
pub mod protected;
pub mod settings;
pub mod sync;

pub use crypto::{
    clear_bytes, clear_chars, AsciiCategory, CipherMode, CryptoRandom, DataProtect, Kdf, KeySize,
    PaddingMode, PasswordOptions, PasswordProtect, ProtectorRef, SaltSource, ScopedProtect,
    SecretString, RAND,
};
pub use error::{ProtectError, Result};
pub use facility::{
    default_facility, install_default_facility, LocalProtection, ProtectionScope, ScopeKeyProtection,
};
pub use protected::{
    LocalProtectedByteArray, LocalProtectedString, PasswordProtectedByteArray, PasswordProtectedString,
    ProtectedByteArray, ProtectedString, ProtectedValue, SharedProtector,
};
pub use settings::{LocalBackend, ProtectSettings, SettingsManager};
pub use sync::{AsyncMutex, AsyncMutexGuard, LockState, ReadWriteLock, RecursionPolicy};

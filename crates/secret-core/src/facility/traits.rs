//! Facility trait definitions

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::ScopeKey;
use crate::error::Result;

/// Who may unprotect data protected under a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProtectionScope {
    /// Only the current OS user
    #[default]
    CurrentUser,
    /// Any user on this machine; keys are kept in a machine-wide store
    LocalMachine,
}

impl ProtectionScope {
    /// Stable tag, used for key names and as associated data
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CurrentUser => "current-user",
            Self::LocalMachine => "local-machine",
        }
    }
}

impl std::fmt::Display for ProtectionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform-style local protection: binds ciphertext to a scope secret the
/// caller never sees, plus optional caller entropy
pub trait LocalProtection: Send + Sync {
    /// Protect data under the scope, mixing in `entropy`
    fn protect(&self, data: &[u8], entropy: &[u8], scope: ProtectionScope) -> Result<Vec<u8>>;

    /// Reverse [`LocalProtection::protect`]; the same entropy and scope are required
    fn unprotect(
        &self,
        protected: &[u8],
        entropy: &[u8],
        scope: ProtectionScope,
    ) -> Result<Zeroizing<Vec<u8>>>;

    /// Check if the scope secrets are hardware-backed
    fn is_hardware_backed(&self) -> bool;

    /// Get a human-readable name for this facility
    fn backend_name(&self) -> &'static str;
}

/// Persistence for per-scope keys
pub trait ScopeKeySource: Send + Sync {
    /// Load the key for a scope, `None` if it was never created
    fn load(&self, scope: ProtectionScope) -> Result<Option<ScopeKey>>;

    /// Persist the key for a scope, replacing any existing one
    fn store(&self, scope: ProtectionScope, key: &ScopeKey) -> Result<()>;

    /// Delete the key for a scope. Data protected under it becomes unrecoverable.
    fn delete(&self, scope: ProtectionScope) -> Result<()>;

    /// Check if this source is hardware-backed
    fn is_hardware_backed(&self) -> bool;

    /// Get a human-readable name for this source
    fn backend_name(&self) -> &'static str;
}

//! OS Keychain scope key source
//!
//! Uses the system keychain for the per-scope keys:
//! - macOS: Keychain
//! - Windows: Credential Manager (DPAPI)
//! - Linux: Secret Service (GNOME Keyring, KWallet)

use keyring::Entry;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::{ProtectionScope, ScopeKeySource};
use crate::crypto::{base64_decode, base64_encode, ScopeKey};
use crate::error::{ProtectError, Result};

/// Service name used for keychain entries
const SERVICE_NAME: &str = "secret-protect";

/// OS Keychain scope key source
pub struct KeychainKeySource {
    /// Whether keychain is available
    available: bool,
}

impl KeychainKeySource {
    pub fn new() -> Self {
        let available = Self::test_availability();

        if available {
            debug!("Keychain key source is available");
        } else {
            warn!("Keychain key source is not available - will use fallback");
        }

        Self { available }
    }

    /// Test if the keychain is available
    fn test_availability() -> bool {
        match Entry::new(SERVICE_NAME, "__test_availability__") {
            Ok(entry) => {
                if entry.set_password("test").is_ok() {
                    let _ = entry.delete_password();
                    true
                } else {
                    false
                }
            }
            Err(_) => false,
        }
    }

    fn entry(&self, scope: ProtectionScope) -> Result<Entry> {
        if !self.available {
            return Err(ProtectError::KeychainError(
                "Keychain not available".to_string(),
            ));
        }

        Entry::new(SERVICE_NAME, &format!("scope-key-{}", scope.as_str()))
            .map_err(|e| ProtectError::KeychainError(e.to_string()))
    }

    /// Check if keychain is available
    pub fn is_available(&self) -> bool {
        self.available
    }
}

impl Default for KeychainKeySource {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeKeySource for KeychainKeySource {
    fn load(&self, scope: ProtectionScope) -> Result<Option<ScopeKey>> {
        match self.entry(scope)?.get_password() {
            Ok(encoded) => {
                let encoded = Zeroizing::new(encoded);
                let raw = Zeroizing::new(base64_decode(&encoded)?);
                let key = ScopeKey::from_slice(&raw).ok_or_else(|| {
                    ProtectError::Format(format!("Keychain {} key has the wrong length", scope))
                })?;
                debug!("Retrieved {} scope key from keychain", scope);
                Ok(Some(key))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ProtectError::KeychainError(e.to_string())),
        }
    }

    fn store(&self, scope: ProtectionScope, key: &ScopeKey) -> Result<()> {
        // Keychains store strings
        let encoded = Zeroizing::new(base64_encode(key.as_bytes()));

        self.entry(scope)?
            .set_password(&encoded)
            .map_err(|e| ProtectError::KeychainError(e.to_string()))?;

        debug!("Stored {} scope key in keychain", scope);
        Ok(())
    }

    fn delete(&self, scope: ProtectionScope) -> Result<()> {
        match self.entry(scope)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ProtectError::KeychainError(e.to_string())),
        }
    }

    fn is_hardware_backed(&self) -> bool {
        // OS keychains count as hardware-backed (DPAPI, Secure Enclave, ...)
        self.available
    }

    fn backend_name(&self) -> &'static str {
        #[cfg(target_os = "macos")]
        return "macOS Keychain";

        #[cfg(target_os = "windows")]
        return "Windows Credential Manager";

        #[cfg(target_os = "linux")]
        return "Linux Secret Service";

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        return "System Keychain";
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keychain_availability() {
        let source = KeychainKeySource::new();
        // Only checks that probing does not panic
        let _ = source.is_available();
    }

    #[test]
    fn test_unavailable_keychain_errors() {
        let source = KeychainKeySource { available: false };
        assert!(matches!(
            source.load(ProtectionScope::CurrentUser),
            Err(ProtectError::KeychainError(_))
        ));
        assert!(!source.is_hardware_backed());
    }
}

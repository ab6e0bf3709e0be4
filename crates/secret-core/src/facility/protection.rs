//! Scope-key local protection and the process-wide default facility

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::{
    FileKeySource, KeychainKeySource, LocalProtection, MemoryKeySource, PerScopeKeySource,
    ProtectionScope, ScopeKeySource,
};
use crate::crypto::{open, seal, ScopeKey};
use crate::error::{ProtectError, Result};
use crate::settings::{LocalBackend, ProtectSettings};

static DEFAULT_FACILITY: OnceLock<Arc<dyn LocalProtection>> = OnceLock::new();

/// AES-256-GCM under a per-scope key.
///
/// Output layout is `nonce || ciphertext || tag`. The scope tag and the
/// caller's entropy are bound as associated data, so unprotecting with other
/// entropy or under the other scope fails authentication.
pub struct ScopeKeyProtection<S: ScopeKeySource> {
    source: S,
    /// Keys already loaded or created by this facility
    keys: Mutex<HashMap<ProtectionScope, ScopeKey>>,
}

impl<S: ScopeKeySource> ScopeKeyProtection<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            keys: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying key source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load the scope key, creating and persisting one on first use
    fn key_or_create(&self, scope: ProtectionScope) -> Result<ScopeKey> {
        let mut keys = self.keys.lock();
        if let Some(key) = keys.get(&scope) {
            return Ok(key.clone());
        }

        let key = match self.source.load(scope)? {
            Some(key) => key,
            None => {
                let key = ScopeKey::generate();
                self.source.store(scope, &key)?;
                info!("Created {} scope key in {}", scope, self.source.backend_name());
                key
            }
        };

        keys.insert(scope, key.clone());
        Ok(key)
    }

    /// Load an existing scope key
    fn existing_key(&self, scope: ProtectionScope) -> Result<ScopeKey> {
        let mut keys = self.keys.lock();
        if let Some(key) = keys.get(&scope) {
            return Ok(key.clone());
        }

        let key = self.source.load(scope)?.ok_or_else(|| {
            ProtectError::NotFound(format!(
                "No {} scope key in {}",
                scope,
                self.source.backend_name()
            ))
        })?;

        keys.insert(scope, key.clone());
        Ok(key)
    }
}

fn associated_data(scope: ProtectionScope, entropy: &[u8]) -> Vec<u8> {
    let tag = scope.as_str().as_bytes();
    let mut aad = Vec::with_capacity(tag.len() + entropy.len());
    aad.extend_from_slice(tag);
    aad.extend_from_slice(entropy);
    aad
}

impl<S: ScopeKeySource> LocalProtection for ScopeKeyProtection<S> {
    fn protect(&self, data: &[u8], entropy: &[u8], scope: ProtectionScope) -> Result<Vec<u8>> {
        let key = self.key_or_create(scope)?;
        seal(&key, data, &associated_data(scope, entropy))
    }

    fn unprotect(
        &self,
        protected: &[u8],
        entropy: &[u8],
        scope: ProtectionScope,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let key = self.existing_key(scope)?;
        open(&key, protected, &associated_data(scope, entropy))
    }

    fn is_hardware_backed(&self) -> bool {
        self.source.is_hardware_backed()
    }

    fn backend_name(&self) -> &'static str {
        self.source.backend_name()
    }
}

/// Build a facility for the configured backend.
///
/// The backend holds current-user keys; `Keychain` falls back to key files
/// when no keychain is reachable. Local-machine keys always go to the
/// machine-wide key directory, except with `Memory`.
pub fn facility_for(settings: &ProtectSettings) -> Result<Arc<dyn LocalProtection>> {
    match settings.local_backend {
        LocalBackend::Keychain => {
            let keychain = KeychainKeySource::new();
            if keychain.is_available() {
                let source = PerScopeKeySource::new(keychain, machine_source(settings));
                return Ok(Arc::new(ScopeKeyProtection::new(source)));
            }
            warn!("Falling back to key files for local protection");
            file_facility(settings)
        }
        LocalBackend::File => file_facility(settings),
        LocalBackend::Memory => Ok(Arc::new(ScopeKeyProtection::new(MemoryKeySource::new()))),
    }
}

fn file_facility(settings: &ProtectSettings) -> Result<Arc<dyn LocalProtection>> {
    let user = match &settings.key_directory {
        Some(dir) => FileKeySource::with_dir(dir)?,
        None => FileKeySource::new()?,
    };
    let source = PerScopeKeySource::new(user, machine_source(settings));
    Ok(Arc::new(ScopeKeyProtection::new(source)))
}

fn machine_source(settings: &ProtectSettings) -> FileKeySource {
    match &settings.machine_key_directory {
        Some(dir) => FileKeySource::machine_with_dir(dir),
        None => FileKeySource::machine(),
    }
}

/// The process-wide facility used by [`ScopedProtect::new`](crate::ScopedProtect::new).
///
/// Built from default settings on first use unless one was installed.
pub fn default_facility() -> Result<Arc<dyn LocalProtection>> {
    if let Some(facility) = DEFAULT_FACILITY.get() {
        return Ok(facility.clone());
    }

    let facility = facility_for(&ProtectSettings::default())?;
    let facility = DEFAULT_FACILITY.get_or_init(|| facility);
    debug!("Default local protection: {}", facility.backend_name());
    Ok(facility.clone())
}

/// Install the process-wide facility. Fails, handing the facility back, if
/// one is already in place.
pub fn install_default_facility(
    facility: Arc<dyn LocalProtection>,
) -> std::result::Result<(), Arc<dyn LocalProtection>> {
    let name = facility.backend_name();
    DEFAULT_FACILITY.set(facility)?;
    info!("Installed default local protection: {}", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn memory_facility() -> ScopeKeyProtection<MemoryKeySource> {
        ScopeKeyProtection::new(MemoryKeySource::new())
    }

    #[test]
    fn test_protect_unprotect() {
        let facility = memory_facility();
        let protected = facility
            .protect(b"secret", b"entropy", ProtectionScope::CurrentUser)
            .unwrap();

        assert_ne!(&protected[..], b"secret");
        let plain = facility
            .unprotect(&protected, b"entropy", ProtectionScope::CurrentUser)
            .unwrap();
        assert_eq!(plain.as_slice(), b"secret");
    }

    #[test]
    fn test_entropy_and_scope_are_bound() {
        let facility = memory_facility();
        let protected = facility
            .protect(b"secret", b"entropy", ProtectionScope::CurrentUser)
            .unwrap();
        facility
            .protect(b"other", b"entropy", ProtectionScope::LocalMachine)
            .unwrap();

        let wrong_entropy = facility.unprotect(&protected, b"other", ProtectionScope::CurrentUser);
        assert!(matches!(wrong_entropy, Err(ProtectError::CryptoFailure(_))));

        let wrong_scope = facility.unprotect(&protected, b"entropy", ProtectionScope::LocalMachine);
        assert!(matches!(wrong_scope, Err(ProtectError::CryptoFailure(_))));
    }

    #[test]
    fn test_unprotect_without_key_is_not_found() {
        let facility = memory_facility();
        let result = facility.unprotect(&[0u8; 40], b"", ProtectionScope::LocalMachine);
        assert!(matches!(result, Err(ProtectError::NotFound(_))));
    }

    #[test]
    fn test_key_persists_through_file_source() {
        let temp_dir = TempDir::new().unwrap();

        let protected = {
            let facility = ScopeKeyProtection::new(FileKeySource::with_dir(temp_dir.path()).unwrap());
            facility
                .protect(b"persisted", b"e", ProtectionScope::CurrentUser)
                .unwrap()
        };

        let facility = ScopeKeyProtection::new(FileKeySource::with_dir(temp_dir.path()).unwrap());
        let plain = facility
            .unprotect(&protected, b"e", ProtectionScope::CurrentUser)
            .unwrap();
        assert_eq!(plain.as_slice(), b"persisted");
        assert_eq!(facility.backend_name(), "Key Files");
    }

    #[test]
    fn test_scopes_resolve_to_distinct_stores() {
        let temp_dir = TempDir::new().unwrap();
        let user_dir = temp_dir.path().join("user");
        let machine_dir = temp_dir.path().join("machine");
        let settings = ProtectSettings {
            local_backend: LocalBackend::File,
            key_directory: Some(user_dir.clone()),
            machine_key_directory: Some(machine_dir.clone()),
            ..ProtectSettings::default()
        };

        let facility = facility_for(&settings).unwrap();
        let user_data = facility
            .protect(b"mine", b"e", ProtectionScope::CurrentUser)
            .unwrap();
        let machine_data = facility
            .protect(b"shared", b"e", ProtectionScope::LocalMachine)
            .unwrap();

        assert!(user_dir.join("current-user.key").exists());
        assert!(!user_dir.join("local-machine.key").exists());
        assert!(machine_dir.join("local-machine.key").exists());
        assert!(!machine_dir.join("current-user.key").exists());

        // Another user's facility sees the machine key but not ours
        let other_user = ProtectSettings {
            key_directory: Some(temp_dir.path().join("other-user")),
            ..settings
        };
        let other = facility_for(&other_user).unwrap();
        let plain = other
            .unprotect(&machine_data, b"e", ProtectionScope::LocalMachine)
            .unwrap();
        assert_eq!(plain.as_slice(), b"shared");
        assert!(matches!(
            other.unprotect(&user_data, b"e", ProtectionScope::CurrentUser),
            Err(ProtectError::NotFound(_))
        ));
    }

    #[test]
    fn test_facility_for_settings() {
        let temp_dir = TempDir::new().unwrap();

        let settings = ProtectSettings {
            local_backend: LocalBackend::File,
            key_directory: Some(temp_dir.path().join("user")),
            machine_key_directory: Some(temp_dir.path().join("machine")),
            ..ProtectSettings::default()
        };
        assert_eq!(facility_for(&settings).unwrap().backend_name(), "Key Files");

        let settings = ProtectSettings {
            local_backend: LocalBackend::Memory,
            ..ProtectSettings::default()
        };
        let facility = facility_for(&settings).unwrap();
        assert_eq!(facility.backend_name(), "In-Memory Keys");
        assert!(!facility.is_hardware_backed());
    }
}

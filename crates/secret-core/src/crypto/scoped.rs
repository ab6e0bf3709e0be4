//! Protection scoped to the current user or the local machine

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use super::encoding::base64_encode;
use super::protect::{DataProtect, SaltSource};
use crate::error::{ProtectError, Result};
use crate::facility::{default_facility, LocalProtection, ProtectionScope};

/// Delegates to a [`LocalProtection`] facility, mixing in per-protector entropy.
///
/// Anyone in the same scope with the same entropy can decrypt, so generate
/// fresh entropy per protected value and keep it next to the ciphertext.
pub struct ScopedProtect {
    entropy: RwLock<Option<Zeroizing<Vec<u8>>>>,
    scope: ProtectionScope,
    facility: Arc<dyn LocalProtection>,
}

impl ScopedProtect {
    /// Create a protector on the process-wide default facility
    pub fn new(entropy: SaltSource<'_>, scope: ProtectionScope) -> Result<Self> {
        Self::with_facility(entropy, scope, default_facility()?)
    }

    /// Create a protector on a specific facility
    pub fn with_facility(
        entropy: SaltSource<'_>,
        scope: ProtectionScope,
        facility: Arc<dyn LocalProtection>,
    ) -> Result<Self> {
        let entropy = Zeroizing::new(entropy.resolve()?);

        debug!(
            "Scoped protector ({}, {} bytes entropy) on {}",
            scope,
            entropy.len(),
            facility.backend_name()
        );

        Ok(Self {
            entropy: RwLock::new(Some(entropy)),
            scope,
            facility,
        })
    }

    /// Copy of the entropy; persist it to decrypt later
    pub fn entropy(&self) -> Result<Vec<u8>> {
        self.with_entropy(|entropy| Ok(entropy.to_vec()))
    }

    /// Entropy as base64
    pub fn entropy_base64(&self) -> Result<String> {
        self.with_entropy(|entropy| Ok(base64_encode(entropy)))
    }

    pub fn scope(&self) -> ProtectionScope {
        self.scope
    }

    /// Name of the facility doing the work
    pub fn backend_name(&self) -> &'static str {
        self.facility.backend_name()
    }

    fn with_entropy<T>(&self, f: impl FnOnce(&[u8]) -> Result<T>) -> Result<T> {
        let entropy = self.entropy.read();
        let entropy = entropy
            .as_ref()
            .ok_or(ProtectError::UseAfterRelease("ScopedProtect"))?;
        f(entropy)
    }
}

impl DataProtect for ScopedProtect {
    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.with_entropy(|entropy| self.facility.protect(data, entropy, self.scope))
    }

    fn decrypt(&self, encrypted_data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        self.with_entropy(|entropy| self.facility.unprotect(encrypted_data, entropy, self.scope))
    }

    fn dispose(&self) {
        if let Some(mut entropy) = self.entropy.write().take() {
            entropy.zeroize();
            debug!("Disposed scoped protector");
        }
    }

    fn is_disposed(&self) -> bool {
        self.entropy.read().is_none()
    }
}

impl std::fmt::Debug for ScopedProtect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedProtect")
            .field("scope", &self.scope)
            .field("backend", &self.facility.backend_name())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

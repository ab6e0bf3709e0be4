//! Bytes held as ciphertext

use zeroize::{Zeroize, Zeroizing};

use super::ProtectedValue;
use crate::crypto::{base64_decode, base64_encode, DataProtect, ProtectorRef};
use crate::error::{ProtectError, Result};

/// Ciphertext plus the protector that can open it.
///
/// Plaintext only ever exists in the zeroizing buffers returned by
/// [`ProtectedValue::decrypt`]. Dropping the array disposes it.
pub struct ProtectedByteArray<P: DataProtect> {
    encrypted_data: Option<Vec<u8>>,
    protector: ProtectorRef<P>,
}

impl<P: DataProtect> ProtectedByteArray<P> {
    /// Encrypt `data` now
    pub fn with_data(data: &[u8], protector: impl Into<ProtectorRef<P>>) -> Result<Self> {
        let protector = protector.into();
        let encrypted_data = protector.encrypt(data)?;
        Ok(Self {
            encrypted_data: Some(encrypted_data),
            protector,
        })
    }

    /// Wrap existing ciphertext; it is only checked on decrypt
    pub fn with_encrypted_data(encrypted_data: Vec<u8>, protector: impl Into<ProtectorRef<P>>) -> Self {
        Self {
            encrypted_data: Some(encrypted_data),
            protector: protector.into(),
        }
    }

    /// Wrap existing base64 ciphertext
    pub fn with_encrypted_data_base64(
        encrypted_data: &str,
        protector: impl Into<ProtectorRef<P>>,
    ) -> Result<Self> {
        let encrypted_data = base64_decode(encrypted_data)?;
        Ok(Self::with_encrypted_data(encrypted_data, protector))
    }

    pub fn protector(&self) -> &P {
        &self.protector
    }

    /// Whether disposing this array also disposes the protector
    pub fn owns_protector(&self) -> bool {
        self.protector.is_owned()
    }

    /// Re-encrypt under another protector; the intermediate plaintext is zeroed
    pub fn convert_to<Q: DataProtect>(
        &self,
        protector: impl Into<ProtectorRef<Q>>,
    ) -> Result<ProtectedByteArray<Q>> {
        let plain = self.decrypt()?;
        ProtectedByteArray::with_data(&plain, protector)
    }
}

impl<P: DataProtect> ProtectedValue for ProtectedByteArray<P> {
    fn encrypted_data(&self) -> Result<&[u8]> {
        self.encrypted_data
            .as_deref()
            .ok_or(ProtectError::UseAfterRelease("ProtectedByteArray"))
    }

    fn encrypted_data_base64(&self) -> Result<String> {
        Ok(base64_encode(self.encrypted_data()?))
    }

    fn decrypt(&self) -> Result<Zeroizing<Vec<u8>>> {
        let encrypted_data = self.encrypted_data()?;
        self.protector.decrypt(encrypted_data)
    }

    fn dispose(&mut self) {
        if let Some(mut encrypted_data) = self.encrypted_data.take() {
            encrypted_data.zeroize();
            self.protector.release();
        }
    }

    fn is_disposed(&self) -> bool {
        self.encrypted_data.is_none()
    }
}

impl<P: DataProtect> Drop for ProtectedByteArray<P> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<P: DataProtect> std::fmt::Debug for ProtectedByteArray<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtectedByteArray")
            .field("encrypted_len", &self.encrypted_data.as_ref().map(Vec::len))
            .field("protector", &self.protector)
            .finish()
    }
}

//! Text held as ciphertext, UTF-8 at the boundary

use zeroize::Zeroizing;

use super::{ProtectedByteArray, ProtectedValue};
use crate::crypto::{decode_chars, encode_chars, DataProtect, ProtectorRef, SecretString};
use crate::error::{ProtectError, Result};

/// A [`ProtectedByteArray`] whose plaintext is UTF-8 text
pub struct ProtectedString<P: DataProtect> {
    bytes: ProtectedByteArray<P>,
}

impl<P: DataProtect> ProtectedString<P> {
    /// Encrypt `text` now
    pub fn with_str(text: &str, protector: impl Into<ProtectorRef<P>>) -> Result<Self> {
        Ok(Self {
            bytes: ProtectedByteArray::with_data(text.as_bytes(), protector)?,
        })
    }

    /// Encrypt chars now; the UTF-8 staging buffer is zeroed
    pub fn with_chars(chars: &[char], protector: impl Into<ProtectorRef<P>>) -> Result<Self> {
        let encoded = encode_chars(chars);
        Ok(Self {
            bytes: ProtectedByteArray::with_data(&encoded, protector)?,
        })
    }

    pub fn with_encrypted_data(encrypted_data: Vec<u8>, protector: impl Into<ProtectorRef<P>>) -> Self {
        Self {
            bytes: ProtectedByteArray::with_encrypted_data(encrypted_data, protector),
        }
    }

    pub fn with_encrypted_data_base64(
        encrypted_data: &str,
        protector: impl Into<ProtectorRef<P>>,
    ) -> Result<Self> {
        Ok(Self {
            bytes: ProtectedByteArray::with_encrypted_data_base64(encrypted_data, protector)?,
        })
    }

    /// Decrypt into a zeroizing char buffer
    pub fn decrypt_to_chars(&self) -> Result<Zeroizing<Vec<char>>> {
        let plain = self.bytes.decrypt()?;
        decode_chars(&plain)
    }

    /// Decrypt into an ordinary `String`. The caller owns clearing it; prefer
    /// [`ProtectedString::decrypt_to_secret_string`].
    pub fn decrypt_to_string(&self) -> Result<String> {
        let plain = self.bytes.decrypt()?;
        let text = std::str::from_utf8(&plain)
            .map_err(|e| ProtectError::Format(format!("Decrypted data is not UTF-8: {}", e)))?;
        let mut owned = String::with_capacity(text.len());
        owned.push_str(text);
        Ok(owned)
    }

    /// Decrypt into a [`SecretString`]; the intermediate chars are cleared
    pub fn decrypt_to_secret_string(&self) -> Result<SecretString> {
        let mut chars = self.decrypt_to_chars()?;
        Ok(SecretString::from_chars(&mut chars))
    }

    pub fn protector(&self) -> &P {
        self.bytes.protector()
    }

    pub fn owns_protector(&self) -> bool {
        self.bytes.owns_protector()
    }

    /// Re-encrypt under another protector
    pub fn convert_to<Q: DataProtect>(
        &self,
        protector: impl Into<ProtectorRef<Q>>,
    ) -> Result<ProtectedString<Q>> {
        Ok(ProtectedString {
            bytes: self.bytes.convert_to(protector)?,
        })
    }

    /// The backing byte array
    pub fn as_byte_array(&self) -> &ProtectedByteArray<P> {
        &self.bytes
    }
}

impl<P: DataProtect> ProtectedValue for ProtectedString<P> {
    fn encrypted_data(&self) -> Result<&[u8]> {
        self.bytes.encrypted_data()
    }

    fn encrypted_data_base64(&self) -> Result<String> {
        self.bytes.encrypted_data_base64()
    }

    fn decrypt(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.bytes.decrypt()
    }

    fn dispose(&mut self) {
        self.bytes.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.bytes.is_disposed()
    }
}

impl<P: DataProtect> std::fmt::Debug for ProtectedString<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ProtectedString").field(&self.bytes).finish()
    }
}

//! Base64 and UTF-8 conversions at the protected-value boundary

use base64::Engine;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{ProtectError, Result};

/// Base64 encode bytes (standard alphabet, padded)
pub fn base64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Base64 decode string
pub fn base64_decode(encoded: &str) -> Result<Vec<u8>> {
    Ok(base64::engine::general_purpose::STANDARD.decode(encoded)?)
}

/// UTF-8 encode a char buffer into a zeroizing byte buffer
pub fn encode_chars(chars: &[char]) -> Zeroizing<Vec<u8>> {
    let mut bytes = Zeroizing::new(Vec::with_capacity(
        chars.iter().map(|c| c.len_utf8()).sum(),
    ));
    let mut buf = [0u8; 4];
    for c in chars {
        bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
    buf.zeroize();
    bytes
}

/// UTF-8 decode bytes into a zeroizing char buffer
pub fn decode_chars(bytes: &[u8]) -> Result<Zeroizing<Vec<char>>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ProtectError::Format(format!("Decrypted data is not UTF-8: {}", e)))?;
    let mut chars = Zeroizing::new(Vec::with_capacity(text.chars().count()));
    chars.extend(text.chars());
    Ok(chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_roundtrip() {
        let data = b"\x00\x01binary\xff";
        assert_eq!(base64_decode(&base64_encode(data)).unwrap(), data);
    }

    #[test]
    fn test_invalid_base64_is_format_error() {
        assert!(matches!(
            base64_decode("not base64!"),
            Err(ProtectError::Format(_))
        ));
    }

    #[test]
    fn test_chars_utf8() {
        let chars: Vec<char> = "héllo, 世界".chars().collect();
        let bytes = encode_chars(&chars);
        assert_eq!(bytes.as_slice(), "héllo, 世界".as_bytes());
        assert_eq!(decode_chars(&bytes).unwrap().as_slice(), chars.as_slice());
    }

    #[test]
    fn test_decode_chars_allocates_once() {
        let text = "naïve café ☕ ".repeat(64);
        let chars = decode_chars(text.as_bytes()).unwrap();
        assert_eq!(chars.len(), text.chars().count());
        assert_eq!(chars.capacity(), chars.len());
    }

    #[test]
    fn test_invalid_utf8_is_format_error() {
        assert!(matches!(
            decode_chars(&[0xff, 0xfe]),
            Err(ProtectError::Format(_))
        ));
    }
}

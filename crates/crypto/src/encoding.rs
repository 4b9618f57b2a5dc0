//! Byte-array to hex-string conversion for key material.

use crate::error::CryptoError;

/// Encode bytes as lower-case hex, two characters per byte.
pub fn buffer_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a hex string into bytes.
///
/// Accepts upper- and lower-case digits. Fails with `MalformedEncoding` on odd
/// length or any non-hex character.
pub fn hex_to_buffer(encoded: &str) -> Result<Vec<u8>, CryptoError> {
    Ok(hex::decode(encoded)?)
}

/// Decode a hex string into a fixed-size array, failing on a length mismatch.
///
/// `what` names the value in the error message.
pub fn hex_to_array<const N: usize>(encoded: &str, what: &str) -> Result<[u8; N], CryptoError> {
    let mut out = [0u8; N];
    hex::decode_to_slice(encoded, &mut out).map_err(|e| match e {
        hex::FromHexError::InvalidStringLength => CryptoError::MalformedEncoding(format!(
            "{what}: expected {N} bytes, got {} hex characters",
            encoded.len()
        )),
        other => CryptoError::MalformedEncoding(format!("{what}: {other}")),
    })?;
    Ok(out)
}

//! Error types for the ephemchat-crypto crate.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
///
/// Messages never contain plaintext, passwords or private key material.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A hex or base64 string has an invalid length or invalid characters.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),

    /// A supplied public key does not decode to a 32-byte curve point.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// A supplied private key does not decode to a 32-byte scalar.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Authentication or integrity check failed (wrong key, wrong password,
    /// tampered ciphertext, nonce mismatch).
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// The platform's secure random source could not produce bytes.
    #[error("entropy source unavailable: {0}")]
    EntropySourceUnavailable(String),

    /// A message to encrypt was empty.
    #[error("message is empty")]
    EmptyMessage,

    /// Key material or an envelope carries a scheme version this build does not know.
    #[error("unsupported scheme version: {0}")]
    UnsupportedSchemeVersion(u8),

    /// Password-hashing parameters were rejected.
    #[error("invalid kdf parameters: {0}")]
    InvalidKdfParams(String),

    /// OS keychain operation failed.
    #[error("keychain error: {0}")]
    KeychainError(String),

    /// OS keychain is not available on this platform.
    #[error("keychain unavailable")]
    KeychainUnavailable,

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for CryptoError {
    fn from(err: serde_json::Error) -> Self {
        CryptoError::SerializationError(err.to_string())
    }
}

impl From<base64::DecodeError> for CryptoError {
    fn from(err: base64::DecodeError) -> Self {
        CryptoError::MalformedEncoding(err.to_string())
    }
}

impl From<hex::FromHexError> for CryptoError {
    fn from(err: hex::FromHexError) -> Self {
        CryptoError::MalformedEncoding(err.to_string())
    }
}

impl From<keyring::Error> for CryptoError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoStorageAccess(_) | keyring::Error::PlatformFailure(_) => {
                CryptoError::KeychainUnavailable
            }
            other => CryptoError::KeychainError(other.to_string()),
        }
    }
}

impl From<CryptoError> for ephemchat_shared::error::ChatError {
    fn from(err: CryptoError) -> Self {
        use ephemchat_shared::error::ChatError;
        match err {
            CryptoError::EmptyMessage => ChatError::Validation(err.to_string()),
            other => ChatError::Crypto(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ephemchat_shared::error::ChatError;

    #[test]
    fn display_messages_are_human_readable() {
        let err = CryptoError::MalformedEncoding("odd length".into());
        assert!(err.to_string().contains("odd length"));

        let err = CryptoError::InvalidPublicKey("receiver".into());
        assert!(err.to_string().contains("receiver"));

        let err = CryptoError::UnsupportedSchemeVersion(9);
        assert!(err.to_string().contains('9'));

        let err = CryptoError::KeychainUnavailable;
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn from_serde_json_error_converts_to_serialization_error() {
        let json_err: serde_json::Error = serde_json::from_str::<String>("not json").unwrap_err();
        let crypto_err: CryptoError = json_err.into();
        assert!(matches!(crypto_err, CryptoError::SerializationError(_)));
    }

    #[test]
    fn from_base64_error_converts_to_malformed_encoding() {
        use base64::Engine;
        let b64_err = base64::engine::general_purpose::STANDARD
            .decode("%%%")
            .unwrap_err();
        let crypto_err: CryptoError = b64_err.into();
        assert!(matches!(crypto_err, CryptoError::MalformedEncoding(_)));
    }

    #[test]
    fn from_keyring_platform_failure_converts_to_unavailable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "test");
        let keyring_err = keyring::Error::PlatformFailure(Box::new(io_err));
        let crypto_err: CryptoError = keyring_err.into();
        assert!(matches!(crypto_err, CryptoError::KeychainUnavailable));
    }

    #[test]
    fn from_keyring_other_converts_to_keychain_error() {
        let keyring_err = keyring::Error::TooLong("service".into(), 10);
        let crypto_err: CryptoError = keyring_err.into();
        assert!(matches!(crypto_err, CryptoError::KeychainError(_)));
    }

    #[test]
    fn empty_message_maps_to_validation() {
        let shared: ChatError = CryptoError::EmptyMessage.into();
        assert!(matches!(shared, ChatError::Validation(_)));
    }

    #[test]
    fn decryption_failure_maps_to_crypto() {
        let shared: ChatError = CryptoError::DecryptionFailed("tag".into()).into();
        assert!(matches!(shared, ChatError::Crypto(_)));
    }

    #[test]
    fn all_variants_impl_error() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(CryptoError::MalformedEncoding("m".into())),
            Box::new(CryptoError::InvalidPublicKey("p".into())),
            Box::new(CryptoError::InvalidPrivateKey("k".into())),
            Box::new(CryptoError::DecryptionFailed("d".into())),
            Box::new(CryptoError::EntropySourceUnavailable("e".into())),
            Box::new(CryptoError::EmptyMessage),
            Box::new(CryptoError::UnsupportedSchemeVersion(2)),
            Box::new(CryptoError::InvalidKdfParams("p".into())),
            Box::new(CryptoError::KeychainError("k".into())),
            Box::new(CryptoError::KeychainUnavailable),
            Box::new(CryptoError::SerializationError("s".into())),
            Box::new(CryptoError::ConfigError("c".into())),
        ];
        for e in &errors {
            let _ = e.to_string();
        }
    }
}

//! Scheme version tag carried by keys, wrapped keys and envelopes.

use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// Algorithm suite identifier.
///
/// `V1`: X25519 key pairs, XSalsa20-Poly1305 boxes with 24-byte nonces for
/// messages, Argon2id + AES-256-GCM for password-wrapped private keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SchemeVersion {
    #[default]
    V1,
}

impl SchemeVersion {
    pub const CURRENT: SchemeVersion = SchemeVersion::V1;

    pub fn as_u8(self) -> u8 {
        match self {
            SchemeVersion::V1 => 1,
        }
    }
}

impl TryFrom<u8> for SchemeVersion {
    type Error = CryptoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SchemeVersion::V1),
            other => Err(CryptoError::UnsupportedSchemeVersion(other)),
        }
    }
}

impl From<SchemeVersion> for u8 {
    fn from(version: SchemeVersion) -> Self {
        version.as_u8()
    }
}

//! Curve25519 key pair generation for message boxes.
//!
//! Keys travel as 64-character lower-case hex strings. The public key is
//! always derived from the private key, never generated on its own.

use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::encoding::{buffer_to_hex, hex_to_array};
use crate::entropy;
use crate::error::CryptoError;
use crate::scheme::SchemeVersion;

/// Size in bytes of both halves of a key pair.
pub const KEY_SIZE: usize = 32;

/// A hex-encoded X25519 key pair. The private half is wiped on drop.
///
/// Deserialization goes through `from_parts`, so a pair read from storage
/// always has a public key derived from its private key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase", try_from = "RawKeyPair")]
pub struct KeyPair {
    #[zeroize(skip)]
    scheme_version: SchemeVersion,
    #[zeroize(skip)]
    public_key: String,
    private_key: String,
}

/// Unchecked wire form of a `KeyPair`.
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
struct RawKeyPair {
    #[zeroize(skip)]
    #[serde(default)]
    scheme_version: SchemeVersion,
    #[zeroize(skip)]
    public_key: String,
    private_key: String,
}

impl TryFrom<RawKeyPair> for KeyPair {
    type Error = CryptoError;

    fn try_from(raw: RawKeyPair) -> Result<Self, Self::Error> {
        let mut pair = KeyPair::from_parts(&raw.public_key, &raw.private_key)?;
        pair.scheme_version = raw.scheme_version;
        Ok(pair)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("scheme_version", &self.scheme_version)
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl KeyPair {
    /// Rebuild a key pair from a private key, deriving its public key.
    pub fn from_private_key_hex(private_key: &str) -> Result<Self, CryptoError> {
        let secret = parse_private_key(private_key)?;
        Ok(Self::from_secret(&secret))
    }

    /// Rebuild a key pair from both halves, checking that they belong together.
    pub fn from_parts(public_key: &str, private_key: &str) -> Result<Self, CryptoError> {
        let pair = Self::from_private_key_hex(private_key)?;
        parse_public_key(public_key, "public key")?;
        if !pair.public_key().eq_ignore_ascii_case(public_key) {
            return Err(CryptoError::InvalidPrivateKey(
                "private key does not match public key".into(),
            ));
        }
        Ok(pair)
    }

    pub fn scheme_version(&self) -> SchemeVersion {
        self.scheme_version
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    fn from_secret(secret: &StaticSecret) -> Self {
        let public = PublicKey::from(secret);
        let secret_bytes = Zeroizing::new(secret.to_bytes());
        Self {
            scheme_version: SchemeVersion::CURRENT,
            public_key: buffer_to_hex(public.as_bytes()),
            private_key: buffer_to_hex(secret_bytes.as_ref()),
        }
    }
}

/// Generate a fresh key pair from the operating system's secure RNG.
pub fn generate_key_pair() -> Result<KeyPair, CryptoError> {
    generate_key_pair_with(&mut rand::rngs::OsRng)
}

/// Generate a fresh key pair from an injected RNG.
pub fn generate_key_pair_with<R: rand::TryCryptoRng>(rng: &mut R) -> Result<KeyPair, CryptoError> {
    let bytes = Zeroizing::new(entropy::random_array::<KEY_SIZE, _>(rng)?);
    let secret = StaticSecret::from(*bytes);
    let pair = KeyPair::from_secret(&secret);
    tracing::debug!(public_key = %&pair.public_key()[..8], "generated key pair");
    Ok(pair)
}

/// Decode a hex public key, reporting failures as `InvalidPublicKey`.
///
/// `what` names the key in the error ("receiver public key", ...).
pub fn parse_public_key(hex: &str, what: &str) -> Result<[u8; KEY_SIZE], CryptoError> {
    hex_to_array::<KEY_SIZE>(hex, what).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

/// Decode a hex private key into an X25519 secret.
pub(crate) fn parse_private_key(hex: &str) -> Result<StaticSecret, CryptoError> {
    let bytes = Zeroizing::new(
        hex_to_array::<KEY_SIZE>(hex, "private key")
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?,
    );
    Ok(StaticSecret::from(*bytes))
}

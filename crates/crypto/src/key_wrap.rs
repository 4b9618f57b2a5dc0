//! Password-based wrapping of a hex private key for server-side recovery.
//!
//! The wrapping key is derived from the password with Argon2id over a random
//! salt, then the private key is sealed with AES-256-GCM. The blob is
//! self-contained: version, KDF parameters, salt and nonce travel with the
//! ciphertext, and the whole header is bound as associated data, so a wrong
//! password or any tampering fails the tag check instead of yielding garbage.
//!
//! Blob layout before base64:
//! `version(1) | m_cost(4) | t_cost(4) | p_cost(4) | salt(16) | nonce(12) | ciphertext+tag`

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::entropy;
use crate::error::CryptoError;
use crate::scheme::SchemeVersion;

const SALT_SIZE: usize = 16;
const NONCE_SIZE: usize = 12; // 96-bit nonce for AES-256-GCM
const KEY_SIZE: usize = 32;
const TAG_SIZE: usize = 16;
const HEADER_SIZE: usize = 1 + 4 * 3 + SALT_SIZE + NONCE_SIZE;
/// Upper bounds on costs accepted from a blob. Memory is capped at 1 GiB.
const MAX_MEMORY_KIB: u32 = 1 << 20;
const MAX_ITERATIONS: u32 = 32;
const MAX_PARALLELISM: u32 = 16;
/// Prefix of OpenSSL-style passphrase blobs from the legacy wrap.
const LEGACY_PREFIX: &[u8] = b"Salted__";

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    fn to_argon2(self) -> Result<argon2::Argon2<'static>, CryptoError> {
        let params = argon2::Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_SIZE),
        )
        .map_err(|e| CryptoError::InvalidKdfParams(e.to_string()))?;
        Ok(argon2::Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            params,
        ))
    }

    /// Check the parameters are accepted by Argon2 and within the limits
    /// unwrap is willing to pay.
    pub fn validate(self) -> Result<(), CryptoError> {
        self.check_limits()?;
        self.to_argon2().map(|_| ())
    }

    fn check_limits(self) -> Result<(), CryptoError> {
        let over = |name: &str, value: u32, max: u32| {
            CryptoError::InvalidKdfParams(format!("{name} {value} exceeds limit {max}"))
        };
        if self.memory_kib > MAX_MEMORY_KIB {
            return Err(over("memory cost (KiB)", self.memory_kib, MAX_MEMORY_KIB));
        }
        if self.iterations > MAX_ITERATIONS {
            return Err(over("iterations", self.iterations, MAX_ITERATIONS));
        }
        if self.parallelism > MAX_PARALLELISM {
            return Err(over("parallelism", self.parallelism, MAX_PARALLELISM));
        }
        Ok(())
    }
}

/// A password-wrapped private key, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WrappedPrivateKey(String);

impl WrappedPrivateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for WrappedPrivateKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for WrappedPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wrap a hex private key under `password` with default KDF parameters.
pub fn wrap_private_key(
    private_key_hex: &str,
    password: &str,
) -> Result<WrappedPrivateKey, CryptoError> {
    wrap_private_key_with(
        &mut rand::rngs::OsRng,
        private_key_hex,
        password,
        KdfParams::default(),
    )
}

/// Wrap a hex private key with an injected RNG and explicit KDF parameters.
pub fn wrap_private_key_with<R: rand::TryCryptoRng>(
    rng: &mut R,
    private_key_hex: &str,
    password: &str,
    params: KdfParams,
) -> Result<WrappedPrivateKey, CryptoError> {
    let salt: [u8; SALT_SIZE] = entropy::random_array(rng)?;
    let nonce_bytes: [u8; NONCE_SIZE] = entropy::random_array(rng)?;

    let mut header = Vec::with_capacity(HEADER_SIZE);
    header.push(SchemeVersion::CURRENT.as_u8());
    header.extend_from_slice(&params.memory_kib.to_be_bytes());
    header.extend_from_slice(&params.iterations.to_be_bytes());
    header.extend_from_slice(&params.parallelism.to_be_bytes());
    header.extend_from_slice(&salt);
    header.extend_from_slice(&nonce_bytes);

    let key = derive_wrapping_key(password, &salt, params)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_ref())
        .map_err(|e| CryptoError::InvalidKdfParams(e.to_string()))?;

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: private_key_hex.as_bytes(),
                aad: &header,
            },
        )
        .map_err(|_| CryptoError::InvalidPrivateKey("private key could not be sealed".into()))?;

    let mut blob = header;
    blob.extend_from_slice(&ciphertext);

    tracing::debug!(
        memory_kib = params.memory_kib,
        iterations = params.iterations,
        "wrapped private key"
    );
    Ok(WrappedPrivateKey(
        base64::engine::general_purpose::STANDARD.encode(blob),
    ))
}

/// Recover the hex private key from a wrapped blob.
///
/// Fails with `DecryptionFailed` on a wrong password or a tampered blob.
pub fn unwrap_private_key(
    wrapped: &WrappedPrivateKey,
    password: &str,
) -> Result<String, CryptoError> {
    let blob = base64::engine::general_purpose::STANDARD.decode(wrapped.as_str())?;
    if blob.starts_with(LEGACY_PREFIX) {
        return Err(CryptoError::MalformedEncoding(
            "legacy passphrase blob is not supported".into(),
        ));
    }
    if blob.len() < HEADER_SIZE + TAG_SIZE {
        return Err(CryptoError::MalformedEncoding(
            "wrapped key too short".into(),
        ));
    }

    SchemeVersion::try_from(blob[0])?;
    let (header, ciphertext) = blob.split_at(HEADER_SIZE);
    let params = KdfParams {
        memory_kib: read_u32(&header[1..5]),
        iterations: read_u32(&header[5..9]),
        parallelism: read_u32(&header[9..13]),
    };
    params.check_limits()?;
    let salt = &header[13..13 + SALT_SIZE];
    let nonce_bytes = &header[13 + SALT_SIZE..];

    let key = derive_wrapping_key(password, salt, params)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_ref())
        .map_err(|e| CryptoError::InvalidKdfParams(e.to_string()))?;

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad: header,
                },
            )
            .map_err(|_| {
                tracing::warn!("private key unwrap rejected");
                CryptoError::DecryptionFailed("wrong password or corrupted key".into())
            })?,
    );

    String::from_utf8(plaintext.to_vec())
        .map_err(|_| CryptoError::DecryptionFailed("unwrapped key is not text".into()))
}

fn derive_wrapping_key(
    password: &str,
    salt: &[u8],
    params: KdfParams,
) -> Result<Zeroizing<[u8; KEY_SIZE]>, CryptoError> {
    let argon2 = params.to_argon2()?;
    let mut output = Zeroizing::new([0u8; KEY_SIZE]);
    argon2
        .hash_password_into(password.as_bytes(), salt, output.as_mut())
        .map_err(|e| CryptoError::InvalidKdfParams(e.to_string()))?;
    Ok(output)
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}

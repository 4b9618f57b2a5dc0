//! Key lifecycle for a user identity: sign-up, login, lazy generation, logout.
//!
//! The local store holds the plaintext key pair for this device. The user
//! directory holds the public key and a password-wrapped copy of the private
//! key; `KeyManager` produces and consumes those directory records but never
//! talks to the directory itself.

use ephemchat_shared::api::user::UserKeyRecord;
use ephemchat_shared::ids::UserId;

use crate::error::CryptoError;
use crate::key_wrap::{unwrap_private_key, wrap_private_key_with, KdfParams, WrappedPrivateKey};
use crate::keypair::{generate_key_pair_with, KeyPair};
use crate::keystore::LocalKeyStore;
use crate::scheme::SchemeVersion;

/// Result of `KeyManager::ensure_keys`.
#[derive(Debug)]
pub struct EnsuredKeys {
    pub pair: KeyPair,
    /// True when a new pair was generated and its public key must be
    /// published to the user directory.
    pub generated: bool,
}

pub struct KeyManager<S: LocalKeyStore> {
    store: S,
    kdf: KdfParams,
}

impl<S: LocalKeyStore> KeyManager<S> {
    pub fn new(store: S, kdf: KdfParams) -> Self {
        Self { store, kdf }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Sign-up: generate a key pair, wrap the private key under `password`,
    /// cache the pair locally and return the record to publish.
    pub fn register(&self, user_id: UserId, password: &str) -> Result<UserKeyRecord, CryptoError> {
        self.register_with(&mut rand::rngs::OsRng, user_id, password)
    }

    pub fn register_with<R: rand::TryCryptoRng>(
        &self,
        rng: &mut R,
        user_id: UserId,
        password: &str,
    ) -> Result<UserKeyRecord, CryptoError> {
        let pair = generate_key_pair_with(rng)?;
        let wrapped = wrap_private_key_with(rng, pair.private_key(), password, self.kdf)?;
        self.store.store(&pair)?;

        tracing::info!(user_id = %user_id, "registered device key pair");
        Ok(UserKeyRecord {
            user_id,
            public_key: pair.public_key().to_string(),
            encrypted_private_key: wrapped.into_string(),
            scheme_version: SchemeVersion::CURRENT.as_u8(),
        })
    }

    /// Login: unwrap the published private key with `password`, check it
    /// matches the published public key, and cache the pair locally.
    ///
    /// A wrong password or a record whose halves do not belong together fails
    /// with `DecryptionFailed`; nothing is cached in that case.
    pub fn restore(&self, record: &UserKeyRecord, password: &str) -> Result<KeyPair, CryptoError> {
        SchemeVersion::try_from(record.scheme_version)?;
        let wrapped = WrappedPrivateKey::from(record.encrypted_private_key.clone());
        let private_key = zeroize::Zeroizing::new(unwrap_private_key(&wrapped, password)?);

        let pair = KeyPair::from_private_key_hex(&private_key).map_err(|_| {
            CryptoError::DecryptionFailed("unwrapped value is not a private key".into())
        })?;
        if !pair.public_key().eq_ignore_ascii_case(&record.public_key) {
            tracing::warn!(user_id = %record.user_id, "restored key does not match directory");
            return Err(CryptoError::DecryptionFailed(
                "private key does not match published public key".into(),
            ));
        }

        self.store.store(&pair)?;
        tracing::info!(user_id = %record.user_id, "restored device key pair");
        Ok(pair)
    }

    /// Return the cached key pair, generating and caching one if none exists.
    pub fn ensure_keys(&self) -> Result<EnsuredKeys, CryptoError> {
        if let Some(pair) = self.store.load()? {
            return Ok(EnsuredKeys {
                pair,
                generated: false,
            });
        }
        let pair = generate_key_pair_with(&mut rand::rngs::OsRng)?;
        self.store.store(&pair)?;
        tracing::info!("generated missing device key pair");
        Ok(EnsuredKeys {
            pair,
            generated: true,
        })
    }

    /// Logout: drop the locally cached key pair.
    pub fn forget(&self) -> Result<(), CryptoError> {
        self.store.clear()?;
        tracing::info!("cleared device key pair");
        Ok(())
    }
}

//! Local cache for the device's own plaintext key pair.
//!
//! Read at startup, written once when keys are generated or restored, cleared
//! on logout. The private key never leaves the device through this store.

use std::sync::Mutex;

use zeroize::Zeroizing;

use crate::config::CryptoConfig;
use crate::error::CryptoError;
use crate::keypair::KeyPair;

const KEYCHAIN_ACCOUNT_PREFIX: &str = "device-keypair-";

/// Storage for the local key pair.
pub trait LocalKeyStore {
    /// Return the cached key pair, or `None` if nothing is cached.
    fn load(&self) -> Result<Option<KeyPair>, CryptoError>;

    /// Replace the cached key pair.
    fn store(&self, pair: &KeyPair) -> Result<(), CryptoError>;

    /// Remove the cached key pair. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), CryptoError>;
}

/// Key pair cached in the OS keychain (Keychain, Credential Manager, Secret Service).
pub struct KeychainKeyStore {
    entry: keyring::Entry,
}

impl KeychainKeyStore {
    /// Open the keychain entry for `account` under `service`.
    pub fn new(service: &str, account: &str) -> Result<Self, CryptoError> {
        let entry = keyring::Entry::new(service, &format!("{KEYCHAIN_ACCOUNT_PREFIX}{account}"))
            .map_err(|_| CryptoError::KeychainUnavailable)?;
        Ok(Self { entry })
    }

    /// Open the entry for `account` under the configured keychain service.
    pub fn from_config(config: &CryptoConfig, account: &str) -> Result<Self, CryptoError> {
        Self::new(&config.keychain_service, account)
    }
}

impl LocalKeyStore for KeychainKeyStore {
    fn load(&self) -> Result<Option<KeyPair>, CryptoError> {
        let json = match self.entry.get_password() {
            Ok(json) => Zeroizing::new(json),
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(e) => {
                tracing::warn!(error = %e, "keychain read failed");
                return Err(CryptoError::from(e));
            }
        };

        // Deserializing checks that the two halves belong together.
        let pair: KeyPair = serde_json::from_str(&json)
            .map_err(|_| CryptoError::KeychainError("malformed key pair in keychain".into()))?;
        Ok(Some(pair))
    }

    fn store(&self, pair: &KeyPair) -> Result<(), CryptoError> {
        let json = Zeroizing::new(serde_json::to_string(pair)?);
        self.entry.set_password(&json).map_err(|e| {
            tracing::warn!(error = %e, "keychain write failed");
            CryptoError::from(e)
        })
    }

    fn clear(&self) -> Result<(), CryptoError> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CryptoError::from(e)),
        }
    }
}

/// Process-local key pair cache, for tests and sessions that must not touch
/// the keychain.
#[derive(Default)]
pub struct MemoryKeyStore {
    slot: Mutex<Option<KeyPair>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalKeyStore for MemoryKeyStore {
    fn load(&self) -> Result<Option<KeyPair>, CryptoError> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        Ok(slot.clone())
    }

    fn store(&self, pair: &KeyPair) -> Result<(), CryptoError> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(pair.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CryptoError> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
        Ok(())
    }
}

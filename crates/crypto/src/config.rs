use std::path::Path;

use serde::Deserialize;

use crate::error::CryptoError;
use crate::key_wrap::KdfParams;

/// Crypto configuration loaded from `ephemchat.toml` with env var overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CryptoConfig {
    /// Argon2id costs for newly wrapped private keys. Existing blobs carry
    /// their own parameters.
    #[serde(default)]
    pub kdf: KdfParams,
    /// OS keychain service name for the device key pair. Default: "com.ephemchat.crypto"
    #[serde(default = "default_keychain_service")]
    pub keychain_service: String,
    /// Tracing log level. Default: "info"
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_keychain_service() -> String {
    "com.ephemchat.crypto".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            keychain_service: default_keychain_service(),
            log_level: default_log_level(),
        }
    }
}

impl CryptoConfig {
    /// Load configuration from the TOML file named by `EPHEMCHAT_CONFIG`
    /// (default `ephemchat.toml`), then apply env var overrides.
    ///
    /// A missing file means defaults; an unreadable or invalid one is an error.
    pub fn load() -> Result<Self, CryptoError> {
        let path =
            std::env::var("EPHEMCHAT_CONFIG").unwrap_or_else(|_| "ephemchat.toml".to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load configuration from `path`, then apply env var overrides.
    pub fn load_from(path: &Path) -> Result<Self, CryptoError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides()?;
                config.kdf.validate()?;
                Ok(config)
            }
            Err(e) => Err(CryptoError::ConfigError(format!(
                "reading {}: {e}",
                path.display()
            ))),
        }
    }

    /// Load configuration from a TOML string, then apply env var overrides.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, CryptoError> {
        let mut config: CryptoConfig =
            toml::from_str(toml_str).map_err(|e| CryptoError::ConfigError(e.to_string()))?;
        config.apply_env_overrides()?;
        config.kdf.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the config.
    ///
    /// Returns an error if an env var is set but has an invalid format
    /// (e.g., EPHEMCHAT_KDF_ITERATIONS=abc).
    pub fn apply_env_overrides(&mut self) -> Result<(), CryptoError> {
        if let Some(val) = parse_env("EPHEMCHAT_KDF_MEMORY_KIB")? {
            self.kdf.memory_kib = val;
        }
        if let Some(val) = parse_env("EPHEMCHAT_KDF_ITERATIONS")? {
            self.kdf.iterations = val;
        }
        if let Some(val) = parse_env("EPHEMCHAT_KDF_PARALLELISM")? {
            self.kdf.parallelism = val;
        }
        if let Ok(val) = std::env::var("EPHEMCHAT_KEYCHAIN_SERVICE") {
            self.keychain_service = val;
        }
        if let Ok(val) = std::env::var("LOG_LEVEL") {
            self.log_level = val;
        }
        Ok(())
    }
}

fn parse_env(name: &str) -> Result<Option<u32>, CryptoError> {
    match std::env::var(name) {
        Ok(val) => val
            .parse()
            .map(Some)
            .map_err(|_| CryptoError::ConfigError(format!("invalid {name} value: {val}"))),
        Err(_) => Ok(None),
    }
}

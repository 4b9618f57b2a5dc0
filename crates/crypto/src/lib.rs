//! ephemchat-crypto: end-to-end encryption core for ephemchat.
//!
//! Provides X25519 key pair generation, password-based wrapping of the
//! private key for server-side recovery, dual-recipient ephemeral-key message
//! encryption (receiver and sender can both read every message), and the key
//! lifecycle around a local key cache.

pub mod account;
pub mod config;
pub mod conversation;
pub mod encoding;
pub mod entropy;
pub mod envelope;
pub mod error;
pub mod key_wrap;
pub mod keypair;
pub mod keystore;
pub mod message;
pub mod scheme;

pub use encoding::{buffer_to_hex, hex_to_buffer};
pub use envelope::{EphemeralEnvelope, Role};
pub use error::CryptoError;
pub use key_wrap::{unwrap_private_key, wrap_private_key, KdfParams, WrappedPrivateKey};
pub use keypair::{generate_key_pair, KeyPair};
pub use message::{decrypt_message, encrypt_for_both};

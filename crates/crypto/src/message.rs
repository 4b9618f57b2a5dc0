//! Ephemeral-key message encryption and decryption.
//!
//! Each outgoing message gets a fresh X25519 key pair. The ephemeral secret
//! is combined with a recipient's public key into a NaCl box
//! (X25519 + HSalsa20 key precomputation + XSalsa20-Poly1305) and then
//! dropped; only the ephemeral public key is kept with the ciphertext.
//!
//! `encrypt_for_both` seals the same plaintext twice under one ephemeral key:
//! once for the receiver and once for the sender, so the sender can reread
//! their own history without keeping the ephemeral secret. Each box gets its
//! own independently drawn nonce.

use crypto_box::aead::{Aead, Nonce};
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::encoding::buffer_to_hex;
use crate::entropy;
use crate::envelope::EphemeralEnvelope;
use crate::error::CryptoError;
use crate::keypair::{parse_public_key, KEY_SIZE};
use crate::scheme::SchemeVersion;

/// Size of a box nonce in bytes.
pub const NONCE_SIZE: usize = 24;
/// Size of the Poly1305 tag appended to every box.
pub const TAG_SIZE: usize = 16;

/// A message sealed for a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedMessage {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
    pub ephemeral_public_key: String,
}

/// Ephemeral secret that lives for exactly one encrypt call.
struct Ephemeral {
    secret: SecretKey,
    public_hex: String,
}

impl Ephemeral {
    fn generate<R: rand::TryCryptoRng>(rng: &mut R) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(entropy::random_array::<KEY_SIZE, _>(rng)?);
        let secret = SecretKey::from(*bytes);
        let public_hex = buffer_to_hex(secret.public_key().as_bytes());
        Ok(Self { secret, public_hex })
    }

    fn seal_for<R: rand::TryCryptoRng>(
        &self,
        rng: &mut R,
        recipient: &PublicKey,
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, [u8; NONCE_SIZE]), CryptoError> {
        let nonce: [u8; NONCE_SIZE] = entropy::random_array(rng)?;
        let shared = SalsaBox::new(recipient, &self.secret);
        let ciphertext = shared
            .encrypt(Nonce::<SalsaBox>::from_slice(&nonce), plaintext)
            .map_err(|_| CryptoError::InvalidPublicKey("box could not be sealed".into()))?;
        Ok((ciphertext, nonce))
    }
}

/// Encrypt `message` for both the receiver and the sender.
pub fn encrypt_for_both(
    message: &str,
    receiver_public_hex: &str,
    sender_public_hex: &str,
) -> Result<EphemeralEnvelope, CryptoError> {
    encrypt_for_both_with(
        &mut rand::rngs::OsRng,
        message,
        receiver_public_hex,
        sender_public_hex,
    )
}

/// Encrypt `message` for both parties, drawing randomness from `rng`.
pub fn encrypt_for_both_with<R: rand::TryCryptoRng>(
    rng: &mut R,
    message: &str,
    receiver_public_hex: &str,
    sender_public_hex: &str,
) -> Result<EphemeralEnvelope, CryptoError> {
    if message.is_empty() {
        return Err(CryptoError::EmptyMessage);
    }
    let receiver = PublicKey::from(parse_public_key(
        receiver_public_hex,
        "receiver public key",
    )?);
    let sender = PublicKey::from(parse_public_key(sender_public_hex, "sender public key")?);

    let ephemeral = Ephemeral::generate(rng)?;
    let (ciphertext, nonce) = ephemeral.seal_for(rng, &receiver, message.as_bytes())?;
    let (self_ciphertext, self_nonce) = ephemeral.seal_for(rng, &sender, message.as_bytes())?;

    tracing::debug!(
        ephemeral_public_key = %&ephemeral.public_hex[..8],
        len = message.len(),
        "sealed message for receiver and sender"
    );

    Ok(EphemeralEnvelope {
        scheme_version: SchemeVersion::CURRENT,
        ciphertext,
        nonce: nonce.to_vec(),
        ephemeral_public_key: ephemeral.public_hex,
        self_ciphertext,
        self_nonce: self_nonce.to_vec(),
    })
}

/// Encrypt `message` for the receiver only.
///
/// The sender cannot read the result back; use `encrypt_for_both` for
/// conversation history.
pub fn encrypt_for_receiver(
    message: &str,
    receiver_public_hex: &str,
) -> Result<SealedMessage, CryptoError> {
    encrypt_for_receiver_with(&mut rand::rngs::OsRng, message, receiver_public_hex)
}

pub fn encrypt_for_receiver_with<R: rand::TryCryptoRng>(
    rng: &mut R,
    message: &str,
    receiver_public_hex: &str,
) -> Result<SealedMessage, CryptoError> {
    if message.is_empty() {
        return Err(CryptoError::EmptyMessage);
    }
    let receiver = PublicKey::from(parse_public_key(
        receiver_public_hex,
        "receiver public key",
    )?);

    let ephemeral = Ephemeral::generate(rng)?;
    let (ciphertext, nonce) = ephemeral.seal_for(rng, &receiver, message.as_bytes())?;

    Ok(SealedMessage {
        ciphertext,
        nonce: nonce.to_vec(),
        ephemeral_public_key: ephemeral.public_hex,
    })
}

/// Decrypt one ciphertext/nonce pair with the local private key.
///
/// Fails with `DecryptionFailed` for a wrong key, a corrupted ciphertext, a
/// nonce that does not belong to the ciphertext, or a nonce of the wrong size.
/// Retrying with the same inputs always fails the same way.
pub fn decrypt_message(
    ciphertext: &[u8],
    nonce: &[u8],
    ephemeral_public_hex: &str,
    my_private_key_hex: &str,
) -> Result<String, CryptoError> {
    if nonce.len() != NONCE_SIZE {
        return Err(CryptoError::DecryptionFailed(format!(
            "nonce must be {NONCE_SIZE} bytes, got {}",
            nonce.len()
        )));
    }
    let ephemeral = PublicKey::from(parse_public_key(
        ephemeral_public_hex,
        "ephemeral public key",
    )?);
    let secret_bytes = Zeroizing::new(
        crate::encoding::hex_to_array::<KEY_SIZE>(my_private_key_hex, "private key")
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?,
    );
    let secret = SecretKey::from(*secret_bytes);

    let shared = SalsaBox::new(&ephemeral, &secret);
    let plaintext = Zeroizing::new(
        shared
            .decrypt(Nonce::<SalsaBox>::from_slice(nonce), ciphertext)
            .map_err(|_| {
                tracing::warn!(
                    ephemeral_public_key = %ephemeral_public_hex.get(..8).unwrap_or_default(),
                    "message authentication failed"
                );
                CryptoError::DecryptionFailed("message authentication failed".into())
            })?,
    );

    String::from_utf8(plaintext.to_vec())
        .map_err(|_| CryptoError::DecryptionFailed("plaintext is not valid UTF-8".into()))
}

/// Decrypt a single-recipient sealed message.
pub fn open_sealed(sealed: &SealedMessage, my_private_key_hex: &str) -> Result<String, CryptoError> {
    decrypt_message(
        &sealed.ciphertext,
        &sealed.nonce,
        &sealed.ephemeral_public_key,
        my_private_key_hex,
    )
}

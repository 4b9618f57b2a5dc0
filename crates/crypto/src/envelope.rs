//! The per-message record produced by `encrypt_for_both`.

use chrono::{DateTime, Utc};
use ephemchat_shared::api::message::MessageRecord;
use ephemchat_shared::ids::UserId;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::message::decrypt_message;
use crate::scheme::SchemeVersion;

/// Which side of a message the local user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The user the message was addressed to.
    Receiver,
    /// The user who wrote the message, rereading their own history.
    Sender,
}

/// Two boxes of the same plaintext sharing one ephemeral public key.
///
/// `ciphertext`/`nonce` open with the receiver's private key,
/// `self_ciphertext`/`self_nonce` with the sender's. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EphemeralEnvelope {
    #[serde(default)]
    pub scheme_version: SchemeVersion,
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
    pub ephemeral_public_key: String,
    pub self_ciphertext: Vec<u8>,
    pub self_nonce: Vec<u8>,
}

impl EphemeralEnvelope {
    /// The `(ciphertext, nonce)` pair readable by `role`.
    pub fn ciphertext_for(&self, role: Role) -> (&[u8], &[u8]) {
        match role {
            Role::Receiver => (self.ciphertext.as_slice(), self.nonce.as_slice()),
            Role::Sender => (self.self_ciphertext.as_slice(), self.self_nonce.as_slice()),
        }
    }

    /// Decrypt the box belonging to `role` with that party's private key.
    pub fn open_as(&self, role: Role, my_private_key_hex: &str) -> Result<String, CryptoError> {
        let (ciphertext, nonce) = self.ciphertext_for(role);
        decrypt_message(
            ciphertext,
            nonce,
            &self.ephemeral_public_key,
            my_private_key_hex,
        )
    }

    /// Build the message-log entry for this envelope.
    pub fn into_record(
        self,
        sender: UserId,
        receiver: UserId,
        timestamp: DateTime<Utc>,
    ) -> MessageRecord {
        MessageRecord {
            sender_id: sender.into(),
            receiver_id: Some(receiver),
            text: None,
            ciphertext: self.ciphertext,
            nonce: self.nonce,
            ephemeral_public_key: Some(self.ephemeral_public_key),
            self_ciphertext: self.self_ciphertext,
            self_nonce: self.self_nonce,
            scheme_version: self.scheme_version.as_u8(),
            timestamp,
            seen: false,
        }
    }
}

impl TryFrom<&MessageRecord> for EphemeralEnvelope {
    type Error = CryptoError;

    fn try_from(record: &MessageRecord) -> Result<Self, Self::Error> {
        let scheme_version = SchemeVersion::try_from(record.scheme_version)?;
        let ephemeral_public_key = record.ephemeral_public_key.clone().ok_or_else(|| {
            CryptoError::MalformedEncoding("record carries no ephemeral public key".into())
        })?;
        Ok(Self {
            scheme_version,
            ciphertext: record.ciphertext.clone(),
            nonce: record.nonce.clone(),
            ephemeral_public_key,
            self_ciphertext: record.self_ciphertext.clone(),
            self_nonce: record.self_nonce.clone(),
        })
    }
}

use crate::constants::{DEFAULT_SCHEME_VERSION, SYSTEM_SENDER_ID};
use crate::ids::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a message log entry: either a user or the log itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SenderId {
    System,
    User(UserId),
}

impl From<SenderId> for String {
    fn from(sender: SenderId) -> Self {
        match sender {
            SenderId::System => SYSTEM_SENDER_ID.to_string(),
            SenderId::User(id) => id.to_string(),
        }
    }
}

impl TryFrom<String> for SenderId {
    type Error = uuid::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == SYSTEM_SENDER_ID {
            return Ok(SenderId::System);
        }
        value.parse().map(SenderId::User)
    }
}

impl From<UserId> for SenderId {
    fn from(id: UserId) -> Self {
        SenderId::User(id)
    }
}

fn default_scheme_version() -> u8 {
    DEFAULT_SCHEME_VERSION
}

/// One entry of a conversation's append-only message log.
///
/// Byte fields serialize as JSON arrays of integers 0–255. Encrypted entries
/// carry an ephemeral public key and both ciphertext/nonce pairs; system
/// notices carry plaintext `text` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub sender_id: SenderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ciphertext: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nonce: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub self_ciphertext: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub self_nonce: Vec<u8>,
    #[serde(default = "default_scheme_version")]
    pub scheme_version: u8,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub seen: bool,
}

impl MessageRecord {
    /// A plaintext notice authored by the log itself.
    pub fn system(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            sender_id: SenderId::System,
            receiver_id: None,
            text: Some(text.into()),
            ciphertext: Vec::new(),
            nonce: Vec::new(),
            ephemeral_public_key: None,
            self_ciphertext: Vec::new(),
            self_nonce: Vec::new(),
            scheme_version: DEFAULT_SCHEME_VERSION,
            timestamp,
            seen: false,
        }
    }

    pub fn is_system(&self) -> bool {
        self.sender_id == SenderId::System
    }

    /// Whether the entry carries an encrypted payload.
    pub fn is_encrypted(&self) -> bool {
        self.ephemeral_public_key.is_some()
    }

    pub fn is_from(&self, user: &UserId) -> bool {
        self.sender_id == SenderId::User(*user)
    }
}

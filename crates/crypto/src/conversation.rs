//! Message-log glue: turn outgoing text into log records and log records
//! back into displayable text.
//!
//! This is where the local user's role for a record is decided; the cipher
//! itself only ever sees one ciphertext/nonce pair.

use chrono::{DateTime, Utc};
use ephemchat_shared::api::message::MessageRecord;
use ephemchat_shared::constants::MAX_MESSAGE_SIZE_BYTES;
use ephemchat_shared::error::ChatError;
use ephemchat_shared::ids::UserId;

use crate::envelope::{EphemeralEnvelope, Role};
use crate::message::encrypt_for_both;

/// A log record as the local user sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenedMessage {
    /// Plaintext notice from the log itself.
    System { text: String },
    /// Decrypted message; `mine` is true for messages the local user sent.
    Text { text: String, mine: bool },
    /// A record that could not be decrypted with the local key.
    Unreadable { mine: bool },
}

impl OpenedMessage {
    /// Text to render for this record.
    pub fn display_text(&self) -> &str {
        match self {
            OpenedMessage::System { text } | OpenedMessage::Text { text, .. } => text,
            OpenedMessage::Unreadable { .. } => "Error decrypting message",
        }
    }
}

/// Seal `text` for `receiver` and `sender` and build the log record.
///
/// Text that is blank after trimming, or oversized, is a validation error.
/// Otherwise the text is sealed exactly as typed. Bad public keys surface as
/// crypto errors.
pub fn seal_text(
    text: &str,
    sender: UserId,
    receiver: UserId,
    sender_public_hex: &str,
    receiver_public_hex: &str,
    timestamp: DateTime<Utc>,
) -> Result<MessageRecord, ChatError> {
    if text.trim().is_empty() {
        return Err(ChatError::Validation("message is empty".into()));
    }
    if text.len() > MAX_MESSAGE_SIZE_BYTES {
        return Err(ChatError::Validation(format!(
            "message exceeds {MAX_MESSAGE_SIZE_BYTES} bytes"
        )));
    }

    let envelope = encrypt_for_both(text, receiver_public_hex, sender_public_hex)?;
    Ok(envelope.into_record(sender, receiver, timestamp))
}

/// Open a log record for the local user `me`.
///
/// Own messages are read from the sender box, everything else from the
/// receiver box. Failures become `Unreadable` rather than errors so one bad
/// record does not hide the rest of the conversation.
pub fn open_record(record: &MessageRecord, me: &UserId, my_private_key_hex: &str) -> OpenedMessage {
    let mine = record.is_from(me);

    if record.is_system() || !record.is_encrypted() {
        return match &record.text {
            Some(text) if record.is_system() => OpenedMessage::System { text: text.clone() },
            Some(text) => OpenedMessage::Text {
                text: text.clone(),
                mine,
            },
            None => OpenedMessage::Unreadable { mine },
        };
    }

    let role = if mine { Role::Sender } else { Role::Receiver };
    let opened = EphemeralEnvelope::try_from(record)
        .and_then(|envelope| envelope.open_as(role, my_private_key_hex));

    match opened {
        Ok(text) => OpenedMessage::Text { text, mine },
        Err(e) => {
            tracing::warn!(error = %e, mine, "could not open message record");
            OpenedMessage::Unreadable { mine }
        }
    }
}

/// Open every record of a conversation in log order.
pub fn open_conversation(
    records: &[MessageRecord],
    me: &UserId,
    my_private_key_hex: &str,
) -> Vec<OpenedMessage> {
    records
        .iter()
        .map(|record| open_record(record, me, my_private_key_hex))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::{generate_key_pair, KeyPair};

    struct Party {
        id: UserId,
        keys: KeyPair,
    }

    fn party() -> Party {
        Party {
            id: UserId::new(),
            keys: generate_key_pair().unwrap(),
        }
    }

    fn seal(from: &Party, to: &Party, text: &str) -> MessageRecord {
        seal_text(
            text,
            from.id,
            to.id,
            from.keys.public_key(),
            to.keys.public_key(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn both_parties_read_the_same_record() {
        let alice = party();
        let bob = party();
        let record = seal(&alice, &bob, "hello");

        let for_bob = open_record(&record, &bob.id, bob.keys.private_key());
        let for_alice = open_record(&record, &alice.id, alice.keys.private_key());
        assert_eq!(
            for_bob,
            OpenedMessage::Text {
                text: "hello".into(),
                mine: false
            }
        );
        assert_eq!(
            for_alice,
            OpenedMessage::Text {
                text: "hello".into(),
                mine: true
            }
        );
    }

    #[test]
    fn surrounding_whitespace_is_kept() {
        let alice = party();
        let bob = party();
        let record = seal(&alice, &bob, "  indented\n");
        let opened = open_record(&record, &bob.id, bob.keys.private_key());
        assert_eq!(opened.display_text(), "  indented\n");
    }

    #[test]
    fn third_party_sees_unreadable() {
        let alice = party();
        let bob = party();
        let eve = party();
        let record = seal(&alice, &bob, "private");
        let opened = open_record(&record, &eve.id, eve.keys.private_key());
        assert_eq!(opened, OpenedMessage::Unreadable { mine: false });
        assert_eq!(opened.display_text(), "Error decrypting message");
    }

    #[test]
    fn system_record_passes_through() {
        let alice = party();
        let record = MessageRecord::system("Bob joined", Utc::now());
        let opened = open_record(&record, &alice.id, alice.keys.private_key());
        assert_eq!(
            opened,
            OpenedMessage::System {
                text: "Bob joined".into()
            }
        );
    }

    #[test]
    fn tampered_record_is_unreadable() {
        let alice = party();
        let bob = party();
        let mut record = seal(&alice, &bob, "hello");
        record.ciphertext[0] ^= 0xff;
        let opened = open_record(&record, &bob.id, bob.keys.private_key());
        assert_eq!(opened, OpenedMessage::Unreadable { mine: false });
        // The sender's copy is untouched.
        let mine = open_record(&record, &alice.id, alice.keys.private_key());
        assert_eq!(mine.display_text(), "hello");
    }

    #[test]
    fn blank_text_is_validation_error() {
        let alice = party();
        let bob = party();
        let result = seal_text(
            "   ",
            alice.id,
            bob.id,
            alice.keys.public_key(),
            bob.keys.public_key(),
            Utc::now(),
        );
        assert!(matches!(result, Err(ChatError::Validation(_))));
    }

    #[test]
    fn oversized_text_is_validation_error() {
        let alice = party();
        let bob = party();
        let text = "x".repeat(MAX_MESSAGE_SIZE_BYTES + 1);
        let result = seal_text(
            &text,
            alice.id,
            bob.id,
            alice.keys.public_key(),
            bob.keys.public_key(),
            Utc::now(),
        );
        assert!(matches!(result, Err(ChatError::Validation(_))));
    }

    #[test]
    fn missing_receiver_key_is_crypto_error() {
        let alice = party();
        let bob = party();
        let result = seal_text("hi", alice.id, bob.id, alice.keys.public_key(), "", Utc::now());
        assert!(matches!(result, Err(ChatError::Crypto(_))));
    }

    #[test]
    fn open_conversation_keeps_order() {
        let alice = party();
        let bob = party();
        let records = vec![
            MessageRecord::system("chat started", Utc::now()),
            seal(&alice, &bob, "one"),
            seal(&bob, &alice, "two"),
        ];
        let texts: Vec<String> = open_conversation(&records, &alice.id, alice.keys.private_key())
            .iter()
            .map(|m| m.display_text().to_string())
            .collect();
        assert_eq!(texts, vec!["chat started", "one", "two"]);
    }
}

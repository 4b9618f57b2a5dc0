//! Full roundtrip integration smoke test for ephemchat-crypto.
//!
//! Exercises the complete flow between two parties: sign-up key generation,
//! private-key wrapping, restore on a second device, dual-recipient message
//! encryption, reading by receiver and sender, and failure cases.

use chrono::Utc;
use ephemchat_crypto::account::KeyManager;
use ephemchat_crypto::conversation::{self, OpenedMessage};
use ephemchat_crypto::error::CryptoError;
use ephemchat_crypto::key_wrap::{self, KdfParams};
use ephemchat_crypto::keypair;
use ephemchat_crypto::keystore::{LocalKeyStore, MemoryKeyStore};
use ephemchat_crypto::message;
use ephemchat_crypto::{EphemeralEnvelope, Role};
use ephemchat_shared::api::message::MessageRecord;
use ephemchat_shared::api::user::UserKeyRecord;
use ephemchat_shared::ids::UserId;

fn test_kdf() -> KdfParams {
    KdfParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

#[test]
fn hello_from_alice_to_bob() {
    let alice = keypair::generate_key_pair().unwrap();
    let bob = keypair::generate_key_pair().unwrap();

    let env = message::encrypt_for_both("hello", bob.public_key(), alice.public_key()).unwrap();

    // Bob reads the message addressed to him.
    let bob_reads = message::decrypt_message(
        &env.ciphertext,
        &env.nonce,
        &env.ephemeral_public_key,
        bob.private_key(),
    )
    .unwrap();
    assert_eq!(bob_reads, "hello");

    // Alice rereads her sent message later.
    let alice_reads = message::decrypt_message(
        &env.self_ciphertext,
        &env.self_nonce,
        &env.ephemeral_public_key,
        alice.private_key(),
    )
    .unwrap();
    assert_eq!(alice_reads, "hello");

    // Alice cannot read Bob's copy.
    let cross = message::decrypt_message(
        &env.ciphertext,
        &env.nonce,
        &env.ephemeral_public_key,
        alice.private_key(),
    );
    assert!(matches!(cross, Err(CryptoError::DecryptionFailed(_))));
}

#[test]
fn full_lifecycle_across_devices() {
    // -- Step 1: Both users sign up; the directory keeps their records --
    let alice_id = UserId::new();
    let bob_id = UserId::new();
    let alice_phone = KeyManager::new(MemoryKeyStore::new(), test_kdf());
    let bob_phone = KeyManager::new(MemoryKeyStore::new(), test_kdf());

    let alice_record = alice_phone.register(alice_id, "alice-pw").unwrap();
    let bob_record = bob_phone.register(bob_id, "bob-pw").unwrap();

    // The directory record survives a JSON roundtrip.
    let json = serde_json::to_string(&alice_record).unwrap();
    let alice_record: UserKeyRecord = serde_json::from_str(&json).unwrap();

    // -- Step 2: Alice sends Bob a message using the directory public key --
    let alice_keys = alice_phone.store().load().unwrap().unwrap();
    let record = conversation::seal_text(
        "hello",
        alice_id,
        bob_id,
        alice_keys.public_key(),
        &bob_record.public_key,
        Utc::now(),
    )
    .unwrap();

    // -- Step 3: The log stores it as JSON --
    let stored = serde_json::to_string(&record).unwrap();
    let fetched: MessageRecord = serde_json::from_str(&stored).unwrap();

    // -- Step 4: Bob reads it on his phone --
    let bob_keys = bob_phone.store().load().unwrap().unwrap();
    let opened = conversation::open_record(&fetched, &bob_id, bob_keys.private_key());
    assert_eq!(
        opened,
        OpenedMessage::Text {
            text: "hello".into(),
            mine: false
        }
    );

    // -- Step 5: Alice logs out, then logs in on a laptop --
    alice_phone.forget().unwrap();
    assert!(alice_phone.store().load().unwrap().is_none());

    let alice_laptop = KeyManager::new(MemoryKeyStore::new(), test_kdf());
    let restored = alice_laptop.restore(&alice_record, "alice-pw").unwrap();
    assert_eq!(restored.public_key(), alice_record.public_key);

    // -- Step 6: Alice rereads her sent message on the laptop --
    let reread = conversation::open_record(&fetched, &alice_id, restored.private_key());
    assert_eq!(reread.display_text(), "hello");

    // -- Step 7: A wrong password never yields a key --
    let wrong = KeyManager::new(MemoryKeyStore::new(), test_kdf()).restore(&alice_record, "guess");
    assert!(matches!(wrong, Err(CryptoError::DecryptionFailed(_))));
}

#[test]
fn wrapped_key_roundtrip_and_wrong_password() {
    let pair = keypair::generate_key_pair().unwrap();
    let wrapped =
        key_wrap::wrap_private_key_with(&mut rand::rngs::OsRng, pair.private_key(), "p1", test_kdf())
            .unwrap();

    assert_eq!(
        key_wrap::unwrap_private_key(&wrapped, "p1").unwrap(),
        pair.private_key()
    );
    assert!(matches!(
        key_wrap::unwrap_private_key(&wrapped, "p2"),
        Err(CryptoError::DecryptionFailed(_))
    ));
}

#[test]
fn envelope_from_record_opens_by_role() {
    let alice = keypair::generate_key_pair().unwrap();
    let bob = keypair::generate_key_pair().unwrap();
    let env = message::encrypt_for_both("by role", bob.public_key(), alice.public_key()).unwrap();
    let record = env.into_record(UserId::new(), UserId::new(), Utc::now());

    let env = EphemeralEnvelope::try_from(&record).unwrap();
    assert_eq!(env.open_as(Role::Receiver, bob.private_key()).unwrap(), "by role");
    assert_eq!(env.open_as(Role::Sender, alice.private_key()).unwrap(), "by role");
}

#[test]
fn many_messages_never_reuse_ephemeral_keys() {
    let alice = keypair::generate_key_pair().unwrap();
    let bob = keypair::generate_key_pair().unwrap();

    let mut seen = std::collections::HashSet::new();
    for i in 0..50 {
        let text = format!("message {i}");
        let env = message::encrypt_for_both(&text, bob.public_key(), alice.public_key()).unwrap();
        assert!(seen.insert(env.ephemeral_public_key.clone()));
        assert!(seen.insert(nonce_key(&env.nonce)));
        assert!(seen.insert(nonce_key(&env.self_nonce)));
        assert_eq!(env.open_as(Role::Receiver, bob.private_key()).unwrap(), text);
    }
}

fn nonce_key(nonce: &[u8]) -> String {
    format!("nonce:{}", ephemchat_crypto::buffer_to_hex(nonce))
}

#[test]
fn concurrent_senders_share_no_state() {
    let bob = keypair::generate_key_pair().unwrap();
    let bob_public = bob.public_key().to_string();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let bob_public = bob_public.clone();
            std::thread::spawn(move || {
                let me = keypair::generate_key_pair().unwrap();
                let text = format!("from thread {i}");
                let env = message::encrypt_for_both(&text, &bob_public, me.public_key()).unwrap();
                (text, env)
            })
        })
        .collect();

    for handle in handles {
        let (text, env) = handle.join().unwrap();
        assert_eq!(env.open_as(Role::Receiver, bob.private_key()).unwrap(), text);
    }
}

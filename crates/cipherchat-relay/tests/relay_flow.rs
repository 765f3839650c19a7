//! End-to-end relay flow over the in-memory store: register two users with
//! real RSA key pairs, encrypt for the receiver, submit through the engine,
//! and decrypt what arrives on the live channel.

use std::sync::Arc;

use cipherchat_core::storage::memory::MemoryStorage;
use cipherchat_core::storage::{MessageStore, UserStore};
use cipherchat_core::{NewUser, OutboundFrame, User};
use cipherchat_crypto::{decrypt, encrypt, generate_key_pair};
use cipherchat_relay::{ChannelHandle, ConnectionRegistry, RelayEngine, Submission};

async fn register_user(storage: &MemoryStorage, nickname: &str) -> User {
    let pair = generate_key_pair().expect("key pair generated");
    storage
        .create_user(NewUser::with_nickname(nickname).with_keys(pair.public_key, pair.private_key))
        .await
        .expect("user created")
}

fn engine_over(storage: &Arc<MemoryStorage>) -> RelayEngine {
    RelayEngine::new(storage.clone(), storage.clone(), ConnectionRegistry::new())
}

#[test_log::test(tokio::test)]
async fn encrypted_message_reaches_a_live_receiver() {
    let storage = MemoryStorage::new();
    let alice = register_user(&storage, "alice").await;
    let bob = register_user(&storage, "bob").await;

    let engine = engine_over(&storage);

    // Bob connects; his channel is the one the engine forwards into.
    let (handle, mut rx) = ChannelHandle::new();
    engine.registry().register(bob.id, handle);

    let bob_public = bob.public_key.as_deref().expect("receiver has a key");
    let ciphertext = encrypt("hello", bob_public).expect("encrypted for bob");

    let persisted = engine
        .submit(Submission {
            sender_id: Some(alice.id),
            content: "hello".to_string(),
            encrypted_content: ciphertext,
            receiver_id: Some(bob.id),
        })
        .await
        .expect("submission accepted");

    let frame = rx.recv().await.expect("delivery frame forwarded");
    let OutboundFrame::Message { data } = frame else {
        panic!("expected a delivery frame");
    };
    assert_eq!(data.id, persisted.id);
    assert_eq!(data.sender_id, Some(alice.id));
    assert_eq!(data.receiver_id, bob.id);
    assert_eq!(data.content, "hello");

    let bob_private = bob.private_key.as_deref().expect("receiver has a key");
    let plaintext = decrypt(&data.encrypted_content, bob_private).expect("decrypted");
    assert_eq!(plaintext, "hello");
}

#[test_log::test(tokio::test)]
async fn offline_receiver_reads_the_message_from_history() {
    let storage = MemoryStorage::new();
    let alice = register_user(&storage, "alice").await;
    let bob = register_user(&storage, "bob").await;

    let engine = engine_over(&storage);

    let bob_public = bob.public_key.as_deref().expect("receiver has a key");
    let ciphertext = encrypt("hello", bob_public).expect("encrypted for bob");

    engine
        .submit(Submission {
            sender_id: Some(alice.id),
            content: "hello".to_string(),
            encrypted_content: ciphertext,
            receiver_id: Some(bob.id),
        })
        .await
        .expect("submission accepted");

    // Nothing was live, so delivery happens through the history listing.
    let history = storage.list_for_user(bob.id).await.expect("listable");
    assert_eq!(history.len(), 1);

    let bob_private = bob.private_key.as_deref().expect("receiver has a key");
    let plaintext = decrypt(&history[0].encrypted_content, bob_private).expect("decrypted");
    assert_eq!(plaintext, "hello");
}

#[test_log::test(tokio::test)]
async fn reconnect_supersedes_and_only_the_new_channel_delivers() {
    let storage = MemoryStorage::new();
    let alice = register_user(&storage, "alice").await;
    let bob = register_user(&storage, "bob").await;

    let engine = engine_over(&storage);

    let (stale, mut stale_rx) = ChannelHandle::new();
    engine.registry().register(bob.id, stale.clone());

    let (fresh, mut fresh_rx) = ChannelHandle::new();
    engine.registry().register(bob.id, fresh);

    // The stale connection tears down after being superseded.
    assert!(!engine.registry().unregister(bob.id, &stale));

    let bob_public = bob.public_key.as_deref().expect("receiver has a key");
    let ciphertext = encrypt("hello", bob_public).expect("encrypted for bob");

    engine
        .submit(Submission {
            sender_id: Some(alice.id),
            content: "hello".to_string(),
            encrypted_content: ciphertext,
            receiver_id: Some(bob.id),
        })
        .await
        .expect("submission accepted");

    assert!(fresh_rx.recv().await.is_some());
    assert!(stale_rx.try_recv().is_err());
}

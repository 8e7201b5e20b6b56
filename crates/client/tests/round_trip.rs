//! Client against a real server router on a loopback listener.

use common::{SecretKind, ServiceError};
use keeper_client::keys::KeyFileError;
use keeper_client::payload::{BankCard, Binary, Text};
use keeper_client::{ClientError, KeeperClient, KeyStore, NewSecret, SecretPayload};
use keeper_server::server::{router, state::AppState};
use tokio::net::TcpListener;

async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router::build(AppState::default());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn card() -> SecretPayload {
    SecretPayload::BankCard(BankCard {
        number: "4111111111111111".into(),
        expire_at: "12/29".into(),
        name: "Alice".into(),
        surname: "Liddell".into(),
    })
}

#[tokio::test]
async fn secret_lifecycle_through_the_client() {
    let base = spawn_server().await;
    let keys = tempfile::tempdir().unwrap();

    let mut alice = KeeperClient::new(&base, KeyStore::new(keys.path())).unwrap();
    alice.register("alice", "pw1").await.unwrap();
    assert!(keys.path().join("alice-cert.pem").exists());

    let id = alice
        .create(NewSecret {
            name: "bank1".into(),
            payload: card(),
            meta: "main card".into(),
        })
        .await
        .unwrap();

    let listed = alice.list(None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "bank1");
    assert_eq!(listed[0].kind, SecretKind::BankCard);
    assert!(alice.list(Some(SecretKind::Text)).await.unwrap().is_empty());

    let secret = alice.get(id).await.unwrap();
    assert_eq!(secret.payload, card());
    assert_eq!(secret.meta, "main card");

    // Larger than one RSA chunk.
    let file = SecretPayload::Binary(Binary {
        name: "notes.bin".into(),
        value: (0..=255u8).cycle().take(4096).collect(),
    });
    alice.update(id, file.clone(), "").await.unwrap();
    let secret = alice.get(id).await.unwrap();
    assert_eq!(secret.kind, SecretKind::Binary);
    assert_eq!(secret.payload, file);
    assert_eq!(secret.meta, "");

    alice.delete(id).await.unwrap();
    assert!(matches!(
        alice.get(id).await,
        Err(ClientError::Service(ServiceError::NotFound(_)))
    ));

    alice.logout().await.unwrap();
    assert!(!alice.is_logged_in());
}

#[tokio::test]
async fn second_login_reads_key_file_and_other_users_are_forbidden() {
    let base = spawn_server().await;
    let keys = tempfile::tempdir().unwrap();

    let mut first = KeeperClient::new(&base, KeyStore::new(keys.path())).unwrap();
    first.register("alice", "pw1").await.unwrap();
    let id = first
        .create(NewSecret {
            name: "note".into(),
            payload: SecretPayload::Text(Text {
                value: "remember the milk".into(),
            }),
            meta: String::new(),
        })
        .await
        .unwrap();

    // A fresh process for the same user decrypts with the stored key.
    let mut again = KeeperClient::new(&base, KeyStore::new(keys.path())).unwrap();
    again.login("alice", "pw1").await.unwrap();
    let secret = again.get(id).await.unwrap();
    assert_eq!(
        secret.payload,
        SecretPayload::Text(Text {
            value: "remember the milk".into()
        })
    );

    let mut bob = KeeperClient::new(&base, KeyStore::new(keys.path())).unwrap();
    bob.register("bob", "pw2").await.unwrap();
    assert!(matches!(
        bob.get(id).await,
        Err(ClientError::Service(ServiceError::Forbidden(_)))
    ));
    assert!(matches!(
        bob.delete(id).await,
        Err(ClientError::Service(ServiceError::Forbidden(_)))
    ));
    assert!(bob.list(None).await.unwrap().is_empty());

    // Duplicate name is rejected across users.
    assert!(matches!(
        bob.create(NewSecret {
            name: "note".into(),
            payload: card(),
            meta: String::new(),
        })
        .await,
        Err(ClientError::Service(ServiceError::Conflict(_)))
    ));
}

#[tokio::test]
async fn login_failures() {
    let base = spawn_server().await;
    let keys = tempfile::tempdir().unwrap();
    let other_keys = tempfile::tempdir().unwrap();

    let mut alice = KeeperClient::new(&base, KeyStore::new(keys.path())).unwrap();
    alice.register("alice", "pw1").await.unwrap();

    let mut wrong_password = KeeperClient::new(&base, KeyStore::new(keys.path())).unwrap();
    assert!(matches!(
        wrong_password.login("alice", "nope").await,
        Err(ClientError::Service(ServiceError::Unauthorized(_)))
    ));

    let mut no_key = KeeperClient::new(&base, KeyStore::new(other_keys.path())).unwrap();
    assert!(matches!(
        no_key.login("alice", "pw1").await,
        Err(ClientError::KeyFile(KeyFileError::Missing(_)))
    ));
    assert!(!no_key.is_logged_in());

    let mut duplicate = KeeperClient::new(&base, KeyStore::new(other_keys.path())).unwrap();
    assert!(matches!(
        duplicate.register("alice", "pw2").await,
        Err(ClientError::Service(ServiceError::Conflict(_)))
    ));
    // Nothing is written when the server refuses the registration.
    assert!(!other_keys.path().join("alice-cert.pem").exists());
}

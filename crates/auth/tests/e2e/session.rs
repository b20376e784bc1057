use std::time::Duration;

use futures::future::join_all;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::time::sleep;
use wetask_session::{SessionError, TokenPair};

use super::{launch_issuer, launch_issuer_with_token_duration};

#[tokio::test]
async fn register_and_fetch_identity() {
    let issuer = launch_issuer().await;
    let client = issuer.client();

    let session = client.register("a@x.com", "secret1", "A").await.unwrap();
    assert_eq!(session.user.email, "a@x.com");

    let me: Value = client.get("/auth/me").await.unwrap().unwrap();

    assert_eq!(me["email"], "a@x.com");
    assert_eq!(me["name"], "A");
    assert_eq!(me["id"], session.user.id);
}

#[tokio::test]
async fn expired_access_token_is_refreshed_transparently() {
    let issuer = launch_issuer_with_token_duration(Duration::from_secs(1)).await;
    let client = issuer.client();

    client.register("a@x.com", "secret1", "A").await.unwrap();
    let first = client.tokens().unwrap();

    sleep(Duration::from_millis(2100)).await;

    let me: Value = client.get("/auth/me").await.unwrap().unwrap();
    assert_eq!(me["email"], "a@x.com");

    let second = client.tokens().unwrap();
    assert_ne!(second.access_token, first.access_token);
    assert_ne!(second.refresh_token, first.refresh_token);

    let replayed = issuer.refresh_raw(&first.refresh_token).await;
    assert_eq!(replayed.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn concurrent_expiry_uses_a_single_exchange() {
    let issuer = launch_issuer_with_token_duration(Duration::from_secs(1)).await;
    let client = issuer.client();

    client.register("a@x.com", "secret1", "A").await.unwrap();
    sleep(Duration::from_millis(2100)).await;

    let results = join_all((0..6).map(|_| {
        let client = client.clone();
        async move { client.get::<Value>("/auth/me").await }
    }))
    .await;

    for result in results {
        assert_eq!(result.unwrap().unwrap()["email"], "a@x.com");
    }
    assert!(client.is_authenticated());
}

#[tokio::test]
async fn refresh_token_is_single_use() {
    let issuer = launch_issuer().await;
    let client = issuer.client();

    client.register("a@x.com", "secret1", "A").await.unwrap();
    let session = client.tokens().unwrap();

    let first = issuer.refresh_raw(&session.refresh_token).await;
    assert_eq!(first.status(), StatusCode::OK);

    let rotated: TokenPair = first.json().await.unwrap();
    assert!(rotated.is_complete());

    let second = issuer.refresh_raw(&session.refresh_token).await;
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn consumed_refresh_token_expires_session() {
    let issuer = launch_issuer_with_token_duration(Duration::from_secs(1)).await;
    let client = issuer.client();

    client.register("a@x.com", "secret1", "A").await.unwrap();
    let tokens = client.tokens().unwrap();

    let consumed = issuer.refresh_raw(&tokens.refresh_token).await;
    assert_eq!(consumed.status(), StatusCode::OK);

    sleep(Duration::from_millis(2100)).await;

    let result = client.get::<Value>("/auth/me").await;

    assert!(matches!(result, Err(SessionError::SessionExpired)));
    assert_eq!(client.tokens(), None);
}

#[tokio::test]
async fn logout_revokes_refresh_token() {
    let issuer = launch_issuer().await;
    let client = issuer.client();

    client.register("a@x.com", "secret1", "A").await.unwrap();
    let tokens = client.tokens().unwrap();

    client.logout().await;

    assert!(!client.is_authenticated());
    let response = issuer.refresh_raw(&tokens.refresh_token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn credential_errors() {
    let issuer = launch_issuer().await;
    let client = issuer.client();

    client.register("a@x.com", "secret1", "A").await.unwrap();

    let duplicate = client.register("a@x.com", "secret1", "A").await;
    assert!(matches!(duplicate, Err(SessionError::EmailTaken)));

    let wrong = client.login("a@x.com", "wrong-password").await;
    assert!(matches!(wrong, Err(SessionError::InvalidCredentials)));

    let invalid = client.register("not-an-email", "secret1", "A").await;
    match invalid {
        Err(SessionError::Api { status, message }) => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "A valid email is required");
        }
        other => panic!("Unexpected result {other:?}"),
    }
}

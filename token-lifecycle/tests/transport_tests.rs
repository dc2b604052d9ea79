//! Integration tests for AuthenticatedTransport's 401 recovery.

mod common;

use common::{hours, Harness};
use reqwest::{Method, StatusCode};
use token_lifecycle::{
    AuthConfig, AuthError, AuthenticatedTransport, CredentialStore, RefreshError, TransportError,
    REFRESH_TOKEN_KEY,
};

fn transport_for(server: &mockito::ServerGuard, harness: &Harness) -> AuthenticatedTransport {
    let config = AuthConfig::new("client").with_api_base_url(format!("{}/v1", server.url()));
    AuthenticatedTransport::new(&config, harness.manager.clone()).unwrap()
}

#[tokio::test]
async fn test_success_passes_through_with_bearer() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/me")
        .match_header("authorization", "Bearer current")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"user-1"}"#)
        .create_async()
        .await;

    let harness = Harness::new();
    harness.manager.install("current", hours(1));
    let transport = transport_for(&server, &harness);

    let me: serde_json::Value = transport.get_json("/me").await.unwrap();

    assert_eq!(me["id"], "user-1");
    assert_eq!(harness.endpoint.calls(), 0);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_auth_failure_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/me/player")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let harness = Harness::new();
    harness.manager.install("current", hours(1));
    let transport = transport_for(&server, &harness);

    let response = transport
        .send(transport.request(Method::GET, "me/player").unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(harness.endpoint.calls(), 0);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_renews_and_replays_once() {
    let mut server = mockito::Server::new_async().await;
    let rejected = server
        .mock("PUT", "/v1/me/player")
        .match_header("authorization", "Bearer stale")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let accepted = server
        .mock("PUT", "/v1/me/player")
        .match_header("authorization", "Bearer renewed-1")
        .match_body(mockito::Matcher::JsonString(
            r#"{"device_ids":["dev-1"]}"#.to_string(),
        ))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let harness = Harness::new();
    harness.manager.install("stale", hours(1));
    let transport = transport_for(&server, &harness);

    let builder = transport
        .request(Method::PUT, "me/player")
        .unwrap()
        .json(&serde_json::json!({ "device_ids": ["dev-1"] }));
    let response = transport.send(builder).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(harness.endpoint.calls(), 1);
    assert_eq!(harness.manager.current_token().as_deref(), Some("renewed-1"));
    rejected.assert_async().await;
    accepted.assert_async().await;
}

#[tokio::test]
async fn test_persistent_rejection_is_retried_only_once() {
    let mut server = mockito::Server::new_async().await;
    let _stale = server
        .mock("GET", "/v1/me")
        .match_header("authorization", "Bearer stale")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let renewed = server
        .mock("GET", "/v1/me")
        .match_header("authorization", "Bearer renewed-1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let harness = Harness::new();
    harness.manager.install("stale", hours(1));
    let transport = transport_for(&server, &harness);

    let response = transport
        .send(transport.request(Method::GET, "me").unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(harness.endpoint.calls(), 1);
    renewed.assert_async().await;
}

#[tokio::test]
async fn test_failed_renewal_propagates_unauthorized() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/me")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let harness = Harness::new();
    harness.manager.install("stale", hours(1));
    harness
        .store
        .set(REFRESH_TOKEN_KEY, "revoked".to_string(), None);
    harness.endpoint.fail_next(RefreshError::Rejected {
        status: 400,
        body: "invalid_grant".to_string(),
    });
    let transport = transport_for(&server, &harness);

    let error = transport
        .send(transport.request(Method::GET, "me").unwrap())
        .await
        .unwrap_err();

    match error {
        TransportError::Unauthorized { url, source } => {
            assert!(url.ends_with("/v1/me"));
            assert!(matches!(source, RefreshError::Rejected { status: 400, .. }));
        }
        other => panic!("Expected Unauthorized, got {other:?}"),
    }
    assert!(harness.store.get(REFRESH_TOKEN_KEY).is_none());
    assert!(harness.manager.current_token().is_none());
    mock.assert_async().await;
}

#[test]
fn test_transport_rejects_invalid_config() {
    let harness = Harness::new();
    let config = AuthConfig::default().with_api_base_url("http://localhost/v1");

    let result = AuthenticatedTransport::new(&config, harness.manager.clone());

    assert!(matches!(result, Err(AuthError::Configuration(msg)) if msg.contains("client_id")));
}

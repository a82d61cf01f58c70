//! Session lifecycle tests against a mock platform backend.

mod common;

use common::{manager_with, seeded_manager, user_json, SharedStorage};
use console_auth::{AuthError, AuthState, RegisterRequest};
use console_storage::StorageKeys;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn login_response_body() -> serde_json::Value {
    serde_json::json!({
        "access_token": "fresh-access-token",
        "refresh_token": "fresh-refresh-token",
        "token_type": "bearer",
        "expires_in": 900,
        "user": user_json()
    })
}

#[tokio::test]
async fn login_success_authenticates_and_persists() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_response_body()))
        .expect(1)
        .mount(&server)
        .await;

    let storage = SharedStorage::new();
    let manager = manager_with(storage.clone(), &server.uri());

    let user = manager.login("a@b.com", "Secret1!").await.unwrap();
    assert_eq!(user.email, "a@b.com");

    assert!(manager.is_authenticated());
    assert_eq!(manager.state(), AuthState::Authenticated);
    assert_eq!(manager.last_error(), None);

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.access_token.as_deref(), Some("fresh-access-token"));
    assert_eq!(
        snapshot.refresh_token.as_deref(),
        Some("fresh-refresh-token")
    );
    assert_eq!(snapshot.user.unwrap().email, "a@b.com");

    // The persisted record matches what the manager holds
    let persisted = storage.raw(StorageKeys::SESSION).expect("persisted session");
    assert!(persisted.contains("fresh-access-token"));
    assert!(persisted.contains("fresh-refresh-token"));
    assert!(persisted.contains("a@b.com"));
}

#[tokio::test]
async fn login_failure_stores_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"message": "Invalid email or password"})),
        )
        .mount(&server)
        .await;

    let manager = manager_with(SharedStorage::new(), &server.uri());

    let err = manager.login("a@b.com", "wrong").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials(_)));

    assert!(!manager.is_authenticated());
    assert_eq!(manager.state(), AuthState::Anonymous);
    assert_eq!(
        manager.last_error().as_deref(),
        Some("Invalid email or password")
    );
    assert!(manager.snapshot().access_token.is_none());
}

#[tokio::test]
async fn refresh_without_token_performs_no_network_io() {
    let server = MockServer::start().await;
    let manager = manager_with(SharedStorage::new(), &server.uri());

    assert!(!manager.refresh_access_token().await);

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn refresh_success_replaces_only_access_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .and(body_json_string(r#"{"refresh_token":"refresh-token"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "minted-access-token",
            "token_type": "bearer",
            "expires_in": 900
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = seeded_manager(SharedStorage::new(), &server.uri());

    assert!(manager.refresh_access_token().await);

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.access_token.as_deref(), Some("minted-access-token"));
    assert_eq!(snapshot.refresh_token.as_deref(), Some("refresh-token"));
    assert_eq!(snapshot.user.unwrap().id, "user-123");
    assert!(snapshot.is_authenticated);
}

#[tokio::test]
async fn refresh_failure_resets_the_whole_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let storage = SharedStorage::new();
    let manager = seeded_manager(storage.clone(), &server.uri());

    assert!(!manager.refresh_access_token().await);

    let snapshot = manager.snapshot();
    assert!(snapshot.access_token.is_none());
    assert!(snapshot.refresh_token.is_none());
    assert!(snapshot.user.is_none());
    assert!(!snapshot.is_authenticated);
    assert_eq!(manager.state(), AuthState::Anonymous);
    assert!(storage.raw(StorageKeys::SESSION).is_none());
}

#[tokio::test]
async fn initialize_without_token_is_a_no_op() {
    let server = MockServer::start().await;
    let manager = manager_with(SharedStorage::new(), &server.uri());

    let restored = manager.initialize_auth().await.unwrap();
    assert!(!restored);
    assert_eq!(manager.state(), AuthState::Anonymous);
    assert!(!manager.is_authenticated());

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn initialize_with_valid_token_restores_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("Authorization", "Bearer stale-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    let manager = seeded_manager(SharedStorage::new(), &server.uri());

    let restored = manager.initialize_auth().await.unwrap();
    assert!(restored);
    assert!(manager.is_authenticated());
    assert_eq!(manager.state(), AuthState::Authenticated);
    assert_eq!(manager.user().unwrap().email, "a@b.com");
}

#[tokio::test]
async fn initialize_with_rejected_token_falls_back_to_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "recovered-access-token",
            "token_type": "bearer",
            "expires_in": 900
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = seeded_manager(SharedStorage::new(), &server.uri());

    let restored = manager.initialize_auth().await.unwrap();
    assert!(restored);
    assert!(manager.is_authenticated());

    let snapshot = manager.snapshot();
    assert_eq!(
        snapshot.access_token.as_deref(),
        Some("recovered-access-token")
    );
    assert_eq!(snapshot.refresh_token.as_deref(), Some("refresh-token"));
}

#[tokio::test]
async fn initialize_with_dead_refresh_clears_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let storage = SharedStorage::new();
    let manager = seeded_manager(storage.clone(), &server.uri());

    let restored = manager.initialize_auth().await.unwrap();
    assert!(!restored);
    assert!(!manager.is_authenticated());
    assert!(manager.snapshot().is_empty());
    assert!(storage.raw(StorageKeys::SESSION).is_none());
}

#[tokio::test]
async fn logout_is_idempotent() {
    let server = MockServer::start().await;
    let manager = manager_with(SharedStorage::new(), &server.uri());

    manager.logout().await;
    manager.logout().await;

    assert!(manager.snapshot().is_empty());
    assert_eq!(manager.state(), AuthState::Anonymous);

    // Anonymous logout never notifies the backend
    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn logout_survives_backend_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let storage = SharedStorage::new();
    let manager = seeded_manager(storage.clone(), &server.uri());

    manager.logout().await;

    assert!(manager.snapshot().is_empty());
    assert!(!manager.is_authenticated());
    assert!(storage.raw(StorageKeys::SESSION).is_none());
}

#[tokio::test]
async fn register_with_mismatched_passwords_never_reaches_network() {
    let server = MockServer::start().await;
    let manager = manager_with(SharedStorage::new(), &server.uri());

    let request = RegisterRequest {
        email: "a@b.com".to_string(),
        password: "Secret1!".to_string(),
        confirm_password: "Different1!".to_string(),
        full_name: "Ada Lovelace".to_string(),
        organization_name: None,
    };

    let err = manager.register(&request).await.unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn register_success_does_not_authenticate() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "user_id": "user-456",
            "email": "new@b.com",
            "organization_id": "org-9",
            "message": "Registration successful"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_with(SharedStorage::new(), &server.uri());

    let request = RegisterRequest {
        email: "new@b.com".to_string(),
        password: "Secret1!".to_string(),
        confirm_password: "Secret1!".to_string(),
        full_name: "New User".to_string(),
        organization_name: Some("Acme".to_string()),
    };

    let response = manager.register(&request).await.unwrap();
    assert_eq!(response.user_id, "user-456");
    assert_eq!(response.organization_id.as_deref(), Some("org-9"));

    // Registration never stores tokens; the caller routes to login
    assert!(!manager.is_authenticated());
    assert!(manager.snapshot().access_token.is_none());
    assert_eq!(manager.state(), AuthState::Anonymous);
}

#[tokio::test]
async fn register_rejection_surfaces_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(serde_json::json!({"message": "Email already registered"})),
        )
        .mount(&server)
        .await;

    let manager = manager_with(SharedStorage::new(), &server.uri());

    let request = RegisterRequest {
        email: "a@b.com".to_string(),
        password: "Secret1!".to_string(),
        confirm_password: "Secret1!".to_string(),
        full_name: "Ada Lovelace".to_string(),
        organization_name: None,
    };

    let err = manager.register(&request).await.unwrap_err();
    assert!(matches!(err, AuthError::Registration(_)));
    assert_eq!(
        manager.last_error().as_deref(),
        Some("Email already registered")
    );
}

#[tokio::test]
async fn refresh_landing_after_logout_is_discarded() {
    let server = MockServer::start().await;

    // Refresh that resolves only after the logout below has happened
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_json(serde_json::json!({
                    "access_token": "late-access-token",
                    "token_type": "bearer",
                    "expires_in": 900
                })),
        )
        .mount(&server)
        .await;

    let manager = Arc::new(seeded_manager(SharedStorage::new(), &server.uri()));

    let refreshing = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.refresh_access_token().await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    manager.logout().await;

    // The refresh observes the advanced epoch and discards its result
    assert!(!refreshing.await.unwrap());
    assert!(manager.snapshot().is_empty());
    assert!(!manager.is_authenticated());
}

#[tokio::test]
async fn token_invariant_holds_across_transitions() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_response_body()))
        .mount(&server)
        .await;

    let manager = manager_with(SharedStorage::new(), &server.uri());

    // Anonymous
    assert!(!manager.is_authenticated() || manager.access_token().is_some());

    manager.login("a@b.com", "Secret1!").await.unwrap();
    assert!(!manager.is_authenticated() || manager.access_token().is_some());

    manager.logout().await;
    assert!(!manager.is_authenticated() || manager.access_token().is_some());
}

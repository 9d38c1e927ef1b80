// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Integration tests for the backend gateway
//!
//! These tests verify request authentication, payload mapping and
//! error handling using mocked HTTP responses.

use anyhow::Result;
use mockito::{Matcher, Server};
use patinfly_core::config::DataConfig;
use patinfly_core::errors::DataError;
use patinfly_core::gateway::ApiClient;
use patinfly_core::session::Session;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

/// Helper to create a mock login response body
fn mock_login_response() -> serde_json::Value {
    json!({
        "success": true,
        "token": {
            "id": 42,
            "email": "rider@patinfly.dev",
            "access": "access-abc",
            "expires": "2025-06-01T00:00:00Z",
            "refresh": "refresh-xyz",
            "expires_refresh": "2025-07-01T00:00:00Z"
        },
        "version": "1.4.2"
    })
}

/// Helper to create a vehicle as the backend serializes it
fn mock_vehicle(id: &str, disabled: bool) -> serde_json::Value {
    json!({
        "vehicle_id": id,
        "name": format!("Vehicle {id}"),
        "vehicle_type_id": "EB-01",
        "group_course": null,
        "lat": 41.3874,
        "lon": 2.1686,
        "meters": 1200,
        "batteryLevel": 87,
        "isDeleted": false,
        "is_activated": true,
        "is_disabled": disabled,
        "is_reserved": false,
        "is_rented": false,
        "rental_uris": {"android": "patinfly://a", "ios": "patinfly://i"},
        "last_reported": "2024-05-01T10:00:00Z"
    })
}

/// Client wired against a mock backend, with a fresh anonymous session
fn gateway_for(server: &Server) -> (ApiClient, Arc<Session>, TempDir) {
    let settings_dir = TempDir::new().expect("Failed to create temp dir");
    let config = DataConfig {
        api_base_url: server.url(),
        database_url: "sqlite::memory:".to_string(),
        settings_path: settings_dir.path().join("session.toml"),
        bcrypt_cost: 4,
        connect_timeout_secs: 5,
        request_timeout_secs: 5,
    };
    let session = Arc::new(Session::restore(config.settings_path.clone()));
    let gateway = ApiClient::new(&config, Arc::clone(&session)).expect("Failed to build gateway");
    (gateway, session, settings_dir)
}

#[tokio::test]
async fn test_login_sends_credential_headers_and_parses_token() -> Result<()> {
    let mut server = Server::new_async().await;
    let login_mock = server
        .mock("POST", "/api/login")
        .match_header("email", "rider@patinfly.dev")
        .match_header("password", "s3cret")
        .match_header("origin", "app")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(mock_login_response().to_string())
        .create_async()
        .await;

    let (gateway, _session, _settings_dir) = gateway_for(&server);
    let response = gateway.login("rider@patinfly.dev", "s3cret", "app").await?;

    assert!(response.success);
    assert_eq!(response.token.id, 42);
    assert_eq!(response.token.access, "access-abc");
    assert_eq!(response.token.refresh, "refresh-xyz");
    login_mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn test_rejected_login_carries_status_and_body() -> Result<()> {
    let mut server = Server::new_async().await;
    let login_mock = server
        .mock("POST", "/api/login")
        .with_status(401)
        .with_body("invalid credentials")
        .create_async()
        .await;

    let (gateway, _session, _settings_dir) = gateway_for(&server);
    let result = gateway.login("rider@patinfly.dev", "wrong", "app").await;

    match result {
        Err(DataError::LoginRejected(message)) => {
            assert!(message.contains("401"));
            assert!(message.contains("invalid credentials"));
        }
        other => panic!("Expected LoginRejected, got {other:?}"),
    }
    login_mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn test_requests_carry_session_bearer_token() -> Result<()> {
    let mut server = Server::new_async().await;
    let user_mock = server
        .mock("GET", "/api/user")
        .match_header("authorization", "Bearer token-live")
        .match_header("origin", "")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": 42,
                "email": "rider@patinfly.dev",
                "first_name": "Ada",
                "last_name": "Riera"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (gateway, session, _settings_dir) = gateway_for(&server);
    session.set_token("token-live").await;

    let profile = gateway.current_user().await?;
    assert_eq!(profile.email.as_deref(), Some("rider@patinfly.dev"));
    assert_eq!(profile.first_name.as_deref(), Some("Ada"));
    user_mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn test_anonymous_requests_fall_back_to_static_token() -> Result<()> {
    let mut server = Server::new_async().await;
    // No login has happened: the Authorization header must carry the empty
    // fallback token rather than being dropped
    let vehicle_mock = server
        .mock("GET", "/api/vehicle")
        .match_header("authorization", Matcher::Regex("^Bearer ?$".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"vehicles": [mock_vehicle("bike-1", false)]}).to_string())
        .create_async()
        .await;

    let (gateway, _session, _settings_dir) = gateway_for(&server);
    let bikes = gateway.bikes().await;

    assert_eq!(bikes.len(), 1);
    assert_eq!(bikes[0].uuid, "bike-1");
    vehicle_mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn test_vehicle_list_maps_to_domain() -> Result<()> {
    let mut server = Server::new_async().await;
    let vehicle_mock = server
        .mock("GET", "/api/vehicle")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"vehicles": [mock_vehicle("bike-1", false), mock_vehicle("bike-2", true)]})
                .to_string(),
        )
        .create_async()
        .await;

    let (gateway, _session, _settings_dir) = gateway_for(&server);
    let bikes = gateway.bikes().await;

    assert_eq!(bikes.len(), 2);
    assert_eq!(bikes[0].bike_type_name, "Electric");
    assert_eq!(bikes[0].rental_uris, "Android: patinfly://a, iOS: patinfly://i");
    // The backend's is_disabled flag is the workshop marker domain-side
    assert!(!bikes[0].in_maintenance);
    assert!(bikes[1].in_maintenance);
    vehicle_mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn test_single_vehicle_fetch() -> Result<()> {
    let mut server = Server::new_async().await;
    let vehicle_mock = server
        .mock("GET", "/api/vehicle/bike-9")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(mock_vehicle("bike-9", false).to_string())
        .create_async()
        .await;

    let (gateway, _session, _settings_dir) = gateway_for(&server);
    let bike = gateway.bike_by_id("bike-9").await;

    assert_eq!(bike.map(|b| b.uuid), Some("bike-9".to_string()));
    vehicle_mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn test_vehicle_failures_degrade_to_empty() -> Result<()> {
    let mut server = Server::new_async().await;
    let list_mock = server
        .mock("GET", "/api/vehicle")
        .with_status(500)
        .create_async()
        .await;
    let single_mock = server
        .mock("GET", "/api/vehicle/ghost")
        .with_status(404)
        .create_async()
        .await;

    let (gateway, _session, _settings_dir) = gateway_for(&server);

    assert!(gateway.bikes().await.is_empty());
    assert!(gateway.bike_by_id("ghost").await.is_none());
    list_mock.assert_async().await;
    single_mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn test_user_directory_parses_list() -> Result<()> {
    let mut server = Server::new_async().await;
    let user_mock = server
        .mock("GET", "/api/user")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {"id": 1, "email": "ada@patinfly.dev", "first_name": "Ada"},
                {"id": 2, "email": "linus@patinfly.dev", "first_name": "Linus"}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let (gateway, _session, _settings_dir) = gateway_for(&server);
    let users = gateway.all_users().await?;

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].email.as_deref(), Some("ada@patinfly.dev"));
    assert_eq!(users[1].id, Some(2));
    user_mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn test_server_status_parses() -> Result<()> {
    let mut server = Server::new_async().await;
    let status_mock = server
        .mock("GET", "/api/status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "version": "1.3.0",
                "build": "210",
                "update": "2024-05-01",
                "name": "patinfly"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (gateway, _session, _settings_dir) = gateway_for(&server);
    let status = gateway.server_status().await;

    assert_eq!(status.version, "1.3.0");
    assert_eq!(status.name, "patinfly");
    assert!(!status.is_unavailable());
    status_mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn test_server_status_sentinel_when_unreachable() -> Result<()> {
    let settings_dir = TempDir::new()?;
    let config = DataConfig {
        // Nothing listens here
        api_base_url: "http://127.0.0.1:9".to_string(),
        database_url: "sqlite::memory:".to_string(),
        settings_path: settings_dir.path().join("session.toml"),
        bcrypt_cost: 4,
        connect_timeout_secs: 1,
        request_timeout_secs: 1,
    };
    let session = Arc::new(Session::restore(config.settings_path.clone()));
    let gateway = ApiClient::new(&config, session)?;

    let status = gateway.server_status().await;
    assert!(status.is_unavailable());
    assert_eq!(status.version, "0.0");
    assert_eq!(status.name, "error");

    Ok(())
}

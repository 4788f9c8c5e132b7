#![allow(clippy::unwrap_used)]
// Session renewal against a mock switch.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use m4250_api::SwitchClient;
use m4250_core::{Clock, Credentials, ManualClock, SessionManager};
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{count_requests, login_body, mount_probe};

const LOGIN: &str = "/api/v1/login";

fn manager(server: &MockServer, clock: Arc<ManualClock>) -> SessionManager {
    let base_url = Url::parse(&format!("{}/api/v1/", server.uri())).unwrap();
    let client = SwitchClient::with_client(reqwest::Client::new(), base_url);
    SessionManager::new(
        client,
        Credentials {
            username: "admin".into(),
            password: SecretString::from("secret".to_string()),
        },
        Duration::from_secs(3600),
        clock as Arc<dyn Clock>,
    )
}

async fn mount_login(server: &MockServer, expire: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body(expire)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn short_token_is_trusted_until_raw_expiry() {
    let server = MockServer::start().await;
    mount_login(&server, json!("60")).await;
    mount_probe(&server).await;

    let clock = Arc::new(ManualClock::at_epoch());
    let sessions = manager(&server, Arc::clone(&clock));

    sessions.ensure_valid().await.unwrap();
    assert_eq!(count_requests(&server, "POST", LOGIN).await, 1);

    clock.advance(TimeDelta::seconds(30));
    assert!(sessions.is_valid());
    sessions.ensure_valid().await.unwrap();
    assert_eq!(count_requests(&server, "POST", LOGIN).await, 1);

    clock.advance(TimeDelta::seconds(3571));
    assert!(!sessions.is_valid());
    sessions.ensure_valid().await.unwrap();
    assert_eq!(count_requests(&server, "POST", LOGIN).await, 2);
}

#[tokio::test]
async fn no_login_while_probe_succeeds() {
    let server = MockServer::start().await;
    mount_login(&server, json!(86_400)).await;
    mount_probe(&server).await;

    let clock = Arc::new(ManualClock::at_epoch());
    let sessions = manager(&server, Arc::clone(&clock));
    sessions.login().await.unwrap();

    for _ in 0..3 {
        clock.advance(TimeDelta::seconds(600));
        sessions.ensure_valid().await.unwrap();
    }
    assert_eq!(count_requests(&server, "POST", LOGIN).await, 1);
    assert_eq!(count_requests(&server, "GET", "/api/v1/device_name").await, 3);
}

#[tokio::test]
async fn failed_probe_forces_exactly_one_login() {
    let server = MockServer::start().await;
    mount_login(&server, json!(86_400)).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/device_name"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::at_epoch());
    let sessions = manager(&server, clock);
    sessions.login().await.unwrap();
    assert!(sessions.is_valid());

    sessions.ensure_valid().await.unwrap();
    assert_eq!(count_requests(&server, "POST", LOGIN).await, 2);
}

#[tokio::test]
async fn concurrent_callers_share_one_login() {
    let server = MockServer::start().await;
    mount_login(&server, json!(86_400)).await;
    mount_probe(&server).await;

    let sessions = manager(&server, Arc::new(ManualClock::at_epoch()));
    let (a, b) = tokio::join!(sessions.ensure_valid(), sessions.ensure_valid());
    a.unwrap();
    b.unwrap();
    assert_eq!(count_requests(&server, "POST", LOGIN).await, 1);
}

#[tokio::test]
async fn rejected_login_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resp": { "status": "failure", "respMsg": "Invalid credentials" }
        })))
        .mount(&server)
        .await;

    let sessions = manager(&server, Arc::new(ManualClock::at_epoch()));
    let err = sessions.ensure_valid().await.unwrap_err();
    assert!(err.is_auth(), "got: {err:?}");
    assert!(err.to_string().contains("Invalid credentials"));
    assert!(sessions.current().is_none());
}

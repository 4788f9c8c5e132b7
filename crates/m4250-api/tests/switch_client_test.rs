#![allow(clippy::unwrap_used)]
// Integration tests for `SwitchClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use m4250_api::{Error, LinkSpeed, PoeStatus, SwitchClient, Uptime};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, SwitchClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/api/v1/", server.uri())).unwrap();
    let client = SwitchClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn token() -> SecretString {
    SecretString::from("tok-123".to_string())
}

fn poe_fixture() -> serde_json::Value {
    json!({
        "resp": { "status": "success", "respCode": 0, "respMsg": "Operation success" },
        "poePortConfig": [
            { "portid": 1, "enable": true, "status": 2, "currentPower": 4300, "powerLimit": 30000 },
            { "portid": 2, "enable": false, "status": 0, "currentPower": 0, "powerLimit": 30000 },
            { "portid": 3, "enable": true, "status": 1, "currentPower": 0, "powerLimit": 15400 }
        ]
    })
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .and(body_json(json!({ "login": { "username": "admin", "password": "pw" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resp": { "status": "success", "respCode": 0 },
            "login": { "token": "abc", "expire": "60" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let password = SecretString::from("pw".to_string());
    let grant = client.login("admin", &password).await.unwrap();
    assert_eq!(grant.expire_secs, 60);
}

#[tokio::test]
async fn test_login_rejected_carries_device_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resp": { "status": "failure", "respCode": 1, "respMsg": "Invalid username or password" }
        })))
        .mount(&server)
        .await;

    let password = SecretString::from("wrong".to_string());
    match client.login("admin", &password).await {
        Err(Error::Authentication { message }) => {
            assert_eq!(message, "Invalid username or password");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_malformed_body_is_auth_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let password = SecretString::from("pw".to_string());
    let result = client.login("admin", &password).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_http_error_is_auth_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let password = SecretString::from("pw".to_string());
    let result = client.login("admin", &password).await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

// ── Device tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_device_info_uses_bearer_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/device_info"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resp": { "status": "success" },
            "deviceInfo": {
                "numOfActivePorts": 7,
                "cpuUsage": "3.5%",
                "memoryUsage": 41.0,
                "upTime": 93_784
            }
        })))
        .mount(&server)
        .await;

    let status = client.device_info(&token()).await.unwrap();
    assert_eq!(status.active_port_count, 7);
    assert!((status.cpu_usage_percent - 3.5).abs() < f64::EPSILON);
    assert_eq!(status.uptime, Uptime::Seconds(93_784));
}

#[tokio::test]
async fn test_device_name() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/device_name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deviceName": { "name": "rack-switch" }
        })))
        .mount(&server)
        .await;

    assert_eq!(client.device_name(&token()).await.unwrap(), "rack-switch");
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/device_name"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.device_name(&token()).await.unwrap_err();
    assert!(err.is_auth_expired(), "got: {err:?}");
}

#[tokio::test]
async fn test_server_error_maps_to_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/device_info"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    match client.device_info(&token()).await {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_field_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/device_info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deviceInfo": { "numOfActivePorts": 7 }
        })))
        .mount(&server)
        .await;

    let result = client.device_info(&token()).await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

#[tokio::test]
async fn test_reboot_posts_fixed_delay() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/device_reboot"))
        .and(body_json(json!({ "deviceReboot": { "afterSecs": 2 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resp": { "status": "success" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.reboot(&token()).await.unwrap();
}

// ── PoE tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_poe_config_preserves_fixture_order() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/swcfg_poe"))
        .and(query_param("portid", "ALL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(poe_fixture()))
        .mount(&server)
        .await;

    let table = client.poe_config(&token()).await.unwrap();
    let fixture = poe_fixture();
    let expected = fixture["poePortConfig"].as_array().unwrap();

    let actual: Vec<serde_json::Value> = table
        .all()
        .iter()
        .map(|port| serde_json::to_value(port).unwrap())
        .collect();
    assert_eq!(&actual, expected);

    for entry in expected {
        let id = u32::try_from(entry["portid"].as_u64().unwrap()).unwrap();
        assert_eq!(table.get(id).unwrap().port_id, id);
    }
    assert_eq!(table.get(1).unwrap().status, PoeStatus::DeliveringPower);
    assert!(matches!(table.get(9), Err(Error::PortNotFound { port_id: 9 })));
}

#[tokio::test]
async fn test_poe_status_out_of_range_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/swcfg_poe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "poePortConfig": [{ "portid": 1, "enable": true, "status": 9, "currentPower": 0 }]
        })))
        .mount(&server)
        .await;

    let result = client.poe_config(&token()).await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

#[tokio::test]
async fn test_set_poe_enabled_posts_full_object() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/swcfg_poe"))
        .and(query_param("portid", "ALL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(poe_fixture()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/swcfg_poe"))
        .and(query_param("portid", "2"))
        .and(body_json(json!({
            "poePortConfig": { "enable": true, "status": 0, "currentPower": 0, "powerLimit": 30000 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resp": { "status": "success" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let table = client.poe_config(&token()).await.unwrap();
    let port = table.get(2).unwrap();
    client.set_poe_enabled(&token(), port, true).await.unwrap();
}

#[tokio::test]
async fn test_power_cycle_adds_reset() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/swcfg_poe"))
        .and(query_param("portid", "ALL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(poe_fixture()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/swcfg_poe"))
        .and(query_param("portid", "1"))
        .and(body_json(json!({
            "poePortConfig": {
                "enable": true, "status": 2, "currentPower": 4300,
                "powerLimit": 30000, "reset": true
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let table = client.poe_config(&token()).await.unwrap();
    client
        .power_cycle_poe(&token(), table.get(1).unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_write_rejected_by_device() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/swcfg_poe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(poe_fixture()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/swcfg_poe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resp": { "status": "failure", "respCode": 7, "respMsg": "Port is not PoE capable" }
        })))
        .mount(&server)
        .await;

    let table = client.poe_config(&token()).await.unwrap();
    let result = client
        .set_poe_enabled(&token(), table.get(3).unwrap(), false)
        .await;
    assert!(matches!(result, Err(Error::Rejected { code: 7, .. })));
}

// ── Port stats tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_port_stats_link_sentinel() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sw_portstats"))
        .and(query_param("portid", "ALL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "switchStatsPort": [
                { "portId": 1, "speed": 5, "vlans": [1] },
                { "portId": 2, "speed": 130, "vlans": [1, 20] }
            ]
        })))
        .mount(&server)
        .await;

    let stats = client.port_stats(&token()).await.unwrap();
    assert_eq!(stats.port_ids(), vec![1, 2]);
    assert!(stats.get(1).unwrap().has_link());
    assert_eq!(stats.get(2).unwrap().link_speed, LinkSpeed::NoLink);
    assert_eq!(stats.get(2).unwrap().vlans_display(), "1,20");
}

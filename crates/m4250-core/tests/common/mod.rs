#![allow(dead_code, clippy::unwrap_used)]
// Shared wiremock fixtures for the engine tests.

use std::sync::Arc;
use std::time::Duration;

use m4250_core::{Clock, Credentials, ManualClock, Switch, SwitchConfig};
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn config_for(server: &MockServer) -> SwitchConfig {
    let url = Url::parse(&format!("{}/api/v1/", server.uri())).unwrap();
    let mut config = SwitchConfig::new(
        url,
        Credentials {
            username: "admin".into(),
            password: SecretString::from("secret".to_string()),
        },
    );
    config.timeout = Duration::from_secs(2);
    config.poll_interval = Duration::from_millis(50);
    config
}

pub fn switch_for(server: &MockServer) -> Switch {
    Switch::with_clock(config_for(server), Arc::new(ManualClock::at_epoch()) as Arc<dyn Clock>)
        .unwrap()
}

pub fn ok() -> Value {
    json!({ "resp": { "status": "success", "respCode": 0, "respMsg": "Operation success" } })
}

pub fn login_body(expire: Value) -> Value {
    json!({
        "resp": { "status": "success", "respCode": 0 },
        "login": { "token": "abc", "expire": expire }
    })
}

pub fn poe_body(ports: &[(u32, bool)]) -> Value {
    let entries: Vec<Value> = ports
        .iter()
        .map(|&(id, enable)| {
            json!({
                "portid": id,
                "enable": enable,
                "status": if enable { 2 } else { 0 },
                "currentPower": if enable { 4300 } else { 0 },
                "powerLimit": 30000
            })
        })
        .collect();
    json!({ "resp": { "status": "success" }, "poePortConfig": entries })
}

pub fn stats_body(ports: &[(u32, i64)]) -> Value {
    let entries: Vec<Value> = ports
        .iter()
        .map(|&(id, speed)| json!({ "portId": id, "speed": speed, "vlans": [1] }))
        .collect();
    json!({ "switchStatsPort": entries })
}

pub fn device_body() -> Value {
    json!({
        "deviceInfo": {
            "numOfActivePorts": 2,
            "cpuUsage": "5%",
            "memoryUsage": 33.0,
            "upTime": 1000
        }
    })
}

pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body(json!(86_400))))
        .mount(server)
        .await;
}

pub async fn mount_probe(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/device_name"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "deviceName": { "name": "lab" } })),
        )
        .mount(server)
        .await;
}

pub async fn mount_device(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/device_info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_body()))
        .mount(server)
        .await;
}

pub async fn mount_poe(server: &MockServer, ports: &[(u32, bool)]) {
    Mock::given(method("GET"))
        .and(path("/api/v1/swcfg_poe"))
        .and(query_param("portid", "ALL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(poe_body(ports)))
        .mount(server)
        .await;
}

pub async fn mount_stats(server: &MockServer, ports: &[(u32, i64)]) {
    Mock::given(method("GET"))
        .and(path("/api/v1/sw_portstats"))
        .and(query_param("portid", "ALL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_body(ports)))
        .mount(server)
        .await;
}

/// A switch answering every read with a fixed state.
pub async fn mount_steady_switch(server: &MockServer) {
    mount_login(server).await;
    mount_probe(server).await;
    mount_device(server).await;
    mount_poe(server, &[(1, true), (2, false), (3, false)]).await;
    mount_stats(server, &[(1, 5), (2, 130), (3, 130)]).await;
}

pub async fn count_requests(server: &MockServer, http_method: &str, url_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == http_method && r.url.path() == url_path)
        .count()
}

#![allow(clippy::unwrap_used)]
// Poll loop, snapshot publication and change detection against a mock switch.

mod common;

use std::time::{Duration, Instant};

use m4250_core::{ConnectionState, EngineState, Field, LinkSpeed, PoeStatus, Resource, Switch};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    count_requests, device_body, mount_device, mount_login, mount_poe, mount_probe,
    mount_stats, mount_steady_switch, poe_body, switch_for,
};

#[tokio::test]
async fn connect_publishes_initial_snapshot() {
    let server = MockServer::start().await;
    mount_steady_switch(&server).await;

    let switch = switch_for(&server);
    let mut changes = switch.changes();
    switch.connect().await.unwrap();

    assert_eq!(*switch.connection_state().borrow(), ConnectionState::Connected);
    let poe = switch.poe_config().unwrap();
    assert_eq!(poe.port_ids(), vec![1, 2, 3]);
    assert_eq!(poe.get(1).unwrap().status, PoeStatus::DeliveringPower);
    assert_eq!(
        switch.port_stats().unwrap().get(2).unwrap().link_speed,
        LinkSpeed::NoLink
    );
    assert_eq!(switch.device_status().unwrap().active_port_count, 2);
    assert!(switch.port_has_link(1).unwrap());
    assert!(!switch.port_has_link(3).unwrap());
    assert!(switch.port_has_link(42).unwrap_err().is_not_found());

    let first = changes.try_recv().unwrap();
    assert!(first.layout_changed);

    switch.stop().await;
}

#[tokio::test]
async fn failed_login_reports_failure_and_does_not_poll() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resp": { "status": "failure", "respMsg": "Invalid credentials" }
        })))
        .mount(&server)
        .await;

    let switch = switch_for(&server);
    let err = switch.connect().await.unwrap_err();
    assert!(err.is_auth());
    assert!(matches!(
        *switch.connection_state().borrow(),
        ConnectionState::Failed { .. }
    ));
    assert_eq!(*switch.engine_state().borrow(), EngineState::Stopped);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(count_requests(&server, "POST", "/api/v1/login").await, 1);
}

#[tokio::test]
async fn identical_ticks_emit_no_changes() {
    let server = MockServer::start().await;
    mount_steady_switch(&server).await;

    let switch = switch_for(&server);
    let first = switch.refresh().await.unwrap();
    assert!(!first.is_empty());

    let second = switch.refresh().await.unwrap();
    assert!(second.is_empty(), "unexpected changes: {second:?}");
}

#[tokio::test]
async fn single_enable_flip_emits_one_change() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_probe(&server).await;
    mount_device(&server).await;
    mount_stats(&server, &[(1, 5), (2, 130)]).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/swcfg_poe"))
        .and(query_param("portid", "ALL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(poe_body(&[(1, true), (2, false)])))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    // Port 2 enabled but still reporting the same status and draw.
    Mock::given(method("GET"))
        .and(path("/api/v1/swcfg_poe"))
        .and(query_param("portid", "ALL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "poePortConfig": [
                { "portid": 1, "enable": true, "status": 2, "currentPower": 4300, "powerLimit": 30000 },
                { "portid": 2, "enable": true, "status": 0, "currentPower": 0, "powerLimit": 30000 }
            ]
        })))
        .mount(&server)
        .await;

    let switch = switch_for(&server);
    switch.refresh().await.unwrap();
    let changes = switch.refresh().await.unwrap();

    assert_eq!(changes.len(), 1, "changes: {changes:?}");
    let change = changes.changes[0];
    assert_eq!(change.resource, Resource::PoeConfig);
    assert_eq!(change.port_id, Some(2));
    assert_eq!(change.field, Field::PoeEnabled);
    assert!(!changes.layout_changed);
}

#[tokio::test]
async fn failed_fetch_keeps_other_resources() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_probe(&server).await;
    mount_device(&server).await;
    mount_poe(&server, &[(1, true)]).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sw_portstats"))
        .respond_with(ResponseTemplate::new(500).set_body_string("busy"))
        .mount(&server)
        .await;

    let switch = switch_for(&server);
    let changes = switch.refresh().await.unwrap();

    assert!(changes.contains(Some(1), Field::PoeEnabled));
    assert!(switch.poe_config().is_some());
    assert!(switch.port_stats().is_none());
    assert_eq!(*switch.connection_state().borrow(), ConnectionState::Connected);
}

#[tokio::test]
async fn all_fetches_failing_reports_failure() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_probe(&server).await;
    for endpoint in ["/api/v1/device_info", "/api/v1/swcfg_poe", "/api/v1/sw_portstats"] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
    }

    let switch = switch_for(&server);
    let err = switch.refresh().await.unwrap_err();
    assert!(err.is_transport());
    assert!(matches!(
        *switch.connection_state().borrow(),
        ConnectionState::Failed { .. }
    ));
}

#[tokio::test]
async fn refreshes_never_overlap() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_probe(&server).await;
    mount_poe(&server, &[(1, true)]).await;
    mount_stats(&server, &[(1, 5)]).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/device_info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(device_body())
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let switch = switch_for(&server);
    let started = Instant::now();
    let (a, b) = tokio::join!(switch.refresh(), switch.refresh());
    a.unwrap();
    b.unwrap();
    assert!(
        started.elapsed() >= Duration::from_millis(400),
        "ticks overlapped: {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn stop_halts_polling() {
    let server = MockServer::start().await;
    mount_steady_switch(&server).await;

    let switch = switch_for(&server);
    switch.connect().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let polled = count_requests(&server, "GET", "/api/v1/sw_portstats").await;
    assert!(polled >= 2, "poll loop did not tick: {polled}");

    switch.stop().await;
    assert_eq!(*switch.engine_state().borrow(), EngineState::Stopped);
    let at_stop = count_requests(&server, "GET", "/api/v1/sw_portstats").await;

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        count_requests(&server, "GET", "/api/v1/sw_portstats").await,
        at_stop
    );

    switch.restart().await;
    assert_eq!(*switch.engine_state().borrow(), EngineState::Idle);
    switch.stop().await;
}

#[tokio::test]
async fn reconfigure_discards_snapshot_and_reconnects() {
    let first = MockServer::start().await;
    mount_steady_switch(&first).await;
    let second = MockServer::start().await;
    mount_login(&second).await;
    mount_probe(&second).await;
    mount_device(&second).await;
    mount_poe(&second, &[(7, true)]).await;
    mount_stats(&second, &[(7, 5)]).await;

    let switch = switch_for(&first);
    switch.connect().await.unwrap();
    assert!(switch.poe_config().unwrap().has(1));

    switch
        .reconfigure(common::config_for(&second))
        .await
        .unwrap();
    let poe = switch.poe_config().unwrap();
    assert_eq!(poe.port_ids(), vec![7]);
    assert_eq!(*switch.connection_state().borrow(), ConnectionState::Connected);
    switch.disconnect().await;
    assert!(switch.poe_config().is_none());
    assert_eq!(
        *switch.connection_state().borrow(),
        ConnectionState::Disconnected
    );
}

#[tokio::test]
async fn oneshot_logs_in_without_polling() {
    let server = MockServer::start().await;
    mount_steady_switch(&server).await;

    let name = Switch::oneshot(common::config_for(&server), |switch| async move {
        switch.device_name().await
    })
    .await
    .unwrap();
    assert_eq!(name, "lab");

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(count_requests(&server, "GET", "/api/v1/sw_portstats").await, 0);
}

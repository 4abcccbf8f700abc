#![allow(clippy::unwrap_used)]
// Integration tests for device views, `Home` and the poller against a
// wiremock Hive API.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hive_core::{
    ActiveMode, DeviceKind, ErrorCode, Home, HomeConfig, Node, Poller, Session, Thermostat,
    classify, poll_once,
};

const ZONE_ID: &str = "fe49e95e-c8cc-47cc-b38f-ec0c06361e13";
const UI_ID: &str = "8e1f1a6b-9d6c-4b2e-a6f4-1d3c8a2d1e55";
const TRV_ID: &str = "0b6e3a7e-2b9f-4c5f-9d7a-61a6d3b1c0f2";

const THERMOSTATUI: &str = "http://alertme.com/schema/json/node.class.thermostatui.json#";
const TRV: &str = "http://alertme.com/schema/json/node.class.trv.json#";

// ── Fixtures ────────────────────────────────────────────────────────

fn href(id: &str) -> String {
    format!("https://api-prod.bgchprod.info/omnia/nodes/{id}")
}

fn zone(id: &str, temperature: f64, target: f64) -> Value {
    json!({
        "id": id,
        "href": href(id),
        "name": "Heating",
        "attributes": {
            "temperature": { "reportedValue": temperature },
            "targetHeatTemperature": { "reportedValue": target, "targetValue": target },
            "activeHeatCoolMode": { "reportedValue": "HEAT" },
            "minHeatTemperature": { "reportedValue": 5.0 },
            "maxHeatTemperature": { "reportedValue": 32.0 }
        }
    })
}

fn controller(battery: i64) -> Value {
    json!({
        "id": UI_ID,
        "href": href(UI_ID),
        "name": "Thermostat",
        "attributes": {
            "nodeType": { "reportedValue": THERMOSTATUI },
            "batteryLevel": { "reportedValue": battery }
        }
    })
}

fn valve(temperature: f64) -> Value {
    json!({
        "id": TRV_ID,
        "href": href(TRV_ID),
        "name": "Bedroom TRV",
        "attributes": {
            "nodeType": { "reportedValue": TRV },
            "temperature": { "reportedValue": temperature }
        }
    })
}

fn hub() -> Value {
    json!({
        "id": "hub",
        "href": href("hub"),
        "name": "Hub",
        "attributes": {
            "nodeType": { "reportedValue": "http://alertme.com/schema/json/node.class.hub.json#" }
        }
    })
}

fn nodes(list: Vec<Value>) -> Value {
    json!({ "meta": {}, "links": {}, "linked": {}, "nodes": list })
}

async fn setup() -> (MockServer, Home) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/omnia/auth/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessions": [{ "id": "token", "username": "username", "sessionId": "token" }]
        })))
        .mount(&server)
        .await;

    let session = Session::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        "username",
        SecretString::from("password".to_string()),
    );
    (server, Home::from_session(Arc::new(session)))
}

async fn mount_nodes(server: &MockServer, list: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/omnia/nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nodes(list)))
        .mount(server)
        .await;
}

async fn mount_node(server: &MockServer, id: &str, list: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(format!("/omnia/nodes/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(nodes(list)))
        .mount(server)
        .await;
}

async fn single_thermostat(server: &MockServer, home: &Home) -> Arc<Thermostat> {
    mount_nodes(server, vec![zone(ZONE_ID, 19.5, 20.0)]).await;
    let mut thermostats = home.thermostats().await.unwrap();
    assert_eq!(thermostats.len(), 1);
    thermostats.remove(0)
}

// ── Construction ────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_logs_in() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/omnia/auth/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessions": [{ "sessionId": "token", "latestSupportedApiVersion": "6" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = HomeConfig::new("username", SecretString::from("password".to_string()))
        .unwrap()
        .with_url(Url::parse(&server.uri()).unwrap());

    let home = Home::connect(&config).await.unwrap();
    assert!(home.session().is_authenticated());
}

#[tokio::test]
async fn test_connect_bad_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/omnia/auth/sessions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [{ "code": "USERNAME_PASSWORD_ERROR", "title": "Invalid credentials" }]
        })))
        .mount(&server)
        .await;

    let config = HomeConfig::new("username", SecretString::from("wrong".to_string()))
        .unwrap()
        .with_url(Url::parse(&server.uri()).unwrap());

    let err = Home::connect(&config).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidCredentials);
}

#[tokio::test]
async fn test_devices_are_classified_in_order() {
    let (server, home) = setup().await;
    mount_nodes(
        &server,
        vec![hub(), controller(80), zone(ZONE_ID, 19.5, 20.0), valve(18.0)],
    )
    .await;

    let devices = home.devices().await.unwrap();
    let kinds: Vec<_> = devices.iter().map(|d| (d.kind(), d.id().to_owned())).collect();

    assert_eq!(
        kinds,
        vec![
            (DeviceKind::Controller, UI_ID.to_owned()),
            (DeviceKind::Thermostat, ZONE_ID.to_owned()),
            (DeviceKind::Radiator, TRV_ID.to_owned()),
        ]
    );
    assert_eq!(home.controllers().await.unwrap()[0].battery_level().unwrap(), 80);
    assert_eq!(home.radiators().await.unwrap()[0].temperature().unwrap(), 18.0);
}

#[tokio::test]
async fn test_no_matching_nodes_yields_empty() {
    let (server, home) = setup().await;
    mount_nodes(&server, vec![hub()]).await;

    assert!(home.thermostats().await.unwrap().is_empty());
    assert!(home.controllers().await.unwrap().is_empty());
    assert!(home.radiators().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_thermostat_readings() {
    let (server, home) = setup().await;
    let thermostat = single_thermostat(&server, &home).await;

    assert_eq!(thermostat.id(), ZONE_ID);
    assert_eq!(thermostat.name(), "Heating");
    assert_eq!(thermostat.temperature().unwrap(), 19.5);
    assert_eq!(thermostat.target().unwrap(), 20.0);
    assert_eq!(thermostat.active_mode().unwrap(), ActiveMode::Heating);
    assert_eq!(thermostat.maximum(), 32.0);
}

// ── Update ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_replaces_node() {
    let (server, home) = setup().await;
    let thermostat = single_thermostat(&server, &home).await;
    mount_node(&server, ZONE_ID, vec![zone(ZONE_ID, 21.0, 22.0)]).await;

    thermostat.update().await.unwrap();

    assert_eq!(thermostat.temperature().unwrap(), 21.0);
    assert_eq!(thermostat.target().unwrap(), 22.0);
}

#[tokio::test]
async fn test_update_id_mismatch_keeps_node() {
    let (server, home) = setup().await;
    let thermostat = single_thermostat(&server, &home).await;
    mount_node(&server, ZONE_ID, vec![zone("another-id", 25.0, 25.0)]).await;

    let err = thermostat.update().await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidUpdate);
    assert_eq!(err.op(), Some("thermostat: update"));
    assert_eq!(thermostat.temperature().unwrap(), 19.5);
    assert_eq!(thermostat.node().id, ZONE_ID);
}

#[tokio::test]
async fn test_update_wrong_node_count_keeps_node() {
    let (server, home) = setup().await;
    let thermostat = single_thermostat(&server, &home).await;
    mount_node(
        &server,
        ZONE_ID,
        vec![zone(ZONE_ID, 25.0, 25.0), zone(ZONE_ID, 26.0, 26.0)],
    )
    .await;

    let err = thermostat.update().await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::NodeNotFound);
    assert_eq!(thermostat.temperature().unwrap(), 19.5);
}

#[tokio::test]
async fn test_controller_update() {
    let (server, home) = setup().await;
    mount_nodes(&server, vec![controller(80)]).await;
    mount_node(&server, UI_ID, vec![controller(35)]).await;

    let controller = home.controllers().await.unwrap().remove(0);
    controller.update().await.unwrap();

    assert_eq!(controller.battery_level().unwrap(), 35);
    assert_eq!(controller.battery_level_or_last_known(), 35);
}

// ── SetTarget ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_target_adopts_server_node() {
    let (server, home) = setup().await;
    let thermostat = single_thermostat(&server, &home).await;

    // The server accepts 17.5 but its reported value still lags behind.
    let mut response = zone(ZONE_ID, 19.5, 20.0);
    response["attributes"]["targetHeatTemperature"]["targetValue"] = json!(17.5);

    Mock::given(method("PUT"))
        .and(path(format!("/omnia/nodes/{ZONE_ID}")))
        .and(body_json(json!({
            "nodes": [{ "attributes": { "targetHeatTemperature": { "targetValue": 17.5 } } }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(nodes(vec![response])))
        .expect(1)
        .mount(&server)
        .await;

    thermostat.set_target(17.5).await.unwrap();

    assert_eq!(thermostat.target().unwrap(), 17.5);
    assert_eq!(
        thermostat
            .node()
            .attr("targetHeatTemperature")
            .reported_as::<f64>()
            .ok(),
        Some(20.0)
    );
    server.verify().await;
}

#[tokio::test]
async fn test_set_target_reflects_server_not_request() {
    let (server, home) = setup().await;
    let thermostat = single_thermostat(&server, &home).await;

    Mock::given(method("PUT"))
        .and(path(format!("/omnia/nodes/{ZONE_ID}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(nodes(vec![zone(ZONE_ID, 19.5, 18.0)])),
        )
        .mount(&server)
        .await;

    thermostat.set_target(17.5).await.unwrap();

    assert_eq!(thermostat.target().unwrap(), 18.0);
}

#[tokio::test]
async fn test_set_target_failure_keeps_node() {
    let (server, home) = setup().await;
    let thermostat = single_thermostat(&server, &home).await;

    Mock::given(method("PUT"))
        .and(path(format!("/omnia/nodes/{ZONE_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(nodes(vec![])))
        .mount(&server)
        .await;

    let err = thermostat.set_target(17.5).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::NodeNotFound);
    assert_eq!(err.op(), Some("thermostat: set target"));
    assert_eq!(thermostat.target().unwrap(), 20.0);
}

#[tokio::test]
async fn test_set_target_after_session_expiry() {
    let (server, home) = setup().await;
    let thermostat = single_thermostat(&server, &home).await;

    Mock::given(method("PUT"))
        .and(path(format!("/omnia/nodes/{ZONE_ID}")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": [{ "code": "NOT_AUTHORIZED", "title": "Not authorized" }]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/omnia/nodes/{ZONE_ID}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(nodes(vec![zone(ZONE_ID, 19.5, 17.5)])),
        )
        .mount(&server)
        .await;

    thermostat.set_target(17.5).await.unwrap();
    assert_eq!(thermostat.target().unwrap(), 17.5);
}

// ── Poller ──────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_poller_updates_devices() {
    let (server, home) = setup().await;
    mount_nodes(&server, vec![zone(ZONE_ID, 19.5, 20.0), controller(80)]).await;
    mount_node(&server, ZONE_ID, vec![zone(ZONE_ID, 23.0, 20.0)]).await;
    // the controller's node cannot be fetched
    Mock::given(method("GET"))
        .and(path(format!("/omnia/nodes/{UI_ID}")))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let devices = home.devices().await.unwrap();
    let thermostat = Arc::clone(devices[0].as_thermostat().unwrap());

    let poller = Poller::spawn(devices, Duration::from_millis(50), CancellationToken::new());
    let mut rx = poller.subscribe();
    assert_eq!(poller.latest().tick, 0);

    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .unwrap()
        .unwrap();
    let summary = *rx.borrow();

    assert!(summary.tick >= 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(thermostat.temperature().unwrap(), 23.0);

    poller.shutdown().await;
}

#[tokio::test]
async fn test_poll_counts_unreachable_devices_as_failed() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let session = Arc::new(Session::with_client(
        reqwest::Client::new(),
        Url::parse(&format!("http://127.0.0.1:{port}")).unwrap(),
        "username",
        SecretString::from("password".to_string()),
    ));
    let node: Node = serde_json::from_value(zone(ZONE_ID, 19.5, 20.0)).unwrap();
    let devices = classify(&session, vec![node]);
    assert_eq!(devices.len(), 1);

    let err = devices[0].update().await.unwrap_err();
    assert!(err.is_transient(), "got {err:?}");

    let summary = poll_once(&devices, 1).await;
    assert_eq!(summary.tick, 1);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.failed, 1);
    // the view keeps its last node
    assert_eq!(devices[0].as_thermostat().unwrap().temperature().unwrap(), 19.5);
}

#[tokio::test]
async fn test_poller_stops_on_cancel() {
    let cancel = CancellationToken::new();
    let poller = Poller::spawn(Vec::new(), Duration::from_secs(3600), cancel.clone());

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), poller.shutdown())
        .await
        .unwrap();
}

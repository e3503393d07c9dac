#![allow(clippy::unwrap_used)]
// Controller lifecycle against a mocked gateway whose resources point back
// at the same mock server.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pangolet_core::{
    ConfirmChoice, Controller, CoreError, FixedChoice, GatewayConfig, RefreshOutcome,
    ResourceKey, WhitelistOutcome,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> GatewayConfig {
    let mut cfg = GatewayConfig::new(
        server.uri().parse().unwrap(),
        SecretString::from("test-key".to_owned()),
        "acme",
    );
    cfg.public_ip_url = Some(format!("{}/ip", server.uri()).parse().unwrap());
    cfg.probe.settle_delay = Duration::from_millis(20);
    cfg
}

async fn mount_resources(server: &MockServer) {
    let host = server.address().to_string();
    Mock::given(method("GET"))
        .and(path("/org/acme/resources"))
        .and(query_param("public", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "resources": [
                    { "resourceId": 7, "niceId": "grafana", "name": "Grafana", "fullDomain": host },
                    { "niceId": "nohost", "name": "No Host" }
                ]
            }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

// ── Loading ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_load_schedules_initial_probes() {
    let server = MockServer::start().await;
    mount_resources(&server).await;

    let controller = Controller::new(config(&server)).unwrap();
    let resources = controller.load_resources().await.unwrap();
    assert_eq!(resources.len(), 2);

    // Nothing is probed before the settle delay elapses.
    assert!(controller.store().health_snapshot().is_empty());

    controller.wait_idle().await;
    let health = controller.store().health_snapshot();
    assert_eq!(health.len(), 1);
    assert!(health.get(&ResourceKey::from("7")).unwrap().up);
    assert!(health.get(&ResourceKey::from("nohost")).is_none());
}

#[tokio::test]
async fn test_reload_clears_previous_status() {
    let server = MockServer::start().await;
    mount_resources(&server).await;

    let controller = Controller::new(config(&server)).unwrap();
    controller.load_resources().await.unwrap();
    controller.wait_idle().await;
    assert_eq!(controller.store().health_snapshot().len(), 1);

    controller.load_resources().await.unwrap();
    assert!(controller.store().health_snapshot().is_empty());
    controller.wait_idle().await;
    assert_eq!(controller.store().health_snapshot().len(), 1);
}

#[tokio::test]
async fn test_shutdown_cancels_pending_batch_and_clears() {
    let server = MockServer::start().await;
    mount_resources(&server).await;

    let mut cfg = config(&server);
    cfg.probe.settle_delay = Duration::from_secs(30);
    let controller = Controller::new(cfg).unwrap();
    controller.load_resources().await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), controller.shutdown())
        .await
        .unwrap();
    assert!(controller.resources().is_empty());
    assert!(controller.store().health_snapshot().is_empty());

    let probes = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/")
        .count();
    assert_eq!(probes, 0);
}

#[tokio::test]
async fn test_load_failure_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/org/acme/resources"))
        .respond_with(ResponseTemplate::new(401).set_body_string("no"))
        .mount(&server)
        .await;

    let controller = Controller::new(config(&server)).unwrap();
    let err = controller.load_resources().await.unwrap_err();
    assert!(matches!(err, CoreError::Http { status: 401, .. }), "got {err:?}");
}

// ── Refresh and whitelist ───────────────────────────────────────────

#[tokio::test]
async fn test_refresh_and_whitelist_by_name() {
    let server = MockServer::start().await;
    mount_resources(&server).await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ip": "9.9.9.9" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/resource/7/rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rules": [{ "ip": "9.9.9.9" }] })))
        .mount(&server)
        .await;

    let controller = Controller::new(config(&server)).unwrap();
    controller.load_resources().await.unwrap();
    controller.wait_idle().await;

    let outcome = controller.refresh_health().await;
    assert_eq!(outcome, RefreshOutcome::Completed { probed: 2, recorded: 1 });

    let grafana = controller.resolve("grafana").unwrap();
    assert_eq!(controller.resolve("Grafana").unwrap().key(), grafana.key());
    let result = controller
        .whitelist(&grafana.key(), &FixedChoice(ConfirmChoice::Confirm))
        .await
        .unwrap();
    assert_eq!(result, WhitelistOutcome::AlreadyWhitelisted { ip: "9.9.9.9".into() });

    let rules = controller.access_rules(&grafana.key()).await.unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].value.as_deref(), Some("9.9.9.9"));

    let err = controller
        .whitelist(&"nohost".into(), &FixedChoice(ConfirmChoice::Confirm))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::MissingResourceId { .. }));
}

// ── Teardown ────────────────────────────────────────────────────────

async fn mount_slow_resource(server: &MockServer) {
    let host = server.address().to_string();
    Mock::given(method("GET"))
        .and(path("/org/acme/resources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "resources": [{ "resourceId": 7, "name": "Slow", "fullDomain": host }] }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(400)))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_stops_running_refresh() {
    let server = MockServer::start().await;
    mount_slow_resource(&server).await;

    let controller = Controller::new(config(&server)).unwrap();
    controller.load_resources().await.unwrap();
    controller.wait_idle().await;

    let refresh = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.refresh_health().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    controller.shutdown().await;

    assert_eq!(refresh.await.unwrap(), RefreshOutcome::Cancelled);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(controller.store().health_snapshot().is_empty());
    assert!(controller.resources().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reload_stops_running_refresh() {
    let server = MockServer::start().await;
    mount_slow_resource(&server).await;

    let controller = Controller::new(config(&server)).unwrap();
    controller.load_resources().await.unwrap();
    controller.wait_idle().await;

    let refresh = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.refresh_health().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    controller.load_resources().await.unwrap();

    assert_eq!(refresh.await.unwrap(), RefreshOutcome::Cancelled);
}

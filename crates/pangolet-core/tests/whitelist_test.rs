#![allow(clippy::unwrap_used)]
// Whitelist coordinator behavior against a mocked gateway and IP echo.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pangolet_api::{GatewayClient, PublicIpClient, TransportConfig};
use pangolet_core::{
    Confirm, ConfirmChoice, ConfirmPrompt, CoreError, FixedChoice, Resource, StatusStore, Target,
    WhitelistCheck, WhitelistCoordinator, WhitelistOutcome,
};

const IP: &str = "203.0.113.7";

// ── Helpers ─────────────────────────────────────────────────────────

fn resource(id: Option<i64>) -> Resource {
    Resource {
        resource_id: id,
        nice_id: Some("svc".into()),
        name: "Service".into(),
        full_domain: Some("svc.example.com".into()),
        ssl: true,
        protocol: Some("http".into()),
        http: true,
        sso: false,
        enabled: true,
        whitelist: true,
        proxy_port: None,
        targets: vec![Target {
            target_id: Some(1),
            ip: "10.0.0.5".into(),
            port: Some(8080),
            enabled: true,
            health_status: None,
        }],
    }
}

fn coordinator_with_key(server: &MockServer, api_key: &str) -> (WhitelistCoordinator, Arc<StatusStore>) {
    let transport = TransportConfig::default();
    let gateway = GatewayClient::from_api_key(
        &server.uri(),
        &SecretString::from(api_key.to_owned()),
        "acme",
        &transport,
    )
    .unwrap();
    let public_ip =
        PublicIpClient::with_endpoint(&format!("{}/ip", server.uri()), &transport).unwrap();
    let store = Arc::new(StatusStore::new());
    let coordinator =
        WhitelistCoordinator::new(gateway, public_ip, Arc::clone(&store), !api_key.is_empty());
    (coordinator, store)
}

fn coordinator(server: &MockServer) -> (WhitelistCoordinator, Arc<StatusStore>) {
    coordinator_with_key(server, "test-key")
}

async fn mount_ip(server: &MockServer, ip: &str) {
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ip": ip })))
        .mount(server)
        .await;
}

async fn mount_rules(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/resource/7/rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn expect_puts(server: &MockServer, count: u64) {
    Mock::given(method("PUT"))
        .and(path("/resource/7/rule"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(count)
        .mount(server)
        .await;
}

/// Counts prompts and answers with a fixed choice.
struct CountingConfirm {
    choice: ConfirmChoice,
    prompts: AtomicUsize,
}

impl CountingConfirm {
    fn new(choice: ConfirmChoice) -> Self {
        Self {
            choice,
            prompts: AtomicUsize::new(0),
        }
    }
}

impl Confirm for CountingConfirm {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> ConfirmChoice {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.choice
    }
}

// ── Idempotence ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_second_call_reports_already_whitelisted() {
    let server = MockServer::start().await;
    mount_ip(&server, IP).await;

    // First listing: no rules. Afterwards the gateway reports the new rule.
    Mock::given(method("GET"))
        .and(path("/resource/7/rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "rules": [] } })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_rules(&server, json!({ "data": { "rules": [{ "ruleId": 1, "match": "IP", "value": IP }] } }))
        .await;

    Mock::given(method("PUT"))
        .and(path("/resource/7/rule"))
        .and(body_partial_json(json!({ "match": "IP", "value": IP })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ruleId": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let (coordinator, store) = coordinator(&server);
    let confirm = FixedChoice(ConfirmChoice::Confirm);
    let r = resource(Some(7));

    let first = coordinator.ensure_whitelisted(&r, &confirm).await.unwrap();
    assert_eq!(first, WhitelistOutcome::Added { ip: IP.into() });
    assert_eq!(store.whitelisted(&r.key()), Some(true));

    let second = coordinator.ensure_whitelisted(&r, &confirm).await.unwrap();
    assert_eq!(second, WhitelistOutcome::AlreadyWhitelisted { ip: IP.into() });
}

// ── Dedup scan ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_every_value_field_short_circuits() {
    let shapes = [
        json!([{ "ip": "1.2.3.4" }]),
        json!({ "rules": [{ "value": "1.2.3.4" }] }),
        json!({ "items": [{ "address": "1.2.3.4" }] }),
        json!({ "data": [{ "client": { "ip": "1.2.3.4" } }] }),
    ];
    for shape in shapes {
        let server = MockServer::start().await;
        mount_ip(&server, "1.2.3.4").await;
        mount_rules(&server, shape.clone()).await;
        expect_puts(&server, 0).await;

        let (coordinator, store) = coordinator(&server);
        let confirm = CountingConfirm::new(ConfirmChoice::Confirm);
        let r = resource(Some(7));
        let outcome = coordinator.ensure_whitelisted(&r, &confirm).await.unwrap();

        assert!(
            matches!(outcome, WhitelistOutcome::AlreadyWhitelisted { .. }),
            "shape {shape}: {outcome:?}"
        );
        assert_eq!(confirm.prompts.load(Ordering::SeqCst), 0);
        assert_eq!(store.whitelisted(&r.key()), Some(true));
    }
}

#[tokio::test]
async fn test_rules_envelope_with_matching_ip_issues_no_put() {
    let server = MockServer::start().await;
    mount_ip(&server, "9.9.9.9").await;
    mount_rules(&server, json!({ "rules": [{ "ip": "9.9.9.9" }] })).await;
    expect_puts(&server, 0).await;

    let (coordinator, _) = coordinator(&server);
    let outcome = coordinator
        .ensure_whitelisted(&resource(Some(7)), &FixedChoice(ConfirmChoice::Confirm))
        .await
        .unwrap();
    assert_eq!(outcome, WhitelistOutcome::AlreadyWhitelisted { ip: "9.9.9.9".into() });
}

// ── Confirmation ────────────────────────────────────────────────────

#[tokio::test]
async fn test_cancel_mutates_nothing() {
    let server = MockServer::start().await;
    mount_ip(&server, IP).await;
    mount_rules(&server, json!([])).await;
    expect_puts(&server, 0).await;

    let (coordinator, store) = coordinator(&server);
    let confirm = CountingConfirm::new(ConfirmChoice::Cancel);
    let r = resource(Some(7));
    let outcome = coordinator.ensure_whitelisted(&r, &confirm).await.unwrap();

    assert_eq!(outcome, WhitelistOutcome::Cancelled { ip: IP.into() });
    assert_eq!(confirm.prompts.load(Ordering::SeqCst), 1);
    assert!(store.whitelisted(&r.key()).is_none());
}

// ── Failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_api_key_is_not_configured() {
    let server = MockServer::start().await;
    let (coordinator, _) = coordinator_with_key(&server, "");

    let err = coordinator
        .ensure_whitelisted(&resource(Some(7)), &FixedChoice(ConfirmChoice::Confirm))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotConfigured { .. }), "got {err:?}");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_resource_without_id_is_rejected() {
    let server = MockServer::start().await;
    let (coordinator, _) = coordinator(&server);

    let err = coordinator
        .ensure_whitelisted(&resource(None), &FixedChoice(ConfirmChoice::Confirm))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::MissingResourceId { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_public_ip_failure_aborts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    expect_puts(&server, 0).await;

    let (coordinator, _) = coordinator(&server);
    let err = coordinator
        .ensure_whitelisted(&resource(Some(7)), &FixedChoice(ConfirmChoice::Confirm))
        .await
        .unwrap_err();
    assert!(
        matches!(err, CoreError::Network { ref message } if message.contains("502")),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_unusable_ip_echo_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ip": "  " })))
        .mount(&server)
        .await;
    expect_puts(&server, 0).await;

    let (coordinator, _) = coordinator(&server);
    let err = coordinator
        .ensure_whitelisted(&resource(Some(7)), &FixedChoice(ConfirmChoice::Confirm))
        .await
        .unwrap_err();
    assert!(err.is_network(), "got {err:?}");
}

#[tokio::test]
async fn test_unrecognized_rules_envelope_aborts_without_put() {
    let server = MockServer::start().await;
    mount_ip(&server, IP).await;
    mount_rules(
        &server,
        json!({ "data": { "accessRules": [{ "match": "IP", "value": IP }] } }),
    )
    .await;
    expect_puts(&server, 0).await;

    let (coordinator, store) = coordinator(&server);
    let confirm = CountingConfirm::new(ConfirmChoice::Confirm);
    let r = resource(Some(7));
    let err = coordinator.ensure_whitelisted(&r, &confirm).await.unwrap_err();

    assert!(matches!(err, CoreError::RuleFetch { .. }), "got {err:?}");
    assert_eq!(confirm.prompts.load(Ordering::SeqCst), 0);
    assert!(store.whitelisted(&r.key()).is_none());
}

#[tokio::test]
async fn test_rule_fetch_failure_aborts() {
    let server = MockServer::start().await;
    mount_ip(&server, IP).await;
    Mock::given(method("GET"))
        .and(path("/resource/7/rules"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    expect_puts(&server, 0).await;

    let (coordinator, _) = coordinator(&server);
    let err = coordinator
        .ensure_whitelisted(&resource(Some(7)), &FixedChoice(ConfirmChoice::Confirm))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::RuleFetch { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_add_failure_leaves_store_unchanged() {
    let server = MockServer::start().await;
    mount_ip(&server, IP).await;
    mount_rules(&server, json!([])).await;
    Mock::given(method("PUT"))
        .and(path("/resource/7/rule"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad rule"))
        .expect(1)
        .mount(&server)
        .await;

    let (coordinator, store) = coordinator(&server);
    let r = resource(Some(7));
    let err = coordinator
        .ensure_whitelisted(&r, &FixedChoice(ConfirmChoice::Confirm))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::AddRule { ref message } if message.contains("400")));
    assert!(store.whitelisted(&r.key()).is_none());
}

// ── Concurrency ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_call_for_same_resource_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ip": IP }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    mount_rules(&server, json!([])).await;
    expect_puts(&server, 1).await;

    let (coordinator, _) = coordinator(&server);
    let coordinator = Arc::new(coordinator);
    let r = resource(Some(7));

    let first = {
        let coordinator = Arc::clone(&coordinator);
        let r = r.clone();
        tokio::spawn(async move {
            coordinator
                .ensure_whitelisted(&r, &FixedChoice(ConfirmChoice::Confirm))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = coordinator
        .ensure_whitelisted(&r, &FixedChoice(ConfirmChoice::Confirm))
        .await;
    assert!(
        matches!(second, Err(CoreError::WhitelistInProgress { ref key }) if key == "7"),
        "got {second:?}"
    );

    let first = first.await.unwrap().unwrap();
    assert_eq!(first, WhitelistOutcome::Added { ip: IP.into() });
}

// ── Read-only check ─────────────────────────────────────────────────

#[tokio::test]
async fn test_check_records_status_without_adding() {
    let server = MockServer::start().await;
    mount_ip(&server, IP).await;
    mount_rules(&server, json!({ "data": { "rules": [{ "value": "198.51.100.1" }] } })).await;
    expect_puts(&server, 0).await;

    let (coordinator, store) = coordinator(&server);
    let r = resource(Some(7));
    let check = coordinator.check(&r).await.unwrap();
    assert_eq!(check, WhitelistCheck { ip: IP.into(), listed: false });
    assert_eq!(store.whitelisted(&r.key()), Some(false));

    // One lookup per check, and the reported IP is the one scanned for.
    let ip_lookups = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|req| req.url.path() == "/ip")
        .count();
    assert_eq!(ip_lookups, 1);
}

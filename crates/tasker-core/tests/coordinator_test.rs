// Integration tests for `PollCoordinator` against a wiremock remote.

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tasker_core::{Category, CoreError, LinkConfig, LinkState, PollCoordinator};

// ── Helpers ─────────────────────────────────────────────────────────

fn config_for(server: &MockServer) -> LinkConfig {
    let url: Url = server.uri().parse().expect("mock server uri");
    let mut config = LinkConfig::new(url.host_str().expect("host"));
    config.port = url.port().expect("port");
    config.fetch_commands = true;
    config
}

fn stats_body() -> serde_json::Value {
    json!({
        "active_profiles": 2,
        "total_profiles": 5,
        "total_tasks": 10,
        "total_scenes": 1,
        "total_globals": 3,
        "version": "6.2",
    })
}

fn device_body() -> serde_json::Value {
    json!({
        "android_id": "abc123",
        "manufacturer": "Google",
        "model": "Pixel 8",
        "sw_version": "14",
    })
}

/// Mounts the endpoints every bootstrap + cycle needs: stats, command
/// drain, device-info task invocation, and universe enumerations for
/// tasks/scenes/globals. Tests mount their own profile mocks.
async fn mount_baseline(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_body()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/commands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;

    // Device Info already present remotely -- no import during bootstrap.
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "Device Info", "running": false},
        ])))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_body()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/scenes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/globals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

fn profile_body(name: &str, enabled: bool, active: bool) -> serde_json::Value {
    json!({"name": name, "enabled": enabled, "active": active})
}

// ── Bootstrap ───────────────────────────────────────────────────────

#[tokio::test]
async fn bootstrap_resolves_identity_and_universe() {
    let server = MockServer::start().await;
    mount_baseline(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            profile_body("Home", true, false),
            profile_body("Away", true, true),
        ])))
        .mount(&server)
        .await;

    let coordinator = PollCoordinator::new(config_for(&server)).expect("coordinator");
    coordinator.bootstrap().await.expect("bootstrap");

    let device = coordinator.device().expect("device identity resolved");
    assert_eq!(device.android_id, "abc123");
    assert_eq!(device.model, "Pixel 8");

    let profiles = coordinator.universe(Category::Profiles);
    assert!(profiles.contains("Home") && profiles.contains("Away"));
    assert!(coordinator.universe(Category::Tasks).contains("Device Info"));
}

#[tokio::test]
async fn bootstrap_failure_is_not_auth_when_remote_is_down() {
    let server = MockServer::start().await;
    // Nothing mounted: every fetch 404s.
    let coordinator = PollCoordinator::new(config_for(&server)).expect("coordinator");

    let err = coordinator.bootstrap().await.expect_err("must fail");
    assert!(matches!(err, CoreError::Bootstrap { .. }), "got: {err}");
}

// ── Cycles ──────────────────────────────────────────────────────────

#[tokio::test]
async fn cycle_publishes_stats_snapshot() {
    let server = MockServer::start().await;
    mount_baseline(&server).await;

    let coordinator = PollCoordinator::new(config_for(&server)).expect("coordinator");
    let snapshot = coordinator.refresh().await.expect("cycle");

    assert_eq!(snapshot.stats.active_profiles, 2);
    assert_eq!(snapshot.stats.total_profiles, 5);
    assert_eq!(snapshot.stats.total_tasks, 10);
    assert_eq!(snapshot.stats.total_scenes, 1);
    assert_eq!(snapshot.stats.total_globals, 3);
    assert_eq!(snapshot.stats.version, "6.2");
    assert_eq!(coordinator.state(), LinkState::Connected);
}

#[tokio::test]
async fn unsubscribed_categories_are_not_fetched() {
    let server = MockServer::start().await;
    mount_baseline(&server).await;

    // No profile subscription -> the cycle must never hit /api/profiles.
    Mock::given(method("GET"))
        .and(path("/api/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let coordinator = PollCoordinator::new(config_for(&server)).expect("coordinator");
    let snapshot = coordinator.refresh().await.expect("cycle");
    assert!(snapshot.profiles.is_empty());
}

#[tokio::test]
async fn subscribed_profiles_are_fetched_by_name() {
    let server = MockServer::start().await;
    mount_baseline(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/profiles"))
        .and(query_param("name", "Home"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            profile_body("Home", true, true),
        ])))
        .mount(&server)
        .await;

    let coordinator = PollCoordinator::new(config_for(&server)).expect("coordinator");
    coordinator.subscribe(Category::Profiles, "Home");

    let snapshot = coordinator.refresh().await.expect("cycle");
    assert_eq!(snapshot.profiles.len(), 1);
    assert!(snapshot.profiles["Home"].active);
    // Delivered, so no longer pending.
    assert!(snapshot.pending.profiles.is_empty());
}

#[tokio::test]
async fn subscribed_name_without_data_stays_pending() {
    let server = MockServer::start().await;
    mount_baseline(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            profile_body("Home", true, false),
        ])))
        .mount(&server)
        .await;

    let coordinator = PollCoordinator::new(config_for(&server)).expect("coordinator");
    coordinator.subscribe(Category::Profiles, "Home");
    coordinator.subscribe(Category::Profiles, "Ghost");

    let snapshot = coordinator.refresh().await.expect("cycle");
    assert!(snapshot.profiles.contains_key("Home"));
    assert!(!snapshot.profiles.contains_key("Ghost"));
    // Still known -- consumers must not treat Ghost as removed yet.
    assert!(snapshot.has_profile("Ghost"));
}

#[tokio::test]
async fn failed_category_fetch_carries_previous_data_forward() {
    let server = MockServer::start().await;
    mount_baseline(&server).await;

    // First cycle sees three profiles, later cycles hit a server error.
    Mock::given(method("GET"))
        .and(path("/api/profiles"))
        .and(query_param("name", "Home"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            profile_body("Home", true, false),
            profile_body("Away", true, true),
            profile_body("Night", false, false),
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/profiles"))
        .and(query_param("name", "Home"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let coordinator = PollCoordinator::new(config_for(&server)).expect("coordinator");
    for name in ["Home", "Away", "Night"] {
        coordinator.subscribe(Category::Profiles, name);
    }

    let first = coordinator.refresh().await.expect("first cycle");
    assert_eq!(first.profiles.len(), 3);

    let second = coordinator.refresh().await.expect("second cycle");
    assert_eq!(second.profiles, first.profiles);
    assert!(second.refreshed_at >= first.refreshed_at);
}

#[tokio::test]
async fn empty_category_fetch_carries_previous_data_forward() {
    let server = MockServer::start().await;
    mount_baseline(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/profiles"))
        .and(query_param("name", "Home"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            profile_body("Home", true, false),
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    // Remote answers null (no data) afterwards.
    Mock::given(method("GET"))
        .and(path("/api/profiles"))
        .and(query_param("name", "Home"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let coordinator = PollCoordinator::new(config_for(&server)).expect("coordinator");
    coordinator.subscribe(Category::Profiles, "Home");

    let first = coordinator.refresh().await.expect("first cycle");
    let second = coordinator.refresh().await.expect("second cycle");
    assert_eq!(second.profiles, first.profiles);
}

#[tokio::test]
async fn auth_failure_aborts_cycle_without_publishing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/commands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let coordinator = PollCoordinator::new(config_for(&server)).expect("coordinator");
    let first = coordinator.refresh().await.expect("first cycle");

    let err = coordinator.refresh().await.expect_err("401 must abort");
    assert!(err.is_auth(), "expected auth classification, got: {err}");
    assert_eq!(coordinator.state(), LinkState::AuthExpired);

    // No partial snapshot: the previous one is still current.
    let current = coordinator.snapshot().expect("snapshot");
    assert_eq!(current.refreshed_at, first.refreshed_at);
}

#[tokio::test]
async fn transient_stats_failure_degrades_and_keeps_snapshot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/commands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let coordinator = PollCoordinator::new(config_for(&server)).expect("coordinator");
    let first = coordinator.refresh().await.expect("first cycle");

    let err = coordinator.refresh().await.expect_err("500 degrades");
    assert!(matches!(err, CoreError::Fetch { .. }));
    assert_eq!(coordinator.state(), LinkState::Degraded);
    assert_eq!(
        coordinator.snapshot().expect("snapshot").refreshed_at,
        first.refreshed_at
    );
}

#[tokio::test]
async fn fired_commands_are_broadcast() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_body()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/commands"))
        .and(query_param("clear", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            "lights=:=on=:=kitchen",
        ])))
        .mount(&server)
        .await;

    let coordinator = PollCoordinator::new(config_for(&server)).expect("coordinator");
    let mut commands = coordinator.commands();

    let snapshot = coordinator.refresh().await.expect("cycle");
    assert_eq!(snapshot.commands, vec!["lights=:=on=:=kitchen"]);

    let fired = commands.recv().await.expect("broadcast");
    assert_eq!(fired.prefix, "lights");
    assert_eq!(fired.params, vec!["on", "kitchen"]);
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn refresh_after_shutdown_is_rejected() {
    let server = MockServer::start().await;
    mount_baseline(&server).await;

    let coordinator = PollCoordinator::new(config_for(&server)).expect("coordinator");
    coordinator.refresh().await.expect("cycle");
    coordinator.shutdown().await;

    let err = coordinator.refresh().await.expect_err("shut down");
    assert!(matches!(err, CoreError::NotRunning));
    assert_eq!(coordinator.state(), LinkState::Idle);
}

#[tokio::test]
async fn start_runs_bootstrap_and_first_cycle() {
    let server = MockServer::start().await;
    mount_baseline(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            profile_body("Home", true, false),
        ])))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.builtin_globals = vec!["BATT".into()];

    let coordinator = PollCoordinator::new(config).expect("coordinator");
    coordinator.start().await.expect("start");

    assert!(coordinator.device().is_some());
    assert!(coordinator.snapshot().is_some());
    assert_eq!(coordinator.state(), LinkState::Connected);

    // Builtin globals were pre-subscribed during bootstrap.
    let snapshot = coordinator.snapshot().expect("snapshot");
    assert!(snapshot.has_global("BATT"));

    coordinator.shutdown().await;
}

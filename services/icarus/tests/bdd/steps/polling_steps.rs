//! BDD step definitions for scheduled polling and lifecycle handling

use std::sync::Arc;
use std::time::Duration;

use cucumber::gherkin::Step;
use cucumber::{given, then, when};

use icarus::credentials::CredentialStore;
use icarus::integration::Integration;
use icarus::io::HttpClient;
use icarus::lifecycle::LifecycleEvent;
use icarus::scheduler::SchedulerState;
use icarus::session::PollStatus;
use icarus::settings::{Preferences, RefreshInterval};
use icarus::{Config, DashboardBuilder};

use crate::steps::fetch_steps::{activity_body, credential};
use crate::world::IcarusWorld;

fn interval(seconds: u64) -> RefreshInterval {
    RefreshInterval::try_from(seconds).unwrap()
}

fn dashboard(world: &IcarusWorld) -> Arc<icarus::dashboard::Dashboard> {
    world.dashboard.clone().expect("no dashboard built")
}

fn tautulli_status(world: &IcarusWorld) -> PollStatus {
    dashboard(world)
        .status(Integration::Tautulli)
        .expect("Tautulli is not polled")
}

/// Let spawned poll tasks run without moving the clock past a tick
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

// --- Given steps ---

#[given(expr = "a dashboard polling Tautulli every {int} seconds")]
fn dashboard_polling(world: &mut IcarusWorld, seconds: u64) {
    let settings = world.settings();
    Preferences {
        refresh_interval: interval(seconds),
        ..Preferences::default()
    }
    .save(settings.as_ref())
    .unwrap();

    let credential = credential(world);
    CredentialStore::new(Arc::clone(&settings))
        .save(
            Integration::Tautulli,
            &credential.endpoint_url,
            &credential.api_key,
        )
        .unwrap();

    let http = world.http() as Arc<dyn HttpClient>;
    let dashboard = DashboardBuilder::new(Config::default())
        .with_settings(settings)
        .with_http_client(http)
        .build()
        .unwrap();
    world.dashboard = Some(Arc::new(dashboard));
}

#[given("the Tautulli server now reports sessions:")]
fn server_now_reports(world: &mut IcarusWorld, step: &Step) {
    world.http().replace(Ok(icarus::io::HttpResponse {
        status: 200,
        body: activity_body(step),
    }));
}

// --- When steps ---

#[when("the dashboard appears")]
async fn dashboard_appears(world: &mut IcarusWorld) {
    dashboard(world).handle(LifecycleEvent::Appeared).unwrap();
    settle().await;
}

#[when("the app is suspended")]
async fn app_suspended(world: &mut IcarusWorld) {
    dashboard(world).handle(LifecycleEvent::Suspended).unwrap();
    settle().await;
}

#[when("the app resumes")]
async fn app_resumes(world: &mut IcarusWorld) {
    dashboard(world).handle(LifecycleEvent::Resumed).unwrap();
    settle().await;
}

#[when(expr = "the refresh interval changes to {int} seconds")]
async fn interval_changes(world: &mut IcarusWorld, seconds: u64) {
    dashboard(world)
        .handle(LifecycleEvent::IntervalChanged(interval(seconds)))
        .unwrap();
    settle().await;
}

#[when(expr = "{int} seconds pass")]
async fn seconds_pass(_world: &mut IcarusWorld, seconds: u64) {
    tokio::time::sleep(Duration::from_secs(seconds)).await;
}

#[when(expr = "the Tautulli credential is changed to {string} with key {string}")]
fn credential_changed(world: &mut IcarusWorld, url: String, key: String) {
    CredentialStore::new(world.settings())
        .save(Integration::Tautulli, &url, &key)
        .unwrap();
}

// --- Then steps ---

#[then(expr = "{int} request(s) should have been made")]
fn requests_made(world: &mut IcarusWorld, count: usize) {
    assert_eq!(world.http().request_count(), count);
}

#[then(expr = "the Tautulli poller should be {word}")]
fn poller_state(world: &mut IcarusWorld, state: String) {
    let expected = match state.as_str() {
        "idle" => SchedulerState::Idle,
        "polling" => SchedulerState::Polling,
        "stopped" => SchedulerState::Stopped,
        other => panic!("unknown scheduler state '{}'", other),
    };
    let actual = dashboard(world)
        .scheduler(Integration::Tautulli)
        .expect("Tautulli is not polled")
        .state();
    assert_eq!(actual, expected);
}

#[then("the Tautulli status should be loading")]
fn status_loading(world: &mut IcarusWorld) {
    assert_eq!(tautulli_status(world), PollStatus::Loading);
}

#[then(expr = "the Tautulli status should list {int} session(s)")]
fn status_lists(world: &mut IcarusWorld, count: usize) {
    let status = tautulli_status(world);
    let snapshot = status
        .snapshot()
        .unwrap_or_else(|| panic!("expected sessions, got {:?}", status));
    assert_eq!(snapshot.sessions.len(), count);
}

#[then(expr = "the Tautulli status should show the error {string}")]
fn status_error(world: &mut IcarusWorld, message: String) {
    let status = tautulli_status(world);
    assert_eq!(status.error_message(), Some(message.as_str()));
}

#[then(expr = "the Tautulli status should list {string} first")]
fn status_first_title(world: &mut IcarusWorld, title: String) {
    let status = tautulli_status(world);
    let snapshot = status.snapshot().expect("no snapshot");
    assert_eq!(snapshot.sessions[0].title, title);
}

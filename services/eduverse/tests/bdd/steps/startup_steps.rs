//! BDD step definitions for dashboard startup and shutdown

use cucumber::{given, then, when};

use eduverse::model::{HealthStatus, Institution, Plan};
use eduverse::EduverseError;

use crate::world::EduverseWorld;

#[given(expr = "a backend reporting {string} with database {string} and {int} collection(s)")]
fn healthy_backend(world: &mut EduverseWorld, backend: String, database: String, count: usize) {
    let collections = (0..count).map(|i| format!("collection_{}", i)).collect();
    world.backend().configure(|b| {
        b.health = Some(HealthStatus {
            backend,
            database,
            collections,
        })
    });
}

#[given("the backend is unreachable")]
fn unreachable_backend(world: &mut EduverseWorld) {
    world.backend().configure(|b| {
        b.health = None;
        b.list_fails = true;
    });
}

#[given("listing institutions fails")]
fn listing_fails(world: &mut EduverseWorld) {
    world.backend().configure(|b| b.list_fails = true);
}

#[given(expr = "the backend has an institution {string} with id {string} and subdomain {string}")]
fn backend_institution(world: &mut EduverseWorld, name: String, id: String, subdomain: String) {
    world.backend().configure(|b| {
        b.institutions.push(Institution {
            id,
            name,
            subdomain: Some(subdomain).filter(|s| !s.is_empty()),
            plan: Plan::Free,
        })
    });
}

#[given("the dashboard has loaded its data")]
async fn dashboard_loaded(world: &mut EduverseWorld) {
    let report = world.controller().initialize().await;
    world.startup_report = Some(report);
}

#[when("the dashboard starts")]
async fn dashboard_starts(world: &mut EduverseWorld) {
    let report = world.controller().initialize().await;
    world.startup_report = Some(report);
}

#[when("the dashboard shuts down")]
fn dashboard_shuts_down(world: &mut EduverseWorld) {
    world.controller().shutdown();
}

#[then("startup should complete without errors")]
fn startup_complete(world: &mut EduverseWorld) {
    let report = world.startup_report.as_ref().expect("dashboard not started");
    assert!(report.is_complete(), "startup report: {:?}", report);
}

#[then("the health check should have failed")]
fn health_failed(world: &mut EduverseWorld) {
    let report = world.startup_report.as_ref().expect("dashboard not started");
    assert!(report.health.is_err());
}

#[then("loading institutions should have failed")]
fn institutions_failed(world: &mut EduverseWorld) {
    let report = world.startup_report.as_ref().expect("dashboard not started");
    assert!(report.institutions.is_err());
}

#[then(expr = "the backend status should be {string}")]
async fn backend_status(world: &mut EduverseWorld, expected: String) {
    let state = world.controller().snapshot().await;
    let health = state.health.expect("health not loaded");
    assert_eq!(health.backend, expected);
}

#[then(expr = "the database status should be {string}")]
async fn database_status(world: &mut EduverseWorld, expected: String) {
    let state = world.controller().snapshot().await;
    let health = state.health.expect("health not loaded");
    assert_eq!(health.database, expected);
}

#[then(expr = "the dashboard should count {int} collection(s)")]
async fn collections_count(world: &mut EduverseWorld, expected: usize) {
    let state = world.controller().snapshot().await;
    assert_eq!(state.collections_count(), expected);
}

#[then("the backend health should be unknown")]
async fn health_unknown(world: &mut EduverseWorld) {
    let state = world.controller().snapshot().await;
    assert!(state.health.is_none());
}

#[then(expr = "the dashboard should show {int} institution(s)")]
async fn institutions_shown(world: &mut EduverseWorld, expected: usize) {
    let state = world.controller().snapshot().await;
    assert_eq!(state.institutions.len(), expected);
}

#[then(expr = "institution {int} should be {string} with id {string}")]
async fn institution_at(world: &mut EduverseWorld, position: usize, name: String, id: String) {
    let state = world.controller().snapshot().await;
    let institution = &state.institutions[position - 1];
    assert_eq!(institution.name, name);
    assert_eq!(institution.id, id);
}

#[then("refreshing institutions should be cancelled")]
async fn refresh_cancelled(world: &mut EduverseWorld) {
    let result = world.controller().refresh_institutions().await;
    assert!(
        matches!(result, Err(EduverseError::Cancelled)),
        "expected cancellation, got {:?}",
        result
    );
}

mod support;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sim_core::backend::BackendError;
use sim_core::fleet::{FleetError, FleetSupervisor};
use sim_core::model::TripDirection;
use sim_core::test_helpers::{test_params, CallKind, RecordingBackend};
use support::drivers::backend_with_planned_trip;
use support::init_logging;

fn tokens(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn drivers_start_ten_seconds_apart_and_stop_on_shutdown() {
    init_logging();
    let fleet = FleetSupervisor::new(test_params()).expect("fleet");
    let mut created: Vec<Arc<RecordingBackend>> = Vec::new();

    // Drivers launch at 0s and 10s; the third would launch at 20s.
    let reports = fleet
        .run(
            &tokens(&["token-alpha", "token-bravo", "token-charlie"]),
            |_token: &str| {
                let backend = Arc::new(RecordingBackend::new());
                created.push(Arc::clone(&backend));
                Ok(backend)
            },
            tokio::time::sleep(Duration::from_secs(15)),
        )
        .await
        .expect("fleet run");

    assert_eq!(created.len(), 3);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].driver, "driver-1 [token-alpha…]");
    assert_eq!(reports[1].driver, "driver-2 [token-bravo…]");
    assert_eq!(created[0].count(CallKind::TodaySchedules), 1);
    assert_eq!(created[1].count(CallKind::TodaySchedules), 1);
    assert_eq!(created[2].count(CallKind::TodaySchedules), 0);
}

#[tokio::test(start_paused = true)]
async fn failing_driver_does_not_disturb_its_neighbour() {
    init_logging();
    let mut backends: HashMap<&str, Arc<RecordingBackend>> = HashMap::new();
    backends.insert(
        "broken",
        Arc::new(RecordingBackend::new().failing(CallKind::TodaySchedules)),
    );
    backends.insert(
        "healthy",
        Arc::new(backend_with_planned_trip("t-1", TripDirection::Outbound)),
    );
    let fleet = FleetSupervisor::new(test_params()).expect("fleet");

    let reports = fleet
        .run(
            &tokens(&["broken", "healthy"]),
            |token: &str| {
                backends
                    .get(token)
                    .cloned()
                    .ok_or_else(|| BackendError::Rejected(format!("unknown token {token}")))
            },
            tokio::time::sleep(Duration::from_secs(200)),
        )
        .await
        .expect("fleet run");

    let (broken, healthy) = (&reports[0], &reports[1]);
    // Failed polls at 0s, 30s, ... up to 180s.
    assert_eq!(broken.cycle_errors, 7);
    assert_eq!(broken.trips_completed, 0);
    assert_eq!(healthy.cycle_errors, 0);
    assert_eq!(healthy.trips_completed, 1);
    assert_eq!(backends["healthy"].count(CallKind::EndTrip), 1);
    assert_eq!(backends["broken"].count(CallKind::TripDetail), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_mid_trip_waits_for_driver_without_ending_trip() {
    init_logging();
    let backend = Arc::new(backend_with_planned_trip("t-1", TripDirection::Outbound));
    let fleet = FleetSupervisor::new(test_params()).expect("fleet");

    let reports = fleet
        .run(
            &tokens(&["solo"]),
            |_token: &str| Ok(Arc::clone(&backend)),
            tokio::time::sleep(Duration::from_secs(20)),
        )
        .await
        .expect("fleet run");

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].trips_completed, 0);
    assert_eq!(backend.count(CallKind::StartTrip), 1);
    assert_eq!(backend.count(CallKind::EndTrip), 0);
}

#[tokio::test]
async fn fleet_without_credentials_refuses_to_start() {
    let fleet = FleetSupervisor::new(test_params()).expect("fleet");
    let result = fleet
        .run(
            &[],
            |_token: &str| Ok(RecordingBackend::new()),
            std::future::ready(()),
        )
        .await;
    assert!(matches!(result, Err(FleetError::NoDrivers)));
}

#[tokio::test]
async fn connect_failure_aborts_before_any_driver_starts() {
    let fleet = FleetSupervisor::new(test_params()).expect("fleet");
    let first = Arc::new(RecordingBackend::new());

    let result = fleet
        .run(
            &tokens(&["good", "bad"]),
            |token: &str| match token {
                "good" => Ok(Arc::clone(&first)),
                _ => Err(BackendError::InvalidUrl("not a url".to_string())),
            },
            std::future::ready(()),
        )
        .await;

    match result {
        Err(FleetError::Connect { driver, .. }) => assert_eq!(driver, "driver-2 [bad…]"),
        other => panic!("expected connect failure, got {other:?}"),
    }
    assert!(first.calls().is_empty());
}

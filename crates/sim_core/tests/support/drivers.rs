use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use sim_core::driver::DriverSupervisor;
use sim_core::model::{TripDirection, TripStatus};
use sim_core::signal::StopSignal;
use sim_core::test_helpers::{cao_thang_trip, schedule_entry, test_params, RecordingBackend};

/// A driver over a shared backend, so the test can inspect calls after the
/// supervisor has been moved into a task.
pub fn driver(
    backend: &Arc<RecordingBackend>,
    signal: StopSignal,
) -> DriverSupervisor<Arc<RecordingBackend>> {
    DriverSupervisor::new(
        "driver-1",
        Arc::clone(backend),
        Arc::new(test_params()),
        signal,
        StdRng::seed_from_u64(1),
    )
}

/// Backend whose schedule holds one PLANNED Cao Thang trip with the given id.
pub fn backend_with_planned_trip(trip_id: &str, direction: TripDirection) -> RecordingBackend {
    RecordingBackend::new()
        .with_schedules(vec![schedule_entry(trip_id, TripStatus::Planned, direction)])
        .with_trip(cao_thang_trip(trip_id))
}

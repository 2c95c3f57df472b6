//! Trip state machine: walks a route path, serves stops, reports every step.
//!
//! One [`TripStateMachine`] drives exactly one trip:
//!
//! 1. Reject a trip without path points before touching the backend.
//! 2. `start_trip`. This is the only backend failure that aborts the run.
//! 3. For every path point: report the location, and if the point is within
//!    the stop threshold of the next unserved stop, arrive, board or drop
//!    students, dwell, then depart. Wait a travel delay before the next point.
//! 4. `end_trip` once the path is exhausted.
//!
//! Stops are served in ascending `sequence`; the cursor only moves forward,
//! so a stop the path never comes near is skipped, and a stop is never served
//! twice. Backend calls are strictly sequential.

use std::time::Duration;

use log::{debug, error, info, warn};
use rand::Rng;
use thiserror::Error;

use crate::backend::{BackendError, TransitBackend};
use crate::geo::is_near;
use crate::model::{StopPoint, StudentAction, TripDetail, TripDirection};
use crate::params::SimulationParams;
use crate::roster::student_events;
use crate::signal::StopSignal;
use crate::telemetry::TripReport;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("trip {trip_id} has no route path")]
    InvalidTripData { trip_id: String },

    #[error("trip {trip_id} could not be started: {source}")]
    StartFailed {
        trip_id: String,
        #[source]
        source: BackendError,
    },

    #[error("trip {trip_id} interrupted by a stop request")]
    Cancelled { trip_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripPhase {
    NotStarted,
    Started,
    Traveling,
    AtStop,
    Ended,
}

pub struct TripStateMachine<'a, B, R> {
    backend: &'a B,
    params: &'a SimulationParams,
    stop: &'a StopSignal,
    rng: R,
    direction: TripDirection,
    phase: TripPhase,
}

impl<'a, B, R> TripStateMachine<'a, B, R>
where
    B: TransitBackend,
    R: Rng + Send,
{
    pub fn new(backend: &'a B, params: &'a SimulationParams, stop: &'a StopSignal, rng: R) -> Self {
        Self {
            backend,
            params,
            stop,
            rng,
            direction: TripDirection::default(),
            phase: TripPhase::NotStarted,
        }
    }

    pub fn with_direction(mut self, direction: TripDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn phase(&self) -> TripPhase {
        self.phase
    }

    /// Simulate `detail` from its first path point to `end_trip`.
    pub async fn run(&mut self, detail: &TripDetail) -> Result<TripReport, SimulationError> {
        let trip_id = detail.id.as_str();
        let Some(path) = detail.path() else {
            error!("trip {trip_id} has no route path, skipping");
            return Err(SimulationError::InvalidTripData {
                trip_id: trip_id.to_string(),
            });
        };

        let mut stops: Vec<&StopPoint> = detail.stops.iter().collect();
        stops.sort_by_key(|stop| stop.sequence);

        info!(
            "trip {trip_id}: route '{}', {} path points, {} stops, {:?}",
            detail.route_name(),
            path.len(),
            stops.len(),
            self.direction
        );

        self.checkpoint(trip_id)?;
        if let Err(source) = self.backend.start_trip(trip_id).await {
            error!("trip {trip_id} failed to start: {source}");
            return Err(SimulationError::StartFailed {
                trip_id: trip_id.to_string(),
                source,
            });
        }
        self.phase = TripPhase::Started;
        info!("trip {trip_id} started");

        let mut report = TripReport::new(trip_id, detail.route_name());
        let mut next_stop = 0;

        for (index, &point) in path.iter().enumerate() {
            self.checkpoint(trip_id)?;
            self.phase = TripPhase::Traveling;
            let result = self.backend.update_location(trip_id, point).await;
            if note_failure(&mut report, "update_location", result) {
                report.locations_reported += 1;
            }
            debug!(
                "trip {trip_id}: at [{:.6}, {:.6}] ({}/{})",
                point.latitude,
                point.longitude,
                index + 1,
                path.len()
            );

            if let Some(stop) = stops.get(next_stop) {
                if is_near(point, stop.location, self.params.stop_threshold_km) {
                    self.serve_stop(trip_id, stop, &mut report).await?;
                    next_stop += 1;
                }
            }

            if index + 1 < path.len() {
                let travel = self.params.travel.sample(&mut self.rng);
                self.pause(trip_id, travel).await?;
            }
        }

        self.checkpoint(trip_id)?;
        let result = self.backend.end_trip(trip_id).await;
        let ended_ok = note_failure(&mut report, "end_trip", result);
        report.ended_ok = ended_ok;
        self.phase = TripPhase::Ended;
        if stops.len() > report.stops_visited.len() {
            info!(
                "trip {trip_id}: {} of {} stops never approached",
                stops.len() - report.stops_visited.len(),
                stops.len()
            );
        }
        info!(
            "trip {trip_id} finished: {} locations, {} stops, {} students, {} failed calls",
            report.locations_reported,
            report.stops_visited.len(),
            report.students_served(),
            report.failed_calls
        );
        Ok(report)
    }

    /// Arrive, handle students, dwell, depart. The path does not advance meanwhile.
    async fn serve_stop(
        &mut self,
        trip_id: &str,
        stop: &StopPoint,
        report: &mut TripReport,
    ) -> Result<(), SimulationError> {
        self.checkpoint(trip_id)?;
        self.phase = TripPhase::AtStop;
        info!("trip {trip_id}: arriving at stop '{}' ({})", stop.name, stop.id);
        let result = self.backend.arrive_stop(trip_id, &stop.id).await;
        note_failure(report, "arrive_stop", result);

        let dwell = self.params.dwell.sample(&mut self.rng);
        let count = self.params.sample_student_count(&mut self.rng);
        for event in student_events(count, self.direction, &mut self.rng) {
            self.checkpoint(trip_id)?;
            let student = event.student_id.as_str();
            match event.action {
                StudentAction::Pickup => {
                    let result = self.backend.pickup_student(trip_id, student).await;
                    if note_failure(report, "pickup_student", result) {
                        report.students_picked_up += 1;
                    }
                }
                StudentAction::Dropoff => {
                    let result = self.backend.dropoff_student(trip_id, student).await;
                    if note_failure(report, "dropoff_student", result) {
                        report.students_dropped_off += 1;
                    }
                }
            }
            let pause = self.params.student_pause.sample(&mut self.rng);
            self.pause(trip_id, pause).await?;
        }

        debug!("trip {trip_id}: dwelling {:.1}s at {}", dwell.as_secs_f64(), stop.id);
        self.pause(trip_id, dwell).await?;

        self.checkpoint(trip_id)?;
        let result = self.backend.depart_stop(trip_id, &stop.id).await;
        note_failure(report, "depart_stop", result);
        report.stops_visited.push(stop.id.clone());
        info!("trip {trip_id}: departed stop '{}'", stop.name);
        Ok(())
    }

    fn checkpoint(&self, trip_id: &str) -> Result<(), SimulationError> {
        self.stop.check().map_err(|_| cancelled(trip_id))
    }

    async fn pause(&self, trip_id: &str, duration: Duration) -> Result<(), SimulationError> {
        self.stop.sleep(duration).await.map_err(|_| cancelled(trip_id))
    }
}

fn cancelled(trip_id: &str) -> SimulationError {
    warn!("trip {trip_id} interrupted by stop request");
    SimulationError::Cancelled {
        trip_id: trip_id.to_string(),
    }
}

/// Log and count a failed non-fatal call. Returns whether the call succeeded.
fn note_failure(report: &mut TripReport, call: &str, result: Result<(), BackendError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            warn!("trip {}: {call} failed: {err}", report.trip_id);
            report.failed_calls += 1;
            false
        }
    }
}

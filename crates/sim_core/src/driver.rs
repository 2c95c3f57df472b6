//! Per-driver control loop.
//!
//! Each cycle polls today's schedule, picks the first PLANNED or ONGOING row,
//! fetches its trip and simulates it, then waits before polling again:
//!
//! | Cycle outcome        | Wait before next poll |
//! |----------------------|-----------------------|
//! | no schedules         | 60s                   |
//! | nothing eligible     | 120s                  |
//! | trip run (or abort)  | 300s                  |
//! | unexpected failure   | 30s backoff           |
//!
//! The loop only ends on a stop request; failures never escape it.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use thiserror::Error;

use crate::backend::{BackendError, TransitBackend};
use crate::model::ScheduleEntry;
use crate::params::SimulationParams;
use crate::signal::{StopSignal, Stopped};
use crate::telemetry::DriverReport;
use crate::trip::{SimulationError, TripStateMachine};

#[derive(Debug, Error)]
pub enum SupervisorCycleError {
    #[error("could not fetch today's schedules: {0}")]
    Schedules(#[source] BackendError),

    #[error("stop requested")]
    Stopped(#[from] Stopped),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    NoSchedules,
    NoEligibleTrip,
    TripCompleted,
    TripAborted,
}

impl CycleOutcome {
    pub fn wait(self, params: &SimulationParams) -> Duration {
        match self {
            CycleOutcome::NoSchedules => params.empty_schedule_wait(),
            CycleOutcome::NoEligibleTrip => params.no_eligible_wait(),
            CycleOutcome::TripCompleted | CycleOutcome::TripAborted => params.rest_after_trip(),
        }
    }
}

/// First schedule row, in backend order, that a driver may run.
pub fn select_eligible(entries: &[ScheduleEntry]) -> Option<&ScheduleEntry> {
    entries.iter().find(|entry| entry.status.is_eligible())
}

pub struct DriverSupervisor<B> {
    label: String,
    backend: B,
    params: Arc<SimulationParams>,
    stop: StopSignal,
    rng: StdRng,
    report: DriverReport,
}

impl<B: TransitBackend> DriverSupervisor<B> {
    pub fn new(
        label: impl Into<String>,
        backend: B,
        params: Arc<SimulationParams>,
        stop: StopSignal,
        rng: StdRng,
    ) -> Self {
        let label = label.into();
        Self {
            report: DriverReport::new(label.clone()),
            label,
            backend,
            params,
            stop,
            rng,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn report(&self) -> &DriverReport {
        &self.report
    }

    /// Poll and simulate until a stop is requested.
    pub async fn run(mut self) -> DriverReport {
        info!("{}: simulator started", self.label);
        while !self.stop.is_stopped() {
            let wait = match self.run_cycle().await {
                Ok(outcome) => outcome.wait(&self.params),
                Err(SupervisorCycleError::Stopped(_)) => break,
                Err(err) => {
                    error!("{}: {err}", self.label);
                    self.report.cycle_errors += 1;
                    self.params.cycle_error_backoff()
                }
            };
            debug!("{}: next poll in {}s", self.label, wait.as_secs());
            if self.stop.sleep(wait).await.is_err() {
                break;
            }
        }
        info!(
            "{}: simulator stopped after {} polls, {} trips completed, {} aborted",
            self.label, self.report.polls, self.report.trips_completed, self.report.trips_aborted
        );
        self.report
    }

    /// One poll: fetch schedules, pick a trip, simulate it.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, SupervisorCycleError> {
        self.stop.check()?;
        self.report.polls += 1;
        let schedules = self
            .backend
            .today_schedules()
            .await
            .map_err(SupervisorCycleError::Schedules)?;
        if schedules.is_empty() {
            info!(
                "{}: no schedules today, waiting {}s",
                self.label, self.params.empty_schedule_wait_secs
            );
            return Ok(CycleOutcome::NoSchedules);
        }
        info!("{}: {} schedules today", self.label, schedules.len());

        let Some(entry) = select_eligible(&schedules) else {
            info!(
                "{}: no PLANNED or ONGOING trip, waiting {}s",
                self.label, self.params.no_eligible_wait_secs
            );
            return Ok(CycleOutcome::NoEligibleTrip);
        };
        for skipped in schedules.iter().take_while(|e| !e.status.is_eligible()) {
            debug!(
                "{}: skipping trip {} ({:?})",
                self.label, skipped.trip_id, skipped.status
            );
        }

        self.stop.check()?;
        let detail = match self.backend.trip_detail(&entry.trip_id).await {
            Ok(Some(detail)) => detail,
            Ok(None) => {
                warn!("{}: trip {} has no detail", self.label, entry.trip_id);
                return Ok(CycleOutcome::NoEligibleTrip);
            }
            Err(err) => {
                warn!("{}: trip {} detail unavailable: {err}", self.label, entry.trip_id);
                return Ok(CycleOutcome::NoEligibleTrip);
            }
        };

        info!(
            "{}: selected trip {} ({:?}, starts {})",
            self.label, entry.trip_id, entry.direction, entry.start_time
        );
        let mut machine =
            TripStateMachine::new(&self.backend, &*self.params, &self.stop, &mut self.rng)
                .with_direction(entry.direction);
        match machine.run(&detail).await {
            Ok(report) => {
                self.report.record_trip(report);
                Ok(CycleOutcome::TripCompleted)
            }
            Err(SimulationError::Cancelled { .. }) => Err(SupervisorCycleError::Stopped(Stopped)),
            Err(err) => {
                error!("{}: {err}", self.label);
                self.report.trips_aborted += 1;
                Ok(CycleOutcome::TripAborted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TripDirection, TripStatus};
    use crate::test_helpers::schedule_entry;

    #[test]
    fn select_eligible_takes_first_planned_or_ongoing_in_order() {
        let entries = vec![
            schedule_entry("done", TripStatus::Completed, TripDirection::Outbound),
            schedule_entry("cancelled", TripStatus::Cancelled, TripDirection::Outbound),
            schedule_entry("ongoing", TripStatus::Ongoing, TripDirection::Inbound),
            schedule_entry("planned", TripStatus::Planned, TripDirection::Outbound),
        ];
        assert_eq!(
            select_eligible(&entries).map(|e| e.trip_id.as_str()),
            Some("ongoing")
        );
        assert!(select_eligible(&entries[..2]).is_none());
        assert!(select_eligible(&[]).is_none());
    }

    #[test]
    fn outcome_waits_follow_params() {
        let params = SimulationParams::default();
        assert_eq!(CycleOutcome::NoSchedules.wait(&params), Duration::from_secs(60));
        assert_eq!(CycleOutcome::NoEligibleTrip.wait(&params), Duration::from_secs(120));
        assert_eq!(CycleOutcome::TripCompleted.wait(&params), Duration::from_secs(300));
        assert_eq!(CycleOutcome::TripAborted.wait(&params), Duration::from_secs(300));
    }
}

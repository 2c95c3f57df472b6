//! Test helpers: a scripted in-memory backend and trip fixtures.
//!
//! [`RecordingBackend`] answers every call from memory and keeps an ordered
//! log of what was asked, so tests can assert on exact call sequences.
//! Individual calls can be made to fail by kind or by occurrence.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::backend::{BackendError, TransitBackend};
use crate::model::{
    Coordinate, RouteInfo, ScheduleEntry, StopPoint, TripDetail, TripDirection, TripStatus,
};
use crate::params::SimulationParams;

/// Route 156D in District 10: two path points, the second within ~56m of
/// the Cao Thang stop.
pub const CAO_THANG_PATH: [(f64, f64); 2] = [(106.700, 10.770), (106.678, 10.773)];
pub const CAO_THANG_STOP: (f64, f64) = (106.67836, 10.773362);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    TodaySchedules,
    TripDetail,
    StartTrip,
    UpdateLocation,
    ArriveStop,
    DepartStop,
    PickupStudent,
    DropoffStudent,
    EndTrip,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    TodaySchedules,
    TripDetail(String),
    StartTrip(String),
    UpdateLocation(String, Coordinate),
    ArriveStop(String, String),
    DepartStop(String, String),
    PickupStudent(String, String),
    DropoffStudent(String, String),
    EndTrip(String),
}

impl BackendCall {
    pub fn kind(&self) -> CallKind {
        match self {
            BackendCall::TodaySchedules => CallKind::TodaySchedules,
            BackendCall::TripDetail(_) => CallKind::TripDetail,
            BackendCall::StartTrip(_) => CallKind::StartTrip,
            BackendCall::UpdateLocation(..) => CallKind::UpdateLocation,
            BackendCall::ArriveStop(..) => CallKind::ArriveStop,
            BackendCall::DepartStop(..) => CallKind::DepartStop,
            BackendCall::PickupStudent(..) => CallKind::PickupStudent,
            BackendCall::DropoffStudent(..) => CallKind::DropoffStudent,
            BackendCall::EndTrip(_) => CallKind::EndTrip,
        }
    }

    /// Trip the call concerns, if any.
    pub fn trip_id(&self) -> Option<&str> {
        match self {
            BackendCall::TodaySchedules => None,
            BackendCall::TripDetail(trip)
            | BackendCall::StartTrip(trip)
            | BackendCall::UpdateLocation(trip, _)
            | BackendCall::ArriveStop(trip, _)
            | BackendCall::DepartStop(trip, _)
            | BackendCall::PickupStudent(trip, _)
            | BackendCall::DropoffStudent(trip, _)
            | BackendCall::EndTrip(trip) => Some(trip),
        }
    }
}

/// Scripted backend for one driver.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    /// Consumed one per poll before falling back to `schedules`.
    scripted_polls: Mutex<VecDeque<Result<Vec<ScheduleEntry>, String>>>,
    schedules: Vec<ScheduleEntry>,
    trips: HashMap<String, TripDetail>,
    failing: HashSet<CallKind>,
    failing_nth: HashSet<(CallKind, usize)>,
    calls: Mutex<Vec<BackendCall>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule list returned by every poll once scripted polls run out.
    pub fn with_schedules(mut self, schedules: Vec<ScheduleEntry>) -> Self {
        self.schedules = schedules;
        self
    }

    /// One-off poll result; `Err` makes that poll fail.
    pub fn then_poll(self, result: Result<Vec<ScheduleEntry>, &str>) -> Self {
        lock(&self.scripted_polls).push_back(result.map_err(str::to_string));
        self
    }

    pub fn with_trip(mut self, trip: TripDetail) -> Self {
        self.trips.insert(trip.id.clone(), trip);
        self
    }

    /// Every call of `kind` fails.
    pub fn failing(mut self, kind: CallKind) -> Self {
        self.failing.insert(kind);
        self
    }

    /// Only the `nth` (0-based) call of `kind` fails.
    pub fn failing_nth(mut self, kind: CallKind, nth: usize) -> Self {
        self.failing_nth.insert((kind, nth));
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        lock(&self.calls).iter().filter(|call| call.kind() == kind).count()
    }

    pub fn kinds(&self) -> Vec<CallKind> {
        lock(&self.calls).iter().map(BackendCall::kind).collect()
    }

    fn record(&self, call: BackendCall) -> Result<(), BackendError> {
        let kind = call.kind();
        let mut calls = lock(&self.calls);
        let nth = calls.iter().filter(|c| c.kind() == kind).count();
        calls.push(call);
        if self.failing.contains(&kind) || self.failing_nth.contains(&(kind, nth)) {
            return Err(BackendError::Rejected(format!("{kind:?} #{nth} rejected")));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TransitBackend for RecordingBackend {
    async fn today_schedules(&self) -> Result<Vec<ScheduleEntry>, BackendError> {
        self.record(BackendCall::TodaySchedules)?;
        match lock(&self.scripted_polls).pop_front() {
            Some(Ok(entries)) => Ok(entries),
            Some(Err(message)) => Err(BackendError::Rejected(message)),
            None => Ok(self.schedules.clone()),
        }
    }

    async fn trip_detail(&self, trip_id: &str) -> Result<Option<TripDetail>, BackendError> {
        self.record(BackendCall::TripDetail(trip_id.to_string()))?;
        Ok(self.trips.get(trip_id).cloned())
    }

    async fn start_trip(&self, trip_id: &str) -> Result<(), BackendError> {
        self.record(BackendCall::StartTrip(trip_id.to_string()))
    }

    async fn update_location(
        &self,
        trip_id: &str,
        position: Coordinate,
    ) -> Result<(), BackendError> {
        self.record(BackendCall::UpdateLocation(trip_id.to_string(), position))
    }

    async fn arrive_stop(&self, trip_id: &str, stop_id: &str) -> Result<(), BackendError> {
        self.record(BackendCall::ArriveStop(trip_id.to_string(), stop_id.to_string()))
    }

    async fn depart_stop(&self, trip_id: &str, stop_id: &str) -> Result<(), BackendError> {
        self.record(BackendCall::DepartStop(trip_id.to_string(), stop_id.to_string()))
    }

    async fn pickup_student(&self, trip_id: &str, student_id: &str) -> Result<(), BackendError> {
        self.record(BackendCall::PickupStudent(
            trip_id.to_string(),
            student_id.to_string(),
        ))
    }

    async fn dropoff_student(&self, trip_id: &str, student_id: &str) -> Result<(), BackendError> {
        self.record(BackendCall::DropoffStudent(
            trip_id.to_string(),
            student_id.to_string(),
        ))
    }

    async fn end_trip(&self, trip_id: &str) -> Result<(), BackendError> {
        self.record(BackendCall::EndTrip(trip_id.to_string()))
    }
}

/// Default parameters with a fixed seed and a 60m stop radius, wide enough
/// for the Cao Thang fixture.
pub fn test_params() -> SimulationParams {
    SimulationParams::default()
        .with_seed(42)
        .with_stop_threshold_km(0.06)
}

pub fn stop_point(id: &str, sequence: i64, (longitude, latitude): (f64, f64)) -> StopPoint {
    StopPoint {
        id: id.to_string(),
        name: format!("Stop {id}"),
        sequence,
        location: Coordinate::new(longitude, latitude),
        status: None,
    }
}

pub fn trip_detail(id: &str, path: &[(f64, f64)], stops: Vec<StopPoint>) -> TripDetail {
    TripDetail {
        id: id.to_string(),
        status: TripStatus::Planned,
        route: Some(RouteInfo {
            name: "156D".to_string(),
            path: path
                .iter()
                .map(|&(longitude, latitude)| Coordinate::new(longitude, latitude))
                .collect(),
        }),
        stops,
    }
}

/// The two-point Cao Thang trip with its single stop.
pub fn cao_thang_trip(id: &str) -> TripDetail {
    trip_detail(id, &CAO_THANG_PATH, vec![stop_point("cao-thang", 1, CAO_THANG_STOP)])
}

pub fn schedule_entry(
    trip_id: &str,
    status: TripStatus,
    direction: TripDirection,
) -> ScheduleEntry {
    ScheduleEntry {
        schedule_id: format!("schedule-{trip_id}"),
        trip_id: trip_id.to_string(),
        date: "2025-10-20".to_string(),
        status,
        direction,
        start_time: "06:30".to_string(),
    }
}

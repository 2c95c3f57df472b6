//! Transit backend abstraction: the calls a simulated driver makes.
//!
//! Two implementations exist:
//!
//! - **`HttpTransitBackend`** (feature `http`): talks to the real driver API.
//! - **`RecordingBackend`** (feature `test-helpers`): in-memory, scripted,
//!   records every call in order.
//!
//! A backend instance is bound to one driver credential, so none of the calls
//! take a token. Every mutation reports success as `Ok(())`; a rejected call
//! and a transport failure both surface as [`BackendError`].

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::model::{Coordinate, ScheduleEntry, TripDetail};

#[cfg(feature = "http")]
pub mod http;

#[derive(Debug, Error)]
pub enum BackendError {
    #[cfg(feature = "http")]
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} answered with status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("malformed response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("invalid backend url: {0}")]
    InvalidUrl(String),

    /// Failure injected by a test double.
    #[error("{0}")]
    Rejected(String),
}

/// Driver-facing API of the transit backend.
///
/// Implementations must be `Send + Sync` so a driver task can be spawned onto
/// a multi-threaded runtime; the returned futures must be `Send` for the same
/// reason.
pub trait TransitBackend: Send + Sync {
    /// Today's schedule rows for the bound driver, in backend order.
    fn today_schedules(
        &self,
    ) -> impl Future<Output = Result<Vec<ScheduleEntry>, BackendError>> + Send;

    /// Full trip record, or `None` when the backend does not know the trip.
    fn trip_detail(
        &self,
        trip_id: &str,
    ) -> impl Future<Output = Result<Option<TripDetail>, BackendError>> + Send;

    fn start_trip(&self, trip_id: &str) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn update_location(
        &self,
        trip_id: &str,
        position: Coordinate,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn arrive_stop(
        &self,
        trip_id: &str,
        stop_id: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn depart_stop(
        &self,
        trip_id: &str,
        stop_id: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn pickup_student(
        &self,
        trip_id: &str,
        student_id: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn dropoff_student(
        &self,
        trip_id: &str,
        student_id: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn end_trip(&self, trip_id: &str) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// Shared sessions: lets a caller keep a handle on a backend that a driver owns.
impl<T: TransitBackend> TransitBackend for Arc<T> {
    fn today_schedules(
        &self,
    ) -> impl Future<Output = Result<Vec<ScheduleEntry>, BackendError>> + Send {
        (**self).today_schedules()
    }

    fn trip_detail(
        &self,
        trip_id: &str,
    ) -> impl Future<Output = Result<Option<TripDetail>, BackendError>> + Send {
        (**self).trip_detail(trip_id)
    }

    fn start_trip(&self, trip_id: &str) -> impl Future<Output = Result<(), BackendError>> + Send {
        (**self).start_trip(trip_id)
    }

    fn update_location(
        &self,
        trip_id: &str,
        position: Coordinate,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        (**self).update_location(trip_id, position)
    }

    fn arrive_stop(
        &self,
        trip_id: &str,
        stop_id: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        (**self).arrive_stop(trip_id, stop_id)
    }

    fn depart_stop(
        &self,
        trip_id: &str,
        stop_id: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        (**self).depart_stop(trip_id, stop_id)
    }

    fn pickup_student(
        &self,
        trip_id: &str,
        student_id: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        (**self).pickup_student(trip_id, student_id)
    }

    fn dropoff_student(
        &self,
        trip_id: &str,
        student_id: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        (**self).dropoff_student(trip_id, student_id)
    }

    fn end_trip(&self, trip_id: &str) -> impl Future<Output = Result<(), BackendError>> + Send {
        (**self).end_trip(trip_id)
    }
}

//! Run summaries: what a trip emitted and how a driver's loop went.

/// Outcome of one simulated trip that got past `start_trip`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripReport {
    pub trip_id: String,
    pub route_name: String,
    pub locations_reported: usize,
    /// Stop ids in the order they were served.
    pub stops_visited: Vec<String>,
    pub students_picked_up: usize,
    pub students_dropped_off: usize,
    /// Non-fatal backend calls that failed along the way.
    pub failed_calls: usize,
    /// Whether the backend acknowledged `end_trip`.
    pub ended_ok: bool,
}

impl TripReport {
    pub fn new(trip_id: impl Into<String>, route_name: impl Into<String>) -> Self {
        Self {
            trip_id: trip_id.into(),
            route_name: route_name.into(),
            ..Default::default()
        }
    }

    pub fn students_served(&self) -> usize {
        self.students_picked_up + self.students_dropped_off
    }
}

/// Totals for one driver, returned when its supervisor stops.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverReport {
    pub driver: String,
    pub polls: usize,
    pub trips_completed: usize,
    pub trips_aborted: usize,
    pub cycle_errors: usize,
    pub completed: Vec<TripReport>,
}

impl DriverReport {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            ..Default::default()
        }
    }

    pub fn record_trip(&mut self, report: TripReport) {
        self.trips_completed += 1;
        self.completed.push(report);
    }

    pub fn failed_calls(&self) -> usize {
        self.completed.iter().map(|trip| trip.failed_calls).sum()
    }
}

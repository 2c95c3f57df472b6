//! Trip, stop and schedule records as the transit backend reports them.
//!
//! These are read-only snapshots: the backend owns trip state, the simulator
//! only walks what it is handed. Field spellings follow the backend, including
//! its historical typos (`rotute`, `static`, `DISPATH`), which are accepted as
//! aliases.

use serde::Deserialize;

/// A WGS84 point in degrees. On the wire this is `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f64; 2]")]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([longitude, latitude]: [f64; 2]) -> Self {
        Self::new(longitude, latitude)
    }
}

/// Lifecycle status shared by schedule entries and trip details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TripStatus {
    Planned,
    Ongoing,
    Completed,
    Cancelled,
    /// Status absent or blank.
    #[default]
    Unknown,
    /// Anything else the backend sends, kept verbatim.
    Other(String),
}

impl TripStatus {
    /// Only planned and in-progress trips are picked up by a driver.
    pub fn is_eligible(&self) -> bool {
        matches!(self, TripStatus::Planned | TripStatus::Ongoing)
    }
}

impl From<String> for TripStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PLANNED" => TripStatus::Planned,
            "ONGOING" => TripStatus::Ongoing,
            "COMPLETED" => TripStatus::Completed,
            "CANCELLED" => TripStatus::Cancelled,
            "" => TripStatus::Unknown,
            _ => TripStatus::Other(raw),
        }
    }
}

/// Which way a trip runs. Outbound trips collect students, inbound trips
/// bring them home.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TripDirection {
    #[default]
    Outbound,
    Inbound,
}

impl TripDirection {
    /// The student action performed at each stop in this direction.
    pub fn student_action(self) -> StudentAction {
        match self {
            TripDirection::Outbound => StudentAction::Pickup,
            TripDirection::Inbound => StudentAction::Dropoff,
        }
    }
}

impl From<String> for TripDirection {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "RETURN" => TripDirection::Inbound,
            // DISPATCH, the backend's DISPATH spelling, and unknown types.
            _ => TripDirection::Outbound,
        }
    }
}

/// One row of a driver's schedule for today.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    #[serde(default)]
    pub schedule_id: String,
    pub trip_id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, alias = "static")]
    pub status: TripStatus,
    #[serde(default, rename = "type")]
    pub direction: TripDirection,
    #[serde(default)]
    pub start_time: String,
}

/// Per-trip progress of a stop as tracked by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum StopStatus {
    Pending,
    Arrived,
    Done,
    Skipped,
    Unknown,
}

impl From<String> for StopStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => StopStatus::Pending,
            "ARRIVED" => StopStatus::Arrived,
            "DONE" => StopStatus::Done,
            "SKIPPED" => StopStatus::Skipped,
            _ => StopStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StopPoint {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Ordering key within one trip.
    #[serde(default)]
    pub sequence: i64,
    pub location: Coordinate,
    #[serde(default)]
    pub status: Option<StopStatus>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteInfo {
    #[serde(default)]
    pub name: String,
    /// Polyline in traversal order.
    #[serde(default)]
    pub path: Vec<Coordinate>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TripDetail {
    pub id: String,
    #[serde(default)]
    pub status: TripStatus,
    #[serde(default, alias = "rotute")]
    pub route: Option<RouteInfo>,
    #[serde(default)]
    pub stops: Vec<StopPoint>,
}

impl TripDetail {
    /// The route polyline, or `None` when the route or its points are missing.
    pub fn path(&self) -> Option<&[Coordinate]> {
        self.route
            .as_ref()
            .map(|route| route.path.as_slice())
            .filter(|path| !path.is_empty())
    }

    pub fn route_name(&self) -> &str {
        self.route.as_ref().map_or("", |route| route.name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentAction {
    Pickup,
    Dropoff,
}

/// A single boarding or alighting generated during a stop visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentEvent {
    pub student_id: String,
    pub action: StudentAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_entry_accepts_backend_spellings() {
        let raw = r#"{
            "scheduleId": "s-1",
            "tripId": "t-1",
            "date": "2025-10-20",
            "static": "planned",
            "type": "DISPATH",
            "startTime": "06:30"
        }"#;
        let entry: ScheduleEntry = serde_json::from_str(raw).expect("entry");
        assert_eq!(entry.trip_id, "t-1");
        assert_eq!(entry.status, TripStatus::Planned);
        assert_eq!(entry.direction, TripDirection::Outbound);
        assert_eq!(entry.start_time, "06:30");
    }

    #[test]
    fn schedule_entry_defaults_missing_fields() {
        let entry: ScheduleEntry =
            serde_json::from_str(r#"{"tripId": "t-2", "status": "ONGOING", "type": "RETURN"}"#)
                .expect("entry");
        assert!(entry.status.is_eligible());
        assert_eq!(entry.direction, TripDirection::Inbound);
        assert_eq!(entry.schedule_id, "");

        let bare: ScheduleEntry = serde_json::from_str(r#"{"tripId": "t-3"}"#).expect("entry");
        assert_eq!(bare.status, TripStatus::Unknown);
        assert!(!bare.status.is_eligible());
    }

    #[test]
    fn unrecognised_status_is_kept_and_ineligible() {
        let status = TripStatus::from("DELAYED".to_string());
        assert_eq!(status, TripStatus::Other("DELAYED".to_string()));
        assert!(!status.is_eligible());
        assert!(!TripStatus::Completed.is_eligible());
    }

    #[test]
    fn trip_detail_reads_rotute_and_lng_lat_pairs() {
        let raw = r#"{
            "id": "trip-9",
            "status": "PLANNED",
            "rotute": {
                "name": "156D",
                "path": [[106.700, 10.770], [106.678, 10.773]],
                "startTime": "06:30"
            },
            "bus": {"id": "b-1", "licensePlate": "51B-123.45"},
            "stops": [
                {"id": "sp-1", "name": "Cao Thang", "location": [106.67836, 10.773362],
                 "sequence": 1, "status": "PENDING"}
            ]
        }"#;
        let detail: TripDetail = serde_json::from_str(raw).expect("detail");
        assert_eq!(detail.route_name(), "156D");
        let path = detail.path().expect("path");
        assert_eq!(path.len(), 2);
        assert_eq!(path[1], Coordinate::new(106.678, 10.773));
        assert_eq!(detail.stops[0].location.latitude, 10.773362);
        assert_eq!(detail.stops[0].status, Some(StopStatus::Pending));
    }

    #[test]
    fn trip_detail_without_points_has_no_path() {
        let detail: TripDetail =
            serde_json::from_str(r#"{"id": "t", "route": {"name": "x", "path": []}}"#)
                .expect("detail");
        assert!(detail.path().is_none());

        let detail: TripDetail = serde_json::from_str(r#"{"id": "t"}"#).expect("detail");
        assert!(detail.path().is_none());
        assert_eq!(detail.route_name(), "");
    }

    #[test]
    fn direction_decides_student_action() {
        assert_eq!(TripDirection::Outbound.student_action(), StudentAction::Pickup);
        assert_eq!(TripDirection::Inbound.student_action(), StudentAction::Dropoff);
    }
}

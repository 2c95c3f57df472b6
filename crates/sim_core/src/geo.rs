//! Great-circle distance and the stop proximity predicate.
//!
//! Coordinates are plain degrees; nothing here is projected or cached.

use crate::model::Coordinate;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance under which a vehicle counts as "at" a stop (~50m).
pub const DEFAULT_STOP_THRESHOLD_KM: f64 = 0.05;

/// Haversine distance between two coordinates in kilometres.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lon1) = (a.latitude.to_radians(), a.longitude.to_radians());
    let (lat2, lon2) = (b.latitude.to_radians(), b.longitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// True when `current` lies strictly closer than `threshold_km` to `target`.
pub fn is_near(current: Coordinate, target: Coordinate, threshold_km: f64) -> bool {
    distance_km(current, target) < threshold_km
}

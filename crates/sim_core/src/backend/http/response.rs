use serde::{Deserialize, Serialize};

use crate::model::ScheduleEntry;

/// Every driver API response wraps its payload in `{"data": ...}`.
#[derive(Deserialize)]
pub(super) struct Envelope<T> {
    pub(super) data: Option<T>,
}

/// Payload of `GET /api/drivers/schedules/today`.
#[derive(Deserialize)]
pub(super) struct SchedulePage {
    #[serde(default)]
    pub(super) data: Vec<ScheduleEntry>,
    #[serde(default)]
    pub(super) total: Option<u64>,
}

/// Body of `POST /api/drivers/trip/{id}/location`.
#[derive(Debug, Serialize, PartialEq)]
pub(super) struct LocationBody {
    pub(super) latitude: f64,
    pub(super) longitude: f64,
}

use log::debug;

use super::response::{Envelope, SchedulePage};
use crate::backend::BackendError;
use crate::model::{ScheduleEntry, TripDetail};

pub(super) fn parse_schedules(
    endpoint: &str,
    body: &[u8],
) -> Result<Vec<ScheduleEntry>, BackendError> {
    let envelope: Envelope<SchedulePage> = decode(endpoint, body)?;
    let Some(page) = envelope.data else {
        return Ok(Vec::new());
    };
    if let Some(total) = page.total {
        if total as usize != page.data.len() {
            debug!(
                "{endpoint} reported {total} schedules but returned {}",
                page.data.len()
            );
        }
    }
    Ok(page.data)
}

pub(super) fn parse_trip_detail(
    endpoint: &str,
    body: &[u8],
) -> Result<Option<TripDetail>, BackendError> {
    let envelope: Envelope<TripDetail> = decode(endpoint, body)?;
    Ok(envelope.data)
}

fn decode<T: serde::de::DeserializeOwned>(endpoint: &str, body: &[u8]) -> Result<T, BackendError> {
    serde_json::from_slice(body).map_err(|err| BackendError::Decode {
        endpoint: endpoint.to_string(),
        message: err.to_string(),
    })
}

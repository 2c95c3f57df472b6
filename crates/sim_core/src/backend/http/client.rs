use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode, Url};

use super::parser::{parse_schedules, parse_trip_detail};
use super::response::LocationBody;
use crate::backend::{BackendError, TransitBackend};
use crate::model::{Coordinate, ScheduleEntry, TripDetail};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Driver API client bound to one bearer token.
#[derive(Debug, Clone)]
pub struct HttpTransitBackend {
    client: Client,
    endpoint: String,
    token: String,
}

impl HttpTransitBackend {
    /// Create a client for the given API root (e.g. `http://localhost:3000`).
    pub fn new(endpoint: &str, token: impl Into<String>) -> Result<Self, BackendError> {
        Self::with_timeout(endpoint, token, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        endpoint: &str,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let endpoint = endpoint.trim_end_matches('/').to_string();
        let parsed = Url::parse(&endpoint)
            .map_err(|err| BackendError::InvalidUrl(format!("{endpoint}: {err}")))?;
        if parsed.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(format!("{endpoint}: not a base url")));
        }
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            token: token.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Append `segments` to the API root, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|err| BackendError::InvalidUrl(format!("{}: {err}", self.endpoint)))?;
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidUrl(self.endpoint.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and return the response when the status is 2xx.
    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&LocationBody>,
    ) -> Result<reqwest::Response, BackendError> {
        let url = self.url(segments)?;
        let endpoint = url.path().to_string();
        let mut request = self.client.request(method, url).bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn post(&self, segments: &[&str]) -> Result<(), BackendError> {
        self.send(Method::POST, segments, None).await.map(|_| ())
    }
}

/// `api/drivers/trip/{trip_id}` followed by `rest`.
fn trip_segments<'a>(trip_id: &'a str, rest: &[&'a str]) -> Vec<&'a str> {
    let mut segments = vec!["api", "drivers", "trip", trip_id];
    segments.extend_from_slice(rest);
    segments
}

impl TransitBackend for HttpTransitBackend {
    async fn today_schedules(&self) -> Result<Vec<ScheduleEntry>, BackendError> {
        let segments = ["api", "drivers", "schedules", "today"];
        let response = self.send(Method::GET, &segments, None).await?;
        let endpoint = response.url().path().to_string();
        let body = response.bytes().await?;
        parse_schedules(&endpoint, &body)
    }

    async fn trip_detail(&self, trip_id: &str) -> Result<Option<TripDetail>, BackendError> {
        let response = match self.send(Method::GET, &trip_segments(trip_id, &[]), None).await {
            Ok(response) => response,
            Err(BackendError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                debug!("trip {trip_id} not found");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        let endpoint = response.url().path().to_string();
        let body = response.bytes().await?;
        parse_trip_detail(&endpoint, &body)
    }

    async fn start_trip(&self, trip_id: &str) -> Result<(), BackendError> {
        self.post(&trip_segments(trip_id, &["start"])).await
    }

    async fn update_location(
        &self,
        trip_id: &str,
        position: Coordinate,
    ) -> Result<(), BackendError> {
        let body = LocationBody {
            latitude: position.latitude,
            longitude: position.longitude,
        };
        self.send(
            Method::POST,
            &trip_segments(trip_id, &["location"]),
            Some(&body),
        )
        .await
        .map(|_| ())
    }

    async fn arrive_stop(&self, trip_id: &str, stop_id: &str) -> Result<(), BackendError> {
        self.post(&trip_segments(trip_id, &["stoppoint", stop_id, "arrive"]))
            .await
    }

    async fn depart_stop(&self, trip_id: &str, stop_id: &str) -> Result<(), BackendError> {
        self.post(&trip_segments(trip_id, &["stoppoint", stop_id, "depart"]))
            .await
    }

    async fn pickup_student(&self, trip_id: &str, student_id: &str) -> Result<(), BackendError> {
        self.post(&trip_segments(trip_id, &["students", student_id, "pickup"]))
            .await
    }

    async fn dropoff_student(&self, trip_id: &str, student_id: &str) -> Result<(), BackendError> {
        self.post(&trip_segments(trip_id, &["students", student_id, "dropoff"]))
            .await
    }

    async fn end_trip(&self, trip_id: &str) -> Result<(), BackendError> {
        // The backend exposes trip completion as a GET.
        self.send(Method::GET, &trip_segments(trip_id, &["end"]), None)
            .await
            .map(|_| ())
    }
}

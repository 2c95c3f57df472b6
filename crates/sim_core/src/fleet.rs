//! Fleet supervisor: one independent driver task per credential.
//!
//! Drivers start in credential order, `driver_stagger_secs` apart, and share
//! nothing but the read-only parameters and the stop signal. When the
//! shutdown future resolves every driver is told to stop; the fleet then waits
//! for each task so in-flight backend calls finish before it returns.

use std::future::Future;
use std::sync::Arc;

use log::{error, info};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::backend::{BackendError, TransitBackend};
use crate::driver::DriverSupervisor;
use crate::params::{ParamsError, SimulationParams};
use crate::signal::stop_channel;
use crate::telemetry::DriverReport;

const MASKED_PREFIX_CHARS: usize = 12;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("no driver credentials configured")]
    NoDrivers,

    #[error("invalid simulation parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("{driver}: could not create backend client: {source}")]
    Connect {
        driver: String,
        #[source]
        source: BackendError,
    },
}

/// First characters of a credential, enough to tell drivers apart in logs.
pub fn mask_credential(token: &str) -> String {
    let prefix: String = token.chars().take(MASKED_PREFIX_CHARS).collect();
    format!("{prefix}…")
}

pub fn driver_label(index: usize, token: &str) -> String {
    format!("driver-{} [{}]", index + 1, mask_credential(token))
}

#[derive(Debug, Clone)]
pub struct FleetSupervisor {
    params: Arc<SimulationParams>,
}

impl FleetSupervisor {
    pub fn new(params: SimulationParams) -> Result<Self, FleetError> {
        params.validate()?;
        Ok(Self {
            params: Arc::new(params),
        })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Run one driver per credential until `shutdown` resolves.
    ///
    /// `connect` builds the backend session for a credential. Every session
    /// is created before the first driver starts, so a bad credential or URL
    /// fails the whole fleet up front. Reports come back in credential order.
    pub async fn run<B, F, S>(
        &self,
        credentials: &[String],
        mut connect: F,
        shutdown: S,
    ) -> Result<Vec<DriverReport>, FleetError>
    where
        B: TransitBackend + 'static,
        F: FnMut(&str) -> Result<B, BackendError>,
        S: Future<Output = ()>,
    {
        if credentials.is_empty() {
            return Err(FleetError::NoDrivers);
        }
        let sessions = credentials
            .iter()
            .enumerate()
            .map(|(index, token)| {
                let driver = driver_label(index, token);
                match connect(token) {
                    Ok(backend) => Ok((driver, backend)),
                    Err(source) => Err(FleetError::Connect { driver, source }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "starting fleet of {} drivers, {}s apart",
            sessions.len(),
            self.params.driver_stagger_secs
        );
        let (handle, signal) = stop_channel();
        tokio::pin!(shutdown);

        let mut tasks: Vec<(String, JoinHandle<DriverReport>)> = Vec::with_capacity(sessions.len());
        let mut shutdown_seen = false;
        for (index, (label, backend)) in sessions.into_iter().enumerate() {
            if index > 0 {
                tokio::select! {
                    _ = tokio::time::sleep(self.params.driver_stagger()) => {}
                    _ = &mut shutdown => {
                        shutdown_seen = true;
                        break;
                    }
                }
            }
            let driver = DriverSupervisor::new(
                label.clone(),
                backend,
                Arc::clone(&self.params),
                signal.clone(),
                self.params.driver_rng(index),
            );
            info!("{label}: launched");
            tasks.push((label, tokio::spawn(driver.run())));
        }

        if !shutdown_seen {
            shutdown.await;
        }
        info!("shutdown requested, stopping {} drivers", tasks.len());
        handle.stop();

        let mut reports = Vec::with_capacity(tasks.len());
        for (label, task) in tasks {
            match task.await {
                Ok(report) => reports.push(report),
                Err(err) => error!("{label}: driver task failed: {err}"),
            }
        }
        for report in &reports {
            info!(
                "{}: {} polls, {} trips completed, {} aborted, {} cycle errors, {} failed calls",
                report.driver,
                report.polls,
                report.trips_completed,
                report.trips_aborted,
                report.cycle_errors,
                report.failed_calls()
            );
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_long_and_short_credentials() {
        assert_eq!(mask_credential("eyJhbGciOiJIUzI1NiJ9.payload"), "eyJhbGciOiJI…");
        assert_eq!(mask_credential("short"), "short…");
        assert_eq!(driver_label(0, "abc"), "driver-1 [abc…]");
    }

    #[test]
    fn invalid_params_are_rejected_up_front() {
        let mut params = SimulationParams::default();
        params.max_students_per_stop = 0;
        params.min_students_per_stop = 0;
        assert!(matches!(
            FleetSupervisor::new(params),
            Err(FleetError::InvalidParams(ParamsError::NoStudents))
        ));
    }
}

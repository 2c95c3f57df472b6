//! Simulation parameters: stop detection radius, delay distributions and the
//! supervisor wait times.
//!
//! Every delay is drawn uniformly from a [`DelayRange`]. Defaults reproduce a
//! believable school-bus run: 3–8s between path points, 30–60s dwell at each
//! stop, 2–5s between students and 2–5 students per stop.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use thiserror::Error;

use crate::geo::DEFAULT_STOP_THRESHOLD_KM;

/// Longest delay a range may produce: one day.
pub const MAX_DELAY_SECS: f64 = 86_400.0;

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("{name}: min {min} is greater than max {max}")]
    InvertedRange { name: &'static str, min: f64, max: f64 },

    #[error("{name} must be a finite, non-negative number (got {value})")]
    Negative { name: &'static str, value: f64 },

    #[error("{name}: {value}s exceeds the one-day limit (86400s)")]
    TooLarge { name: &'static str, value: f64 },

    #[error("max_students_per_stop must be at least 1")]
    NoStudents,
}

/// Closed interval of seconds a delay is sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DelayRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl DelayRange {
    pub const fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// Range that always yields `secs`.
    pub const fn fixed(secs: f64) -> Self {
        Self::new(secs, secs)
    }

    /// Draw a delay uniformly from the range. Endpoints are clamped to
    /// `0..=MAX_DELAY_SECS`, so an unvalidated range cannot panic here.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min = self.min_secs.max(0.0).min(MAX_DELAY_SECS);
        let max = self.max_secs.max(0.0).min(MAX_DELAY_SECS);
        let secs = if max > min {
            rng.gen_range(min..=max)
        } else {
            min
        };
        Duration::from_secs_f64(secs)
    }

    fn validate(&self, name: &'static str) -> Result<(), ParamsError> {
        for value in [self.min_secs, self.max_secs] {
            if !value.is_finite() || value < 0.0 {
                return Err(ParamsError::Negative { name, value });
            }
            if value > MAX_DELAY_SECS {
                return Err(ParamsError::TooLarge { name, value });
            }
        }
        if self.min_secs > self.max_secs {
            return Err(ParamsError::InvertedRange {
                name,
                min: self.min_secs,
                max: self.max_secs,
            });
        }
        Ok(())
    }
}

/// Knobs for one driver's simulation. Shared read-only by every driver in a fleet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// A path point closer than this to the next stop counts as arriving.
    pub stop_threshold_km: f64,
    /// Time between consecutive path points.
    pub travel: DelayRange,
    /// Time spent at a stop, on top of the student pauses.
    pub dwell: DelayRange,
    /// Pause after each boarding or alighting.
    pub student_pause: DelayRange,
    pub min_students_per_stop: usize,
    pub max_students_per_stop: usize,
    /// Wait before re-polling when the driver has no schedule today.
    pub empty_schedule_wait_secs: u64,
    /// Wait before re-polling when no schedule row is PLANNED or ONGOING.
    pub no_eligible_wait_secs: u64,
    /// Rest after a trip before polling again.
    pub rest_after_trip_secs: u64,
    /// Backoff after an unexpected failure in a poll cycle.
    pub cycle_error_backoff_secs: u64,
    /// Delay between starting consecutive drivers.
    pub driver_stagger_secs: u64,
    /// Seed for reproducible runs. Driver `i` uses `seed + i`.
    pub seed: Option<u64>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            stop_threshold_km: DEFAULT_STOP_THRESHOLD_KM,
            travel: DelayRange::new(3.0, 8.0),
            dwell: DelayRange::new(30.0, 60.0),
            student_pause: DelayRange::new(2.0, 5.0),
            min_students_per_stop: 2,
            max_students_per_stop: 5,
            empty_schedule_wait_secs: 60,
            no_eligible_wait_secs: 120,
            rest_after_trip_secs: 300,
            cycle_error_backoff_secs: 30,
            driver_stagger_secs: 10,
            seed: None,
        }
    }
}

impl SimulationParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_stop_threshold_km(mut self, threshold_km: f64) -> Self {
        self.stop_threshold_km = threshold_km;
        self
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if !self.stop_threshold_km.is_finite() || self.stop_threshold_km < 0.0 {
            return Err(ParamsError::Negative {
                name: "stop_threshold_km",
                value: self.stop_threshold_km,
            });
        }
        self.travel.validate("travel")?;
        self.dwell.validate("dwell")?;
        self.student_pause.validate("student_pause")?;
        if self.max_students_per_stop == 0 {
            return Err(ParamsError::NoStudents);
        }
        if self.min_students_per_stop > self.max_students_per_stop {
            return Err(ParamsError::InvertedRange {
                name: "students_per_stop",
                min: self.min_students_per_stop as f64,
                max: self.max_students_per_stop as f64,
            });
        }
        Ok(())
    }

    /// How many students board or alight at one stop visit.
    pub fn sample_student_count<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        if self.max_students_per_stop > self.min_students_per_stop {
            rng.gen_range(self.min_students_per_stop..=self.max_students_per_stop)
        } else {
            self.min_students_per_stop
        }
    }

    pub fn empty_schedule_wait(&self) -> Duration {
        Duration::from_secs(self.empty_schedule_wait_secs)
    }

    pub fn no_eligible_wait(&self) -> Duration {
        Duration::from_secs(self.no_eligible_wait_secs)
    }

    pub fn rest_after_trip(&self) -> Duration {
        Duration::from_secs(self.rest_after_trip_secs)
    }

    pub fn cycle_error_backoff(&self) -> Duration {
        Duration::from_secs(self.cycle_error_backoff_secs)
    }

    pub fn driver_stagger(&self) -> Duration {
        Duration::from_secs(self.driver_stagger_secs)
    }

    /// RNG for the driver at `index` in the fleet.
    pub fn driver_rng(&self, index: usize) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_entropy(),
        }
    }
}

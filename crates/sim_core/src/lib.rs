//! Core of the school-bus trip simulator.
//!
//! A [`fleet::FleetSupervisor`] runs one [`driver::DriverSupervisor`] per
//! driver credential. Each driver polls its schedule through a
//! [`backend::TransitBackend`] and replays the selected trip with a
//! [`trip::TripStateMachine`], reporting locations, stop visits and students
//! as it goes.

pub mod backend;
pub mod config;
pub mod driver;
pub mod fleet;
pub mod geo;
pub mod model;
pub mod params;
pub mod roster;
pub mod signal;
pub mod telemetry;
pub mod trip;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

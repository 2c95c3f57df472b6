//! HTTP implementation of [`TransitBackend`](super::TransitBackend) for the
//! driver API.
//!
//! This module wraps an async `reqwest` client bound to one driver's bearer
//! token. Response envelopes are decoded by pure functions in `parser` so they
//! can be tested without a server.

mod client;
mod parser;
mod response;


pub use client::{HttpTransitBackend, DEFAULT_REQUEST_TIMEOUT};

//! Reverse geocoding and transit directions for commute evaluation.
//!
//! [`MapsClient`] talks to a Google Maps compatible web service. The
//! [`Maps`] trait is what the evaluator depends on.

mod client;
mod error;
mod types;

pub use client::{DEFAULT_MAPS_URL, Maps, MapsClient};
pub use error::MapsError;
pub use types::{DirectionsRequest, Leg, Route, TimeValue, TravelTime};

//! Core library for the `orutego` distance and travel-time calculator.
//!
//! This crate defines:
//! - Shared domain models (coordinates, geocodes, distances, routes)
//! - The mapping-provider abstraction and its Google Maps implementation
//! - The calculation pipeline and the per-user session it runs against
//! - Duration formatting, polyline decoding and the copy payload
//! - On-disk configuration (never including the API key)
//!
//! It is used by `orutego-cli`, but can also be reused by other front ends.

pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod planner;
pub mod polyline;
pub mod provider;
pub mod session;

pub use config::{CacheConfig, Config, ProviderConfig};
pub use error::{Endpoint, ErrorKind, MapsError};
pub use model::{
    BoundingBox, CalculationResult, Coordinates, DistanceResult, GeoResult, Route, Suggestion,
    TravelMode, TripRequest,
};
pub use planner::Planner;
pub use provider::{MapsProvider, google::GoogleMapsProvider};
pub use session::{Credential, Session};

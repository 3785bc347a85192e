//! redline-common: data model and service seam shared by the redline crates.
//!
//! This crate provides:
//! - `GeoCoordinate`, `BoundingBox`, `UserId` and the overlay feature collection
//! - the wire envelope the map service speaks
//! - `MapService`, the one trait every backend implements, with an HTTP and
//!   an in-memory implementation
//! - configuration and error types

pub mod config;
pub mod error;
pub mod geo;
#[cfg(feature = "http")]
pub mod http;
pub mod memory;
pub mod overlay;
pub mod service;
#[cfg(feature = "telemetry")]
pub mod telemetry;
pub mod wire;

pub use crate::config::{ClientConfig, PinVisibility, StalePolicy};
pub use crate::error::{ConfigError, FetchError, RedlineError, Result};
pub use crate::geo::{BoundingBox, GeoCoordinate, UserId};
#[cfg(feature = "http")]
pub use crate::http::HttpMapService;
pub use crate::memory::MemoryMapService;
pub use crate::overlay::{Feature, FeatureCollection, FeatureProperties, HolcGrade, Overlay};
pub use crate::service::{Endpoint, MapService};
pub use crate::wire::{Envelope, PinsBody, ServiceResponse};

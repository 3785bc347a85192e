//! The remote map service, as seen by the client.
//!
//! One method per endpoint. Implementations only move bytes: they return the
//! status and body as they came back, and leave envelope and shape checks to
//! the callers in `redline-core`. A transport failure (no response at all)
//! is the only error they report themselves.

use crate::error::FetchError;
use crate::geo::{BoundingBox, UserId};
use crate::wire::ServiceResponse;

/// Endpoints of the map service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    GetData,
    GetArea,
    GetPins,
    AddPin,
    ClearPins,
}

impl Endpoint {
    /// Default path, relative to the service base URL.
    pub fn default_path(&self) -> &'static str {
        match self {
            Endpoint::GetData => "getData",
            Endpoint::GetArea => "getArea",
            Endpoint::GetPins => "getPins",
            Endpoint::AddPin => "addPin",
            Endpoint::ClearPins => "clearPins",
        }
    }
}

#[trait_variant::make(MapService: Send)]
pub trait LocalMapService {
    /// `GET getData?minLat&maxLat&minLong&maxLong`
    async fn get_data(&self, bounds: &BoundingBox) -> Result<ServiceResponse, FetchError>;

    /// `GET getArea?key`
    async fn get_area(&self, keyword: &str) -> Result<ServiceResponse, FetchError>;

    /// `GET getPins`, with `uid` when listing is scoped to one user.
    async fn get_pins(&self, user: Option<&UserId>) -> Result<ServiceResponse, FetchError>;

    /// `GET addPin?uid&ltd&lng`. Coordinates are forwarded verbatim.
    async fn add_pin(
        &self,
        user: &UserId,
        lat: &str,
        lng: &str,
    ) -> Result<ServiceResponse, FetchError>;

    /// `GET clearPins?uid`
    async fn clear_pins(&self, user: &UserId) -> Result<ServiceResponse, FetchError>;
}

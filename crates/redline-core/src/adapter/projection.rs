//! Screen space to map coordinates.

use std::f64::consts::PI;

use redline_common::GeoCoordinate;
use serde::{Deserialize, Serialize};

/// Web Mercator tile size the map widget renders with.
pub const TILE_SIZE: f64 = 512.0;

/// Latitude limit of the Web Mercator square.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
}

impl Camera {
    pub const fn new(longitude: f64, latitude: f64, zoom: f64) -> Self {
        Self {
            longitude,
            latitude,
            zoom,
        }
    }

    pub fn center(&self) -> GeoCoordinate {
        GeoCoordinate::new(self.latitude, self.longitude)
    }
}

impl Default for Camera {
    /// Providence, RI.
    fn default() -> Self {
        Camera::new(-71.4128, 41.824, 10.0)
    }
}

/// Pixel position relative to the top-left of the map viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport::new(1024.0, 768.0)
    }
}

/// The map widget's projection between viewport pixels and coordinates.
pub trait MapProjection {
    fn unproject(&self, point: ScreenPoint) -> GeoCoordinate;

    fn project(&self, coordinate: GeoCoordinate) -> ScreenPoint;
}

/// Spherical Web Mercator, centred on a camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    pub camera: Camera,
    pub viewport: Viewport,
}

impl WebMercator {
    pub fn new(camera: Camera, viewport: Viewport) -> Self {
        Self { camera, viewport }
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.camera.zoom)
    }

    /// World pixel coordinates at the current zoom.
    fn to_world(&self, coordinate: GeoCoordinate) -> (f64, f64) {
        let size = self.world_size();
        let lat = coordinate
            .latitude
            .clamp(-MAX_LATITUDE, MAX_LATITUDE)
            .to_radians();
        let x = (coordinate.longitude + 180.0) / 360.0 * size;
        let y = (1.0 - (PI / 4.0 + lat / 2.0).tan().ln() / PI) / 2.0 * size;
        (x, y)
    }

    fn from_world(&self, x: f64, y: f64) -> GeoCoordinate {
        let size = self.world_size();
        let longitude = x / size * 360.0 - 180.0;
        let latitude = (PI * (1.0 - 2.0 * y / size)).sinh().atan().to_degrees();
        GeoCoordinate::new(latitude, longitude)
    }
}

impl MapProjection for WebMercator {
    fn unproject(&self, point: ScreenPoint) -> GeoCoordinate {
        let (cx, cy) = self.to_world(self.camera.center());
        let mid = self.viewport.center();
        self.from_world(cx + point.x - mid.x, cy + point.y - mid.y)
    }

    fn project(&self, coordinate: GeoCoordinate) -> ScreenPoint {
        let (cx, cy) = self.to_world(self.camera.center());
        let (x, y) = self.to_world(coordinate);
        let mid = self.viewport.center();
        ScreenPoint::new(x - cx + mid.x, y - cy + mid.y)
    }
}

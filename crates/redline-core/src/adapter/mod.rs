//! Map interaction adapter.
//!
//! Sits between a map widget and the [`SyncController`]: clicks come in as
//! screen points and leave as pin requests, and the controller's state goes
//! out as a [`MapScene`] the widget can draw.

pub mod color;
pub mod projection;
pub mod scene;

use std::sync::Arc;

use redline_common::{GeoCoordinate, MapService};

pub use projection::{Camera, MapProjection, ScreenPoint, Viewport, WebMercator};
pub use scene::{Anchor, FeatureFill, FillLayer, MapScene, MapStyle, MarkerGlyph};

use crate::state::ViewState;
use crate::sync::SyncController;

pub struct MapAdapter<S> {
    controller: Arc<SyncController<S>>,
    camera: Camera,
    viewport: Viewport,
}

impl<S: MapService> MapAdapter<S> {
    pub fn new(controller: Arc<SyncController<S>>) -> Self {
        Self {
            controller,
            camera: Camera::default(),
            viewport: Viewport::default(),
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn controller(&self) -> &Arc<SyncController<S>> {
        &self.controller
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Pan/zoom. Purely local.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Projection for the current camera and viewport.
    pub fn projection(&self) -> WebMercator {
        WebMercator::new(self.camera, self.viewport)
    }

    /// A click at `point`, projected with the built-in Web Mercator.
    /// Returns the coordinate that was sent.
    pub async fn on_click(&self, point: ScreenPoint) -> GeoCoordinate {
        self.on_click_with(&self.projection(), point).await
    }

    /// A click at `point`, projected by the widget's own projection.
    pub async fn on_click_with(
        &self,
        projection: &(impl MapProjection + Sync),
        point: ScreenPoint,
    ) -> GeoCoordinate {
        let coordinate = projection.unproject(point);
        self.on_map_click(coordinate).await;
        coordinate
    }

    /// A click the widget already resolved to a coordinate.
    pub async fn on_map_click(&self, coordinate: GeoCoordinate) {
        let (lat, lng) = coordinate.to_wire();
        tracing::debug!(%lat, %lng, "map click");
        self.controller.add_pin_raw(&lat, &lng).await;
    }

    pub fn scene(&self, state: &ViewState) -> MapScene {
        MapScene::build(self.camera, state)
    }

    /// Scene for the controller's current state.
    pub fn current_scene(&self) -> MapScene {
        self.scene(&self.controller.snapshot())
    }
}

//! The view state the controller owns and renderers read.

use std::sync::Arc;

use redline_common::{GeoCoordinate, Overlay, UserId};

/// Single source of truth for what the map shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Pins from the last successful listing, in server order.
    pub markers: Vec<GeoCoordinate>,
    /// Current overlay. `None` before the first fetch, or when the service
    /// answered with something that wasn't a feature collection.
    pub overlay: Option<Arc<Overlay>>,
    /// Human readable text of the most recent failure.
    pub last_error: Option<String>,
    pub user_id: UserId,
    /// Generation of the overlay response last applied (0 = none yet).
    pub overlay_generation: u64,
    /// Generation of the pin listing last applied (0 = none yet).
    pub pins_generation: u64,
}

impl ViewState {
    pub fn new(user_id: UserId) -> Self {
        Self {
            markers: Vec::new(),
            overlay: None,
            last_error: None,
            user_id,
            overlay_generation: 0,
            pins_generation: 0,
        }
    }

    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }

    /// Markers that can actually be placed on a map.
    pub fn visible_markers(&self) -> impl Iterator<Item = &GeoCoordinate> {
        self.markers.iter().filter(|m| m.is_finite())
    }

    pub fn overlay_len(&self) -> usize {
        self.overlay.as_ref().map_or(0, |o| o.len())
    }
}

/// Which request family a generation counter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Overlay,
    Pins,
}

//! redline-core: pin and overlay synchronization, independent of any UI.
//!
//! This crate provides:
//! - `OverlayLoader` - fetches the redlining overlay by bounding box or keyword
//! - `PinStore` - lists, adds and clears a user's pins
//! - `SyncController` - owns the `ViewState` and reconciles it with the service
//! - `MapAdapter` - turns map clicks into pins and state into a drawable scene
//!
//! Everything is generic over `redline_common::MapService`.

pub mod adapter;
pub mod overlay;
pub mod pins;
pub mod state;
pub mod sync;

pub use adapter::{Camera, MapAdapter, MapProjection, MapScene, ScreenPoint, Viewport, WebMercator};
pub use overlay::{OverlayLoader, OverlayQuery};
pub use pins::{PinStore, parse_pin};
pub use state::{RequestKind, ViewState};
pub use sync::{EMPTY_KEYWORD_MESSAGE, SyncController};

//! Plain-text rendering of view state and map scenes.

use std::fmt::Write;

use redline_common::{FeatureCollection, GeoCoordinate};
use redline_core::ViewState;
use redline_core::adapter::{MapScene, MapStyle};

pub fn markers(markers: &[GeoCoordinate]) -> String {
    if markers.is_empty() {
        return "No pins".to_string();
    }
    let mut out = format!("{} pin(s)", markers.len());
    for (i, marker) in markers.iter().enumerate() {
        if marker.is_finite() {
            let _ = write!(out, "\n  {:>3}. {}", i + 1, marker);
        } else {
            let _ = write!(out, "\n  {:>3}. {} (not drawn)", i + 1, marker);
        }
    }
    out
}

pub fn overlay(overlay: Option<&FeatureCollection>) -> String {
    let Some(overlay) = overlay else {
        return "No overlay".to_string();
    };
    let mut out = format!("Overlay: {} feature(s)", overlay.len());
    for feature in &overlay.features {
        let props = &feature.properties;
        let _ = write!(
            out,
            "\n  [{}] {} {}",
            feature.grade().label().unwrap_or("-"),
            props.holc_id.as_deref().unwrap_or("?"),
            props.name.as_deref().unwrap_or(""),
        );
    }
    out
}

/// One-line status after each session command.
pub fn status(state: &ViewState) -> String {
    let mut out = format!(
        "{} · {} pin(s) · overlay {}",
        state.user_id,
        state.markers.len(),
        match &state.overlay {
            Some(overlay) => format!("{} feature(s)", overlay.len()),
            None => "absent".to_string(),
        }
    );
    if let Some(error) = &state.last_error {
        let _ = write!(out, "\n⚠ {error}");
    }
    out
}

pub fn scene(scene: &MapScene, style: &MapStyle) -> String {
    let camera = &scene.camera;
    let mut out = format!(
        "Camera: {:.4}, {:.4} @ z{}",
        camera.longitude, camera.latitude, camera.zoom
    );
    if style.is_tiled() {
        let _ = write!(out, "\nBase map: {}", style.style_url);
    } else {
        out.push_str("\nBase map: none (MAPBOX_TOKEN not set)");
    }

    let _ = write!(out, "\nMarkers: {}", scene.markers.len());
    for marker in &scene.markers {
        let _ = write!(out, "\n  ▼ {}", marker.position);
    }

    match &scene.fill {
        Some(fill) => {
            let _ = write!(out, "\nFill layer '{}' (opacity {}):", fill.id, fill.opacity);
            for (grade, count) in fill.grade_counts() {
                let color = redline_core::adapter::color::grade_color(grade);
                let _ = write!(
                    out,
                    "\n  {:<5} {:<8} {}",
                    grade.label().unwrap_or("other"),
                    color,
                    count
                );
            }
        }
        None => out.push_str("\nFill layer: none"),
    }
    out
}

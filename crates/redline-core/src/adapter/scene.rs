//! Render model handed to the map widget.

use redline_common::{ClientConfig, ConfigError, GeoCoordinate, HolcGrade, Overlay};
use serde::Serialize;
use serde_json::{Value, json};

use super::color::{FILL_OPACITY, grade_color};
use super::projection::Camera;
use crate::state::ViewState;

/// Layer and source id of the overlay fill.
pub const OVERLAY_LAYER_ID: &str = "geo_data";
/// Feature property the fill colour is keyed on.
pub const GRADE_PROPERTY: &str = "holc_grade";
pub const DEFAULT_STYLE_URL: &str = "mapbox://styles/mapbox/streets-v12";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapScene {
    pub camera: Camera,
    pub markers: Vec<MarkerGlyph>,
    pub fill: Option<FillLayer>,
}

impl MapScene {
    pub fn build(camera: Camera, state: &ViewState) -> Self {
        Self {
            camera,
            markers: state.visible_markers().copied().map(MarkerGlyph::pin).collect(),
            fill: state.overlay.as_deref().map(FillLayer::from_overlay),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerGlyph {
    pub position: GeoCoordinate,
    pub anchor: Anchor,
    pub icon: &'static str,
}

impl MarkerGlyph {
    /// The pin icon, with its tip on the coordinate.
    pub fn pin(position: GeoCoordinate) -> Self {
        Self {
            position,
            anchor: Anchor::Bottom,
            icon: "pin",
        }
    }
}

/// One overlay polygon with its resolved colour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureFill {
    pub holc_id: Option<String>,
    pub name: Option<String>,
    pub grade: HolcGrade,
    pub color: &'static str,
    /// GeoJSON geometry, as the service sent it.
    pub geometry: Option<Value>,
}

/// Polygon fill over the overlay, coloured by grade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillLayer {
    pub id: &'static str,
    pub property: &'static str,
    pub opacity: f32,
    pub features: Vec<FeatureFill>,
}

impl FillLayer {
    pub fn from_overlay(overlay: &Overlay) -> Self {
        let features = overlay
            .features
            .iter()
            .map(|feature| {
                let grade = feature.grade();
                FeatureFill {
                    holc_id: feature.properties.holc_id.clone(),
                    name: feature.properties.name.clone(),
                    grade,
                    color: grade_color(grade),
                    geometry: feature.geometry.clone(),
                }
            })
            .collect();
        Self {
            id: OVERLAY_LAYER_ID,
            property: GRADE_PROPERTY,
            opacity: FILL_OPACITY,
            features,
        }
    }

    /// Number of features per grade, in `HolcGrade::ALL` order.
    pub fn grade_counts(&self) -> Vec<(HolcGrade, usize)> {
        HolcGrade::ALL
            .iter()
            .map(|grade| {
                let count = self.features.iter().filter(|f| f.grade == *grade).count();
                (*grade, count)
            })
            .collect()
    }

    /// Paint properties as a Mapbox style expression, for widgets that evaluate
    /// the expression themselves.
    pub fn paint(&self) -> Value {
        let mut color = vec![json!("match"), json!(["get", self.property])];
        for grade in HolcGrade::ALL {
            if let Some(label) = grade.label() {
                color.push(json!(label));
                color.push(json!(grade_color(grade)));
            }
        }
        color.push(json!(grade_color(HolcGrade::Other)));
        json!({
            "fill-color": color,
            "fill-opacity": self.opacity,
        })
    }
}

/// Base style and access token for a tiled map widget.
#[derive(Debug, Clone, PartialEq)]
pub struct MapStyle {
    pub style_url: String,
    pub access_token: Option<String>,
}

impl MapStyle {
    /// Style for a real tiled map. Fails without `MAPBOX_TOKEN`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        let token = config.require_map_token()?;
        Ok(Self {
            style_url: DEFAULT_STYLE_URL.to_string(),
            access_token: Some(token.to_string()),
        })
    }

    /// No base map; only markers and the overlay are drawn.
    pub fn untiled() -> Self {
        Self {
            style_url: DEFAULT_STYLE_URL.to_string(),
            access_token: None,
        }
    }

    pub fn is_tiled(&self) -> bool {
        self.access_token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_common::{Feature, FeatureCollection, FeatureProperties, UserId};
    use std::sync::Arc;

    fn feature(grade: Option<&str>) -> Feature {
        Feature::new(
            json!({"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]]}),
            FeatureProperties {
                holc_grade: grade.map(str::to_string),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_paint_expression() {
        let layer = FillLayer::from_overlay(&FeatureCollection::empty());
        insta::assert_snapshot!(
            layer.paint()["fill-color"].to_string(),
            @r##"["match",["get","holc_grade"],"A","#5bcc04","B","#04b8cc","C","#e9ed0e","D","#d11d1d","#ccc"]"##
        );
        assert!((layer.paint()["fill-opacity"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_feature_colors() {
        let overlay = FeatureCollection::new(vec![
            feature(Some("A")),
            feature(Some("D")),
            feature(Some("Z")),
            feature(None),
        ]);
        let layer = FillLayer::from_overlay(&overlay);
        let colors: Vec<_> = layer.features.iter().map(|f| f.color).collect();
        assert_eq!(colors, vec!["#5bcc04", "#d11d1d", "#ccc", "#ccc"]);
        assert_eq!(layer.id, "geo_data");
        assert_eq!(
            layer.grade_counts(),
            vec![
                (HolcGrade::A, 1),
                (HolcGrade::B, 0),
                (HolcGrade::C, 0),
                (HolcGrade::D, 1),
                (HolcGrade::Other, 2),
            ]
        );
    }

    #[test]
    fn test_scene_skips_nan_markers() {
        let mut state = ViewState::new(UserId::new("u"));
        state.markers = vec![
            GeoCoordinate::new(41.8, -71.4),
            GeoCoordinate::new(f64::NAN, f64::NAN),
        ];
        state.overlay = Some(Arc::new(FeatureCollection::empty()));

        let scene = MapScene::build(Camera::default(), &state);
        assert_eq!(scene.markers.len(), 1);
        assert_eq!(scene.markers[0].anchor, Anchor::Bottom);
        assert!(scene.fill.is_some());
    }

    #[test]
    fn test_scene_carries_polygon_geometry() {
        let mut state = ViewState::new(UserId::new("u"));
        state.overlay = Some(Arc::new(FeatureCollection::new(vec![feature(Some("A"))])));

        let scene = serde_json::to_value(MapScene::build(Camera::default(), &state)).unwrap();
        let fill = &scene["fill"]["features"][0];
        assert_eq!(fill["color"], json!("#5bcc04"));
        assert_eq!(fill["geometry"]["type"], json!("Polygon"));
        assert_eq!(
            fill["geometry"]["coordinates"],
            json!([[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]])
        );
    }

    #[test]
    fn test_no_overlay_no_fill() {
        let scene = MapScene::build(Camera::default(), &ViewState::new(UserId::new("u")));
        assert!(scene.fill.is_none());
        assert!(scene.markers.is_empty());
    }

    #[test]
    fn test_style_requires_token() {
        let mut config = ClientConfig::for_url("http://localhost:3232").unwrap();
        assert!(MapStyle::from_config(&config).is_err());
        config.map_token = Some("pk.test".into());
        let style = MapStyle::from_config(&config).unwrap();
        assert!(style.is_tiled());
        assert!(!MapStyle::untiled().is_tiled());
    }
}

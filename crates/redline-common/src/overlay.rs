//! GeoJSON feature collection for the redlining overlay.
//!
//! Only the parts the client actually looks at are typed. Geometry stays as
//! raw JSON since it's handed to the map widget untouched, and unknown
//! property keys are preserved so nothing is lost on a round trip.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::geo::{BoundingBox, GeoCoordinate};

/// Type tag every valid overlay carries.
pub const FEATURE_COLLECTION: &str = "FeatureCollection";

/// The overlay is a feature collection, replaced wholesale on every fetch.
pub type Overlay = FeatureCollection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: FEATURE_COLLECTION.to_string(),
            features,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn is_feature_collection(&self) -> bool {
        self.kind == FEATURE_COLLECTION
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features that lie entirely inside `bounds`.
    pub fn within(&self, bounds: &BoundingBox) -> Self {
        Self {
            kind: self.kind.clone(),
            features: self
                .features
                .iter()
                .filter(|f| f.is_within(bounds))
                .cloned()
                .collect(),
        }
    }

    /// Features whose area description mentions `keyword` (case-sensitive).
    pub fn matching(&self, keyword: &str) -> Self {
        Self {
            kind: self.kind.clone(),
            features: self
                .features
                .iter()
                .filter(|f| f.properties.mentions(keyword))
                .cloned()
                .collect(),
        }
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        FeatureCollection::empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_kind")]
    pub kind: String,
    #[serde(default)]
    pub geometry: Option<Value>,
    #[serde(default)]
    pub properties: FeatureProperties,
}

fn feature_kind() -> String {
    "Feature".to_string()
}

impl Feature {
    pub fn new(geometry: Value, properties: FeatureProperties) -> Self {
        Self {
            kind: feature_kind(),
            geometry: Some(geometry),
            properties,
        }
    }

    pub fn grade(&self) -> HolcGrade {
        HolcGrade::from_property(self.properties.holc_grade.as_deref())
    }

    /// Every vertex of the geometry, as `[lng, lat]` positions.
    ///
    /// Walks arbitrarily nested coordinate arrays, so Polygon and
    /// MultiPolygon both work.
    pub fn vertices(&self) -> Vec<GeoCoordinate> {
        let mut out = Vec::new();
        if let Some(coords) = self.geometry.as_ref().and_then(|g| g.get("coordinates")) {
            collect_positions(coords, &mut out);
        }
        out
    }

    /// A feature with no vertices, whether its geometry is missing or its
    /// coordinate list is empty, is never inside anything.
    pub fn is_within(&self, bounds: &BoundingBox) -> bool {
        let vertices = self.vertices();
        !vertices.is_empty() && vertices.iter().all(|v| bounds.contains(v))
    }
}

fn collect_positions(value: &Value, out: &mut Vec<GeoCoordinate>) {
    let Some(items) = value.as_array() else {
        return;
    };
    match (items.first().and_then(Value::as_f64), items.get(1).and_then(Value::as_f64)) {
        (Some(lng), Some(lat)) => out.push(GeoCoordinate::new(lat, lng)),
        _ => {
            for item in items {
                collect_positions(item, out);
            }
        }
    }
}

/// Feature properties, with the keys the client reads pulled out.
///
/// Decoding never fails: `null` or non-object properties are empty, and a
/// known key holding an unexpected type stays in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holc_grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood_id: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub area_description_data: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for FeatureProperties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Object(map) => FeatureProperties::from_map(map),
            _ => FeatureProperties::default(),
        })
    }
}

/// Remove `key` from `map` if it decodes as `T`.
fn take<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) -> Option<T> {
    let typed = T::deserialize(map.get(key)?).ok()?;
    map.remove(key);
    Some(typed)
}

impl FeatureProperties {
    pub fn from_map(mut extra: Map<String, Value>) -> Self {
        Self {
            holc_grade: take(&mut extra, "holc_grade"),
            holc_id: take(&mut extra, "holc_id"),
            name: take(&mut extra, "name"),
            city: take(&mut extra, "city"),
            state: take(&mut extra, "state"),
            neighborhood_id: take(&mut extra, "neighborhood_id"),
            area_description_data: take(&mut extra, "area_description_data").unwrap_or_default(),
            extra,
        }
    }

    pub fn mentions(&self, keyword: &str) -> bool {
        self.area_description_data
            .values()
            .filter_map(Value::as_str)
            .any(|description| description.contains(keyword))
    }
}

/// Home Owners' Loan Corporation grade, used for the fill colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum HolcGrade {
    A,
    B,
    C,
    D,
    /// Missing, empty or anything unexpected.
    Other,
}

impl HolcGrade {
    pub const ALL: [HolcGrade; 5] = [
        HolcGrade::A,
        HolcGrade::B,
        HolcGrade::C,
        HolcGrade::D,
        HolcGrade::Other,
    ];

    /// Exact match on the property value, like the map style expression.
    pub fn from_property(grade: Option<&str>) -> Self {
        match grade {
            Some("A") => HolcGrade::A,
            Some("B") => HolcGrade::B,
            Some("C") => HolcGrade::C,
            Some("D") => HolcGrade::D,
            _ => HolcGrade::Other,
        }
    }

    pub fn label(&self) -> Option<&'static str> {
        match self {
            HolcGrade::A => Some("A"),
            HolcGrade::B => Some("B"),
            HolcGrade::C => Some("C"),
            HolcGrade::D => Some("D"),
            HolcGrade::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(min: f64, max: f64) -> Value {
        json!({
            "type": "MultiPolygon",
            "coordinates": [[[[min, min], [max, min], [max, max], [min, max], [min, min]]]]
        })
    }

    #[test]
    fn test_parses_server_shape() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": square(1.0, 2.0),
                "properties": {
                    "state": "RI",
                    "city": "Providence",
                    "name": "Elmhurst",
                    "holc_id": "A1",
                    "holc_grade": "A",
                    "neighborhood_id": 244.0,
                    "area_description_data": {"5": "quiet streets"},
                    "custom": true
                }
            }]
        });
        let overlay: FeatureCollection = serde_json::from_value(body).unwrap();
        assert!(overlay.is_feature_collection());
        assert_eq!(overlay.len(), 1);
        assert_eq!(overlay.features[0].grade(), HolcGrade::A);
        assert_eq!(overlay.features[0].properties.extra["custom"], json!(true));
    }

    #[test]
    fn test_grade_fallback() {
        assert_eq!(HolcGrade::from_property(None), HolcGrade::Other);
        assert_eq!(HolcGrade::from_property(Some("a")), HolcGrade::Other);
        assert_eq!(HolcGrade::from_property(Some("E")), HolcGrade::Other);
        assert_eq!(HolcGrade::from_property(Some("D")), HolcGrade::D);
    }

    #[test]
    fn test_within_requires_every_vertex() {
        let inside = Feature::new(square(1.0, 2.0), FeatureProperties::default());
        let straddling = Feature::new(square(1.0, 20.0), FeatureProperties::default());
        let overlay = FeatureCollection::new(vec![inside.clone(), straddling]);

        let filtered = overlay.within(&BoundingBox::new(0.0, 10.0, 0.0, 10.0));
        assert_eq!(filtered.features, vec![inside]);
    }

    #[test]
    fn test_geometry_less_feature_is_excluded() {
        let feature = Feature {
            kind: "Feature".into(),
            geometry: None,
            properties: FeatureProperties::default(),
        };
        assert!(!feature.is_within(&BoundingBox::WORLD));
    }

    #[test]
    fn test_empty_coordinates_are_excluded() {
        let feature = Feature::new(
            json!({"type": "Polygon", "coordinates": []}),
            FeatureProperties::default(),
        );
        assert!(feature.vertices().is_empty());
        assert!(!feature.is_within(&BoundingBox::WORLD));
    }

    #[test]
    fn test_null_properties_decode_empty() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "geometry": square(0.0, 1.0),
            "properties": null
        }))
        .unwrap();
        assert_eq!(feature.properties, FeatureProperties::default());
        assert_eq!(feature.grade(), HolcGrade::Other);
    }

    #[test]
    fn test_off_type_known_keys_stay_in_extra() {
        let props: FeatureProperties = serde_json::from_value(json!({
            "holc_grade": "B",
            "neighborhood_id": "12",
            "name": null,
            "area_description_data": "n/a"
        }))
        .unwrap();
        assert_eq!(props.holc_grade.as_deref(), Some("B"));
        assert_eq!(props.neighborhood_id, None);
        assert_eq!(props.name, None);
        assert!(props.area_description_data.is_empty());
        assert_eq!(props.extra["neighborhood_id"], json!("12"));
        assert_eq!(props.extra["area_description_data"], json!("n/a"));

        let back = serde_json::to_value(&props).unwrap();
        assert_eq!(back["neighborhood_id"], json!("12"));
        assert_eq!(back["holc_grade"], json!("B"));
    }

    #[test]
    fn test_keyword_match_is_case_sensitive() {
        let mut props = FeatureProperties::default();
        props
            .area_description_data
            .insert("8".into(), json!("Rolling hills near the river"));
        let overlay = FeatureCollection::new(vec![Feature::new(square(0.0, 1.0), props)]);

        assert_eq!(overlay.matching("river").len(), 1);
        assert_eq!(overlay.matching("River").len(), 0);
    }
}

use crate::core::geo::LatLng;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// Geometry of a transgression record
///
/// Only the coordinates matter to the map. They are kept as raw JSON so that a
/// single malformed record cannot fail the whole collection; interpretation
/// happens in [`Feature::position`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<serde_json::Value>,
}

impl Geometry {
    /// Point geometry at `position`
    pub fn point(position: LatLng) -> Self {
        Self {
            kind: Some("Point".to_string()),
            coordinates: Some(serde_json::json!(position.to_lng_lat())),
        }
    }
}

/// A single transgression record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, serde_json::Value>>,
}

impl Feature {
    /// Point feature with the given description and photo id
    pub fn point(position: LatLng, description: Option<&str>, photo_id: Option<&str>) -> Self {
        let mut properties = HashMap::new();
        if let Some(description) = description {
            properties.insert("description".to_string(), description.into());
        }
        if let Some(photo_id) = photo_id {
            properties.insert("photoIDs".to_string(), photo_id.into());
        }
        Self {
            geometry: Some(Geometry::point(position)),
            properties: Some(properties),
        }
    }

    /// Feature carrying properties but no geometry
    pub fn without_geometry(description: &str) -> Self {
        let mut properties = HashMap::new();
        properties.insert("description".to_string(), description.into());
        Self {
            geometry: None,
            properties: Some(properties),
        }
    }

    /// Marker position, if the record has usable `[lng, lat]` coordinates
    pub fn position(&self) -> Option<LatLng> {
        let coordinates = self.geometry.as_ref()?.coordinates.as_ref()?.as_array()?;
        let lng = coordinates.first()?.as_f64()?;
        let lat = coordinates.get(1)?.as_f64()?;
        Some(LatLng::from_lng_lat(lng, lat)).filter(LatLng::is_valid)
    }

    /// Free-text description. Truthy scalars are stringified; null, `false`,
    /// zero and anything structured render as empty.
    pub fn description(&self) -> Cow<'_, str> {
        match self.property("description") {
            Some(serde_json::Value::String(text)) => Cow::Borrowed(text.as_str()),
            Some(serde_json::Value::Number(n)) if n.as_f64() != Some(0.0) => Cow::Owned(n.to_string()),
            Some(serde_json::Value::Bool(true)) => Cow::Borrowed("true"),
            _ => Cow::Borrowed(""),
        }
    }

    /// Photo identifier used to build the popup image URL
    pub fn photo_id(&self) -> Option<String> {
        match self.property("photoIDs")? {
            serde_json::Value::String(id) if !id.is_empty() => Some(id.clone()),
            serde_json::Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.as_ref()?.get(key)
    }
}

/// The full dataset of one fetch cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Parses a collection from a GeoJSON string
    pub fn from_str(geojson_str: &str) -> crate::Result<Self> {
        serde_json::from_str(geojson_str)
            .map_err(|e| crate::Error::ParseError(format!("Invalid GeoJSON: {}", e)))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geojson_parsing() {
        let geojson_str = r#"
        {
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"description": "Blocked bike lane", "photoIDs": "abc 123"},
                    "geometry": {
                        "type": "Point",
                        "coordinates": [-74.0060, 40.7128]
                    }
                }
            ]
        }
        "#;

        let collection = FeatureCollection::from_str(geojson_str).unwrap();
        assert_eq!(collection.len(), 1);

        let feature = &collection.features[0];
        assert_eq!(feature.position(), Some(LatLng::new(40.7128, -74.0060)));
        assert_eq!(feature.description(), "Blocked bike lane");
        assert_eq!(feature.photo_id().as_deref(), Some("abc 123"));
    }

    #[test]
    fn test_missing_members_are_tolerated() {
        let collection = FeatureCollection::from_str(
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {"type": "Feature", "geometry": null, "properties": null},
                    {"type": "Feature", "geometry": {"type": "Point"}},
                    {"type": "Feature", "geometry": {"type": "Point", "coordinates": "bogus"}},
                    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [12.5]}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(collection.len(), 4);
        assert!(collection.features.iter().all(|f| f.position().is_none()));
        assert_eq!(collection.features[0].description(), "");
        assert_eq!(collection.features[0].photo_id(), None);
    }

    #[test]
    fn test_missing_features_member() {
        let collection = FeatureCollection::from_str(r#"{"type": "FeatureCollection"}"#).unwrap();
        assert!(collection.is_empty());
    }

    #[test]
    fn test_out_of_range_coordinates_rejected() {
        let feature = Feature::point(LatLng::new(95.0, 10.0), None, None);
        assert_eq!(feature.position(), None);
    }

    #[test]
    fn test_numeric_photo_id() {
        let feature: Feature = serde_json::from_value(serde_json::json!({
            "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
            "properties": {"photoIDs": 42}
        }))
        .unwrap();
        assert_eq!(feature.photo_id().as_deref(), Some("42"));

        let empty = Feature::point(LatLng::new(2.0, 1.0), None, Some(""));
        assert_eq!(empty.photo_id(), None);
    }

    #[test]
    fn test_scalar_descriptions() {
        let with = |value: serde_json::Value| -> Feature {
            serde_json::from_value(serde_json::json!({"properties": {"description": value}})).unwrap()
        };
        assert_eq!(with(serde_json::json!(42)).description(), "42");
        assert_eq!(with(serde_json::json!(1.5)).description(), "1.5");
        assert_eq!(with(serde_json::json!(true)).description(), "true");
        assert_eq!(with(serde_json::json!(0)).description(), "");
        assert_eq!(with(serde_json::json!(false)).description(), "");
        assert_eq!(with(serde_json::Value::Null).description(), "");
    }

    #[test]
    fn test_invalid_document() {
        assert!(FeatureCollection::from_str("not json").is_err());
    }
}

//! Places text-search boundary.
//!
//! The third-party capability is callback based: a request goes in, and at
//! some later point the callback fires once with `(results, status)`.

pub mod google;

pub use google::GooglePlacesClient;

use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

/// Fields requested for every text search
pub const SEARCH_FIELDS: [&str; 3] = ["name", "geometry", "formatted_address"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextSearchRequest {
    pub query: String,
    pub fields: Vec<String>,
}

impl TextSearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            fields: SEARCH_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Status sentinel reported alongside search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlacesStatus {
    Ok,
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    NotFound,
    UnknownError,
    #[serde(other)]
    Other,
}

impl PlacesStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

/// One place returned by a text search
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaceResult {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl PlaceResult {
    /// Position of the place, if it carries usable geometry
    pub fn position(&self) -> Option<LatLng> {
        let point = self.geometry.as_ref()?.location?;
        let position = LatLng::new(point.lat, point.lng);
        position.is_valid().then_some(position)
    }

    /// Name, falling back to the address
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.formatted_address.as_deref())
            .unwrap_or_default()
    }
}

/// Completion callback; fires at most once
pub type SearchCallback = Box<dyn FnOnce(Vec<PlaceResult>, PlacesStatus) + Send + 'static>;

/// The external text-search capability
pub trait PlacesService: Send + Sync {
    /// Start a search. Returns immediately; `callback` fires when the
    /// response arrives.
    fn text_search(&self, request: TextSearchRequest, callback: SearchCallback);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        let ok: PlacesStatus = serde_json::from_str("\"OK\"").unwrap();
        let zero: PlacesStatus = serde_json::from_str("\"ZERO_RESULTS\"").unwrap();
        let novel: PlacesStatus = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert!(ok.is_ok());
        assert_eq!(zero, PlacesStatus::ZeroResults);
        assert_eq!(novel, PlacesStatus::Other);
    }

    #[test]
    fn test_place_without_geometry_has_no_position() {
        let place: PlaceResult = serde_json::from_value(serde_json::json!({
            "name": "Somewhere",
            "formatted_address": "Calle 1"
        }))
        .unwrap();
        assert_eq!(place.position(), None);
        assert_eq!(place.label(), "Somewhere");
    }

    #[test]
    fn test_place_position() {
        let place: PlaceResult = serde_json::from_value(serde_json::json!({
            "formatted_address": "Plaça de l'Ajuntament, València",
            "geometry": { "location": { "lat": 39.4699, "lng": -0.3763 } }
        }))
        .unwrap();
        assert_eq!(place.position(), Some(LatLng::new(39.4699, -0.3763)));
        assert_eq!(place.label(), "Plaça de l'Ajuntament, València");
    }

    #[test]
    fn test_request_fields() {
        let request = TextSearchRequest::new("museo");
        assert_eq!(request.fields, vec!["name", "geometry", "formatted_address"]);
    }
}

//! Rows of the hosted `locations` table.

use locamap_maps::LatLng;
use serde::{Deserialize, Serialize};

/// A stored location.
///
/// Only the columns the app reads are typed; anything else on the row is
/// carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Assigned by the hosted database
    pub id: i64,
    /// Latitude
    #[serde(rename = "latX", alias = "latx")]
    pub lat_x: f64,
    /// Longitude
    #[serde(rename = "lonY", alias = "lony")]
    pub lon_y: f64,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Location {
    pub fn new(id: i64, lat_x: f64, lon_y: f64, province: Option<&str>) -> Self {
        Self {
            id,
            lat_x,
            lon_y,
            province: province.map(str::to_string),
            extra: serde_json::Map::new(),
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat_x, self.lon_y)
    }

    /// A display name if the row has one
    pub fn name(&self) -> Option<&str> {
        ["name", "nombre", "title"]
            .iter()
            .find_map(|key| self.extra.get(*key).and_then(|v| v.as_str()))
    }
}

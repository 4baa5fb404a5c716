use serde::{Deserialize, Serialize};

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

impl LatLng {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `[lat, lon]`, the shape the map layer takes for centers.
    pub fn as_pair(&self) -> [f64; 2] {
        [self.lat, self.lon]
    }

    /// Finite and inside the lat/lon ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl From<[f64; 2]> for LatLng {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lon)
    }
}

/// Axis-aligned box grown point by point.
///
/// Empty until the first valid point is added; invalid points are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLngBounds {
    corners: Option<(LatLng, LatLng)>,
}

impl LatLngBounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, point: LatLng) {
        if !point.is_valid() {
            return;
        }
        self.corners = Some(match self.corners {
            None => (point, point),
            Some((sw, ne)) => (
                LatLng::new(sw.lat.min(point.lat), sw.lon.min(point.lon)),
                LatLng::new(ne.lat.max(point.lat), ne.lon.max(point.lon)),
            ),
        });
    }

    /// True once at least one point has been added.
    pub fn is_valid(&self) -> bool {
        self.corners.is_some()
    }

    pub fn south_west(&self) -> Option<LatLng> {
        self.corners.map(|(sw, _)| sw)
    }

    pub fn north_east(&self) -> Option<LatLng> {
        self.corners.map(|(_, ne)| ne)
    }

    pub fn center(&self) -> Option<LatLng> {
        self.corners
            .map(|(sw, ne)| LatLng::new((sw.lat + ne.lat) / 2.0, (sw.lon + ne.lon) / 2.0))
    }

    pub fn contains(&self, point: LatLng) -> bool {
        match self.corners {
            Some((sw, ne)) => {
                (sw.lat..=ne.lat).contains(&point.lat) && (sw.lon..=ne.lon).contains(&point.lon)
            }
            None => false,
        }
    }
}

impl FromIterator<LatLng> for LatLngBounds {
    fn from_iter<I: IntoIterator<Item = LatLng>>(iter: I) -> Self {
        let mut bounds = Self::new();
        for point in iter {
            bounds.extend(point);
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bounds_are_invalid() {
        let bounds = LatLngBounds::new();
        assert!(!bounds.is_valid());
        assert_eq!(bounds.center(), None);
    }

    #[test]
    fn test_single_point_is_valid() {
        let bounds: LatLngBounds = [LatLng::new(39.47, -0.37)].into_iter().collect();
        assert!(bounds.is_valid());
        assert_eq!(bounds.south_west(), bounds.north_east());
    }

    #[test]
    fn test_extend_grows_corners() {
        let bounds: LatLngBounds = [
            LatLng::new(39.47, -0.37),
            LatLng::new(40.41, -3.70),
            LatLng::new(41.38, 2.17),
        ]
        .into_iter()
        .collect();

        assert_eq!(bounds.south_west(), Some(LatLng::new(39.47, -3.70)));
        assert_eq!(bounds.north_east(), Some(LatLng::new(41.38, 2.17)));
        assert!(bounds.contains(LatLng::new(40.0, 0.0)));
        assert!(!bounds.contains(LatLng::new(38.0, 0.0)));
    }

    #[test]
    fn test_invalid_points_are_ignored() {
        let mut bounds = LatLngBounds::new();
        bounds.extend(LatLng::new(f64::NAN, 1.0));
        bounds.extend(LatLng::new(95.0, 1.0));
        assert!(!bounds.is_valid());
    }
}

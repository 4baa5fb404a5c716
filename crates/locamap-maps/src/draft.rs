use crate::geo::LatLng;

/// A point picked on the map that has not been saved yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointDraft {
    add_new_point: bool,
    coords: Option<LatLng>,
    is_creating: bool,
}

impl PointDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the clicked coordinates and raise the "add new point" flag.
    pub fn set_coords(&mut self, coords: LatLng) {
        self.coords = Some(coords);
        self.add_new_point = true;
    }

    /// Drop the pending point.
    pub fn reset(&mut self) {
        self.add_new_point = false;
        self.coords = None;
    }

    pub fn set_creating(&mut self, creating: bool) {
        self.is_creating = creating;
    }

    pub fn add_new_point(&self) -> bool {
        self.add_new_point
    }

    pub fn coords(&self) -> Option<LatLng> {
        self.coords
    }

    pub fn is_creating(&self) -> bool {
        self.is_creating
    }
}

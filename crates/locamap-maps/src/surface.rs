//! Boundary to the map rendering layer.
//!
//! The tile map itself lives outside this crate; everything here talks to it
//! through `MapSurface`. `HeadlessSurface` is an in-process implementation
//! that only records what it was asked to draw.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::geo::{LatLng, LatLngBounds};

/// Handle to a marker placed on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(pub u64);

/// How a set of bounds is fitted into the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitOptions {
    /// Padding in pixels, (x, y)
    pub padding: (u32, u32),
    /// Fitting never zooms in past this level
    pub max_zoom: u8,
}

impl FitOptions {
    pub fn new(padding_px: u32, max_zoom: u8) -> Self {
        Self {
            padding: (padding_px, padding_px),
            max_zoom,
        }
    }
}

/// Static widget options handed to the rendering layer on creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapOptions {
    pub zoom_control: bool,
    pub attribution_control: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            zoom_control: false,
            attribution_control: true,
        }
    }
}

/// The live map widget.
pub trait MapSurface: Send + Sync {
    /// Move the viewport
    fn set_view(&self, center: LatLng, zoom: u8);

    /// Place a marker and return its handle
    fn add_marker(&self, position: LatLng, label: &str) -> MarkerId;

    /// Remove a marker; unknown handles are ignored
    fn remove_marker(&self, marker: MarkerId);

    /// Fit the viewport around `bounds`
    fn fit_bounds(&self, bounds: &LatLngBounds, options: FitOptions);
}

#[derive(Debug, Default)]
struct HeadlessState {
    next_marker: u64,
    markers: BTreeMap<MarkerId, (LatLng, String)>,
    view: Option<(LatLng, u8)>,
    last_fit: Option<(LatLngBounds, FitOptions)>,
    removed: usize,
}

/// Surface without a display: keeps markers and viewport in memory.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    state: Mutex<HeadlessState>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers currently on the surface, in creation order
    pub fn markers(&self) -> Vec<(MarkerId, LatLng, String)> {
        self.state
            .lock()
            .markers
            .iter()
            .map(|(id, (pos, label))| (*id, *pos, label.clone()))
            .collect()
    }

    /// Last center/zoom applied
    pub fn view(&self) -> Option<(LatLng, u8)> {
        self.state.lock().view
    }

    /// Last fit request
    pub fn last_fit(&self) -> Option<(LatLngBounds, FitOptions)> {
        self.state.lock().last_fit
    }

    /// How many markers have been removed so far
    pub fn removed_count(&self) -> usize {
        self.state.lock().removed
    }
}

impl MapSurface for HeadlessSurface {
    fn set_view(&self, center: LatLng, zoom: u8) {
        self.state.lock().view = Some((center, zoom));
    }

    fn add_marker(&self, position: LatLng, label: &str) -> MarkerId {
        let mut state = self.state.lock();
        state.next_marker += 1;
        let id = MarkerId(state.next_marker);
        state.markers.insert(id, (position, label.to_string()));
        id
    }

    fn remove_marker(&self, marker: MarkerId) {
        let mut state = self.state.lock();
        if state.markers.remove(&marker).is_some() {
            state.removed += 1;
        }
    }

    fn fit_bounds(&self, bounds: &LatLngBounds, options: FitOptions) {
        let mut state = self.state.lock();
        state.last_fit = Some((*bounds, options));
        if let Some(center) = bounds.center() {
            let zoom = state.view.map(|(_, z)| z.min(options.max_zoom)).unwrap_or(options.max_zoom);
            state.view = Some((center, zoom));
        }
    }
}

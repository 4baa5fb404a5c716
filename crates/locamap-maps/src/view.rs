use std::sync::Arc;

use locamap_core::MapsConfig;
use parking_lot::RwLock;

use crate::geo::LatLng;
use crate::surface::{MapOptions, MapSurface};

struct MapView {
    center: LatLng,
    zoom: u8,
    ready: bool,
    surface: Option<Arc<dyn MapSurface>>,
}

/// Shared viewport state: center, zoom, ready flag and the map handle.
///
/// Center and zoom may change before the map is ready; they are stored and
/// pushed to the surface once `mark_ready` runs. Cloning shares the state.
#[derive(Clone)]
pub struct MapViewState {
    inner: Arc<RwLock<MapView>>,
    options: MapOptions,
}

impl MapViewState {
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MapView {
                center,
                zoom,
                ready: false,
                surface: None,
            })),
            options: MapOptions::default(),
        }
    }

    pub fn from_config(config: &MapsConfig) -> Self {
        Self::new(LatLng::from(config.default_center), config.default_zoom)
    }

    pub fn options(&self) -> MapOptions {
        self.options
    }

    pub fn center(&self) -> LatLng {
        self.inner.read().center
    }

    pub fn zoom(&self) -> u8 {
        self.inner.read().zoom
    }

    pub fn is_ready(&self) -> bool {
        self.inner.read().ready
    }

    /// The map handle, present only once the widget signalled readiness
    pub fn surface(&self) -> Option<Arc<dyn MapSurface>> {
        let view = self.inner.read();
        if view.ready {
            view.surface.clone()
        } else {
            None
        }
    }

    pub fn set_center(&self, center: LatLng) {
        let zoom = self.zoom();
        self.set_view(center, zoom);
    }

    pub fn set_zoom(&self, zoom: u8) {
        let center = self.center();
        self.set_view(center, zoom);
    }

    /// Update center and zoom together, applying them to the surface if ready.
    pub fn set_view(&self, center: LatLng, zoom: u8) {
        let surface = {
            let mut view = self.inner.write();
            view.center = center;
            view.zoom = zoom;
            if view.ready {
                view.surface.clone()
            } else {
                None
            }
        };

        if let Some(surface) = surface {
            surface.set_view(center, zoom);
        }
    }

    /// Record the widget handle and flip the ready flag.
    ///
    /// Any center/zoom set before this point becomes visible now.
    pub fn mark_ready(&self, surface: Arc<dyn MapSurface>) {
        let (center, zoom) = {
            let mut view = self.inner.write();
            view.surface = Some(surface.clone());
            view.ready = true;
            (view.center, view.zoom)
        };
        tracing::info!("Map ready at {} (zoom {})", center, zoom);
        surface.set_view(center, zoom);
    }

    /// Drop the widget handle at teardown.
    pub fn detach(&self) {
        let mut view = self.inner.write();
        view.ready = false;
        view.surface = None;
    }

    /// Coordinates of a context-menu click, as `[lat, lon]` for a new point.
    pub fn handle_context_menu(&self, point: LatLng) -> LatLng {
        tracing::debug!("Context menu at {}", point);
        point
    }
}

impl std::fmt::Debug for MapViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let view = self.inner.read();
        f.debug_struct("MapViewState")
            .field("center", &view.center)
            .field("zoom", &view.zoom)
            .field("ready", &view.ready)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;

    #[test]
    fn test_defaults_from_config() {
        let view = MapViewState::from_config(&MapsConfig::default());
        assert_eq!(view.center(), LatLng::new(39.473040, -0.371475));
        assert_eq!(view.zoom(), 13);
        assert!(!view.is_ready());
        assert!(view.surface().is_none());
    }

    #[test]
    fn test_changes_before_ready_apply_on_ready() {
        let view = MapViewState::new(LatLng::new(0.0, 0.0), 3);
        view.set_center(LatLng::new(39.47, -0.37));
        view.set_zoom(15);

        let surface = Arc::new(HeadlessSurface::new());
        assert_eq!(surface.view(), None);

        view.mark_ready(surface.clone());
        assert!(view.is_ready());
        assert_eq!(surface.view(), Some((LatLng::new(39.47, -0.37), 15)));
    }

    #[test]
    fn test_changes_after_ready_reach_surface() {
        let view = MapViewState::new(LatLng::new(0.0, 0.0), 3);
        let surface = Arc::new(HeadlessSurface::new());
        view.mark_ready(surface.clone());

        view.set_view(LatLng::new(40.41, -3.70), 12);
        assert_eq!(surface.view(), Some((LatLng::new(40.41, -3.70), 12)));
    }

    #[test]
    fn test_clones_share_state() {
        let view = MapViewState::new(LatLng::new(0.0, 0.0), 3);
        let other = view.clone();
        other.set_zoom(9);
        assert_eq!(view.zoom(), 9);
    }

    #[test]
    fn test_detach_clears_handle() {
        let view = MapViewState::new(LatLng::new(0.0, 0.0), 3);
        view.mark_ready(Arc::new(HeadlessSurface::new()));
        view.detach();
        assert!(!view.is_ready());
        assert!(view.surface().is_none());
    }
}

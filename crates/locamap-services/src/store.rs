//! Local, possibly stale copy of the `locations` table plus the active selection.

use std::sync::Arc;

use locamap_core::{Config, RefreshScope, StoreError};
use locamap_maps::{LatLng, MapViewState};
use parking_lot::RwLock;

use crate::location::Location;
use crate::remote::RemoteStore;

/// Zoom applied when a location is selected
pub const SELECTION_ZOOM: u8 = 15;

#[derive(Debug, Default)]
struct LocationList {
    items: Vec<Location>,
    /// `None` exactly when nothing is selected; otherwise a valid index
    active: Option<usize>,
}

impl LocationList {
    /// Keep the selection if it still points into the list, fall back to
    /// the first entry otherwise, and clear it for an empty list.
    fn revalidate(&mut self) {
        self.active = match self.active {
            _ if self.items.is_empty() => None,
            Some(index) if index < self.items.len() => Some(index),
            _ => Some(0),
        };
    }
}

/// Owns the in-memory location list and which entry is active.
///
/// The list only changes after the remote store confirmed a change; a failed
/// remote call leaves it exactly as it was. Remote-touching calls are not
/// queued against each other, so callers sequence them (await `remove`
/// before calling `refresh`).
pub struct LocationStore {
    remote: Arc<dyn RemoteStore>,
    view: MapViewState,
    state: RwLock<LocationList>,
    scope: RefreshScope,
    selection_zoom: u8,
}

impl LocationStore {
    pub fn new(remote: Arc<dyn RemoteStore>, view: MapViewState) -> Self {
        Self {
            remote,
            view,
            state: RwLock::new(LocationList::default()),
            scope: RefreshScope::All,
            selection_zoom: SELECTION_ZOOM,
        }
    }

    pub fn from_config(remote: Arc<dyn RemoteStore>, view: MapViewState, config: &Config) -> Self {
        Self::new(remote, view)
            .with_scope(config.locations.refresh_scope)
            .with_selection_zoom(config.maps.selection_zoom)
    }

    /// Which rows `remove` re-reads after a delete
    pub fn with_scope(mut self, scope: RefreshScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_selection_zoom(mut self, zoom: u8) -> Self {
        self.selection_zoom = zoom;
        self
    }

    /// Snapshot of the current list
    pub fn locations(&self) -> Vec<Location> {
        self.state.read().items.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().items.is_empty()
    }

    /// Index of the active location; `None` means no selection
    pub fn active_index(&self) -> Option<usize> {
        self.state.read().active
    }

    pub fn active_location(&self) -> Option<Location> {
        let state = self.state.read();
        state.active.and_then(|i| state.items.get(i).cloned())
    }

    /// Replace the list with every remote row.
    ///
    /// On failure the previous list and selection are kept.
    pub async fn refresh(&self) -> Result<usize, StoreError> {
        let rows = self.remote.select_all().await.map_err(|e| {
            tracing::error!("Error al obtener ubicaciones: {}", e);
            e
        })?;

        let mut state = self.state.write();
        state.items = rows;
        state.revalidate();
        tracing::info!(
            "Loaded {} locations (active: {:?})",
            state.items.len(),
            state.active
        );
        Ok(state.items.len())
    }

    /// Make `index` active and center the map on it at the selection zoom.
    pub fn select(&self, index: usize) -> Result<LatLng, StoreError> {
        let position = {
            let mut state = self.state.write();
            let len = state.items.len();
            let location = state
                .items
                .get(index)
                .ok_or(StoreError::InvalidIndex { index, len })?;
            let position = location.position();
            state.active = Some(index);
            position
        };

        self.view.set_view(position, self.selection_zoom);
        Ok(position)
    }

    /// Delete the active location remotely, then re-read the list.
    ///
    /// A failed delete changes nothing locally. After a successful delete the
    /// first remaining location is selected, or the selection is cleared if
    /// none remain. If the re-read fails, the deleted row is dropped from the
    /// local list instead.
    pub async fn remove(&self) -> Result<Location, StoreError> {
        let target = self.active_location().ok_or(StoreError::NoSelection)?;

        if let Err(e) = self.remote.delete_by_id(target.id).await {
            tracing::error!("Error al eliminar la ubicación {}: {}", target.id, e);
            return Err(e);
        }
        tracing::info!("Deleted location {}", target.id);

        let refetched = match (self.scope, target.province.as_deref()) {
            (RefreshScope::Province, Some(province)) => {
                self.remote.select_by_province(province).await
            }
            _ => self.remote.select_all().await,
        };

        match refetched {
            Ok(rows) => {
                let first = {
                    let mut state = self.state.write();
                    state.items = rows;
                    state.active = if state.items.is_empty() { None } else { Some(0) };
                    state.items.first().map(Location::position)
                };
                if let Some(position) = first {
                    self.view.set_view(position, self.selection_zoom);
                }
            }
            Err(e) => {
                tracing::warn!("Location list not re-read after delete: {}", e);
                let mut state = self.state.write();
                state.items.retain(|l| l.id != target.id);
                state.revalidate();
            }
        }

        Ok(target)
    }

    /// Append a location locally (not persisted).
    pub fn add(&self, location: Location) {
        let mut state = self.state.write();
        state.items.push(location);
        state.revalidate();
    }
}

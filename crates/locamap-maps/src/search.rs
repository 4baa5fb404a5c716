//! Place search sessions and their map overlays.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use locamap_core::{MapsConfig, SearchError};
use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;

use crate::geo::LatLngBounds;
use crate::places::{PlaceResult, PlacesService, PlacesStatus, TextSearchRequest};
use crate::surface::{FitOptions, MarkerId};
use crate::view::MapViewState;

/// How a search call ended when it did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Blank query; nothing was cleared or sent
    Skipped,
    /// Results arrived and were drawn
    Found {
        places: Vec<PlaceResult>,
        markers: usize,
    },
    /// A newer search was started before this one completed; its results were dropped
    Superseded,
}

/// Runs text searches against the places capability and keeps the markers
/// of the latest search on the map.
///
/// Only the most recent search may touch the overlay: each call takes a new
/// generation number and a completion for an older generation is discarded.
pub struct PlacesSearch {
    view: MapViewState,
    service: RwLock<Option<Arc<dyn PlacesService>>>,
    overlay: Mutex<Vec<MarkerId>>,
    generation: AtomicU64,
    fit: FitOptions,
}

impl PlacesSearch {
    pub fn new(view: MapViewState, fit: FitOptions) -> Self {
        Self {
            view,
            service: RwLock::new(None),
            overlay: Mutex::new(Vec::new()),
            generation: AtomicU64::new(0),
            fit,
        }
    }

    pub fn from_config(view: MapViewState, config: &MapsConfig) -> Self {
        Self::new(
            view,
            FitOptions::new(config.fit_padding_px, config.search_max_zoom),
        )
    }

    /// Install (or remove) the search capability.
    pub fn attach_service(&self, service: Option<Arc<dyn PlacesService>>) {
        if service.is_none() {
            tracing::warn!("Places service unavailable");
        }
        *self.service.write() = service;
    }

    pub fn is_available(&self) -> bool {
        self.service.read().is_some()
    }

    /// Markers of the current search
    pub fn overlay(&self) -> Vec<MarkerId> {
        self.overlay.lock().clone()
    }

    /// Remove every overlay marker from the map.
    ///
    /// Without a map handle the overlay is left as is.
    pub fn clear_results(&self) {
        let Some(surface) = self.view.surface() else {
            return;
        };
        let markers = std::mem::take(&mut *self.overlay.lock());
        for marker in &markers {
            surface.remove_marker(*marker);
        }
        if !markers.is_empty() {
            tracing::debug!("Cleared {} search markers", markers.len());
        }
    }

    /// Search for `query`, draw a marker per located result and fit the
    /// viewport around them.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        if !self.view.is_ready() || self.view.surface().is_none() {
            tracing::warn!("Search requested before the map is ready");
            return Err(SearchError::MapNotReady);
        }

        let service = self.service.read().clone().ok_or_else(|| {
            tracing::warn!("Search requested without a places service");
            SearchError::Unavailable
        })?;

        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchOutcome::Skipped);
        }

        // Bump first: an older search that has not yet recorded its markers
        // sees the new generation, one that already did is cleared here.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.clear_results();

        let (tx, rx) = oneshot::channel();
        service.text_search(
            TextSearchRequest::new(query),
            Box::new(move |results, status| {
                let _ = tx.send((results, status));
            }),
        );

        let (results, status) = rx.await.unwrap_or_else(|_| {
            tracing::warn!("Places callback dropped without firing");
            (Vec::new(), PlacesStatus::UnknownError)
        });

        // Held from the generation check until the markers are recorded
        let mut overlay = self.overlay.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Discarding results of superseded search {:?}", query);
            return Ok(SearchOutcome::Superseded);
        }

        if !status.is_ok() || results.is_empty() {
            tracing::info!("No results for {:?} (status {:?})", query, status);
            return Err(SearchError::NoResults(query.to_string()));
        }

        let surface = self.view.surface().ok_or(SearchError::MapNotReady)?;

        let mut bounds = LatLngBounds::new();
        let mut marker_count = 0;
        for place in &results {
            if let Some(position) = place.position() {
                bounds.extend(position);
                overlay.push(surface.add_marker(position, place.label()));
                marker_count += 1;
            }
        }
        drop(overlay);

        if bounds.is_valid() {
            surface.fit_bounds(&bounds, self.fit);
        }

        tracing::info!(
            "Search {:?} returned {} places, {} on the map",
            query,
            results.len(),
            marker_count
        );
        Ok(SearchOutcome::Found {
            places: results,
            markers: marker_count,
        })
    }
}

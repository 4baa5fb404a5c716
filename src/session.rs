//! Wires the configuration, map view, location store, place search and
//! weather widget into one unit with a single lifecycle.

use std::sync::Arc;

use anyhow::{Context, Result};
use locamap_core::{App, Config, StoreError};
use locamap_maps::{
    GooglePlacesClient, HttpScriptHost, LatLng, MapSurface, MapViewState, PlacesSearch,
    PlacesService, PointDraft, ScriptHost, ScriptLoader,
};
use locamap_services::{Location, LocationStore, RemoteStore, SupabaseClient};
use locamap_weather::{AemetProvider, ForecastSource, WeatherWidget};
use parking_lot::Mutex;

/// External services a session talks to
pub struct Backends {
    pub remote: Arc<dyn RemoteStore>,
    pub script_host: Arc<dyn ScriptHost>,
    pub places: Arc<dyn PlacesService>,
    pub forecast: Arc<dyn ForecastSource>,
}

impl Backends {
    /// Real HTTP clients for every service named in `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let remote = SupabaseClient::new(&config.supabase).context("Failed to set up database client")?;
        let script_host = HttpScriptHost::new()?;
        let places = GooglePlacesClient::new(&config.maps.places_url, &config.maps.api_key)?;
        let forecast = AemetProvider::new(&config.weather)?;

        Ok(Self {
            remote: Arc::new(remote),
            script_host: Arc::new(script_host),
            places: Arc::new(places),
            forecast: Arc::new(forecast),
        })
    }
}

pub struct Session {
    app: App,
    view: MapViewState,
    store: LocationStore,
    search: PlacesSearch,
    script: ScriptLoader,
    places: Arc<dyn PlacesService>,
    weather: WeatherWidget,
    draft: Mutex<PointDraft>,
}

impl Session {
    pub fn new(config: Config, backends: Backends) -> Self {
        let view = MapViewState::from_config(&config.maps);
        let store = LocationStore::from_config(backends.remote, view.clone(), &config);
        let search = PlacesSearch::from_config(view.clone(), &config.maps);
        let weather = WeatherWidget::new(
            backends.forecast,
            std::time::Duration::from_secs(config.weather.refresh_seconds),
        );

        let mut app = App::with_config(config);
        app.register(Box::new(weather.clone()));

        Self {
            app,
            view,
            store,
            search,
            script: ScriptLoader::new(backends.script_host),
            places: backends.places,
            weather,
            draft: Mutex::new(PointDraft::new()),
        }
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let backends = Backends::from_config(&config)?;
        Ok(Self::new(config, backends))
    }

    /// Start background components (the weather poller)
    pub fn start(&mut self) -> Result<()> {
        self.app.initialize()
    }

    pub fn config(&self) -> &Config {
        self.app.config()
    }

    pub fn view(&self) -> &MapViewState {
        &self.view
    }

    pub fn store(&self) -> &LocationStore {
        &self.store
    }

    pub fn search(&self) -> &PlacesSearch {
        &self.search
    }

    pub fn weather(&self) -> &WeatherWidget {
        &self.weather
    }

    /// The map finished loading: attach it, load the maps script and enable
    /// place search if the script provided it.
    pub async fn on_map_ready(&self, surface: Arc<dyn MapSurface>) {
        self.view.mark_ready(surface);

        match self.config().maps.script_url_with_key() {
            Ok(url) => self.script.load(&url).await,
            Err(e) => tracing::warn!("Maps script URL unusable: {}", e),
        }

        if self.script.places_available() {
            self.search.attach_service(Some(self.places.clone()));
            tracing::info!("Place search ready");
        } else {
            self.search.attach_service(None);
            tracing::warn!("Places library not available; search disabled");
        }
    }

    /// Re-read the list and select `index`
    pub async fn select_location(&self, index: usize) -> Result<LatLng, StoreError> {
        self.store.refresh().await?;
        self.store.select(index)
    }

    /// Re-read the list, select `index` if given, then delete the active
    /// location. Nothing is deleted when the re-read or the selection fails.
    pub async fn delete_location(&self, index: Option<usize>) -> Result<Location, StoreError> {
        self.store.refresh().await?;
        if let Some(index) = index {
            self.store.select(index)?;
        }
        self.store.remove().await
    }

    /// Right click on the map: remember the point as an unsaved draft
    pub fn pick_point(&self, point: LatLng) -> LatLng {
        let point = self.view.handle_context_menu(point);
        self.draft.lock().set_coords(point);
        point
    }

    pub fn draft(&self) -> PointDraft {
        self.draft.lock().clone()
    }

    pub fn set_creating(&self, creating: bool) {
        self.draft.lock().set_creating(creating);
    }

    pub fn reset_draft(&self) {
        self.draft.lock().reset();
    }

    /// Stop the poller, drop search markers and release the map
    pub fn shutdown(&mut self) -> Result<()> {
        self.app.shutdown()?;
        self.search.clear_results();
        self.view.detach();
        Ok(())
    }
}

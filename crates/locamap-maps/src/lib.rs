//! Map-side state for Locamap
//!
//! Holds the map viewport, the boundary to the rendering layer, the one-shot
//! loader for the places script and the place search session that drives
//! search-result overlays.

pub mod draft;
pub mod geo;
pub mod places;
pub mod script;
pub mod search;
pub mod surface;
pub mod view;

pub use draft::PointDraft;
pub use geo::{LatLng, LatLngBounds};
pub use places::{
    GooglePlacesClient, PlaceResult, PlacesService, PlacesStatus, SearchCallback,
    TextSearchRequest,
};
pub use script::{HttpScriptHost, ScriptError, ScriptHost, ScriptLoader};
pub use search::{PlacesSearch, SearchOutcome};
pub use surface::{FitOptions, HeadlessSurface, MapOptions, MapSurface, MarkerId};
pub use view::MapViewState;

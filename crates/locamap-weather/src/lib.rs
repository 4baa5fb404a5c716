//! Weather widget for Locamap
//!
//! Polls the AEMET OpenData daily municipal forecast and keeps a display
//! snapshot that always has every field filled in.

pub mod provider;
pub mod types;
pub mod widget;

pub use provider::{AemetProvider, ForecastSource};
pub use types::*;
pub use widget::WeatherWidget;

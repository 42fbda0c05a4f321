//! World and indicator map views for the monitor.
//!
//! Fetches datasets and GeoJSON geometry (over HTTP or from disk), joins
//! them with the resolvers from `choropleth-core`, and assembles painted
//! views. A failed geometry fetch degrades the map to a fallback surface;
//! a failed dataset fetch turns the whole section into an error message.
//!
//! # Example
//!
//! ```rust,ignore
//! use choropleth_core::MapKind;
//! use map_views::{MonitorConfig, ViewController, ViewOutcome, ViewRequest};
//!
//! let controller = ViewController::from_config(MonitorConfig::from_env()?).await?;
//! match controller.show(ViewRequest::indicator(MapKind::States)).await {
//!     ViewOutcome::Applied(view) => println!("{}", serde_json::to_string_pretty(&view)?),
//!     ViewOutcome::Stale { .. } => {}
//! }
//! ```

mod config;
mod controller;
mod error;
mod fetch;
mod view;

pub use config::{
    MonitorConfig, MonitorConfigBuilder, BOROUGHS_DATA, CDMX_GEOJSON_LOCAL, CDMX_GEOJSON_URL,
    DEFAULT_FALLBACK_CELLS, DEFAULT_FETCH_TIMEOUT_SECS, MEXICO_GEOJSON_URL, STATES_DATA,
    WORLD_DATA, WORLD_GEOJSON_URL,
};
pub use controller::{load_aliases, ViewController, ViewOutcome, ViewRequest};
pub use error::ViewError;
pub use fetch::{fetch_first, is_remote, DocumentFetcher, HttpFetcher};
pub use view::{
    dataset_error_message, fallback_cells, indicator_surface, paint_features, FallbackCell,
    FeatureFill, IndicatorView, MapSurface, SectionView, SurfaceMessages, TooltipFormat,
    WorldView, WORLD_NO_DATA,
};

// Re-export async_trait for custom fetchers
pub use async_trait::async_trait;

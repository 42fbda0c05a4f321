//! Configuration for the map views.

use std::env;
use std::time::Duration;

use choropleth_core::{ColorScale, MapKind, Rgb};

use crate::error::ViewError;

/// World countries GeoJSON.
pub const WORLD_GEOJSON_URL: &str =
    "https://raw.githubusercontent.com/holtzy/D3-graph-gallery/master/DATA/world.geojson";
/// Mexican states GeoJSON.
pub const MEXICO_GEOJSON_URL: &str =
    "https://raw.githubusercontent.com/angelnmara/geojson/master/mexicoHigh.json";
/// CDMX boroughs GeoJSON bundled with the site.
pub const CDMX_GEOJSON_LOCAL: &str = "data/cdmx-alcaldia/cdmx_alcaldias_real.geojson";
/// Remote CDMX boroughs GeoJSON, tried when the local copy is missing.
pub const CDMX_GEOJSON_URL: &str =
    "https://raw.githubusercontent.com/angelnmara/geojson/master/mexicoCityHigh.json";

/// World female labor participation dataset.
pub const WORLD_DATA: &str = "data/dashboard-nacional/participacion_economica_mujeres_por_pais.json";
/// State indicator dataset.
pub const STATES_DATA: &str = "data/estadisticas-entidad/variables_monitor_entidad_enriched.json";
/// Borough indicator dataset.
pub const BOROUGHS_DATA: &str = "data/cdmx-alcaldia/monitor_cdmx_indicadores.json";

/// Default fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
/// Default number of cells in the world fallback grid.
pub const DEFAULT_FALLBACK_CELLS: usize = 48;

/// Configuration for the map views.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// World geometry location.
    pub world_geojson: String,
    /// Mexican states geometry location.
    pub mexico_geojson: String,
    /// CDMX borough geometry locations, tried in order.
    pub cdmx_geojson: Vec<String>,

    /// World dataset location.
    pub world_data: String,
    /// State dataset location.
    pub states_data: String,
    /// Borough dataset location.
    pub boroughs_data: String,

    /// Fill colors.
    pub colors: ColorScale,

    /// Timeout for each remote fetch.
    pub fetch_timeout: Duration,

    /// Cells drawn by the world fallback grid.
    pub fallback_cells: usize,

    /// Optional JSON file extending the alias tables.
    pub alias_file: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            world_geojson: WORLD_GEOJSON_URL.to_string(),
            mexico_geojson: MEXICO_GEOJSON_URL.to_string(),
            cdmx_geojson: vec![CDMX_GEOJSON_LOCAL.to_string(), CDMX_GEOJSON_URL.to_string()],
            world_data: WORLD_DATA.to_string(),
            states_data: STATES_DATA.to_string(),
            boroughs_data: BOROUGHS_DATA.to_string(),
            colors: ColorScale::default(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            fallback_cells: DEFAULT_FALLBACK_CELLS,
            alias_file: None,
        }
    }
}

impl MonitorConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `MONITOR_WORLD_GEOJSON_URL` - World geometry (default: D3 graph gallery world.geojson)
    /// - `MONITOR_MEXICO_GEOJSON_URL` - State geometry (default: mexicoHigh.json)
    /// - `MONITOR_CDMX_GEOJSON_URL` - Comma-separated borough geometry sources
    ///   (default: bundled file, then mexicoCityHigh.json)
    /// - `MONITOR_WORLD_DATA` - World dataset location
    /// - `MONITOR_STATES_DATA` - State dataset location
    /// - `MONITOR_BOROUGHS_DATA` - Borough dataset location
    /// - `MONITOR_COLOR_LOW` - Low color stop (default: #e5e4fe)
    /// - `MONITOR_COLOR_HIGH` - High color stop (default: #7f79fb)
    /// - `MONITOR_NO_DATA_COLOR` - Fill for features without data (default: #eceaf5)
    /// - `MONITOR_FETCH_TIMEOUT_SECS` - Fetch timeout (default: 20)
    /// - `MONITOR_FALLBACK_CELLS` - World fallback grid size (default: 48)
    /// - `MONITOR_ALIAS_FILE` - JSON alias overrides
    ///
    /// Locations starting with `http://` or `https://` are fetched; any
    /// other value is read from disk.
    pub fn from_env() -> Result<Self, ViewError> {
        let defaults = Self::default();

        let world_geojson =
            env::var("MONITOR_WORLD_GEOJSON_URL").unwrap_or(defaults.world_geojson);
        let mexico_geojson =
            env::var("MONITOR_MEXICO_GEOJSON_URL").unwrap_or(defaults.mexico_geojson);
        let cdmx_geojson = env::var("MONITOR_CDMX_GEOJSON_URL")
            .ok()
            .map(|v| split_sources(&v))
            .filter(|sources| !sources.is_empty())
            .unwrap_or(defaults.cdmx_geojson);

        let world_data = env::var("MONITOR_WORLD_DATA").unwrap_or(defaults.world_data);
        let states_data = env::var("MONITOR_STATES_DATA").unwrap_or(defaults.states_data);
        let boroughs_data = env::var("MONITOR_BOROUGHS_DATA").unwrap_or(defaults.boroughs_data);

        let colors = ColorScale::new(
            color_from_env("MONITOR_COLOR_LOW", defaults.colors.low)?,
            color_from_env("MONITOR_COLOR_HIGH", defaults.colors.high)?,
            color_from_env("MONITOR_NO_DATA_COLOR", defaults.colors.no_data)?,
        );

        let fetch_timeout = env::var("MONITOR_FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.fetch_timeout);

        let fallback_cells = env::var("MONITOR_FALLBACK_CELLS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.fallback_cells);

        let alias_file = env::var("MONITOR_ALIAS_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Ok(Self {
            world_geojson,
            mexico_geojson,
            cdmx_geojson,
            world_data,
            states_data,
            boroughs_data,
            colors,
            fetch_timeout,
            fallback_cells,
            alias_file,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }

    /// Geometry locations for a map kind, in the order they are tried.
    pub fn geometry_sources(&self, kind: MapKind) -> Vec<String> {
        match kind {
            MapKind::World => vec![self.world_geojson.clone()],
            MapKind::States => vec![self.mexico_geojson.clone()],
            MapKind::Boroughs => self.cdmx_geojson.clone(),
        }
    }

    /// Dataset location for a map kind.
    pub fn data_source(&self, kind: MapKind) -> &str {
        match kind {
            MapKind::World => &self.world_data,
            MapKind::States => &self.states_data,
            MapKind::Boroughs => &self.boroughs_data,
        }
    }
}

fn split_sources(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn color_from_env(key: &str, default: Rgb) -> Result<Rgb, ViewError> {
    match env::var(key) {
        Ok(value) => Rgb::from_hex(&value)
            .map_err(|e| ViewError::Configuration(format!("{}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

/// Builder for MonitorConfig.
#[derive(Debug, Default)]
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl MonitorConfigBuilder {
    /// Set the world geometry location.
    pub fn world_geojson(mut self, location: impl Into<String>) -> Self {
        self.config.world_geojson = location.into();
        self
    }

    /// Set the state geometry location.
    pub fn mexico_geojson(mut self, location: impl Into<String>) -> Self {
        self.config.mexico_geojson = location.into();
        self
    }

    /// Set the borough geometry locations.
    pub fn cdmx_geojson<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.cdmx_geojson = locations.into_iter().map(Into::into).collect();
        self
    }

    /// Set the world dataset location.
    pub fn world_data(mut self, location: impl Into<String>) -> Self {
        self.config.world_data = location.into();
        self
    }

    /// Set the state dataset location.
    pub fn states_data(mut self, location: impl Into<String>) -> Self {
        self.config.states_data = location.into();
        self
    }

    /// Set the borough dataset location.
    pub fn boroughs_data(mut self, location: impl Into<String>) -> Self {
        self.config.boroughs_data = location.into();
        self
    }

    /// Set the fill colors.
    pub fn colors(mut self, colors: ColorScale) -> Self {
        self.config.colors = colors;
        self
    }

    /// Set the fetch timeout.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout = timeout;
        self
    }

    /// Set the fallback grid size.
    pub fn fallback_cells(mut self, cells: usize) -> Self {
        self.config.fallback_cells = cells;
        self
    }

    /// Set the alias override file.
    pub fn alias_file(mut self, location: impl Into<String>) -> Self {
        self.config.alias_file = Some(location.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> MonitorConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.world_geojson, WORLD_GEOJSON_URL);
        assert_eq!(config.fetch_timeout, Duration::from_secs(20));
        assert_eq!(config.fallback_cells, 48);
        assert_eq!(
            config.geometry_sources(MapKind::Boroughs),
            vec![CDMX_GEOJSON_LOCAL.to_string(), CDMX_GEOJSON_URL.to_string()]
        );
        assert_eq!(config.data_source(MapKind::States), STATES_DATA);
    }

    #[test]
    fn test_builder() {
        let config = MonitorConfig::builder()
            .world_geojson("fixtures/world.json")
            .cdmx_geojson(["a.json", "b.json"])
            .fallback_cells(12)
            .alias_file("aliases.json")
            .build();
        assert_eq!(config.geometry_sources(MapKind::World), vec!["fixtures/world.json"]);
        assert_eq!(config.cdmx_geojson.len(), 2);
        assert_eq!(config.fallback_cells, 12);
        assert_eq!(config.alias_file.as_deref(), Some("aliases.json"));
    }

    #[test]
    fn test_split_sources() {
        assert_eq!(split_sources(" a.json, ,https://x/b.json "), vec!["a.json", "https://x/b.json"]);
        assert!(split_sources(" , ").is_empty());
    }
}

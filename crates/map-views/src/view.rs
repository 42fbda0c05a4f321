//! Rendered view models for the world and indicator sections.

use choropleth_core::{
    features_from_collection, ColorScale, FeatureResolver, GeoFeature, MapKind, NormalizedKey,
    ValueIndex, ValueRange,
};
use indicator_data::{EntityProfile, IndicatorSnapshot, NamedValue, ValueFormat};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ViewError;

/// Message shown when a world dataset has no usable rows.
pub const WORLD_NO_DATA: &str = "No hay datos disponibles para el mapa.";

/// Message shown when a dataset could not be loaded.
pub fn dataset_error_message(error: impl std::fmt::Display) -> String {
    format!("Error al cargar los datos: {}", error)
}

/// Messages for a map kind whose geometry or data is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceMessages {
    /// The geometry document could not be fetched.
    pub geometry_failed: &'static str,
    /// The geometry document has no features.
    pub geometry_empty: &'static str,
    /// The dataset has no rows for this view.
    pub no_data: &'static str,
}

impl SurfaceMessages {
    pub fn for_kind(kind: MapKind) -> Self {
        match kind {
            MapKind::World => Self {
                geometry_failed: "No fue posible cargar el mapa.",
                geometry_empty: "El archivo del mapa no contiene países.",
                no_data: WORLD_NO_DATA,
            },
            MapKind::States => Self {
                geometry_failed: "No fue posible cargar el mapa de México.",
                geometry_empty: "El archivo del mapa no contiene entidades.",
                no_data: "No hay datos disponibles para el mapa por entidad.",
            },
            MapKind::Boroughs => Self {
                geometry_failed: "No fue posible cargar el mapa de CDMX.",
                geometry_empty: "El archivo del mapa no contiene alcaldías.",
                no_data: "No hay datos disponibles para el mapa de alcaldías.",
            },
        }
    }
}

/// One painted map feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureFill {
    /// Join key on this kind of map.
    pub key: NormalizedKey,
    /// Name of the feature as drawn.
    pub name: String,
    /// Dataset label when matched, else the feature name.
    pub label: String,
    pub value: Option<f64>,
    /// Tooltip value, two decimals.
    pub display_value: Option<String>,
    /// CSS `rgb(r, g, b)` fill.
    pub fill: String,
    pub selected: bool,
}

/// One cell of the world intensity grid drawn without geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackCell {
    pub name: String,
    pub value: f64,
    pub fill: String,
    /// `name: value%` with one decimal.
    pub title: String,
}

/// What the map area of a section shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MapSurface {
    /// Painted geographic features.
    Geographic { features: Vec<FeatureFill> },
    /// Intensity grid of the top-ranked entries.
    Fallback { cells: Vec<FallbackCell> },
    /// Inline message in place of the map.
    Unavailable { message: String },
}

impl MapSurface {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, Self::Geographic { .. })
    }
}

/// The world participation map and its ranking.
#[derive(Debug, Clone, Serialize)]
pub struct WorldView {
    pub range: ValueRange,
    /// Countries by value, highest first.
    pub ranking: Vec<NamedValue>,
    pub surface: MapSurface,
}

/// A state or borough indicator map with its side panels.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorView {
    pub kind: MapKind,
    /// Every variable the dataset offers, sorted.
    pub variables: Vec<String>,
    pub snapshot: IndicatorSnapshot,
    /// Selected entity key.
    pub selected: Option<NormalizedKey>,
    /// Profile of the selected entity.
    pub profile: Option<EntityProfile>,
    pub surface: MapSurface,
}

impl IndicatorView {
    pub fn variable(&self) -> &str {
        &self.snapshot.variable
    }
}

/// The content of a section after a load.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum SectionView {
    World(WorldView),
    Indicator(IndicatorView),
    /// The dataset loaded but has nothing to show.
    Empty { message: String },
    /// The dataset could not be loaded.
    Error { message: String },
}

impl SectionView {
    /// The map kind whose data is on screen, if any.
    pub fn kind(&self) -> Option<MapKind> {
        match self {
            Self::World(_) => Some(MapKind::World),
            Self::Indicator(view) => Some(view.kind),
            Self::Empty { .. } | Self::Error { .. } => None,
        }
    }

    /// The selected entity of an indicator view.
    pub fn selected(&self) -> Option<&NormalizedKey> {
        match self {
            Self::Indicator(view) => view.selected.as_ref(),
            _ => None,
        }
    }

    /// User-facing message for empty and error views.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Empty { message } | Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

/// How a painted feature's value is printed on its tooltip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipFormat {
    /// One decimal, as on the world participation map.
    World,
    /// The map format of an indicator variable.
    Indicator(ValueFormat),
}

impl TooltipFormat {
    pub fn display(&self, value: f64) -> String {
        match self {
            Self::World => ValueFormat::Decimal.format(value),
            Self::Indicator(format) => format.format_map(value),
        }
    }
}

/// Paint every visible feature against a value index.
///
/// Features without a value get the no-data fill.
pub fn paint_features(
    features: &[GeoFeature],
    resolver: &dyn FeatureResolver,
    index: &ValueIndex,
    range: &ValueRange,
    colors: &ColorScale,
    format: TooltipFormat,
    selected: Option<&NormalizedKey>,
) -> Vec<FeatureFill> {
    let mut matched = 0;
    let fills: Vec<FeatureFill> = features
        .iter()
        .filter(|feature| resolver.is_visible(feature))
        .map(|feature| {
            let hit = resolver.resolve(feature, index);
            let name = resolver.display_name(feature);
            let key = feature_key(feature, resolver, hit.as_ref().map(|m| m.label.as_str()), &name);
            let value = hit.as_ref().map(|m| m.value);
            if value.is_some() {
                matched += 1;
            }
            FeatureFill {
                selected: selected == Some(&key),
                key,
                label: hit.map(|m| m.label).unwrap_or_else(|| name.clone()),
                name,
                value,
                display_value: value.map(|v| format.display(v)),
                fill: colors.fill(value, range).to_string(),
            }
        })
        .collect();

    debug!(
        "Painted {} {} features, {} with data",
        fills.len(),
        resolver.kind().as_str(),
        matched
    );
    fills
}

fn feature_key(
    feature: &GeoFeature,
    resolver: &dyn FeatureResolver,
    matched_label: Option<&str>,
    name: &str,
) -> NormalizedKey {
    match resolver.kind() {
        MapKind::World => resolver.index_key(matched_label.unwrap_or(name)),
        MapKind::States | MapKind::Boroughs => {
            resolver.index_key(&feature.name().unwrap_or_else(|| name.to_string()))
        }
    }
}

/// The top `limit` entries of a descending ranking as grid cells.
pub fn fallback_cells(
    ranking: &[NamedValue],
    range: &ValueRange,
    colors: &ColorScale,
    limit: usize,
) -> Vec<FallbackCell> {
    ranking
        .iter()
        .take(limit)
        .map(|item| FallbackCell {
            name: item.name.clone(),
            value: item.value,
            fill: colors.fill(Some(item.value), range).to_string(),
            title: format!("{}: {:.1}%", item.name, item.value),
        })
        .collect()
}

/// Turn a fetched geometry document into a surface for an indicator map.
///
/// A failed fetch or a collection without features yields an inline
/// message; the panels around the map still work.
pub fn indicator_surface(
    geometry: Result<&Value, &ViewError>,
    snapshot: &IndicatorSnapshot,
    resolver: &dyn FeatureResolver,
    colors: &ColorScale,
    selected: Option<&NormalizedKey>,
) -> MapSurface {
    let messages = SurfaceMessages::for_kind(snapshot.kind);
    let document = match geometry {
        Ok(document) => document,
        Err(e) => {
            warn!("{} map geometry unavailable: {}", snapshot.kind.as_str(), e);
            return MapSurface::unavailable(messages.geometry_failed);
        }
    };

    let features = features_from_collection(document);
    if features.is_empty() {
        warn!("{} map geometry has no features", snapshot.kind.as_str());
        return MapSurface::unavailable(messages.geometry_empty);
    }

    MapSurface::Geographic {
        features: paint_features(
            &features,
            resolver,
            snapshot.index(),
            &snapshot.range,
            colors,
            TooltipFormat::Indicator(snapshot.value_format),
            selected,
        ),
    }
}

//! Indicator datasets for the monitor maps.
//!
//! Parses the JSON datasets behind the world, state and borough views,
//! drops malformed rows, and derives per-variable snapshots: value range,
//! direction-aware ranking, unit symbol and source notes.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use choropleth_core::{AliasTables, DirectionPolicy, MapKind, RegionMatcher};
//! use indicator_data::IndicatorDataset;
//!
//! let dataset = IndicatorDataset::from_json(json)?;
//! let resolver = RegionMatcher::states(Arc::new(AliasTables::builtin()));
//! let variable = dataset.default_variable(MapKind::States).unwrap_or_default();
//! if let Some(snapshot) = dataset.snapshot(&variable, &resolver, &DirectionPolicy::builtin()) {
//!     for (i, row) in snapshot.ranking.iter().enumerate() {
//!         println!("{}. {} {}{}", i + 1, row.label, row.display_value, snapshot.unit_symbol);
//!     }
//! }
//! ```

mod dataset;
mod error;
mod format;
mod records;
mod snapshot;

pub use dataset::{IndicatorDataset, WorldDataset};
pub use error::DataError;
pub use format::{
    format_source, hides_percent_symbol, normalize_rate_to_percent, unit_symbol,
    with_source_prefix, ValueFormat,
};
pub use records::{IndicatorRecord, NamedValue};
pub use snapshot::{
    EntityProfile, IndicatorSnapshot, KindDefaults, ProfileRow, RankedEntity, DEFAULT_DESCRIPTION,
};

//! Geographic name resolution and choropleth coloring.
//!
//! This crate joins map features (countries, Mexican states, CDMX boroughs)
//! to indicator dataset rows whose names come from different sources and
//! languages, then turns the matched values into fill colors.
//!
//! # Pipeline
//!
//! - [`normalize`] / [`canonicalize`] - the shared join key.
//! - [`AliasTables`] - static redirects between naming variants, optionally
//!   extended from JSON.
//! - [`RegionTranslator`] - English to Spanish region names built from a
//!   [`RegionDisplayNames`] provider.
//! - [`CountryMatcher`] / [`RegionMatcher`] - resolve a [`GeoFeature`]
//!   against a [`ValueIndex`]. The country matcher runs an ordered chain of
//!   [`MatchStrategy`] tiers over every candidate key.
//! - [`ColorScale`] - linear interpolation between two stops.
//! - [`DirectionPolicy`] - whether a higher value of a variable ranks first.
//!
//! # Example
//!
//! ```rust,ignore
//! use choropleth_core::{color_from_value, CountryMatcher, FeatureResolver, GeoFeature, ValueIndex};
//!
//! let index = ValueIndex::build([("Rusia", 41.3), ("Alemania", 56.0)]);
//! let matcher = CountryMatcher::builtin();
//! let hit = matcher.resolve(&GeoFeature::named("Russian Federation"), &index);
//! assert_eq!(hit.map(|m| m.label).as_deref(), Some("Rusia"));
//! println!("{}", color_from_value(41.3, 41.3, 56.0)); // rgb(229, 228, 254)
//! ```

mod aliases;
mod color;
mod direction;
mod error;
mod feature;
mod index;
mod matcher;
mod normalize;
mod region_names;
mod translator;

pub use aliases::{AliasMap, AliasOverrides, AliasTables, MapKind};
pub use color::{
    color_from_value, ratio, ColorScale, Rgb, ValueRange, DEFAULT_HIGH, DEFAULT_LOW,
    DEFAULT_NO_DATA,
};
pub use direction::{is_higher_better, DirectionPolicy};
pub use error::CoreError;
pub use feature::{features_from_collection, GeoFeature};
pub use index::{IndexedValue, ValueIndex};
pub use matcher::{
    default_strategies, matcher_for, CanonicalMatch, CountryMatcher, DatasetAliasMatch,
    ExactMatch, FeatureResolver, Match, MatchContext, MatchStrategy, RegionMatcher,
    UNNAMED_COUNTRY,
};
pub use normalize::{canonical, canonicalize, normalize, NormalizedKey};
pub use translator::{
    BuiltinDisplayNames, Locale, NoDisplayNames, RegionDisplayNames, RegionTranslator,
};

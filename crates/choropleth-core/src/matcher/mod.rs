//! Feature to dataset matching.
//!
//! World maps go through [`CountryMatcher`], which expands a feature into
//! an ordered set of candidate keys and runs the strategy chain over each.
//! State and borough maps go through [`RegionMatcher`], which keys both
//! sides through the administrative alias table and matches exactly.

mod strategy;

pub use strategy::{
    CanonicalMatch, DatasetAliasMatch, ExactMatch, Match, MatchContext, MatchStrategy,
};

use std::sync::Arc;

use indexmap::IndexSet;
use tracing::debug;

use crate::aliases::{AliasTables, MapKind};
use crate::feature::GeoFeature;
use crate::index::ValueIndex;
use crate::normalize::{normalize, NormalizedKey};
use crate::translator::{BuiltinDisplayNames, Locale, RegionDisplayNames, RegionTranslator};

/// Name shown for a world feature without any name or id.
pub const UNNAMED_COUNTRY: &str = "País";

/// Normalized names never drawn on world maps.
const HIDDEN_WORLD_FEATURES: &[&str] = &["antarctica", "antartida"];

/// Resolves features of one map kind against a dataset snapshot.
pub trait FeatureResolver: Send + Sync {
    /// The map kind this resolver serves.
    fn kind(&self) -> MapKind;

    /// Key used for dataset entities on this kind of map.
    fn index_key(&self, raw: &str) -> NormalizedKey;

    /// Find the dataset value for a feature. `None` means no data.
    fn resolve(&self, feature: &GeoFeature, index: &ValueIndex) -> Option<Match>;

    /// Label for a feature the dataset has no value for.
    fn display_name(&self, feature: &GeoFeature) -> String;

    /// Label for a dataset entity on this kind of map.
    fn entity_label(&self, entity: &str) -> String {
        entity.trim().to_string()
    }

    /// Whether the feature should be drawn at all.
    fn is_visible(&self, _feature: &GeoFeature) -> bool {
        true
    }

    /// Index `(entity, value)` pairs with this resolver's key function.
    fn build_index(&self, items: &[(&str, f64)]) -> ValueIndex {
        ValueIndex::build_with(items.iter().copied(), |raw| self.index_key(raw))
    }
}

/// The default strategy chain: exact, dataset alias, canonical.
pub fn default_strategies() -> Vec<Arc<dyn MatchStrategy>> {
    vec![
        Arc::new(ExactMatch),
        Arc::new(DatasetAliasMatch),
        Arc::new(CanonicalMatch),
    ]
}

/// Country matcher for world maps.
#[derive(Clone)]
pub struct CountryMatcher {
    aliases: Arc<AliasTables>,
    translator: Arc<RegionTranslator>,
    names: Arc<dyn RegionDisplayNames>,
    strategies: Vec<Arc<dyn MatchStrategy>>,
}

impl CountryMatcher {
    /// Matcher using the builtin alias tables and display names.
    pub fn builtin() -> Self {
        Self {
            aliases: Arc::new(AliasTables::builtin()),
            translator: RegionTranslator::builtin(),
            names: Arc::new(BuiltinDisplayNames),
            strategies: default_strategies(),
        }
    }

    /// Matcher over the given tables and display-name provider.
    pub fn new(aliases: Arc<AliasTables>, names: Arc<dyn RegionDisplayNames>) -> Self {
        let translator = Arc::new(RegionTranslator::build(names.as_ref()));
        Self {
            aliases,
            translator,
            names,
            strategies: default_strategies(),
        }
    }

    /// Append a strategy after the existing ones.
    pub fn with_strategy<S: MatchStrategy + 'static>(mut self, strategy: S) -> Self {
        debug!("Adding match strategy: {}", strategy.name());
        self.strategies.push(Arc::new(strategy));
        self
    }

    /// Names of the strategies, in the order they run.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// The alias tables in use.
    pub fn aliases(&self) -> &AliasTables {
        &self.aliases
    }

    /// The translator in use.
    pub fn translator(&self) -> &RegionTranslator {
        &self.translator
    }

    /// Ordered, deduplicated candidate keys for a feature.
    ///
    /// Every seed name contributes its normalized form, its language alias
    /// and its Spanish translation. The ISO-2 code, when present, adds the
    /// Spanish display name and that name's dataset alias.
    pub fn candidates(&self, feature: &GeoFeature) -> IndexSet<NormalizedKey> {
        let mut candidates = IndexSet::new();

        for seed in feature.seed_names() {
            let key = normalize(&seed);
            if key.is_empty() {
                continue;
            }
            candidates.insert(key.clone());
            if let Some(alias) = self.aliases.language.get(key.as_str()) {
                candidates.insert(alias.clone());
            }
            if let Some(spanish) = self.translator.translate(key.as_str()) {
                candidates.insert(spanish.clone());
            }
        }

        if let Some(spanish) = self.iso_spanish_key(feature) {
            let remap = self.aliases.dataset_labels.get(spanish.as_str()).cloned();
            candidates.insert(spanish);
            if let Some(remap) = remap {
                candidates.insert(remap);
            }
        }

        candidates
    }

    /// Spanish name for a feature the dataset has no value for.
    ///
    /// Prefers the ISO-2 display name (through the dataset aliases), then
    /// the language alias of the feature name, then the name itself.
    pub fn spanish_name(&self, feature: &GeoFeature) -> String {
        let fallback = feature.name().unwrap_or_else(|| UNNAMED_COUNTRY.to_string());

        if let Some(spanish) = feature
            .iso2()
            .and_then(|code| self.names.display_name(&code, Locale::Spanish))
        {
            return match self.aliases.dataset_labels.get(normalize(&spanish).as_str()) {
                Some(remap) => remap.to_string(),
                None => spanish,
            };
        }

        match self.aliases.language.get(normalize(&fallback).as_str()) {
            Some(alias) => alias.to_string(),
            None => fallback,
        }
    }

    fn iso_spanish_key(&self, feature: &GeoFeature) -> Option<NormalizedKey> {
        let code = feature.iso2()?;
        let spanish = self.names.display_name(&code, Locale::Spanish)?;
        let key = normalize(&spanish);
        (!key.is_empty()).then_some(key)
    }
}

impl Default for CountryMatcher {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FeatureResolver for CountryMatcher {
    fn kind(&self) -> MapKind {
        MapKind::World
    }

    fn index_key(&self, raw: &str) -> NormalizedKey {
        normalize(raw)
    }

    fn resolve(&self, feature: &GeoFeature, index: &ValueIndex) -> Option<Match> {
        let feature_name = feature.name().unwrap_or_else(|| UNNAMED_COUNTRY.to_string());
        let ctx = MatchContext {
            index,
            aliases: &self.aliases,
            feature_name: &feature_name,
        };

        for candidate in self.candidates(feature) {
            for strategy in &self.strategies {
                if let Some(hit) = strategy.try_resolve(&candidate, &ctx) {
                    debug!(
                        "Matched '{}' via {} on '{}' -> {}",
                        feature_name,
                        strategy.name(),
                        candidate,
                        hit.label
                    );
                    return Some(hit);
                }
            }
        }

        debug!("No data for feature '{}'", feature_name);
        None
    }

    fn display_name(&self, feature: &GeoFeature) -> String {
        self.spanish_name(feature)
    }

    fn is_visible(&self, feature: &GeoFeature) -> bool {
        let Some(name) = feature.name() else {
            return true;
        };
        !HIDDEN_WORLD_FEATURES.contains(&normalize(&name).as_str())
    }
}

/// Exact matcher for Mexican states and CDMX boroughs.
#[derive(Debug, Clone)]
pub struct RegionMatcher {
    kind: MapKind,
    aliases: Arc<AliasTables>,
}

impl RegionMatcher {
    pub fn new(kind: MapKind, aliases: Arc<AliasTables>) -> Self {
        Self { kind, aliases }
    }

    pub fn states(aliases: Arc<AliasTables>) -> Self {
        Self::new(MapKind::States, aliases)
    }

    pub fn boroughs(aliases: Arc<AliasTables>) -> Self {
        Self::new(MapKind::Boroughs, aliases)
    }
}

impl FeatureResolver for RegionMatcher {
    fn kind(&self) -> MapKind {
        self.kind
    }

    fn index_key(&self, raw: &str) -> NormalizedKey {
        self.aliases.admin_key(self.kind, raw)
    }

    fn resolve(&self, feature: &GeoFeature, index: &ValueIndex) -> Option<Match> {
        let name = feature.name()?;
        let key = self.index_key(&name);
        let entry = index.get(key.as_str())?;
        Some(Match {
            value: entry.value,
            label: self.entity_label(&entry.label),
        })
    }

    fn display_name(&self, feature: &GeoFeature) -> String {
        let name = feature.name().unwrap_or_default();
        self.entity_label(&name)
    }

    fn entity_label(&self, entity: &str) -> String {
        self.aliases.display_label(self.kind, entity)
    }
}

/// The resolver for a map kind, sharing the given tables and names.
pub fn matcher_for(
    kind: MapKind,
    aliases: Arc<AliasTables>,
    names: Arc<dyn RegionDisplayNames>,
) -> Arc<dyn FeatureResolver> {
    match kind {
        MapKind::World => Arc::new(CountryMatcher::new(aliases, names)),
        MapKind::States | MapKind::Boroughs => Arc::new(RegionMatcher::new(kind, aliases)),
    }
}

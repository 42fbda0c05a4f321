//! Per-variable snapshots: value range, ranking and panel metadata.

use choropleth_core::{
    normalize, DirectionPolicy, FeatureResolver, MapKind, NormalizedKey, ValueIndex, ValueRange,
};
use serde::Serialize;
use tracing::debug;

use crate::format::{format_source, unit_symbol, with_source_prefix, ValueFormat};
use crate::records::{non_blank, IndicatorRecord};

/// Description shown when no record of a variable has one.
pub const DEFAULT_DESCRIPTION: &str = "Sin descripción.";

/// Per-map-kind defaults for indicator panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindDefaults {
    /// Variable selected when a view first opens.
    pub default_variable: &'static str,
    /// Unit shown when no record of a variable has one.
    pub default_unit: &'static str,
    /// Name shown on the profile panel before anything is selected.
    pub entity_placeholder: &'static str,
}

impl KindDefaults {
    pub fn for_kind(kind: MapKind) -> Self {
        match kind {
            MapKind::World => Self {
                default_variable: "Tasa de participación económica femenina",
                default_unit: "Porcentaje",
                entity_placeholder: "País",
            },
            MapKind::States => Self {
                default_variable: "Tasa de participación económica femenina",
                default_unit: "Porcentaje",
                entity_placeholder: "Entidad",
            },
            MapKind::Boroughs => Self {
                default_variable: "Delitos sexuales",
                default_unit: "Valor",
                entity_placeholder: "Alcaldía",
            },
        }
    }
}

/// One row of an indicator ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntity {
    /// Join key on this kind of map.
    pub key: NormalizedKey,
    /// Entity name as the dataset spells it.
    pub entity: String,
    /// Name to display.
    pub label: String,
    pub value: f64,
    pub display_value: String,
}

/// Everything an indicator view needs for one variable.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSnapshot {
    pub variable: String,
    pub kind: MapKind,
    pub description: String,
    pub unit: String,
    pub unit_symbol: String,
    /// Source text with the `Fuente:` prefix, if any record has one.
    pub source: Option<String>,
    /// `source` split into display lines, note first.
    pub source_lines: Vec<String>,
    pub range: ValueRange,
    pub higher_is_better: bool,
    pub value_format: ValueFormat,
    /// Number of entities with a value.
    pub coverage: usize,
    /// Entities in ranking order for this variable.
    pub ranking: Vec<RankedEntity>,
    #[serde(skip)]
    index: ValueIndex,
}

impl IndicatorSnapshot {
    /// Build the snapshot of `variable` from its records.
    ///
    /// Returns `None` when there are no records.
    pub fn build(
        variable: &str,
        records: &[&IndicatorRecord],
        resolver: &dyn FeatureResolver,
        policy: &DirectionPolicy,
    ) -> Option<Self> {
        let kind = resolver.kind();
        let defaults = KindDefaults::for_kind(kind);
        let range = ValueRange::from_values(records.iter().map(|r| r.value))?;

        let description = first_non_blank(records, |r| r.description.as_deref())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
        let unit = first_non_blank(records, |r| r.unit.as_deref())
            .unwrap_or_else(|| defaults.default_unit.to_string());
        let source = first_non_blank(records, |r| r.source.as_deref()).map(|s| with_source_prefix(&s));
        let source_lines = source.as_deref().map(format_source).unwrap_or_default();

        let value_format = ValueFormat::for_variable(variable);
        let pairs: Vec<(&str, f64)> = records.iter().map(|r| (r.entity.as_str(), r.value)).collect();
        let index = resolver.build_index(&pairs);

        let mut ranking: Vec<RankedEntity> = records
            .iter()
            .map(|r| RankedEntity {
                key: resolver.index_key(&r.entity),
                entity: r.entity.clone(),
                label: resolver.entity_label(&r.entity),
                value: r.value,
                display_value: value_format.format(r.value),
            })
            .collect();
        policy.rank(variable, &mut ranking, |entry| entry.value);

        debug!(
            "Snapshot '{}' on {} map: {} entities, range {}..{}",
            variable,
            kind.as_str(),
            records.len(),
            range.min,
            range.max
        );

        Some(Self {
            variable: variable.to_string(),
            kind,
            description,
            unit_symbol: unit_symbol(kind, variable, &unit),
            unit,
            source,
            source_lines,
            range,
            higher_is_better: policy.is_higher_better(variable),
            value_format,
            coverage: records.len(),
            ranking,
            index,
        })
    }

    /// The snapshot's values keyed for feature matching.
    pub fn index(&self) -> &ValueIndex {
        &self.index
    }

    /// Whether an entity key has a value in this snapshot.
    pub fn contains(&self, key: &NormalizedKey) -> bool {
        self.index.get(key.as_str()).is_some()
    }

    /// The first entity in ranking order.
    pub fn top(&self) -> Option<&RankedEntity> {
        self.ranking.first()
    }

    /// Keep the previous selection if it has a value here, else pick the
    /// top-ranked entity.
    pub fn select(&self, previous: Option<&NormalizedKey>) -> Option<NormalizedKey> {
        match previous {
            Some(key) if self.contains(key) => Some(key.clone()),
            _ => self.top().map(|entry| entry.key.clone()),
        }
    }

    /// Position (1-based) of an entity in the ranking.
    pub fn rank_of(&self, key: &NormalizedKey) -> Option<usize> {
        self.ranking
            .iter()
            .position(|entry| &entry.key == key)
            .map(|i| i + 1)
    }
}

/// One variable on an entity's profile panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRow {
    pub variable: String,
    pub value: f64,
    pub display_value: String,
    pub unit_symbol: String,
}

/// Every variable the dataset has for one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityProfile {
    pub key: NormalizedKey,
    pub name: String,
    /// Sorted by variable name.
    pub rows: Vec<ProfileRow>,
}

impl EntityProfile {
    /// Build the profile for `key` from the entity's records.
    pub fn build(key: &NormalizedKey, records: &[&IndicatorRecord], resolver: &dyn FeatureResolver) -> Self {
        let kind = resolver.kind();
        let name = records
            .first()
            .map(|r| resolver.entity_label(&r.entity))
            .unwrap_or_else(|| KindDefaults::for_kind(kind).entity_placeholder.to_string());

        let mut rows: Vec<ProfileRow> = records
            .iter()
            .map(|r| {
                let format = ValueFormat::for_variable(&r.variable);
                ProfileRow {
                    variable: r.variable.clone(),
                    value: r.value,
                    display_value: format.format(r.value),
                    unit_symbol: unit_symbol(kind, &r.variable, r.unit.as_deref().unwrap_or("")),
                }
            })
            .collect();
        rows.sort_by(|a, b| variable_order(&a.variable, &b.variable));

        Self {
            key: key.clone(),
            name,
            rows,
        }
    }
}

fn first_non_blank<'a, F>(records: &[&'a IndicatorRecord], field: F) -> Option<String>
where
    F: Fn(&'a IndicatorRecord) -> Option<&'a str>,
{
    records
        .iter()
        .find_map(|r| non_blank(field(r)))
        .map(str::to_string)
}

/// Order variable names alphabetically, ignoring case and accents.
pub(crate) fn variable_order(a: &str, b: &str) -> std::cmp::Ordering {
    normalize(a).cmp(&normalize(b)).then_with(|| a.cmp(b))
}

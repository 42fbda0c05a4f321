//! Dataset payload parsing.

use std::collections::HashSet;

use choropleth_core::{
    normalize, DirectionPolicy, FeatureResolver, MapKind, NormalizedKey, ValueIndex, ValueRange,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::DataError;
use crate::records::{IndicatorRecord, NamedValue};
use crate::snapshot::{variable_order, EntityProfile, IndicatorSnapshot, KindDefaults};

/// The rows of a payload that is either an array or `{ "data": [...] }`.
fn payload_rows(payload: &Value) -> Result<&[Value], DataError> {
    match payload {
        Value::Array(rows) => Ok(rows),
        Value::Object(object) => object
            .get("data")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| DataError::UnexpectedShape("object without a data array".to_string())),
        Value::Null => Err(DataError::UnexpectedShape("null".to_string())),
        Value::Bool(_) => Err(DataError::UnexpectedShape("boolean".to_string())),
        Value::Number(_) => Err(DataError::UnexpectedShape("number".to_string())),
        Value::String(_) => Err(DataError::UnexpectedShape("string".to_string())),
    }
}

/// A state or borough indicator dataset.
#[derive(Debug, Clone, Default)]
pub struct IndicatorDataset {
    records: Vec<IndicatorRecord>,
    skipped: usize,
}

impl IndicatorDataset {
    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let payload: Value = serde_json::from_str(json)?;
        Self::from_value(&payload)
    }

    /// Read a parsed payload, keeping only well-formed records.
    ///
    /// Of several records for the same entity and variable the first wins.
    pub fn from_value(payload: &Value) -> Result<Self, DataError> {
        let rows = payload_rows(payload)?;
        let mut seen: HashSet<(NormalizedKey, String)> = HashSet::new();
        let mut records = Vec::with_capacity(rows.len());
        let mut skipped = 0;

        for row in rows {
            let Some(record) = IndicatorRecord::from_value(row) else {
                skipped += 1;
                continue;
            };
            if !seen.insert((normalize(&record.entity), record.variable.clone())) {
                debug!(
                    "Dropping duplicate record for '{}' / '{}'",
                    record.entity, record.variable
                );
                skipped += 1;
                continue;
            }
            records.push(record);
        }

        info!(
            "Loaded indicator dataset: {} records, {} skipped",
            records.len(),
            skipped
        );
        Ok(Self { records, skipped })
    }

    pub fn records(&self) -> &[IndicatorRecord] {
        &self.records
    }

    /// Rows dropped as malformed or duplicate.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct variable names, sorted alphabetically.
    pub fn variables(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut variables: Vec<String> = self
            .records
            .iter()
            .filter(|r| seen.insert(r.variable.as_str()))
            .map(|r| r.variable.clone())
            .collect();
        variables.sort_by(|a, b| variable_order(a, b));
        variables
    }

    /// The default variable for `kind` if present, else the first one.
    pub fn default_variable(&self, kind: MapKind) -> Option<String> {
        let preferred = KindDefaults::for_kind(kind).default_variable;
        let variables = self.variables();
        variables
            .iter()
            .find(|v| v.as_str() == preferred)
            .or_else(|| variables.first())
            .cloned()
    }

    /// Records of one variable, in dataset order.
    pub fn records_for(&self, variable: &str) -> Vec<&IndicatorRecord> {
        self.records.iter().filter(|r| r.variable == variable).collect()
    }

    /// Snapshot of `variable`, or `None` if the dataset has no such variable.
    pub fn snapshot(
        &self,
        variable: &str,
        resolver: &dyn FeatureResolver,
        policy: &DirectionPolicy,
    ) -> Option<IndicatorSnapshot> {
        IndicatorSnapshot::build(variable, &self.records_for(variable), resolver, policy)
    }

    /// Every variable of the entity whose key is `key`.
    pub fn profile(&self, key: &NormalizedKey, resolver: &dyn FeatureResolver) -> EntityProfile {
        let rows: Vec<&IndicatorRecord> = self
            .records
            .iter()
            .filter(|r| &resolver.index_key(&r.entity) == key)
            .collect();
        EntityProfile::build(key, &rows, resolver)
    }
}

/// The world dataset: one value per country.
#[derive(Debug, Clone, Default)]
pub struct WorldDataset {
    items: Vec<NamedValue>,
    skipped: usize,
}

impl WorldDataset {
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let payload: Value = serde_json::from_str(json)?;
        Self::from_value(&payload)
    }

    /// Read `{pais, tpe}` (or `{name, value}`) rows, dropping the rest.
    pub fn from_value(payload: &Value) -> Result<Self, DataError> {
        let rows = payload_rows(payload)?;
        let items: Vec<NamedValue> = rows.iter().filter_map(NamedValue::from_value).collect();
        let skipped = rows.len() - items.len();
        info!(
            "Loaded world dataset: {} countries, {} skipped",
            items.len(),
            skipped
        );
        Ok(Self { items, skipped })
    }

    pub fn items(&self) -> &[NamedValue] {
        &self.items
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn range(&self) -> Option<ValueRange> {
        ValueRange::from_values(self.items.iter().map(|item| item.value))
    }

    /// Countries sorted by value, highest first. Ties keep dataset order.
    pub fn ranking(&self) -> Vec<NamedValue> {
        let mut ranking = self.items.clone();
        ranking.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranking
    }

    /// Index the countries with the resolver's key function.
    pub fn index(&self, resolver: &dyn FeatureResolver) -> ValueIndex {
        let pairs: Vec<(&str, f64)> = self
            .items
            .iter()
            .map(|item| (item.name.as_str(), item.value))
            .collect();
        resolver.build_index(&pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use choropleth_core::{AliasTables, RegionMatcher};
    use serde_json::json;
    use std::sync::Arc;

    fn sample() -> Value {
        json!({"data": [
            {"Entidad": "Jalisco", "Variable": "Informalidad", "Valor": 48.0},
            {"Entidad": "Sonora", "Variable": "Informalidad", "Valor": 40.0},
            {"Entidad": "Jalisco", "Variable": "Embarazo adolescente", "Valor": 12.5},
            {"Entidad": "JALISCO", "Variable": "Informalidad", "Valor": 99.0},
            {"Entidad": "Sonora", "Variable": "Informalidad", "Valor": "n/d"},
            {"Entidad": "Sonora"}
        ]})
    }

    #[test]
    fn test_both_payload_shapes() {
        let wrapped = IndicatorDataset::from_value(&sample()).unwrap();
        assert_eq!(wrapped.records().len(), 3);
        assert_eq!(wrapped.skipped(), 3);

        let bare = IndicatorDataset::from_value(&sample()["data"]).unwrap();
        assert_eq!(bare.records(), wrapped.records());
    }

    #[test]
    fn test_unexpected_shapes() {
        for payload in [json!({"rows": []}), json!("data"), json!(null), json!(3)] {
            assert!(matches!(
                IndicatorDataset::from_value(&payload),
                Err(DataError::UnexpectedShape(_))
            ));
        }
        assert!(matches!(
            IndicatorDataset::from_json("{not json"),
            Err(DataError::Json(_))
        ));
    }

    #[test]
    fn test_first_duplicate_wins() {
        let dataset = IndicatorDataset::from_value(&sample()).unwrap();
        let jalisco: Vec<f64> = dataset
            .records_for("Informalidad")
            .iter()
            .filter(|r| r.entity.eq_ignore_ascii_case("jalisco"))
            .map(|r| r.value)
            .collect();
        assert_eq!(jalisco, vec![48.0]);
    }

    #[test]
    fn test_variables_sorted_and_default() {
        let dataset = IndicatorDataset::from_value(&sample()).unwrap();
        assert_eq!(dataset.variables(), vec!["Embarazo adolescente", "Informalidad"]);
        assert_eq!(
            dataset.default_variable(MapKind::States).as_deref(),
            Some("Embarazo adolescente")
        );

        let with_default = IndicatorDataset::from_value(&json!([
            {"Entidad": "Jalisco", "Variable": "Informalidad", "Valor": 1.0},
            {"Entidad": "Jalisco", "Variable": "Tasa de participación económica femenina", "Valor": 2.0}
        ]))
        .unwrap();
        assert_eq!(
            with_default.default_variable(MapKind::States).as_deref(),
            Some("Tasa de participación económica femenina")
        );
        assert_eq!(IndicatorDataset::default().default_variable(MapKind::States), None);
    }

    #[test]
    fn test_snapshot_and_profile() {
        let dataset = IndicatorDataset::from_value(&sample()).unwrap();
        let resolver = RegionMatcher::states(Arc::new(AliasTables::builtin()));
        let policy = DirectionPolicy::builtin();
        let snapshot = dataset.snapshot("Informalidad", &resolver, &policy).unwrap();
        assert_eq!(snapshot.coverage, 2);
        assert!(dataset.snapshot("Feminicidios", &resolver, &policy).is_none());

        let profile = dataset.profile(&normalize("Jalisco"), &resolver);
        assert_eq!(profile.rows.len(), 2);
    }

    #[test]
    fn test_world_dataset() {
        let world = WorldDataset::from_value(&json!([
            {"pais": "México", "tpe": 46.2},
            {"pais": "Rusia", "tpe": 55.1},
            {"pais": "Chile", "tpe": 52.3},
            {"pais": "Sin dato", "tpe": null}
        ]))
        .unwrap();
        assert_eq!(world.items().len(), 3);
        assert_eq!(world.skipped(), 1);
        assert_eq!(world.range(), Some(ValueRange { min: 46.2, max: 55.1 }));
        let names: Vec<String> = world.ranking().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Rusia", "Chile", "México"]);
    }
}

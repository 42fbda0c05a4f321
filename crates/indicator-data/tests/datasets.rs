//! Integration tests for indicator datasets.
//!
//! Run with: cargo test -p indicator-data --test datasets

use std::sync::Arc;

use choropleth_core::{
    normalize, AliasTables, CountryMatcher, DirectionPolicy, FeatureResolver, GeoFeature, MapKind,
    RegionMatcher,
};
use indicator_data::{IndicatorDataset, WorldDataset};

const STATES: &str = r#"{
  "data": [
    {"Entidad": "Ciudad de México", "Variable": "Tasa de participación económica femenina", "Valor": 52.3,
     "Que_mide": "Mujeres ocupadas o buscando empleo", "Unidad": "Porcentaje",
     "Fuente": "INEGI, ENOE 2024. Nota: promedio anual."},
    {"Entidad": "Chiapas", "Variable": "Tasa de participación económica femenina", "Valor": 33.1},
    {"Entidad": "Veracruz de Ignacio de la Llave", "Variable": "Tasa de participación económica femenina", "Valor": 39.8},
    {"Entidad": "Chiapas", "Variable": "Feminicidios", "Valor": 1.4, "Unidad": "Tasa"},
    {"Entidad": "Veracruz de Ignacio de la Llave", "Variable": "Feminicidios", "Valor": 2.2},
    {"Entidad": "Chiapas", "Variable": "Permisos de paternidad", "Valor": 812.6, "Unidad": "Número"},
    {"Entidad": "Chiapas", "Variable": "Feminicidios", "Valor": 9.9},
    {"Entidad": "", "Variable": "Feminicidios", "Valor": 1.0},
    {"Entidad": "Sonora", "Variable": "Feminicidios", "Valor": null}
  ]
}"#;

const WORLD: &str = r#"[
  {"pais": "Alemania", "tpe": 56.0},
  {"pais": "Rusia", "tpe": 55.0},
  {"pais": "México", "tpe": 46.2},
  {"pais": "Sudáfrica", "tpe": 49.9}
]"#;

fn states() -> RegionMatcher {
    RegionMatcher::states(Arc::new(AliasTables::builtin()))
}

// ============================================================================
// State datasets
// ============================================================================

mod state_tests {
    use super::*;

    #[test]
    fn test_malformed_and_duplicate_rows_are_counted() {
        let dataset = IndicatorDataset::from_json(STATES).unwrap();
        assert_eq!(dataset.records().len(), 6);
        assert_eq!(dataset.skipped(), 3);
    }

    #[test]
    fn test_default_variable_snapshot() {
        let dataset = IndicatorDataset::from_json(STATES).unwrap();
        let variable = dataset.default_variable(MapKind::States).unwrap();
        assert_eq!(variable, "Tasa de participación económica femenina");

        let snapshot = dataset
            .snapshot(&variable, &states(), &DirectionPolicy::builtin())
            .unwrap();
        assert!(snapshot.higher_is_better);
        assert_eq!(snapshot.description, "Mujeres ocupadas o buscando empleo");
        assert_eq!(snapshot.unit_symbol, "%");
        assert_eq!(
            snapshot.source_lines,
            vec!["Nota: promedio anual.", "Fuente: INEGI, ENOE 2024"]
        );
        let labels: Vec<&str> = snapshot.ranking.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Ciudad de México", "Veracruz", "Chiapas"]);
    }

    #[test]
    fn test_count_variables_hide_percent_symbol() {
        let dataset = IndicatorDataset::from_json(STATES).unwrap();
        let snapshot = dataset
            .snapshot("Feminicidios", &states(), &DirectionPolicy::builtin())
            .unwrap();
        assert_eq!(snapshot.unit_symbol, "");
        assert!(!snapshot.higher_is_better);
        assert_eq!(snapshot.top().map(|r| r.value), Some(1.4));
    }

    #[test]
    fn test_snapshot_index_matches_state_features() {
        let dataset = IndicatorDataset::from_json(STATES).unwrap();
        let resolver = states();
        let snapshot = dataset
            .snapshot("Feminicidios", &resolver, &DirectionPolicy::builtin())
            .unwrap();
        let hit = resolver.resolve(&GeoFeature::named("Veracruz"), snapshot.index());
        assert_eq!(hit.map(|m| m.value), Some(2.2));
        assert!(resolver
            .resolve(&GeoFeature::named("Sonora"), snapshot.index())
            .is_none());
    }

    #[test]
    fn test_profile_lists_every_variable() {
        let dataset = IndicatorDataset::from_json(STATES).unwrap();
        let profile = dataset.profile(&normalize("Chiapas"), &states());
        let rows: Vec<(&str, &str)> = profile
            .rows
            .iter()
            .map(|r| (r.variable.as_str(), r.display_value.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Feminicidios", "1.4"),
                ("Permisos de paternidad", "813"),
                ("Tasa de participación económica femenina", "33.1"),
            ]
        );
    }
}

// ============================================================================
// World dataset
// ============================================================================

mod world_tests {
    use super::*;

    #[test]
    fn test_world_index_resolves_english_features() {
        let dataset = WorldDataset::from_json(WORLD).unwrap();
        let matcher = CountryMatcher::builtin();
        let index = dataset.index(&matcher);

        let russia = matcher.resolve(&GeoFeature::named("Russian Federation"), &index);
        assert_eq!(russia.map(|m| m.label), Some("Rusia".to_string()));
        assert!(matcher
            .resolve(&GeoFeature::named("Atlantis"), &index)
            .is_none());
    }

    #[test]
    fn test_world_ranking_is_descending() {
        let dataset = WorldDataset::from_json(WORLD).unwrap();
        let names: Vec<String> = dataset.ranking().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Alemania", "Rusia", "Sudáfrica", "México"]);
    }
}

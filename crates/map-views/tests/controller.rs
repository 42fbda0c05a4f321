//! Integration tests for the view controller.
//!
//! Run with: cargo test -p map-views --test controller
//!
//! Documents are served from memory; a location can be gated so its fetch
//! blocks until the test releases it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use choropleth_core::{normalize, AliasTables, BuiltinDisplayNames, MapKind};
use map_views::{
    async_trait, DocumentFetcher, MapSurface, MonitorConfig, SectionView, ViewController,
    ViewError, ViewOutcome, ViewRequest,
};
use serde_json::{json, Value};
use tokio::sync::Notify;

struct MockFetcher {
    documents: HashMap<String, Value>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    started: Arc<Notify>,
}

impl MockFetcher {
    fn new(documents: Vec<(&str, Value)>) -> Self {
        Self {
            documents: documents
                .into_iter()
                .map(|(location, doc)| (location.to_string(), doc))
                .collect(),
            gates: Mutex::new(HashMap::new()),
            started: Arc::new(Notify::new()),
        }
    }

    /// Block fetches of `location` until the returned gate is notified.
    fn gate(&self, location: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(location.to_string(), Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl DocumentFetcher for MockFetcher {
    async fn fetch(&self, location: &str) -> Result<Value, ViewError> {
        let gate = self.gates.lock().unwrap().get(location).cloned();
        if let Some(gate) = gate {
            self.started.notify_one();
            gate.notified().await;
        }
        self.documents
            .get(location)
            .cloned()
            .ok_or_else(|| ViewError::Status {
                location: location.to_string(),
                status: 404,
            })
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config() -> MonitorConfig {
    MonitorConfig::builder()
        .world_geojson("world.geojson")
        .mexico_geojson("mexico.geojson")
        .cdmx_geojson(["cdmx.geojson"])
        .world_data("world.json")
        .states_data("states.json")
        .boroughs_data("boroughs.json")
        .build()
}

fn world_data() -> Value {
    json!([
        {"pais": "Chile", "tpe": 45.0},
        {"pais": "Rusia", "tpe": 55.0},
        {"pais": "México", "tpe": 40.0},
        {"pais": "Sin dato", "tpe": "n/d"}
    ])
}

fn world_geometry() -> Value {
    json!({"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"name": "Russian Federation"}, "geometry": null},
        {"type": "Feature", "properties": {"name": "Chile"}, "geometry": null},
        {"type": "Feature", "properties": {"name": "Atlantis"}, "geometry": null},
        {"type": "Feature", "properties": {"name": "Antarctica"}, "geometry": null}
    ]})
}

fn states_data() -> Value {
    json!({"data": [
        {"Entidad": "Chiapas", "Variable": "Embarazo adolescente", "Valor": 19.4,
         "Unidad": "Tasa", "Fuente": "INEGI. Nota: cifras preliminares"},
        {"Entidad": "Veracruz de Ignacio de la Llave", "Variable": "Embarazo adolescente", "Valor": 11.2},
        {"Entidad": "Sonora", "Variable": "Embarazo adolescente", "Valor": 14.8},
        {"Entidad": "Jalisco", "Variable": "Informalidad", "Valor": 48.0},
        {"Entidad": "Sonora", "Variable": "Informalidad", "Valor": 40.0},
        {"Entidad": "Sonora", "Variable": "Informalidad"}
    ]})
}

fn states_geometry() -> Value {
    json!({"features": [
        {"properties": {"name": "Veracruz"}},
        {"properties": {"name": "Chiapas"}},
        {"properties": {"name": "Sonora"}},
        {"properties": {"name": "Jalisco"}}
    ]})
}

fn controller(fetcher: Arc<MockFetcher>, config: MonitorConfig) -> Arc<ViewController> {
    Arc::new(ViewController::new(
        config,
        fetcher,
        AliasTables::builtin(),
        Arc::new(BuiltinDisplayNames),
    ))
}

fn applied(outcome: ViewOutcome) -> SectionView {
    match outcome {
        ViewOutcome::Applied(view) => view,
        ViewOutcome::Stale { generation, latest } => {
            panic!("request {} unexpectedly stale (latest {})", generation, latest)
        }
    }
}

// ============================================================================
// World view
// ============================================================================

mod world_tests {
    use super::*;

    #[tokio::test]
    async fn test_world_view_paints_matched_countries() {
        let fetcher = Arc::new(MockFetcher::new(vec![
            ("world.json", world_data()),
            ("world.geojson", world_geometry()),
        ]));
        let view = applied(controller(fetcher, config()).show(ViewRequest::World).await);

        let SectionView::World(world) = view else {
            panic!("expected world view");
        };
        let names: Vec<&str> = world.ranking.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Rusia", "Chile", "México"]);
        assert_eq!(world.range.min, 40.0);
        assert_eq!(world.range.max, 55.0);

        let MapSurface::Geographic { features } = world.surface else {
            panic!("expected geographic surface");
        };
        assert_eq!(features.len(), 3, "Antarctica is never drawn");
        assert_eq!(features[0].label, "Rusia");
        assert_eq!(features[0].value, Some(55.0));
        assert_eq!(features[0].display_value.as_deref(), Some("55.0"));
        assert_eq!(features[0].fill, "rgb(127, 121, 251)");
        assert_eq!(features[2].value, None);
        assert_eq!(features[2].fill, "rgb(236, 234, 245)");
    }

    #[tokio::test]
    async fn test_world_geometry_failure_draws_fallback_grid() {
        let fetcher = Arc::new(MockFetcher::new(vec![("world.json", world_data())]));
        let config = MonitorConfig {
            fallback_cells: 2,
            ..config()
        };
        let view = applied(controller(fetcher, config).show(ViewRequest::World).await);

        let SectionView::World(world) = view else {
            panic!("expected world view");
        };
        let MapSurface::Fallback { cells } = world.surface else {
            panic!("expected fallback surface");
        };
        let titles: Vec<&str> = cells.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Rusia: 55.0%", "Chile: 45.0%"]);
        assert_eq!(world.ranking.len(), 3);
    }

    #[tokio::test]
    async fn test_world_dataset_failure_is_an_error_view() {
        let fetcher = Arc::new(MockFetcher::new(vec![("world.geojson", world_geometry())]));
        let view = applied(controller(fetcher, config()).show(ViewRequest::World).await);
        assert!(matches!(view, SectionView::Error { .. }));
        assert_eq!(
            view.message(),
            Some("Error al cargar los datos: No se pudo leer world.json (HTTP 404)")
        );
    }

    #[tokio::test]
    async fn test_empty_world_dataset() {
        let fetcher = Arc::new(MockFetcher::new(vec![
            ("world.json", json!({"data": []})),
            ("world.geojson", world_geometry()),
        ]));
        let view = applied(controller(fetcher, config()).show(ViewRequest::World).await);
        assert_eq!(view.message(), Some("No hay datos disponibles para el mapa."));
    }
}

// ============================================================================
// Indicator views
// ============================================================================

mod indicator_tests {
    use super::*;

    fn fetcher() -> Arc<MockFetcher> {
        Arc::new(MockFetcher::new(vec![
            ("states.json", states_data()),
            ("mexico.geojson", states_geometry()),
        ]))
    }

    #[tokio::test]
    async fn test_states_view_selects_top_ranked_entity() {
        let view = applied(
            controller(fetcher(), config())
                .show(ViewRequest::indicator(MapKind::States))
                .await,
        );
        let SectionView::Indicator(indicator) = view else {
            panic!("expected indicator view");
        };

        assert_eq!(indicator.variables, vec!["Embarazo adolescente", "Informalidad"]);
        assert_eq!(indicator.variable(), "Embarazo adolescente");
        assert!(!indicator.snapshot.higher_is_better);
        assert_eq!(indicator.snapshot.unit_symbol, "%");
        assert_eq!(
            indicator.snapshot.source_lines,
            vec!["Nota: cifras preliminares", "Fuente: INEGI"]
        );

        let labels: Vec<&str> = indicator
            .snapshot
            .ranking
            .iter()
            .map(|r| r.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Veracruz", "Sonora", "Chiapas"]);

        let veracruz = normalize("Veracruz de Ignacio de la Llave");
        assert_eq!(indicator.selected, Some(veracruz.clone()));
        assert_eq!(indicator.profile.as_ref().map(|p| p.name.as_str()), Some("Veracruz"));

        let MapSurface::Geographic { features } = indicator.surface else {
            panic!("expected geographic surface");
        };
        let selected: Vec<&str> = features
            .iter()
            .filter(|f| f.selected)
            .map(|f| f.label.as_str())
            .collect();
        assert_eq!(selected, vec!["Veracruz"]);
        assert_eq!(features[0].display_value.as_deref(), Some("11.20"));
        assert_eq!(features[3].value, None, "Jalisco has no teen pregnancy value");
    }

    #[tokio::test]
    async fn test_selection_carries_over_between_variables() {
        let controller = controller(fetcher(), config());
        applied(
            controller
                .show(ViewRequest::Indicator {
                    kind: MapKind::States,
                    variable: None,
                    entity: Some("Sonora".to_string()),
                })
                .await,
        );

        let view = applied(
            controller
                .show(ViewRequest::Indicator {
                    kind: MapKind::States,
                    variable: Some("Informalidad".to_string()),
                    entity: None,
                })
                .await,
        );
        assert_eq!(view.selected(), Some(&normalize("Sonora")));

        let SectionView::Indicator(indicator) = view else {
            panic!("expected indicator view");
        };
        assert_eq!(indicator.snapshot.coverage, 2);
        assert_eq!(indicator.profile.map(|p| p.rows.len()), Some(2));
    }

    #[tokio::test]
    async fn test_unknown_variable_falls_back_to_default() {
        let view = applied(
            controller(fetcher(), config())
                .show(ViewRequest::Indicator {
                    kind: MapKind::States,
                    variable: Some("Feminicidios".to_string()),
                    entity: None,
                })
                .await,
        );
        let SectionView::Indicator(indicator) = view else {
            panic!("expected indicator view");
        };
        assert_eq!(indicator.variable(), "Embarazo adolescente");
    }

    #[tokio::test]
    async fn test_missing_geometry_keeps_panels() {
        let fetcher = Arc::new(MockFetcher::new(vec![("states.json", states_data())]));
        let view = applied(
            controller(fetcher, config())
                .show(ViewRequest::indicator(MapKind::States))
                .await,
        );
        let SectionView::Indicator(indicator) = view else {
            panic!("expected indicator view");
        };
        assert_eq!(
            indicator.surface,
            MapSurface::unavailable("No fue posible cargar el mapa de México.")
        );
        assert_eq!(indicator.snapshot.ranking.len(), 3);
    }

    #[tokio::test]
    async fn test_geometry_without_features() {
        let fetcher = Arc::new(MockFetcher::new(vec![
            ("states.json", states_data()),
            ("mexico.geojson", json!({"type": "FeatureCollection", "features": []})),
        ]));
        let view = applied(
            controller(fetcher, config())
                .show(ViewRequest::indicator(MapKind::States))
                .await,
        );
        let SectionView::Indicator(indicator) = view else {
            panic!("expected indicator view");
        };
        assert_eq!(
            indicator.surface,
            MapSurface::unavailable("El archivo del mapa no contiene entidades.")
        );
    }

    #[tokio::test]
    async fn test_empty_states_dataset() {
        let fetcher = Arc::new(MockFetcher::new(vec![
            ("states.json", json!([{"Entidad": "Sonora"}])),
            ("mexico.geojson", states_geometry()),
        ]));
        let view = applied(
            controller(fetcher, config())
                .show(ViewRequest::indicator(MapKind::States))
                .await,
        );
        assert_eq!(
            view.message(),
            Some("No hay datos disponibles para el mapa por entidad.")
        );
    }

    #[tokio::test]
    async fn test_boroughs_use_second_geometry_source() {
        init_tracing();
        let fetcher = Arc::new(MockFetcher::new(vec![
            (
                "boroughs.json",
                json!([
                    {"Entidad": "Gustavo A. Madero", "Variable": "Delitos sexuales", "Valor": 310.0, "Unidad": "Tasa"},
                    {"Entidad": "Coyoacán", "Variable": "Delitos sexuales", "Valor": 120.0},
                    {"Entidad": "Coyoacán", "Variable": "Feminicidios", "Valor": 2.0}
                ]),
            ),
            (
                "remote-cdmx.geojson",
                json!({"features": [
                    {"properties": {"NOMGEO": "G. A. Madero"}},
                    {"properties": {"NOMGEO": "Coyoacan"}}
                ]}),
            ),
        ]));
        let config = MonitorConfig::builder()
            .cdmx_geojson(["missing-local.geojson", "remote-cdmx.geojson"])
            .boroughs_data("boroughs.json")
            .build();
        let view = applied(
            controller(fetcher, config)
                .show(ViewRequest::indicator(MapKind::Boroughs))
                .await,
        );
        let SectionView::Indicator(indicator) = view else {
            panic!("expected indicator view");
        };
        assert_eq!(indicator.variable(), "Delitos sexuales");
        assert_eq!(indicator.snapshot.unit_symbol, "");

        let MapSurface::Geographic { features } = indicator.surface else {
            panic!("expected geographic surface");
        };
        let values: Vec<Option<f64>> = features.iter().map(|f| f.value).collect();
        assert_eq!(values, vec![Some(310.0), Some(120.0)]);
    }
}

// ============================================================================
// Generations
// ============================================================================

mod generation_tests {
    use super::*;

    #[tokio::test]
    async fn test_slow_earlier_request_is_discarded() {
        init_tracing();
        let fetcher = Arc::new(MockFetcher::new(vec![
            ("world.json", world_data()),
            ("world.geojson", world_geometry()),
            ("states.json", states_data()),
            ("mexico.geojson", states_geometry()),
        ]));
        let gate = fetcher.gate("world.json");
        let started = Arc::clone(&fetcher.started);
        let controller = controller(fetcher, config());

        let slow = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.show(ViewRequest::World).await })
        };
        started.notified().await;

        let fast = controller
            .show(ViewRequest::indicator(MapKind::States))
            .await;
        assert!(!fast.is_stale());

        gate.notify_one();
        let outcome = slow.await.unwrap();
        match outcome {
            ViewOutcome::Stale { generation, latest } => {
                assert_eq!(generation, 1);
                assert_eq!(latest, 2);
            }
            ViewOutcome::Applied(_) => panic!("stale world view was applied"),
        }

        let current = controller.current().await.unwrap();
        assert_eq!(current.kind(), Some(MapKind::States));
        assert_eq!(controller.generation(), 2);
    }

    #[tokio::test]
    async fn test_sequential_requests_all_apply() {
        let fetcher = Arc::new(MockFetcher::new(vec![
            ("world.json", world_data()),
            ("world.geojson", world_geometry()),
        ]));
        let controller = controller(fetcher, config());
        for _ in 0..3 {
            assert!(!controller.show(ViewRequest::World).await.is_stale());
        }
        assert_eq!(controller.generation(), 3);
        assert!(controller.current().await.is_some());
    }

    #[tokio::test]
    async fn test_controller_exposes_its_fetcher() {
        let fetcher = Arc::new(MockFetcher::new(vec![("states.json", states_data())]));
        let controller = controller(fetcher, config());
        let location = controller.config().data_source(MapKind::States);

        let document = controller.fetcher().fetch(location).await.unwrap();
        assert_eq!(document, states_data());
        assert!(matches!(
            controller.fetcher().fetch("missing.json").await,
            Err(ViewError::Status { status: 404, .. })
        ));
    }
}

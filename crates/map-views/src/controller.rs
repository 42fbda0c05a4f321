//! Generation-counted loading of section views.
//!
//! Every request takes a new generation number before it starts fetching.
//! When its documents arrive the result is applied only if no newer request
//! has started in the meantime; otherwise it is reported as stale and
//! dropped, so the latest selection always wins regardless of the order in
//! which fetches resolve.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use choropleth_core::{
    features_from_collection, matcher_for, AliasOverrides, AliasTables, BuiltinDisplayNames,
    DirectionPolicy, FeatureResolver, MapKind, NormalizedKey, RegionDisplayNames,
};
use indicator_data::{IndicatorDataset, WorldDataset};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::ViewError;
use crate::fetch::{fetch_first, DocumentFetcher, HttpFetcher};
use crate::view::{
    dataset_error_message, fallback_cells, indicator_surface, paint_features, IndicatorView,
    MapSurface, SectionView, SurfaceMessages, TooltipFormat, WorldView, WORLD_NO_DATA,
};

/// A selection to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewRequest {
    /// The world participation map.
    World,
    /// A state or borough indicator map.
    Indicator {
        kind: MapKind,
        /// Variable to show; the kind's default when `None` or unknown.
        variable: Option<String>,
        /// Entity to select; the previous selection or the top-ranked
        /// entity when `None`.
        entity: Option<String>,
    },
}

impl ViewRequest {
    pub fn indicator(kind: MapKind) -> Self {
        Self::Indicator {
            kind,
            variable: None,
            entity: None,
        }
    }

    pub fn kind(&self) -> MapKind {
        match self {
            Self::World => MapKind::World,
            Self::Indicator { kind, .. } => *kind,
        }
    }
}

/// Result of a request.
#[derive(Debug, Clone)]
pub enum ViewOutcome {
    /// The view was built and is now current.
    Applied(SectionView),
    /// A newer request started first; this result was discarded.
    Stale { generation: u64, latest: u64 },
}

impl ViewOutcome {
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }

    /// The applied view, if any.
    pub fn into_view(self) -> Option<SectionView> {
        match self {
            Self::Applied(view) => Some(view),
            Self::Stale { .. } => None,
        }
    }
}

/// Loads section views and keeps the latest one.
pub struct ViewController {
    config: MonitorConfig,
    fetcher: Arc<dyn DocumentFetcher>,
    world: Arc<dyn FeatureResolver>,
    states: Arc<dyn FeatureResolver>,
    boroughs: Arc<dyn FeatureResolver>,
    policy: DirectionPolicy,
    generation: AtomicU64,
    current: RwLock<Option<SectionView>>,
}

impl ViewController {
    /// Create a controller over the given tables and display names.
    pub fn new(
        config: MonitorConfig,
        fetcher: Arc<dyn DocumentFetcher>,
        aliases: AliasTables,
        names: Arc<dyn RegionDisplayNames>,
    ) -> Self {
        let policy = DirectionPolicy::from_aliases(&aliases);
        let aliases = Arc::new(aliases);
        let resolver = |kind| matcher_for(kind, Arc::clone(&aliases), Arc::clone(&names));

        Self {
            config,
            fetcher,
            world: resolver(MapKind::World),
            states: resolver(MapKind::States),
            boroughs: resolver(MapKind::Boroughs),
            policy,
            generation: AtomicU64::new(0),
            current: RwLock::new(None),
        }
    }

    /// Create a controller with the HTTP fetcher, loading the alias file
    /// named in the configuration.
    pub async fn from_config(config: MonitorConfig) -> Result<Self, ViewError> {
        let fetcher: Arc<dyn DocumentFetcher> = Arc::new(HttpFetcher::new(config.fetch_timeout)?);
        let aliases = load_aliases(fetcher.as_ref(), config.alias_file.as_deref()).await?;
        Ok(Self::new(config, fetcher, aliases, Arc::new(BuiltinDisplayNames)))
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// The fetcher used for datasets and geometry.
    pub fn fetcher(&self) -> &dyn DocumentFetcher {
        self.fetcher.as_ref()
    }

    pub fn policy(&self) -> &DirectionPolicy {
        &self.policy
    }

    /// The resolver used for a map kind.
    pub fn resolver(&self, kind: MapKind) -> Arc<dyn FeatureResolver> {
        match kind {
            MapKind::World => Arc::clone(&self.world),
            MapKind::States => Arc::clone(&self.states),
            MapKind::Boroughs => Arc::clone(&self.boroughs),
        }
    }

    /// The latest generation handed out.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// The view currently applied.
    pub async fn current(&self) -> Option<SectionView> {
        self.current.read().await.clone()
    }

    /// Load a selection and apply it unless a newer one started meanwhile.
    pub async fn show(&self, request: ViewRequest) -> ViewOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Request {} for {:?}", generation, request);

        let view = match request {
            ViewRequest::World => self.load_world().await,
            ViewRequest::Indicator {
                kind: MapKind::World,
                ..
            } => self.load_world().await,
            ViewRequest::Indicator {
                kind,
                variable,
                entity,
            } => {
                let previous = self.previous_selection(kind).await;
                let requested = entity
                    .map(|e| self.resolver(kind).index_key(&e))
                    .or(previous);
                self.load_indicator(kind, variable.as_deref(), requested).await
            }
        };

        self.apply(generation, view).await
    }

    async fn apply(&self, generation: u64, view: SectionView) -> ViewOutcome {
        let mut current = self.current.write().await;
        let latest = self.generation.load(Ordering::SeqCst);
        if generation != latest {
            info!(
                "Discarding stale view from request {} (latest {})",
                generation, latest
            );
            return ViewOutcome::Stale { generation, latest };
        }

        debug!("Applying view from request {}", generation);
        *current = Some(view.clone());
        ViewOutcome::Applied(view)
    }

    async fn previous_selection(&self, kind: MapKind) -> Option<NormalizedKey> {
        let current = self.current.read().await;
        current
            .as_ref()
            .filter(|view| view.kind() == Some(kind))
            .and_then(|view| view.selected().cloned())
    }

    async fn load_documents(&self, kind: MapKind) -> (Result<Value, ViewError>, Result<Value, ViewError>) {
        let geometry_sources = self.config.geometry_sources(kind);
        tokio::join!(
            self.fetcher.fetch(self.config.data_source(kind)),
            fetch_first(self.fetcher.as_ref(), &geometry_sources),
        )
    }

    async fn load_world(&self) -> SectionView {
        let (data, geometry) = self.load_documents(MapKind::World).await;

        let dataset = match data.and_then(|v| WorldDataset::from_value(&v).map_err(ViewError::from)) {
            Ok(dataset) => dataset,
            Err(e) => {
                warn!("World dataset unavailable: {}", e);
                return SectionView::Error {
                    message: dataset_error_message(&e),
                };
            }
        };

        let Some(range) = dataset.range() else {
            return SectionView::Empty {
                message: WORLD_NO_DATA.to_string(),
            };
        };
        let ranking = dataset.ranking();
        let resolver = self.resolver(MapKind::World);

        let features = match geometry {
            Ok(document) => features_from_collection(&document),
            Err(e) => {
                warn!("World geometry unavailable, drawing fallback grid: {}", e);
                Vec::new()
            }
        };

        let surface = if features.is_empty() {
            MapSurface::Fallback {
                cells: fallback_cells(&ranking, &range, &self.config.colors, self.config.fallback_cells),
            }
        } else {
            MapSurface::Geographic {
                features: paint_features(
                    &features,
                    resolver.as_ref(),
                    &dataset.index(resolver.as_ref()),
                    &range,
                    &self.config.colors,
                    TooltipFormat::World,
                    None,
                ),
            }
        };

        info!("Built world view: {} countries", ranking.len());
        SectionView::World(WorldView {
            range,
            ranking,
            surface,
        })
    }

    async fn load_indicator(
        &self,
        kind: MapKind,
        variable: Option<&str>,
        requested: Option<NormalizedKey>,
    ) -> SectionView {
        let (data, geometry) = self.load_documents(kind).await;
        let messages = SurfaceMessages::for_kind(kind);

        let dataset = match data.and_then(|v| IndicatorDataset::from_value(&v).map_err(ViewError::from)) {
            Ok(dataset) => dataset,
            Err(e) => {
                warn!("{} dataset unavailable: {}", kind.as_str(), e);
                return SectionView::Error {
                    message: dataset_error_message(&e),
                };
            }
        };

        let variables = dataset.variables();
        let chosen = match variable {
            Some(v) if variables.iter().any(|known| known == v) => Some(v.to_string()),
            Some(v) => {
                warn!("Unknown variable '{}' on {} map, using default", v, kind.as_str());
                dataset.default_variable(kind)
            }
            None => dataset.default_variable(kind),
        };

        let resolver = self.resolver(kind);
        let Some(snapshot) = chosen
            .as_deref()
            .and_then(|v| dataset.snapshot(v, resolver.as_ref(), &self.policy))
        else {
            return SectionView::Empty {
                message: messages.no_data.to_string(),
            };
        };

        let selected = snapshot.select(requested.as_ref());
        let profile = selected
            .as_ref()
            .map(|key| dataset.profile(key, resolver.as_ref()));
        let surface = indicator_surface(
            geometry.as_ref(),
            &snapshot,
            resolver.as_ref(),
            &self.config.colors,
            selected.as_ref(),
        );

        info!(
            "Built {} view for '{}': {} entities",
            kind.as_str(),
            snapshot.variable,
            snapshot.coverage
        );
        SectionView::Indicator(IndicatorView {
            kind,
            variables,
            snapshot,
            selected,
            profile,
            surface,
        })
    }
}

/// Builtin alias tables, extended from a JSON document when one is named.
pub async fn load_aliases(
    fetcher: &dyn DocumentFetcher,
    location: Option<&str>,
) -> Result<AliasTables, ViewError> {
    let Some(location) = location else {
        return Ok(AliasTables::builtin());
    };
    let document = fetcher.fetch(location).await?;
    let overrides: AliasOverrides = serde_json::from_value(document)?;
    info!("Loaded alias overrides from {}", location);
    Ok(AliasTables::with_overrides(&overrides)?)
}

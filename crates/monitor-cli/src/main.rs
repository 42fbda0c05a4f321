//! Command line front end for the choropleth monitor.
//!
//! Configuration comes from the environment (and `.env`), see
//! `MonitorConfig::from_env`. Every subcommand prints JSON on stdout.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use choropleth_core::{
    canonical, normalize, BuiltinDisplayNames, FeatureResolver, GeoFeature, Locale, MapKind,
    RegionDisplayNames, RegionTranslator,
};
use indicator_data::{IndicatorDataset, ValueFormat, WorldDataset};
use map_views::{
    DocumentFetcher, MonitorConfig, TooltipFormat, ViewController, ViewOutcome, ViewRequest,
};

#[derive(Debug, Parser)]
#[command(name = "monitor")]
#[command(about = "Resolve geographic names and build choropleth views for the gender monitor")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve feature names against a dataset and print the match and fill
    Resolve {
        /// Map kind: world, states or boroughs
        #[arg(long, default_value = "world", value_parser = parse_kind)]
        kind: MapKind,

        /// Variable to resolve against (state and borough maps)
        #[arg(long)]
        variable: Option<String>,

        /// ISO 3166-1 alpha-2 code of the feature (world maps)
        #[arg(long)]
        iso2: Option<String>,

        /// Feature names as they appear in the GeoJSON
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Build a section view and print it
    Indicator {
        /// Map kind: world, states or boroughs
        #[arg(long, default_value = "states", value_parser = parse_kind)]
        kind: MapKind,

        /// Variable to show (defaults to the map's default variable)
        #[arg(long)]
        variable: Option<String>,

        /// Entity to select (defaults to the top-ranked entity)
        #[arg(long)]
        entity: Option<String>,
    },

    /// Print the ranking of a variable with its direction
    Rank {
        /// Map kind: world, states or boroughs
        #[arg(long, default_value = "states", value_parser = parse_kind)]
        kind: MapKind,

        /// Variable to rank (defaults to the map's default variable)
        #[arg(long)]
        variable: Option<String>,

        /// Only print the first N entries
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Translate English region names (or ISO codes) to Spanish
    Translate {
        /// Treat inputs as ISO 3166-1 alpha-2 codes
        #[arg(long)]
        iso: bool,

        /// Region names or codes
        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn parse_kind(value: &str) -> Result<MapKind, String> {
    MapKind::parse(value).ok_or_else(|| format!("unknown map kind '{}'", value))
}

#[derive(Debug, Serialize)]
struct Resolution {
    name: String,
    key: String,
    label: String,
    value: Option<f64>,
    display_value: Option<String>,
    fill: String,
}

#[derive(Debug, Serialize)]
struct RankRow {
    rank: usize,
    label: String,
    value: f64,
    display_value: String,
}

#[derive(Debug, Serialize)]
struct Ranking {
    kind: MapKind,
    variable: String,
    higher_is_better: bool,
    unit_symbol: String,
    rows: Vec<RankRow>,
}

#[derive(Debug, Serialize)]
struct Translation {
    input: String,
    key: String,
    canonical: String,
    spanish: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = MonitorConfig::from_env()?;

    let output = match args.command {
        Command::Resolve {
            kind,
            variable,
            iso2,
            names,
        } => {
            let controller = ViewController::from_config(config).await?;
            serde_json::to_value(resolve(&controller, kind, variable, iso2, names).await?)?
        }
        Command::Indicator {
            kind,
            variable,
            entity,
        } => {
            let controller = ViewController::from_config(config).await?;
            let request = match kind {
                MapKind::World => ViewRequest::World,
                _ => ViewRequest::Indicator {
                    kind,
                    variable,
                    entity,
                },
            };
            match controller.show(request).await {
                ViewOutcome::Applied(view) => serde_json::to_value(view)?,
                ViewOutcome::Stale { generation, latest } => {
                    return Err(format!("request {} superseded by {}", generation, latest).into())
                }
            }
        }
        Command::Rank {
            kind,
            variable,
            limit,
        } => {
            let controller = ViewController::from_config(config).await?;
            serde_json::to_value(rank(&controller, kind, variable, limit).await?)?
        }
        Command::Translate { iso, names } => serde_json::to_value(translate(iso, names))?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn fetch_dataset(
    controller: &ViewController,
    kind: MapKind,
) -> Result<Value, Box<dyn std::error::Error>> {
    let location = controller.config().data_source(kind);
    info!("Loading {} dataset from {}", kind.as_str(), location);
    Ok(controller.fetcher().fetch(location).await?)
}

fn feature(name: &str, iso2: Option<&str>) -> GeoFeature {
    let mut properties = Map::new();
    properties.insert("name".to_string(), Value::String(name.to_string()));
    if let Some(code) = iso2 {
        properties.insert("iso_a2".to_string(), Value::String(code.to_string()));
    }
    GeoFeature::with_properties(properties)
}

async fn resolve(
    controller: &ViewController,
    kind: MapKind,
    variable: Option<String>,
    iso2: Option<String>,
    names: Vec<String>,
) -> Result<Vec<Resolution>, Box<dyn std::error::Error>> {
    let resolver = controller.resolver(kind);
    let document = fetch_dataset(controller, kind).await?;
    let colors = controller.config().colors;

    let (index, range, format) = match kind {
        MapKind::World => {
            let dataset = WorldDataset::from_value(&document)?;
            let range = dataset.range().ok_or("world dataset has no values")?;
            (dataset.index(resolver.as_ref()), range, TooltipFormat::World)
        }
        MapKind::States | MapKind::Boroughs => {
            let dataset = IndicatorDataset::from_value(&document)?;
            let variable = variable
                .or_else(|| dataset.default_variable(kind))
                .ok_or("dataset has no variables")?;
            let snapshot = dataset
                .snapshot(&variable, resolver.as_ref(), controller.policy())
                .ok_or_else(|| format!("no data for variable '{}'", variable))?;
            (
                snapshot.index().clone(),
                snapshot.range,
                TooltipFormat::Indicator(snapshot.value_format),
            )
        }
    };

    let resolutions = names
        .iter()
        .map(|name| {
            let feature = feature(name, iso2.as_deref());
            let hit = resolver.resolve(&feature, &index);
            if hit.is_none() {
                warn!("No data for '{}'", name);
            }
            let value = hit.as_ref().map(|m| m.value);
            Resolution {
                name: name.clone(),
                key: resolver.index_key(name).to_string(),
                label: hit
                    .map(|m| m.label)
                    .unwrap_or_else(|| resolver.display_name(&feature)),
                value,
                display_value: value.map(|v| format.display(v)),
                fill: colors.fill(value, &range).to_string(),
            }
        })
        .collect();
    Ok(resolutions)
}

async fn rank(
    controller: &ViewController,
    kind: MapKind,
    variable: Option<String>,
    limit: Option<usize>,
) -> Result<Ranking, Box<dyn std::error::Error>> {
    let document = fetch_dataset(controller, kind).await?;
    let limit = limit.unwrap_or(usize::MAX);

    if kind == MapKind::World {
        let dataset = WorldDataset::from_value(&document)?;
        let rows = dataset
            .ranking()
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, item)| RankRow {
                rank: i + 1,
                display_value: ValueFormat::Decimal.format(item.value),
                label: item.name,
                value: item.value,
            })
            .collect();
        return Ok(Ranking {
            kind,
            variable: variable.unwrap_or_else(|| "Tasa de participación económica femenina".to_string()),
            higher_is_better: true,
            unit_symbol: "%".to_string(),
            rows,
        });
    }

    let resolver = controller.resolver(kind);
    let dataset = IndicatorDataset::from_value(&document)?;
    let variable = variable
        .or_else(|| dataset.default_variable(kind))
        .ok_or("dataset has no variables")?;
    let snapshot = dataset
        .snapshot(&variable, resolver.as_ref(), controller.policy())
        .ok_or_else(|| format!("no data for variable '{}'", variable))?;

    let rows = snapshot
        .ranking
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, entry)| RankRow {
            rank: i + 1,
            label: entry.label.clone(),
            value: entry.value,
            display_value: entry.display_value.clone(),
        })
        .collect();

    Ok(Ranking {
        kind,
        variable: snapshot.variable,
        higher_is_better: snapshot.higher_is_better,
        unit_symbol: snapshot.unit_symbol,
        rows,
    })
}

fn translate(iso: bool, names: Vec<String>) -> Vec<Translation> {
    let translator: Arc<RegionTranslator> = RegionTranslator::builtin();
    names
        .into_iter()
        .map(|input| {
            let spanish = if iso {
                BuiltinDisplayNames.display_name(&input, Locale::Spanish)
            } else {
                translator
                    .translate(normalize(&input).as_str())
                    .map(|key| key.to_string())
            };
            Translation {
                key: normalize(&input).to_string(),
                canonical: canonical(&input).to_string(),
                spanish,
                input,
            }
        })
        .collect()
}

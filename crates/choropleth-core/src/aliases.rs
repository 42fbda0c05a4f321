//! Static alias tables.
//!
//! Every table is declared as data and normalized when loaded. Redirect
//! chains are collapsed to their final form, so applying a table twice is
//! the same as applying it once. Extra entries can be layered on top of the
//! builtin data from JSON (see [`AliasOverrides`]).

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::normalize::{normalize, NormalizedKey};

/// Geographic feature names (mostly English) to the Spanish names used in
/// the world dataset.
const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("brazil", "brasil"),
    ("united states", "estados unidos"),
    ("united states of america", "estados unidos"),
    ("usa", "estados unidos"),
    ("us", "estados unidos"),
    ("russia", "rusia"),
    ("russian federation", "rusia"),
    ("czechia", "republica checa"),
    ("czech republic", "republica checa"),
    ("ivory coast", "costa de marfil"),
    ("democratic republic of the congo", "republica democratica del congo"),
    ("republic of the congo", "republica del congo"),
    ("south korea", "corea del sur"),
    ("north korea", "corea del norte"),
    ("lao pdr", "laos"),
    ("lao peoples democratic republic", "laos"),
    ("iran, islamic republic of", "iran"),
    ("syrian arab republic", "siria"),
    ("venezuela, bolivarian republic of", "venezuela"),
    ("bolivia, plurinational state of", "bolivia"),
    ("tanzania, united republic of", "tanzania"),
    ("moldova, republic of", "moldavia"),
    ("myanmar", "birmania"),
    ("eswatini", "suazilandia"),
    ("cape verde", "cabo verde"),
    ("the bahamas", "bahamas"),
    ("slovakia", "eslovaquia"),
    ("timor-leste", "timor oriental"),
    ("brunei darussalam", "brunei"),
    ("sao tome and principe", "santo tome y principe"),
    ("north macedonia", "macedonia del norte"),
    ("viet nam", "vietnam"),
];

/// Spanish names produced by locale data that differ from the labels used
/// in the indicator datasets.
const SPANISH_DATASET_ALIASES: &[(&str, &str)] = &[
    ("china", "republica popular china"),
    ("chequia", "republica checa"),
    ("estados unidos de america", "estados unidos"),
    ("corea", "corea del sur"),
    ("myanmar", "birmania"),
    ("myanmar birmania", "birmania"),
    ("esuatini", "suazilandia"),
    ("lao", "laos"),
    ("timorleste", "timor oriental"),
];

/// Mexican state names as found in geometry files and datasets.
const MEXICO_STATE_ALIASES: &[(&str, &str)] = &[
    ("estado de mexico", "mexico"),
    ("mexico state", "mexico"),
    ("distrito federal", "ciudad de mexico"),
    ("cdmx", "ciudad de mexico"),
    ("veracruz", "veracruz de ignacio de la llave"),
    ("coahuila de zaragoza", "coahuila"),
    ("michoacan de ocampo", "michoacan"),
];

/// Mexico City borough (alcaldía) names.
const ALCALDIA_ALIASES: &[(&str, &str)] = &[
    ("gustavo a. madero", "gustavo a madero"),
    ("g a madero", "gustavo a madero"),
    ("magdalena contreras", "la magdalena contreras"),
];

/// Spelling variants of monitored variables, used by the direction policy.
const VARIABLE_DIRECTION_ALIASES: &[(&str, &str)] = &[
    (
        "tasa de participacion economica femenina",
        "tasa de participacion economica de mujeres",
    ),
    (
        "tasa de participacion economica de la mujer",
        "tasa de participacion economica de mujeres",
    ),
    ("brecha de ingreso por genero", "brecha de ingresos por genero"),
    ("brecha de ingreso", "brecha de ingresos"),
    ("permiso de paternidad", "permisos de paternidad"),
    (
        "mujeres jovenes que hablan lengua indigena",
        "mujeres jovenes que hablan una lengua indigena",
    ),
];

/// Dataset entity names shown under a shorter label on state maps.
const STATE_DISPLAY_OVERRIDES: &[(&str, &str)] =
    &[("veracruz de ignacio de la llave", "Veracruz")];

/// The kind of map a feature collection describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapKind {
    /// World countries.
    World,
    /// Mexican states.
    States,
    /// Mexico City boroughs.
    Boroughs,
}

impl MapKind {
    /// Parse a map kind from a CLI or config string.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "world" | "mundo" => Some(Self::World),
            "states" | "state" | "entidad" | "estados" => Some(Self::States),
            "boroughs" | "borough" | "alcaldias" | "cdmx" => Some(Self::Boroughs),
            _ => None,
        }
    }

    /// Lowercase identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::World => "world",
            Self::States => "states",
            Self::Boroughs => "boroughs",
        }
    }
}

/// An immutable `NormalizedKey -> NormalizedKey` redirect table.
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    entries: HashMap<NormalizedKey, NormalizedKey>,
}

impl AliasMap {
    /// Build a table from raw pairs, breaking any cycle it contains.
    ///
    /// Entries that take part in a cycle are dropped with a warning.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let raw = collect_pairs(pairs);
        let mut entries = HashMap::with_capacity(raw.len());
        for key in raw.keys() {
            match follow_chain(&raw, key) {
                Ok(target) => {
                    entries.insert(key.clone(), target);
                }
                Err(_) => warn!("Dropping cyclic alias entry: {}", key),
            }
        }
        Self { entries }
    }

    /// Build a table from raw pairs, rejecting cycles.
    pub fn try_from_pairs<'a, I>(pairs: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let raw = collect_pairs(pairs);
        let mut entries = HashMap::with_capacity(raw.len());
        for key in raw.keys() {
            let target = follow_chain(&raw, key)?;
            entries.insert(key.clone(), target);
        }
        Ok(Self { entries })
    }

    /// Look up the redirect for a key.
    pub fn get(&self, key: &str) -> Option<&NormalizedKey> {
        if key.is_empty() {
            return None;
        }
        self.entries.get(key)
    }

    /// Apply the table: the redirect target, or the key unchanged.
    pub fn redirect(&self, key: &NormalizedKey) -> NormalizedKey {
        self.get(key.as_str()).cloned().unwrap_or_else(|| key.clone())
    }

    /// Number of redirects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no redirects.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(from, to)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&NormalizedKey, &NormalizedKey)> {
        self.entries.iter()
    }
}

/// Normalize pairs, dropping empty and identity entries. Later pairs win.
fn collect_pairs<'a, I>(pairs: I) -> HashMap<NormalizedKey, NormalizedKey>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut raw = HashMap::new();
    for (from, to) in pairs {
        let from = normalize(from);
        let to = normalize(to);
        if from.is_empty() || to.is_empty() || from == to {
            continue;
        }
        raw.insert(from, to);
    }
    raw
}

fn follow_chain(
    raw: &HashMap<NormalizedKey, NormalizedKey>,
    start: &NormalizedKey,
) -> Result<NormalizedKey, CoreError> {
    let mut seen = HashSet::new();
    seen.insert(start);
    let mut current = start;
    while let Some(next) = raw.get(current) {
        if !seen.insert(next) {
            return Err(CoreError::AliasCycle(start.to_string()));
        }
        current = next;
    }
    Ok(current.clone())
}

/// Extra alias entries loaded from JSON, layered over the builtin tables.
///
/// ```json
/// { "language": { "turkiye": "turquia" }, "state_display": { "mexico": "Estado de México" } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasOverrides {
    pub language: BTreeMap<String, String>,
    pub dataset_labels: BTreeMap<String, String>,
    pub states: BTreeMap<String, String>,
    pub boroughs: BTreeMap<String, String>,
    pub directions: BTreeMap<String, String>,
    pub state_display: BTreeMap<String, String>,
    pub borough_display: BTreeMap<String, String>,
}

/// All alias tables used by the matchers and the direction policy.
#[derive(Debug, Clone)]
pub struct AliasTables {
    /// Foreign or abbreviated country names to dataset names.
    pub language: AliasMap,
    /// Locale-derived Spanish names to the labels used in datasets.
    pub dataset_labels: AliasMap,
    /// Mexican state naming variants.
    pub states: AliasMap,
    /// CDMX borough naming variants.
    pub boroughs: AliasMap,
    /// Variable name variants for the direction policy.
    pub directions: AliasMap,
    display_overrides: HashMap<MapKind, HashMap<NormalizedKey, String>>,
}

impl Default for AliasTables {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AliasTables {
    /// The builtin tables.
    pub fn builtin() -> Self {
        Self {
            language: AliasMap::from_pairs(COUNTRY_ALIASES.iter().copied()),
            dataset_labels: AliasMap::from_pairs(SPANISH_DATASET_ALIASES.iter().copied()),
            states: AliasMap::from_pairs(MEXICO_STATE_ALIASES.iter().copied()),
            boroughs: AliasMap::from_pairs(ALCALDIA_ALIASES.iter().copied()),
            directions: AliasMap::from_pairs(VARIABLE_DIRECTION_ALIASES.iter().copied()),
            display_overrides: build_display_overrides(
                STATE_DISPLAY_OVERRIDES.iter().copied(),
                std::iter::empty(),
            ),
        }
    }

    /// Builtin tables extended with the given overrides.
    ///
    /// Override entries replace builtin entries with the same key. A cycle
    /// introduced by the overrides is an error.
    pub fn with_overrides(overrides: &AliasOverrides) -> Result<Self, CoreError> {
        fn layered<'a>(
            builtin: &'a [(&'a str, &'a str)],
            extra: &'a BTreeMap<String, String>,
        ) -> impl Iterator<Item = (&'a str, &'a str)> {
            builtin
                .iter()
                .copied()
                .chain(extra.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        }

        let tables = Self {
            language: AliasMap::try_from_pairs(layered(COUNTRY_ALIASES, &overrides.language))?,
            dataset_labels: AliasMap::try_from_pairs(layered(
                SPANISH_DATASET_ALIASES,
                &overrides.dataset_labels,
            ))?,
            states: AliasMap::try_from_pairs(layered(MEXICO_STATE_ALIASES, &overrides.states))?,
            boroughs: AliasMap::try_from_pairs(layered(ALCALDIA_ALIASES, &overrides.boroughs))?,
            directions: AliasMap::try_from_pairs(layered(
                VARIABLE_DIRECTION_ALIASES,
                &overrides.directions,
            ))?,
            display_overrides: build_display_overrides(
                layered(STATE_DISPLAY_OVERRIDES, &overrides.state_display),
                overrides
                    .borough_display
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            ),
        };
        debug!(
            "Loaded alias tables: {} language, {} dataset, {} states, {} boroughs, {} directions",
            tables.language.len(),
            tables.dataset_labels.len(),
            tables.states.len(),
            tables.boroughs.len(),
            tables.directions.len()
        );
        Ok(tables)
    }

    /// Builtin tables extended with overrides parsed from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let overrides: AliasOverrides = serde_json::from_str(json)?;
        Self::with_overrides(&overrides)
    }

    /// The administrative table for a map kind. World maps have none.
    pub fn administrative(&self, kind: MapKind) -> Option<&AliasMap> {
        match kind {
            MapKind::World => None,
            MapKind::States => Some(&self.states),
            MapKind::Boroughs => Some(&self.boroughs),
        }
    }

    /// Normalize a name and apply the administrative table for `kind`.
    pub fn admin_key(&self, kind: MapKind, raw: &str) -> NormalizedKey {
        let key = normalize(raw);
        match self.administrative(kind) {
            Some(table) => table.redirect(&key),
            None => key,
        }
    }

    /// The label to display for a dataset entity on a map of `kind`.
    pub fn display_label(&self, kind: MapKind, raw: &str) -> String {
        let trimmed = raw.trim();
        self.display_overrides
            .get(&kind)
            .and_then(|overrides| overrides.get(normalize(trimmed).as_str()))
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }
}

fn display_map<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> HashMap<NormalizedKey, String> {
    pairs
        .map(|(from, label)| (normalize(from), label.trim().to_string()))
        .filter(|(from, label)| !from.is_empty() && !label.is_empty())
        .collect()
}

fn build_display_overrides<'a>(
    states: impl Iterator<Item = (&'a str, &'a str)>,
    boroughs: impl Iterator<Item = (&'a str, &'a str)>,
) -> HashMap<MapKind, HashMap<NormalizedKey, String>> {
    HashMap::from([
        (MapKind::States, display_map(states)),
        (MapKind::Boroughs, display_map(boroughs)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tables(tables: &AliasTables) -> Vec<(&'static str, &AliasMap)> {
        vec![
            ("language", &tables.language),
            ("dataset_labels", &tables.dataset_labels),
            ("states", &tables.states),
            ("boroughs", &tables.boroughs),
            ("directions", &tables.directions),
        ]
    }

    #[test]
    fn test_builtin_tables_are_not_empty() {
        let tables = AliasTables::builtin();
        for (name, table) in all_tables(&tables) {
            assert!(!table.is_empty(), "{} table is empty", name);
        }
    }

    #[test]
    fn test_redirect_twice_is_noop() {
        let tables = AliasTables::builtin();
        for (name, table) in all_tables(&tables) {
            for (from, to) in table.iter() {
                let once = table.redirect(from);
                assert_eq!(&once, to);
                assert_eq!(table.redirect(&once), once, "{} not idempotent at {}", name, from);
            }
        }
    }

    #[test]
    fn test_keys_are_normalized() {
        let tables = AliasTables::builtin();
        assert_eq!(
            tables.language.get("iran islamic republic of").map(|k| k.as_str()),
            Some("iran")
        );
        assert_eq!(
            tables.boroughs.get("gustavo a madero"),
            None,
            "identity entries are dropped"
        );
        assert_eq!(
            tables.boroughs.get("g a madero").map(|k| k.as_str()),
            Some("gustavo a madero")
        );
    }

    #[test]
    fn test_chains_are_collapsed() {
        let table = AliasMap::from_pairs([("a", "b"), ("b", "c"), ("c", "d")]);
        assert_eq!(table.get("a").map(|k| k.as_str()), Some("d"));
        assert_eq!(table.get("b").map(|k| k.as_str()), Some("d"));
        assert_eq!(table.get("d"), None);
    }

    #[test]
    fn test_cycles_are_dropped_or_rejected() {
        let lenient = AliasMap::from_pairs([("a", "b"), ("b", "a"), ("x", "y")]);
        assert_eq!(lenient.get("a"), None);
        assert_eq!(lenient.get("b"), None);
        assert_eq!(lenient.get("x").map(|k| k.as_str()), Some("y"));

        let strict = AliasMap::try_from_pairs([("a", "b"), ("b", "a")]);
        assert!(matches!(strict, Err(CoreError::AliasCycle(_))));
    }

    #[test]
    fn test_empty_key_never_redirects() {
        let tables = AliasTables::builtin();
        assert_eq!(tables.language.get(""), None);
        assert!(tables.language.redirect(&normalize("")).is_empty());
    }

    #[test]
    fn test_admin_key_per_kind() {
        let tables = AliasTables::builtin();
        assert_eq!(
            tables.admin_key(MapKind::States, "Veracruz").as_str(),
            "veracruz de ignacio de la llave"
        );
        assert_eq!(
            tables.admin_key(MapKind::States, "Distrito Federal").as_str(),
            "ciudad de mexico"
        );
        assert_eq!(
            tables.admin_key(MapKind::Boroughs, "Magdalena Contreras").as_str(),
            "la magdalena contreras"
        );
        assert_eq!(tables.admin_key(MapKind::World, "Veracruz").as_str(), "veracruz");
    }

    #[test]
    fn test_display_label_overrides() {
        let tables = AliasTables::builtin();
        assert_eq!(
            tables.display_label(MapKind::States, " Veracruz de Ignacio de la Llave "),
            "Veracruz"
        );
        assert_eq!(tables.display_label(MapKind::States, "Jalisco"), "Jalisco");
        assert_eq!(
            tables.display_label(MapKind::Boroughs, "Veracruz de Ignacio de la Llave"),
            "Veracruz de Ignacio de la Llave"
        );
    }

    #[test]
    fn test_overrides_from_json() {
        let tables = AliasTables::from_json(
            r#"{"language": {"Türkiye": "Turquía"}, "borough_display": {"Cuauhtémoc": "Cuauhtémoc (Centro)"}}"#,
        )
        .unwrap();
        assert_eq!(tables.language.get("turkiye").map(|k| k.as_str()), Some("turquia"));
        assert_eq!(tables.language.get("russia").map(|k| k.as_str()), Some("rusia"));
        assert_eq!(
            tables.display_label(MapKind::Boroughs, "Cuauhtemoc"),
            "Cuauhtémoc (Centro)"
        );
    }

    #[test]
    fn test_overrides_reject_cycles() {
        let result = AliasTables::from_json(r#"{"language": {"rusia": "russia"}}"#);
        assert!(matches!(result, Err(CoreError::AliasCycle(_))));
    }

    #[test]
    fn test_map_kind_parse() {
        assert_eq!(MapKind::parse("World"), Some(MapKind::World));
        assert_eq!(MapKind::parse("entidad"), Some(MapKind::States));
        assert_eq!(MapKind::parse("cdmx"), Some(MapKind::Boroughs));
        assert_eq!(MapKind::parse("mars"), None);
    }
}

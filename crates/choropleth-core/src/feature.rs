//! GeoJSON-like features and their name fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Property keys tried, in order, for a feature's primary display name.
const PRIMARY_NAME_KEYS: &[&str] = &[
    "name", "NAME", "NOMGEO", "nomgeo", "NOM_MUN", "ADMIN", "admin", "sovereignt",
];

/// Alternate name fields, collected as extra matching seeds.
const ALTERNATE_NAME_KEYS: &[&str] = &[
    "name",
    "NAME",
    "ADMIN",
    "admin",
    "sovereignt",
    "SOVEREIGNT",
    "name_long",
    "NAME_LONG",
    "formal_en",
    "FORMAL_EN",
    "name_sort",
    "NAME_SORT",
    "abbrev",
    "ABBREV",
    "postal",
    "POSTAL",
    "brk_name",
    "BRK_NAME",
];

/// Property keys that may hold an ISO 3166-1 alpha-2 code.
const ISO2_KEYS: &[&str] = &["iso_a2", "ISO_A2", "iso2", "ISO2", "iso-a2"];

/// A single geographic region with its metadata properties.
///
/// Geometry is carried through untouched; matching only looks at the
/// properties and the optional id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,
}

impl GeoFeature {
    /// Create a feature from a properties bag.
    pub fn with_properties(properties: Map<String, Value>) -> Self {
        Self {
            id: None,
            properties: Some(properties),
            geometry: None,
        }
    }

    /// Create a feature carrying a single `name` property.
    pub fn named(name: impl Into<String>) -> Self {
        let mut properties = Map::new();
        properties.insert("name".to_string(), Value::String(name.into()));
        Self::with_properties(properties)
    }

    /// A trimmed, non-empty string property.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties
            .as_ref()?
            .get(key)?
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The feature's primary display name, falling back to its id.
    pub fn name(&self) -> Option<String> {
        PRIMARY_NAME_KEYS
            .iter()
            .find_map(|key| self.property_str(key))
            .map(str::to_string)
            .or_else(|| match &self.id {
                Some(Value::String(id)) if !id.trim().is_empty() => Some(id.trim().to_string()),
                Some(Value::Number(id)) => Some(id.to_string()),
                _ => None,
            })
    }

    /// Every alternate name field present, in key order.
    pub fn alternate_names(&self) -> Vec<&str> {
        ALTERNATE_NAME_KEYS
            .iter()
            .filter_map(|key| self.property_str(key))
            .collect()
    }

    /// Primary name followed by all alternate names.
    pub fn seed_names(&self) -> Vec<String> {
        let mut seeds = Vec::new();
        if let Some(name) = self.name() {
            seeds.push(name);
        }
        seeds.extend(self.alternate_names().into_iter().map(str::to_string));
        seeds
    }

    /// The feature's two-letter region code, uppercased.
    pub fn iso2(&self) -> Option<String> {
        ISO2_KEYS.iter().find_map(|key| {
            let code = self.property_str(key)?;
            (code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()))
                .then(|| code.to_ascii_uppercase())
        })
    }
}

/// Extract features from a FeatureCollection (`features` or `data.features`).
///
/// Entries that do not deserialize as features are skipped.
pub fn features_from_collection(collection: &Value) -> Vec<GeoFeature> {
    let features = collection
        .get("features")
        .or_else(|| collection.get("data").and_then(|data| data.get("features")))
        .and_then(Value::as_array);

    let Some(features) = features else {
        return Vec::new();
    };

    features
        .iter()
        .filter_map(|raw| match serde_json::from_value::<GeoFeature>(raw.clone()) {
            Ok(feature) => Some(feature),
            Err(err) => {
                debug!("Skipping malformed feature: {}", err);
                None
            }
        })
        .collect()
}

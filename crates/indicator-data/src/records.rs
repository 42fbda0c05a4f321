//! Dataset record shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `(entity, variable, value)` row of an indicator dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    /// State, borough or country name as the dataset spells it.
    #[serde(rename = "Entidad")]
    pub entity: String,
    /// Indicator name.
    #[serde(rename = "Variable")]
    pub variable: String,
    #[serde(rename = "Valor")]
    pub value: f64,
    /// What the indicator measures.
    #[serde(rename = "Que_mide", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Unidad", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(rename = "Fuente", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl IndicatorRecord {
    /// Read a record from a raw JSON row.
    ///
    /// Returns `None` unless `Entidad` and `Variable` are non-blank strings
    /// and `Valor` is a finite number. Optional text fields that are not
    /// strings are ignored.
    pub fn from_value(row: &Value) -> Option<Self> {
        let entity = non_blank(row.get("Entidad")?.as_str())?;
        let variable = non_blank(row.get("Variable")?.as_str())?;
        let value = row.get("Valor")?.as_f64().filter(|v| v.is_finite())?;
        let text = |key: &str| row.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            entity: entity.to_string(),
            variable: variable.to_string(),
            value,
            description: text("Que_mide"),
            unit: text("Unidad"),
            source: text("Fuente"),
        })
    }
}

/// A `(name, value)` pair from the world dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

impl NamedValue {
    /// Read `{pais, tpe}` or `{name, value}`; anything else is `None`.
    pub fn from_value(row: &Value) -> Option<Self> {
        let (name, value) = match (row.get("pais"), row.get("tpe")) {
            (Some(name), Some(value)) => (name, value),
            _ => (row.get("name")?, row.get("value")?),
        };
        let name = name.as_str()?.trim();
        let value = value.as_f64().filter(|v| v.is_finite())?;
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            value,
        })
    }
}

/// Trimmed text, or `None` when blank.
pub(crate) fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

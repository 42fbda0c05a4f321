//! Value, unit and source formatting for indicator panels.

use choropleth_core::{normalize, MapKind};
use serde::Serialize;

/// Variables measured in counts, hours or rates per inhabitant, never shown
/// with a `%` even when the dataset unit says so.
const NO_PERCENT_SYMBOL_VARIABLES: &[&str] = &[
    "homicidios dolosos de mujeres",
    "oferta de cuidados de adultos mayores",
    "oferta de cuidados para adultos mayores",
    "feminicidios",
    "duracion de la jornada laboral",
    "horas promedio destinadas a las tareas del hogar",
    "horas promedio destinadas a los cuidados",
];

/// How indicator values are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    /// Rounded to a whole number.
    Integer,
    /// One decimal in lists, two on map tooltips.
    Decimal,
}

impl ValueFormat {
    /// Paternity-leave variables are counts; everything else is decimal.
    pub fn for_variable(variable: &str) -> Self {
        let key = normalize(variable);
        if key.as_str().contains("permiso de paternidad")
            || key.as_str().contains("permisos de paternidad")
        {
            Self::Integer
        } else {
            Self::Decimal
        }
    }

    /// Value as shown in rankings and profiles.
    pub fn format(&self, value: f64) -> String {
        match self {
            Self::Integer => format!("{}", value.round()),
            Self::Decimal => format!("{:.1}", value),
        }
    }

    /// Value as shown on map tooltips.
    pub fn format_map(&self, value: f64) -> String {
        match self {
            Self::Integer => format!("{}", value.round()),
            Self::Decimal => format!("{:.2}", value),
        }
    }
}

/// Whether `variable` is in the fixed no-`%` list.
pub fn hides_percent_symbol(variable: &str) -> bool {
    NO_PERCENT_SYMBOL_VARIABLES.contains(&normalize(variable).as_str())
}

/// Unit suffix printed after values of `variable`.
///
/// Sexual-offense variables and the no-`%` list print nothing. Units that
/// mention "porcent" or "tasa" print `%`. Other units are echoed on state
/// maps and dropped on borough maps.
pub fn unit_symbol(kind: MapKind, variable: &str, unit: &str) -> String {
    if normalize(variable).as_str().contains("delitos sexuales") || hides_percent_symbol(variable) {
        return String::new();
    }
    let lower = unit.to_lowercase();
    if lower.contains("porcent") || lower.contains("tasa") {
        return "%".to_string();
    }
    match kind {
        MapKind::Boroughs => String::new(),
        MapKind::World | MapKind::States => unit.to_string(),
    }
}

/// Prefix `Fuente: ` unless the text already starts with it.
pub fn with_source_prefix(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.to_ascii_lowercase().starts_with("fuente:") {
        trimmed.to_string()
    } else {
        format!("Fuente: {}", trimmed)
    }
}

/// Split a source text into display lines with any note placed first.
///
/// Line breaks and `<br>` tags collapse to single spaces. When both
/// `Nota:` and `Fuente:` are present the result is `[note, source]`, with
/// any text before the first marker kept in front of the source and
/// trailing `.`/`;` trimmed from whichever part came first. Otherwise a
/// line break is inserted before each `Nota:`.
pub fn format_source(text: &str) -> Vec<String> {
    let flattened = collapse_whitespace(&strip_br_tags(text));
    if flattened.is_empty() {
        return Vec::new();
    }

    let lower = flattened.to_ascii_lowercase();
    match (lower.find("nota:"), lower.find("fuente:")) {
        (Some(nota), Some(fuente)) => {
            let (prefix, note, source) = if nota < fuente {
                (
                    flattened[..nota].trim(),
                    trim_trailing_punctuation(&flattened[nota..fuente]),
                    flattened[fuente..].trim(),
                )
            } else {
                (
                    flattened[..fuente].trim(),
                    flattened[nota..].trim(),
                    trim_trailing_punctuation(&flattened[fuente..nota]),
                )
            };
            let full_source = if prefix.is_empty() {
                source.to_string()
            } else {
                format!("{} {}", prefix, source)
            };
            vec![note.to_string(), full_source.trim().to_string()]
        }
        _ => split_before_notes(&flattened),
    }
}

/// Scale fractional rates to percentages.
///
/// Values at or below 1 are read as fractions and multiplied by 100.
/// Non-finite input gives `None`.
pub fn normalize_rate_to_percent(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    Some(if value <= 1.0 { value * 100.0 } else { value })
}

fn strip_br_tags(text: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut rest = 0;
    let mut search = 0;
    while let Some(found) = lower[search..].find("<br") {
        let start = search + found;
        let after = &lower[start + 3..];
        let tag_len = after
            .char_indices()
            .find(|(_, c)| !c.is_whitespace() && *c != '/')
            .filter(|(_, c)| *c == '>')
            .map(|(i, _)| 3 + i + 1);
        match tag_len {
            Some(len) => {
                out.push_str(&text[rest..start]);
                out.push(' ');
                rest = start + len;
                search = rest;
            }
            None => search = start + 3,
        }
    }
    out.push_str(&text[rest..]);
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn trim_trailing_punctuation(text: &str) -> &str {
    text.trim()
        .trim_end_matches(|c: char| c == '.' || c == ';' || c.is_whitespace())
}

fn split_before_notes(text: &str) -> Vec<String> {
    let lower = text.to_ascii_lowercase();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut search = 0;
    while let Some(found) = lower[search..].find(" nota:") {
        let at = search + found;
        let line = text[start..at].trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
        start = at + 1;
        search = start;
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        lines.push(tail.to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_format() {
        assert_eq!(ValueFormat::for_variable("Permisos de paternidad"), ValueFormat::Integer);
        assert_eq!(ValueFormat::for_variable("Informalidad"), ValueFormat::Decimal);
        assert_eq!(ValueFormat::Integer.format(12.6), "13");
        assert_eq!(ValueFormat::Decimal.format(12.64), "12.6");
        assert_eq!(ValueFormat::Decimal.format_map(12.641), "12.64");
    }

    #[test]
    fn test_unit_symbol_rules() {
        assert_eq!(unit_symbol(MapKind::States, "Informalidad", "Porcentaje"), "%");
        assert_eq!(unit_symbol(MapKind::States, "Embarazo adolescente", "Tasa por cada mil"), "%");
        assert_eq!(unit_symbol(MapKind::States, "Delitos sexuales", "Porcentaje"), "");
        assert_eq!(unit_symbol(MapKind::States, "Feminicidios", "Tasa"), "");
        assert_eq!(unit_symbol(MapKind::States, "Permisos de paternidad", "Número"), "Número");
        assert_eq!(unit_symbol(MapKind::Boroughs, "Permisos de paternidad", "Número"), "");
    }

    #[test]
    fn test_source_prefix() {
        assert_eq!(with_source_prefix(" INEGI "), "Fuente: INEGI");
        assert_eq!(with_source_prefix("FUENTE: INEGI"), "FUENTE: INEGI");
    }

    #[test]
    fn test_note_is_moved_before_source() {
        let lines = format_source("Fuente: INEGI, ENOE 2024.\nNota: Datos preliminares.");
        assert_eq!(lines, vec!["Nota: Datos preliminares.", "Fuente: INEGI, ENOE 2024"]);
    }

    #[test]
    fn test_note_first_keeps_prefix_with_source() {
        let lines = format_source("Elaborado por el IMCO. Nota: cifras brutas; Fuente: INEGI.");
        assert_eq!(lines, vec!["Nota: cifras brutas", "Elaborado por el IMCO. Fuente: INEGI."]);
    }

    #[test]
    fn test_source_without_both_markers() {
        assert_eq!(format_source("Fuente: INEGI<br/>2024"), vec!["Fuente: INEGI 2024"]);
        assert_eq!(
            format_source("Datos 2024 Nota: preliminares"),
            vec!["Datos 2024", "Nota: preliminares"]
        );
        assert!(format_source("  <br> ").is_empty());
    }

    #[test]
    fn test_rate_normalization() {
        assert_eq!(normalize_rate_to_percent(0.45), Some(45.0));
        assert_eq!(normalize_rate_to_percent(1.0), Some(100.0));
        assert_eq!(normalize_rate_to_percent(45.0), Some(45.0));
        assert_eq!(normalize_rate_to_percent(f64::NAN), None);
    }
}

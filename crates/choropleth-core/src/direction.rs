//! Whether a higher value of an indicator is better.
//!
//! The policy drives ranking order only; colors always run from low to high.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::aliases::{AliasMap, AliasTables};
use crate::normalize::{normalize, NormalizedKey};

/// Curated "is more better?" answers for the entity and CDMX monitors.
///
/// Variables missing here are treated as higher-is-better.
const BETTER_DIRECTION: &[(&str, bool)] = &[
    // Entity monitor
    ("tasa de participacion economica de mujeres", true),
    ("mujeres preparadas", true),
    ("embarazo adolescente", false),
    ("desigualdad en trabajo no remunerado", false),
    ("inseguridad en el transporte publico", false),
    ("homicidios dolosos de mujeres", false),
    ("mujeres que quieren trabajar y no pueden", false),
    ("brecha de ingresos por genero", false),
    ("informalidad", false),
    ("cobertura de cuidados en la primera infancia", true),
    ("oferta de cuidados de adultos mayores", true),
    ("permisos de paternidad", true),
    ("delitos sexuales", false),
    ("pobreza laboral", false),
    ("dependencia de ingresos", false),
    ("emprendedoras formales", true),
    ("propiedad de la vivienda", true),
    // CDMX monitor
    ("poblacion de mujeres jovenes", true),
    ("porcentaje de mujeres con hijos", true),
    ("mujeres jovenes que hablan una lengua indigena", true),
    ("mujeres con discapacidad", true),
    ("rezago educativo", false),
    ("mujeres fuera del sistema educativo y del mercado de trabajo", false),
    ("acceso a servicios de salud", false),
    ("mujeres con programas sociales", false),
    ("feminicidios", false),
    ("horas promedio destinadas a las tareas del hogar", false),
    ("horas promedio destinadas a los cuidados", false),
    ("tasa de participacion economica de las mujeres", true),
    ("duracion de la jornada laboral", true),
    ("brecha de ingresos", false),
    ("mujeres jovenes con trabajo precario", false),
    ("inclusion financiera", false),
    ("emprendedoras", true),
];

static BUILTIN_POLICY: LazyLock<DirectionPolicy> = LazyLock::new(DirectionPolicy::builtin);

/// Variable name to ranking direction.
#[derive(Debug, Clone)]
pub struct DirectionPolicy {
    table: HashMap<NormalizedKey, bool>,
    aliases: AliasMap,
}

impl Default for DirectionPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DirectionPolicy {
    /// The curated table with the builtin variable aliases.
    pub fn builtin() -> Self {
        Self::from_aliases(&AliasTables::builtin())
    }

    /// The curated table with the direction aliases from `tables`.
    pub fn from_aliases(tables: &AliasTables) -> Self {
        let table = BETTER_DIRECTION
            .iter()
            .map(|(variable, higher)| (normalize(variable), *higher))
            .collect();
        Self {
            table,
            aliases: tables.directions.clone(),
        }
    }

    /// Add or replace a policy entry.
    pub fn with_entry(mut self, variable: &str, higher_is_better: bool) -> Self {
        let key = normalize(variable);
        if !key.is_empty() {
            self.table.insert(key, higher_is_better);
        }
        self
    }

    /// Whether higher values of `variable` rank first. Unknown variables do.
    pub fn is_higher_better(&self, variable: &str) -> bool {
        let key = self.aliases.redirect(&normalize(variable));
        self.table.get(&key).copied().unwrap_or(true)
    }

    /// Compare two values in ranking order for `variable`.
    pub fn compare(&self, variable: &str, a: f64, b: f64) -> Ordering {
        ranking_order(self.is_higher_better(variable), a, b)
    }

    /// Stable sort of `items` into ranking order for `variable`.
    pub fn rank<T, F>(&self, variable: &str, items: &mut [T], value: F)
    where
        F: Fn(&T) -> f64,
    {
        let higher_first = self.is_higher_better(variable);
        items.sort_by(|a, b| ranking_order(higher_first, value(a), value(b)));
    }
}

/// Incomparable values (NaN) tie.
fn ranking_order(higher_first: bool, a: f64, b: f64) -> Ordering {
    let ascending = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    if higher_first {
        ascending.reverse()
    } else {
        ascending
    }
}

/// [`DirectionPolicy::is_higher_better`] with the builtin policy.
pub fn is_higher_better(variable: &str) -> bool {
    BUILTIN_POLICY.is_higher_better(variable)
}

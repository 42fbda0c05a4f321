//! English to Spanish region name translation.
//!
//! The translator pairs the English and Spanish display names of every
//! two-letter region code. Display names come from a [`RegionDisplayNames`]
//! provider; when none is available the translator is simply empty and the
//! matchers rely on the alias tables alone.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use tracing::{info, warn};

use crate::normalize::{normalize, NormalizedKey};
use crate::region_names::REGION_NAMES;

/// Languages the display-name providers can answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locale {
    English,
    Spanish,
}

/// Locale display names for two-letter region codes.
pub trait RegionDisplayNames: Send + Sync {
    /// Display name of `code` in `locale`, or `None` if unknown.
    fn display_name(&self, code: &str, locale: Locale) -> Option<String>;

    /// Whether the provider can name anything at all.
    fn is_available(&self) -> bool {
        true
    }
}

/// Display names backed by the embedded ISO 3166-1 table.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDisplayNames;

impl RegionDisplayNames for BuiltinDisplayNames {
    fn display_name(&self, code: &str, locale: Locale) -> Option<String> {
        let code = code.trim().to_ascii_uppercase();
        let idx = REGION_NAMES
            .binary_search_by(|(c, _, _)| (*c).cmp(code.as_str()))
            .ok()?;
        let (_, english, spanish) = REGION_NAMES[idx];
        Some(match locale {
            Locale::English => english.to_string(),
            Locale::Spanish => spanish.to_string(),
        })
    }
}

/// Degraded provider for environments without locale data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDisplayNames;

impl RegionDisplayNames for NoDisplayNames {
    fn display_name(&self, _code: &str, _locale: Locale) -> Option<String> {
        None
    }

    fn is_available(&self) -> bool {
        false
    }
}

static BUILTIN_TRANSLATOR: LazyLock<Arc<RegionTranslator>> =
    LazyLock::new(|| Arc::new(RegionTranslator::build(&BuiltinDisplayNames)));

/// Normalized English region name to normalized Spanish region name.
#[derive(Debug, Clone, Default)]
pub struct RegionTranslator {
    map: HashMap<NormalizedKey, NormalizedKey>,
}

impl RegionTranslator {
    /// Build the dictionary by walking every code from `AA` to `ZZ`.
    ///
    /// Codes that either locale cannot name are skipped.
    pub fn build(names: &dyn RegionDisplayNames) -> Self {
        if !names.is_available() {
            warn!("Region display names unavailable; translator disabled");
            return Self::default();
        }

        let mut map = HashMap::new();
        for first in b'A'..=b'Z' {
            for second in b'A'..=b'Z' {
                let code: String = [first as char, second as char].iter().collect();
                let (Some(english), Some(spanish)) = (
                    names.display_name(&code, Locale::English),
                    names.display_name(&code, Locale::Spanish),
                ) else {
                    continue;
                };
                let english = normalize(&english);
                let spanish = normalize(&spanish);
                if english.is_empty() || spanish.is_empty() {
                    continue;
                }
                map.insert(english, spanish);
            }
        }

        info!("Built region translator with {} entries", map.len());
        Self { map }
    }

    /// The shared translator built from the embedded table.
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN_TRANSLATOR)
    }

    /// Translate a normalized English name.
    pub fn translate(&self, key: &str) -> Option<&NormalizedKey> {
        if key.is_empty() {
            return None;
        }
        self.map.get(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

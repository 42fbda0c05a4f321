//! Normalized lookup over a dataset snapshot.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::normalize::{canonicalize, normalize, NormalizedKey};

/// A dataset value together with the label the dataset stores for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedValue {
    pub value: f64,
    pub label: String,
}

/// Dataset entries keyed by normalized and canonicalized name.
///
/// The first entry for a key wins; later duplicates are ignored.
#[derive(Debug, Clone, Default)]
pub struct ValueIndex {
    by_key: HashMap<NormalizedKey, IndexedValue>,
    by_canonical: HashMap<NormalizedKey, IndexedValue>,
}

impl ValueIndex {
    /// Index `(label, value)` pairs by `normalize(label)`.
    pub fn build<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        Self::build_with(items, normalize)
    }

    /// Index `(label, value)` pairs with a custom key function.
    ///
    /// Entries with an empty key or a non-finite value are skipped.
    pub fn build_with<'a, I, F>(items: I, key_fn: F) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
        F: Fn(&str) -> NormalizedKey,
    {
        let mut index = Self::default();
        for (label, value) in items {
            if !value.is_finite() {
                debug!("Skipping non-finite value for '{}'", label);
                continue;
            }
            let key = key_fn(label);
            if key.is_empty() {
                continue;
            }
            let entry = IndexedValue {
                value,
                label: label.trim().to_string(),
            };

            let canonical = canonicalize(&key);
            if !canonical.is_empty() {
                index
                    .by_canonical
                    .entry(canonical)
                    .or_insert_with(|| entry.clone());
            }
            if index.by_key.contains_key(&key) {
                debug!("Ignoring duplicate dataset entry '{}'", label);
                continue;
            }
            index.by_key.insert(key, entry);
        }
        index
    }

    /// Exact lookup by normalized key.
    pub fn get(&self, key: &str) -> Option<&IndexedValue> {
        if key.is_empty() {
            return None;
        }
        self.by_key.get(key)
    }

    /// Lookup by canonical key.
    pub fn get_canonical(&self, key: &str) -> Option<&IndexedValue> {
        if key.is_empty() {
            return None;
        }
        self.by_canonical.get(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

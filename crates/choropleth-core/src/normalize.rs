//! Name normalization and canonicalization.
//!
//! [`normalize`] produces the join key shared by geographic features and
//! dataset records. [`canonicalize`] is a lossier second pass that drops
//! common English and Spanish stopwords; it is only meant for the last
//! matching tier.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Words removed by [`canonicalize`].
const STOPWORDS: &[&str] = &[
    // English
    "the",
    "of",
    "and",
    "republic",
    "united",
    "islamic",
    "democratic",
    "federal",
    "state",
    "states",
    "kingdom",
    "people",
    "peoples",
    "plurinational",
    // Spanish
    "el",
    "la",
    "los",
    "las",
    "de",
    "del",
    "y",
    "republica",
    "popular",
    "democratica",
    "federacion",
    "estado",
    "estados",
    "unida",
    "unidas",
    "unido",
    "unidos",
];

/// A name reduced to lowercase ASCII letters, digits and single spaces.
///
/// Many raw names map to the same key. The empty key is never a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key is empty (garbage or blank input).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the key and return the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NormalizedKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NormalizedKey {
    fn from(raw: &str) -> Self {
        normalize(raw)
    }
}

/// Normalize a raw name into a [`NormalizedKey`].
///
/// Decomposes to NFD, drops combining marks, lowercases, removes every
/// character outside `[a-z0-9]` and whitespace, then collapses and trims
/// whitespace. Removed punctuation does not introduce a space, so
/// `"Gustavo A. Madero"` becomes `"gustavo a madero"`.
pub fn normalize(raw: &str) -> NormalizedKey {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
    {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else if c.is_whitespace() {
            pending_space = true;
        }
    }

    NormalizedKey(out)
}

/// Strip stopwords from an already normalized key.
pub fn canonicalize(key: &NormalizedKey) -> NormalizedKey {
    let words: Vec<&str> = key
        .as_str()
        .split_whitespace()
        .filter(|word| !STOPWORDS.contains(word))
        .collect();
    NormalizedKey(words.join(" "))
}

/// Normalize then canonicalize a raw name.
pub fn canonical(raw: &str) -> NormalizedKey {
    canonicalize(&normalize(raw))
}

//! Matching strategies, tried in order for every candidate key.

use serde::Serialize;

use crate::aliases::AliasTables;
use crate::index::{IndexedValue, ValueIndex};
use crate::normalize::{canonicalize, NormalizedKey};

/// A resolved dataset value and the label to show for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub value: f64,
    pub label: String,
}

impl Match {
    fn from_indexed(entry: &IndexedValue, fallback_label: &str) -> Self {
        let label = if entry.label.is_empty() {
            fallback_label.to_string()
        } else {
            entry.label.clone()
        };
        Self {
            value: entry.value,
            label,
        }
    }
}

/// Everything a strategy may consult besides the candidate key.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    /// The active dataset snapshot.
    pub index: &'a ValueIndex,
    /// Alias tables in effect.
    pub aliases: &'a AliasTables,
    /// Display name of the feature being matched, used when the dataset
    /// has no label for the hit.
    pub feature_name: &'a str,
}

/// One tier of the matching cascade.
///
/// Strategies are pure: the same candidate and context always give the
/// same answer.
pub trait MatchStrategy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Try to resolve a single candidate key.
    fn try_resolve(&self, candidate: &NormalizedKey, ctx: &MatchContext<'_>) -> Option<Match>;
}

/// The candidate is a dataset key as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl MatchStrategy for ExactMatch {
    fn name(&self) -> &str {
        "exact"
    }

    fn try_resolve(&self, candidate: &NormalizedKey, ctx: &MatchContext<'_>) -> Option<Match> {
        let entry = ctx.index.get(candidate.as_str())?;
        Some(Match::from_indexed(entry, ctx.feature_name))
    }
}

/// The candidate is a locale Spanish name that the datasets spell differently.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetAliasMatch;

impl MatchStrategy for DatasetAliasMatch {
    fn name(&self) -> &str {
        "dataset-alias"
    }

    fn try_resolve(&self, candidate: &NormalizedKey, ctx: &MatchContext<'_>) -> Option<Match> {
        let remap = ctx.aliases.dataset_labels.get(candidate.as_str())?;
        let entry = ctx.index.get(remap.as_str())?;
        Some(Match::from_indexed(entry, remap.as_str()))
    }
}

/// The candidate and a dataset key agree once stopwords are removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalMatch;

impl MatchStrategy for CanonicalMatch {
    fn name(&self) -> &str {
        "canonical"
    }

    fn try_resolve(&self, candidate: &NormalizedKey, ctx: &MatchContext<'_>) -> Option<Match> {
        let canonical = canonicalize(candidate);
        let entry = ctx.index.get_canonical(canonical.as_str())?;
        Some(Match::from_indexed(entry, ctx.feature_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn ctx<'a>(index: &'a ValueIndex, aliases: &'a AliasTables) -> MatchContext<'a> {
        MatchContext {
            index,
            aliases,
            feature_name: "Feature",
        }
    }

    #[test]
    fn test_exact() {
        let index = ValueIndex::build([("Rusia", 12.0)]);
        let aliases = AliasTables::builtin();
        let hit = ExactMatch.try_resolve(&normalize("rusia"), &ctx(&index, &aliases));
        assert_eq!(
            hit,
            Some(Match {
                value: 12.0,
                label: "Rusia".to_string()
            })
        );
        assert_eq!(
            ExactMatch.try_resolve(&normalize("russia"), &ctx(&index, &aliases)),
            None
        );
    }

    #[test]
    fn test_dataset_alias() {
        let index = ValueIndex::build([("República Checa", 7.0)]);
        let aliases = AliasTables::builtin();
        let hit = DatasetAliasMatch.try_resolve(&normalize("Chequia"), &ctx(&index, &aliases));
        assert_eq!(hit.map(|m| m.label), Some("República Checa".to_string()));
        assert_eq!(
            DatasetAliasMatch.try_resolve(&normalize("republica checa"), &ctx(&index, &aliases)),
            None
        );
    }

    #[test]
    fn test_canonical() {
        let index = ValueIndex::build([("Congo, República del", 4.0)]);
        let aliases = AliasTables::builtin();
        let hit = CanonicalMatch.try_resolve(&normalize("Republic of the Congo"), &ctx(&index, &aliases));
        assert_eq!(hit.map(|m| m.value), Some(4.0));
    }

    #[test]
    fn test_empty_candidate_never_matches() {
        let index = ValueIndex::build([("Chile", 1.0)]);
        let aliases = AliasTables::builtin();
        let empty = normalize("");
        let context = ctx(&index, &aliases);
        assert_eq!(ExactMatch.try_resolve(&empty, &context), None);
        assert_eq!(DatasetAliasMatch.try_resolve(&empty, &context), None);
        assert_eq!(CanonicalMatch.try_resolve(&empty, &context), None);
    }
}

//! Error types for name resolution and coloring.

use thiserror::Error;

/// Errors raised while loading tables or parsing colors.
///
/// Matching itself never fails: a feature without data resolves to `None`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A color string was not `#rgb` or `#rrggbb`.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// An alias table redirects back onto itself.
    #[error("alias cycle detected at '{0}'")]
    AliasCycle(String),

    /// External alias data could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

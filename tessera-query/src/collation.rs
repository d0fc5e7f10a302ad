//! Collation policies for string comparison.
//!
//! A collation decides how two strings compare for equality and ordering.
//! There is no process-wide default: every comparison receives its policy
//! explicitly, either from the filter leaf itself or from a
//! [`CollationResolver`] consulted per field path.
//!
//! ```rust
//! use std::cmp::Ordering;
//! use tessera_query::collation::{equals_ignoring_case, Collation};
//!
//! assert!(equals_ignoring_case("prisMa", "PRISMA"));
//! assert_eq!(Collation::CaseSensitive.compare("Apple", "apple"), Ordering::Less);
//! assert_eq!(Collation::CaseInsensitive.compare("Apple", "apple"), Ordering::Equal);
//! ```

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// String comparison policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Collation {
    /// Codepoint-ordinal comparison.
    #[default]
    #[serde(rename = "sensitive", alias = "default")]
    CaseSensitive,
    /// Uppercase-folded comparison.
    #[serde(rename = "insensitive")]
    CaseInsensitive,
}

impl Collation {
    /// Compare two strings under this policy.
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::CaseSensitive => a.cmp(b),
            Self::CaseInsensitive => fold(a).cmp(fold(b)),
        }
    }

    /// Check two strings for equality under this policy.
    pub fn equals(self, a: &str, b: &str) -> bool {
        match self {
            Self::CaseSensitive => a == b,
            Self::CaseInsensitive => fold(a).eq(fold(b)),
        }
    }

    /// Check whether `haystack` contains `needle`.
    pub fn contains(self, haystack: &str, needle: &str) -> bool {
        match self {
            Self::CaseSensitive => haystack.contains(needle),
            Self::CaseInsensitive => folded(haystack).contains(&folded(needle)),
        }
    }

    /// Check whether `s` starts with `prefix`.
    pub fn starts_with(self, s: &str, prefix: &str) -> bool {
        match self {
            Self::CaseSensitive => s.starts_with(prefix),
            Self::CaseInsensitive => folded(s).starts_with(&folded(prefix)),
        }
    }

    /// Check whether `s` ends with `suffix`.
    pub fn ends_with(self, s: &str, suffix: &str) -> bool {
        match self {
            Self::CaseSensitive => s.ends_with(suffix),
            Self::CaseInsensitive => folded(s).ends_with(&folded(suffix)),
        }
    }

    /// Get the policy name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CaseSensitive => "sensitive",
            Self::CaseInsensitive => "insensitive",
        }
    }
}

impl std::fmt::Display for Collation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Case-insensitive equality regardless of any configured policy.
pub fn equals_ignoring_case(a: &str, b: &str) -> bool {
    Collation::CaseInsensitive.equals(a, b)
}

// ASCII letters fold exactly; other characters use the Unicode uppercase
// mapping, which is best effort for multi-char expansions.
fn fold(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_uppercase)
}

fn folded(s: &str) -> String {
    if s.is_ascii() {
        s.to_ascii_uppercase()
    } else {
        fold(s).collect()
    }
}

/// Source of default collations for field paths.
pub trait CollationResolver: Send + Sync {
    /// The collation for a dotted field path.
    fn collation(&self, path: &str) -> Collation;
}

impl CollationResolver for Collation {
    fn collation(&self, _path: &str) -> Collation {
        *self
    }
}

impl<R: CollationResolver + ?Sized> CollationResolver for &R {
    fn collation(&self, path: &str) -> Collation {
        (**self).collation(path)
    }
}

/// A default collation plus per-path overrides.
///
/// ```rust
/// use tessera_query::collation::{Collation, CollationMap, CollationResolver};
///
/// let map = CollationMap::new(Collation::CaseSensitive)
///     .with_override("email", Collation::CaseInsensitive);
/// assert_eq!(map.collation("email"), Collation::CaseInsensitive);
/// assert_eq!(map.collation("name"), Collation::CaseSensitive);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollationMap {
    /// Collation for paths without an override.
    #[serde(default)]
    pub default: Collation,
    /// Per-path overrides keyed by dotted path.
    #[serde(default)]
    pub overrides: IndexMap<String, Collation>,
}

impl CollationMap {
    /// Create a map with the given default and no overrides.
    pub fn new(default: Collation) -> Self {
        Self {
            default,
            overrides: IndexMap::new(),
        }
    }

    /// Add an override for a dotted path.
    pub fn with_override(mut self, path: impl Into<String>, collation: Collation) -> Self {
        self.overrides.insert(path.into(), collation);
        self
    }
}

impl CollationResolver for CollationMap {
    fn collation(&self, path: &str) -> Collation {
        self.overrides.get(path).copied().unwrap_or(self.default)
    }
}

//! Versioned entity identity.
//!
//! Questions and options are identified by (name, version): the name is the
//! stable lineage, the version increments monotonically on every fork.
//! Answers pin the exact key that was active at submission time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Composite (name, version) key for a versioned entity.
///
/// Equality and hashing are exact (case-sensitive): an `Answer` must resolve
/// the precise row it was graded against. Case-insensitive matching during
/// template sync happens in the sync handlers, never here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionKey {
    pub name: String,
    pub version: i32,
}

impl VersionKey {
    pub fn new(name: impl Into<String>, version: i32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.name, self.version)
    }
}

/// Strip a legacy `"{question_name}_"` prefix from an option name.
///
/// Older data stored option names prefixed with their owning question's name.
/// Sync matching accepts both spellings; this helper is the only place that
/// knows about the legacy scheme.
pub fn strip_legacy_prefix<'a>(option_name: &'a str, question_name: &str) -> Option<&'a str> {
    if question_name.is_empty() {
        return None;
    }
    let head = option_name.get(..question_name.len())?;
    if !head.eq_ignore_ascii_case(question_name) {
        return None;
    }
    let tail = option_name[question_name.len()..].strip_prefix('_')?;
    if tail.is_empty() {
        None
    } else {
        Some(tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn display_format() {
        let key = VersionKey::new("onboarding-quiz", 3);
        assert_eq!(key.to_string(), "onboarding-quiz v3");
    }

    #[test]
    fn keys_are_case_sensitive() {
        let a = VersionKey::new("q1", 1);
        let b = VersionKey::new("Q1", 1);
        assert_ne!(a, b);
    }

    #[test]
    fn keys_distinguish_versions() {
        let mut map = HashMap::new();
        map.insert(VersionKey::new("q1", 1), "old");
        map.insert(VersionKey::new("q1", 2), "new");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn strips_exact_prefix() {
        assert_eq!(strip_legacy_prefix("q1_optA", "q1"), Some("optA"));
    }

    #[test]
    fn strips_prefix_case_insensitively() {
        assert_eq!(strip_legacy_prefix("Q1_optA", "q1"), Some("optA"));
    }

    #[test]
    fn no_prefix_returns_none() {
        assert_eq!(strip_legacy_prefix("optA", "q1"), None);
    }

    #[test]
    fn bare_prefix_returns_none() {
        // Nothing after the underscore is not a legacy name.
        assert_eq!(strip_legacy_prefix("q1_", "q1"), None);
    }

    #[test]
    fn different_question_returns_none() {
        assert_eq!(strip_legacy_prefix("q2_optA", "q1"), None);
    }
}

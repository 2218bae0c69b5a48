//! Type-safe identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::errors::{DotkitError, Result};

/// A validated kit identifier.
///
/// Kit identifiers must:
/// - Start with a lowercase letter or digit
/// - Contain only lowercase letters, digits, hyphens, and underscores
///
/// # Example
///
/// ```
/// use dotkit_types::KitId;
///
/// let kit = KitId::new("gt-graphite").unwrap();
/// assert_eq!(kit.as_str(), "gt-graphite");
///
/// // Invalid identifiers are rejected
/// assert!(KitId::new("Bad Kit").is_err());
/// assert!(KitId::new("-leading").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KitId(String);

impl KitId {
    /// Create a new validated kit identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier doesn't meet validation requirements.
    pub fn new(id: impl AsRef<str>) -> Result<Self> {
        let id = id.as_ref();
        if !Self::is_valid(id) {
            return Err(DotkitError::Validation(format!(
                "Invalid kit id '{}': must contain only lowercase letters, digits, hyphens, \
                and underscores, and must start with a letter or digit",
                id
            )));
        }
        Ok(Self(id.to_string()))
    }

    /// Check if an identifier is valid without allocating.
    pub fn is_valid(id: &str) -> bool {
        let mut chars = id.chars();
        let first = match chars.next() {
            Some(c) => c,
            None => return false,
        };

        if !(first.is_ascii_lowercase() || first.is_ascii_digit()) {
            return false;
        }

        chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for KitId {
    type Err = DotkitError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for KitId {
    type Error = DotkitError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<KitId> for String {
    fn from(id: KitId) -> Self {
        id.0
    }
}

impl AsRef<str> for KitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_kit_id_validation() {
        assert!(KitId::new("devrun").is_ok());
        assert!(KitId::new("gt_graphite").is_ok());
        assert!(KitId::new("123kit").is_ok());

        assert!(KitId::new("Devrun").is_err());
        assert!(KitId::new("-devrun").is_err());
        assert!(KitId::new("").is_err());
        assert!(KitId::new("dev run").is_err());
        assert!(KitId::new("../escape").is_err());
    }

    #[test]
    fn test_kit_id_deserialize_rejects_invalid() {
        let ok: KitId = serde_yaml::from_str("demo").unwrap();
        assert_eq!(ok.as_str(), "demo");
        assert!(serde_yaml::from_str::<KitId>("Not Valid").is_err());
    }

    proptest! {
        #[test]
        fn prop_valid_ids_accepted(id in "[a-z0-9][a-z0-9_-]{0,30}") {
            prop_assert!(KitId::new(&id).is_ok());
        }

        #[test]
        fn prop_path_separators_rejected(prefix in "[a-z]{1,8}", suffix in "[a-z]{1,8}") {
            let slash = format!("{}/{}", prefix, suffix);
            let backslash = format!("{}\\{}", prefix, suffix);
            prop_assert!(KitId::new(&slash).is_err());
            prop_assert!(KitId::new(&backslash).is_err());
        }
    }
}

//! Identifiers for declared resources.
//!
//! Logical ids are caller-assigned and unique within a stack. They are
//! independent of whatever identifier a provider assigns at deploy time.

use crate::error::{SynthError, SynthResult};
use crate::hash::Hash;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static LOGICAL_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9/_-]*$").expect("logical id pattern is valid")
});

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]").expect("sanitize pattern is valid"));

/// Number of hash bytes appended to path-derived ids (8 hex chars)
const PATH_SUFFIX_BYTES: usize = 4;

/// Logical identifier - names a resource within a stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalId(String);

impl LogicalId {
    /// Create a logical id, validating its characters
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` if the id is empty, does not start with an ASCII
    /// letter, or contains characters other than alphanumerics, `/`, `_`, `-`
    pub fn new(id: impl Into<String>) -> SynthResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(SynthError::InvalidId {
                reason: "logical id must not be empty".to_string(),
            });
        }
        if !LOGICAL_ID.is_match(&id) {
            return Err(SynthError::InvalidId {
                reason: format!("'{}' must match {}", id, LOGICAL_ID.as_str()),
            });
        }
        Ok(Self(id))
    }

    /// Derive a logical id from a construct path
    ///
    /// The alphanumeric characters of every component are concatenated and
    /// followed by an 8-character hex suffix of the BLAKE3 hash of the full
    /// path, so ids stay stable across runs and distinct across paths.
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` if the path is empty or sanitizes to an id that
    /// does not start with a letter
    pub fn from_path(components: &[&str]) -> SynthResult<Self> {
        if components.is_empty() {
            return Err(SynthError::InvalidId {
                reason: "construct path must not be empty".to_string(),
            });
        }

        let human: String = components
            .iter()
            .map(|c| NON_ALPHANUMERIC.replace_all(c, ""))
            .collect();
        if !human.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(SynthError::InvalidId {
                reason: format!(
                    "construct path '{}' does not start with a letter once sanitized",
                    components.join("/")
                ),
            });
        }

        let suffix = Hash::compute_joined(components, "/").short_hex(PATH_SUFFIX_BYTES);
        Self::new(format!("{}{}", human, suffix))
    }

    /// Borrow the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LogicalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LogicalId {
    type Error = SynthError;

    fn try_from(value: String) -> SynthResult<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for LogicalId {
    type Error = SynthError;

    fn try_from(value: &str) -> SynthResult<Self> {
        Self::new(value)
    }
}

impl From<LogicalId> for String {
    fn from(id: LogicalId) -> Self {
        id.0
    }
}

impl AsRef<str> for LogicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resource type tag (e.g. `AWS::EC2::VPC`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceType(String);

impl ResourceType {
    /// Create a resource type tag
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` if the tag is empty or contains whitespace
    pub fn new(tag: impl Into<String>) -> SynthResult<Self> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(SynthError::InvalidType {
                reason: "resource type must not be empty".to_string(),
            });
        }
        if tag.chars().any(char::is_whitespace) {
            return Err(SynthError::InvalidType {
                reason: format!("'{}' contains whitespace", tag),
            });
        }
        Ok(Self(tag))
    }

    /// Borrow the tag as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ResourceType {
    type Error = SynthError;

    fn try_from(value: String) -> SynthResult<Self> {
        Self::new(value)
    }
}

impl From<ResourceType> for String {
    fn from(tag: ResourceType) -> Self {
        tag.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_id_valid() {
        assert!(LogicalId::new("Vpc").is_ok());
        assert!(LogicalId::new("Vpc/PrivateSubnet0").is_ok());
        assert!(LogicalId::new("eice-sg_1").is_ok());
    }

    #[test]
    fn test_logical_id_invalid() {
        assert!(matches!(
            LogicalId::new(""),
            Err(SynthError::InvalidId { .. })
        ));
        assert!(LogicalId::new("0Vpc").is_err());
        assert!(LogicalId::new("Vpc Subnet").is_err());
        assert!(LogicalId::new("Vpc.Subnet").is_err());
    }

    #[test]
    fn test_logical_id_display() {
        let id = LogicalId::new("Instance").unwrap();
        assert_eq!(format!("{}", id), "Instance");
        assert_eq!(id.as_str(), "Instance");
    }

    #[test]
    fn test_logical_id_serde_transparent() {
        let id = LogicalId::new("Vpc").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"Vpc\"");
        let back: LogicalId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_logical_id_deserialize_rejects_invalid() {
        let result = serde_json::from_str::<LogicalId>("\"has space\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_path_deterministic() {
        let a = LogicalId::from_path(&["Vpc", "PrivateSubnet1", "Subnet"]).unwrap();
        let b = LogicalId::from_path(&["Vpc", "PrivateSubnet1", "Subnet"]).unwrap();
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("VpcPrivateSubnet1Subnet"));
        assert_eq!(a.as_str().len(), "VpcPrivateSubnet1Subnet".len() + 8);
    }

    #[test]
    fn test_from_path_distinguishes_colliding_prefixes() {
        let a = LogicalId::from_path(&["Vpc", "A-B"]).unwrap();
        let b = LogicalId::from_path(&["Vpc", "AB"]).unwrap();
        assert_ne!(a, b);
        assert_eq!(&a.as_str()[..5], &b.as_str()[..5]);
    }

    #[test]
    fn test_from_path_invalid() {
        assert!(LogicalId::from_path(&[]).is_err());
        assert!(LogicalId::from_path(&["--", "//"]).is_err());
        assert!(LogicalId::from_path(&["1st"]).is_err());
    }

    #[test]
    fn test_logical_id_ordering() {
        let a = LogicalId::new("A").unwrap();
        let b = LogicalId::new("B").unwrap();
        assert!(a < b);
    }

    proptest::proptest! {
        #[test]
        fn prop_from_path_yields_stable_valid_id(
            components in proptest::collection::vec("[A-Za-z][A-Za-z0-9_-]{0,12}", 1..5)
        ) {
            let parts: Vec<&str> = components.iter().map(String::as_str).collect();
            let derived = LogicalId::from_path(&parts).unwrap();
            proptest::prop_assert!(LogicalId::new(derived.as_str()).is_ok());
            proptest::prop_assert_eq!(derived, LogicalId::from_path(&parts).unwrap());
        }
    }

    #[test]
    fn test_resource_type() {
        let t = ResourceType::new("AWS::EC2::VPC").unwrap();
        assert_eq!(t.as_str(), "AWS::EC2::VPC");
        assert!(ResourceType::new("").is_err());
        assert!(ResourceType::new("AWS EC2").is_err());
    }
}

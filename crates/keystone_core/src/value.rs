//! Property values and cross-resource references.
//!
//! A property is either a literal or a symbolic pointer at another
//! resource's attribute. References are never resolved to concrete values
//! here; those only exist after deployment.
//!
//! The serialized form is plain JSON for literals, `{"ref": .., "attribute": ..}`
//! for references and `{"join": [..], "delimiter": ..}` for joins. Only maps
//! are ever read back as references or joins: a map with exactly the keys
//! `ref` and `attribute`, or with `join` and at most `delimiter`.

use crate::error::{SynthError, SynthResult};
use crate::id::LogicalId;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

const REF_KEY: &str = "ref";
const ATTRIBUTE_KEY: &str = "attribute";
const JOIN_KEY: &str = "join";
const DELIMITER_KEY: &str = "delimiter";

/// A weak, named pointer at another resource's attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reference {
    /// Referenced resource
    #[serde(rename = "ref")]
    pub target: LogicalId,
    /// Attribute of the referenced resource (e.g. `SubnetId`)
    pub attribute: String,
}

impl Reference {
    /// Create a new reference
    #[must_use]
    pub fn new(target: LogicalId, attribute: impl Into<String>) -> Self {
        Self {
            target,
            attribute: attribute.into(),
        }
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.target, self.attribute)
    }
}

/// String concatenation of literal and referenced parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Join {
    /// Parts to concatenate
    #[serde(rename = "join")]
    pub parts: Vec<PropertyValue>,
    /// Separator placed between parts
    pub delimiter: String,
}

/// Property value - literal or reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Reference to another resource's attribute
    Reference(Reference),
    /// Join of several values into one string
    Join(Join),
    /// Null literal
    Null,
    /// Boolean literal
    Bool(bool),
    /// Numeric literal
    Number(serde_json::Number),
    /// String literal
    String(String),
    /// List of values
    List(Vec<PropertyValue>),
    /// Key-sorted map of values
    Map(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Build a reference value
    #[must_use]
    pub fn reference(target: LogicalId, attribute: impl Into<String>) -> Self {
        Self::Reference(Reference::new(target, attribute))
    }

    /// Build a join value
    #[must_use]
    pub fn join(parts: Vec<PropertyValue>, delimiter: impl Into<String>) -> Self {
        Self::Join(Join {
            parts,
            delimiter: delimiter.into(),
        })
    }

    /// Build a string literal
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Whether this value contains no references at any depth
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.references().is_empty()
    }

    /// Every reference inside this value, depth-first in document order
    #[must_use]
    pub fn references(&self) -> Vec<&Reference> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    /// Check that no literal map would read back as a reference or join
    ///
    /// `path` names this value in the error, nested maps and lists extend it
    /// with `.key` and `[index]`.
    ///
    /// # Errors
    ///
    /// Returns `Encoding` naming the first offending map
    pub fn ensure_unambiguous(&self, path: &str) -> SynthResult<()> {
        match self {
            Self::Map(entries) => {
                let keys: Vec<&str> = entries.keys().map(String::as_str).collect();
                if is_reference_shape(&keys) || is_join_shape(&keys) {
                    return Err(SynthError::Encoding {
                        message: format!(
                            "literal map at '{}' has the shape of a reference or join",
                            path
                        ),
                    });
                }
                for (key, value) in entries {
                    value.ensure_unambiguous(&format!("{}.{}", path, key))?;
                }
            }
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    item.ensure_unambiguous(&format!("{}[{}]", path, i))?;
                }
            }
            Self::Join(join) => {
                for (i, part) in join.parts.iter().enumerate() {
                    part.ensure_unambiguous(&format!("{}[{}]", path, i))?;
                }
            }
            Self::Reference(_) | Self::Null | Self::Bool(_) | Self::Number(_) | Self::String(_) => {}
        }
        Ok(())
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a Reference>) {
        match self {
            Self::Reference(r) => out.push(r),
            Self::Join(join) => {
                for part in &join.parts {
                    part.collect_references(out);
                }
            }
            Self::List(items) => {
                for item in items {
                    item.collect_references(out);
                }
            }
            Self::Map(entries) => {
                for value in entries.values() {
                    value.collect_references(out);
                }
            }
            Self::Null | Self::Bool(_) | Self::Number(_) | Self::String(_) => {}
        }
    }
}

impl TryFrom<serde_json::Value> for PropertyValue {
    type Error = SynthError;

    fn try_from(value: serde_json::Value) -> SynthResult<Self> {
        use serde_json::Value;

        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(Self::try_from)
                    .collect::<SynthResult<_>>()?,
            ),
            Value::Object(mut map) => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();

                if is_reference_shape(&keys) {
                    let target = take_string(&mut map, REF_KEY)?;
                    let attribute = take_string(&mut map, ATTRIBUTE_KEY)?;
                    Self::Reference(Reference::new(LogicalId::new(target)?, attribute))
                } else if is_join_shape(&keys) {
                    let delimiter = if map.contains_key(DELIMITER_KEY) {
                        take_string(&mut map, DELIMITER_KEY)?
                    } else {
                        String::new()
                    };
                    let Some(Value::Array(parts)) = map.remove(JOIN_KEY) else {
                        return Err(SynthError::Encoding {
                            message: "join parts must be a list".to_string(),
                        });
                    };
                    Self::Join(Join {
                        parts: parts
                            .into_iter()
                            .map(Self::try_from)
                            .collect::<SynthResult<_>>()?,
                        delimiter,
                    })
                } else {
                    Self::Map(
                        map.into_iter()
                            .map(|(k, v)| Self::try_from(v).map(|v| (k, v)))
                            .collect::<SynthResult<_>>()?,
                    )
                }
            }
        })
    }
}

fn is_reference_shape(keys: &[&str]) -> bool {
    keys.len() == 2 && keys.contains(&REF_KEY) && keys.contains(&ATTRIBUTE_KEY)
}

fn is_join_shape(keys: &[&str]) -> bool {
    keys.contains(&JOIN_KEY) && keys.iter().all(|k| *k == JOIN_KEY || *k == DELIMITER_KEY)
}

fn take_string(map: &mut serde_json::Map<String, serde_json::Value>, key: &str) -> SynthResult<String> {
    match map.remove(key) {
        Some(serde_json::Value::String(s)) => Ok(s),
        _ => Err(SynthError::Encoding {
            message: format!("'{}' must be a string", key),
        }),
    }
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

impl From<Reference> for PropertyValue {
    fn from(value: Reference) -> Self {
        Self::Reference(value)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(value: Vec<PropertyValue>) -> Self {
        Self::List(value)
    }
}

impl From<BTreeMap<String, PropertyValue>> for PropertyValue {
    fn from(value: BTreeMap<String, PropertyValue>) -> Self {
        Self::Map(value)
    }
}

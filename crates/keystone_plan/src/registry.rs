//! Resource registry.
//!
//! Holds declared resources in registration order. Registration order is
//! the planner's tie-break, so it is preserved exactly.

use indexmap::IndexMap;
use keystone_core::{LogicalId, PropertyValue, ResourceType, SynthError, SynthResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A declared resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Logical id, unique within the registry
    pub id: LogicalId,
    /// Type tag
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Property name to value
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Resource {
    /// Create a resource with no properties
    #[must_use]
    pub fn new(id: LogicalId, resource_type: ResourceType) -> Self {
        Self {
            id,
            resource_type,
            properties: BTreeMap::new(),
        }
    }

    /// Set a property
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// Registry of declared resources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    resources: IndexMap<LogicalId, Resource>,
}

impl Registry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource
    ///
    /// # Errors
    ///
    /// Returns `DuplicateIdentifier` if the logical id is already registered,
    /// or `Encoding` if a literal map property looks like a reference or join
    pub fn register(&mut self, resource: Resource) -> SynthResult<()> {
        if self.resources.contains_key(&resource.id) {
            return Err(SynthError::DuplicateIdentifier { id: resource.id });
        }
        for (name, value) in &resource.properties {
            value.ensure_unambiguous(&format!("{}.{}", resource.id, name))?;
        }
        self.resources.insert(resource.id.clone(), resource);
        Ok(())
    }

    /// Look up a resource
    ///
    /// # Errors
    ///
    /// Returns `UnknownResource` if no resource has this id
    pub fn get(&self, id: &LogicalId) -> SynthResult<&Resource> {
        self.resources
            .get(id)
            .ok_or_else(|| SynthError::UnknownResource { id: id.clone() })
    }

    /// Registration index of a resource
    #[must_use]
    pub fn index_of(&self, id: &LogicalId) -> Option<usize> {
        self.resources.get_index_of(id)
    }

    /// Resource at a registration index
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Resource> {
        self.resources.get_index(index).map(|(_, r)| r)
    }

    /// Whether a resource is registered
    #[must_use]
    pub fn contains(&self, id: &LogicalId) -> bool {
        self.resources.contains_key(id)
    }

    /// Resources in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Logical ids in registration order
    pub fn ids(&self) -> impl Iterator<Item = &LogicalId> {
        self.resources.keys()
    }

    /// Number of registered resources
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

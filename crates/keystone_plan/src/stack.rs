//! Stack declarations.
//!
//! A stack bundles everything a caller declares before synthesis: the
//! resources, explicit ordering hints and named outputs. Ordering hints stay
//! outside the resource model; the graph builder merges them with the edges
//! derived from references.

use crate::registry::{Registry, Resource};
use indexmap::IndexMap;
use keystone_core::{LogicalId, PropertyValue, ResourceType, SynthError, SynthResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Ordering requirement without a data reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependsOn {
    /// Resource that must wait
    pub dependent: LogicalId,
    /// Resource that must exist first
    pub dependency: LogicalId,
}

/// Named stack output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    /// Output value, usually a reference or join
    pub value: PropertyValue,
    /// Human readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Output {
    /// Create an output without description
    #[must_use]
    pub fn new(value: impl Into<PropertyValue>) -> Self {
        Self {
            value: value.into(),
            description: None,
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A complete set of declarations handed to the synthesizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    /// Stack name
    pub name: String,
    /// Optional description carried into the template
    pub description: Option<String>,
    registry: Registry,
    depends_on: Vec<DependsOn>,
    outputs: IndexMap<String, Output>,
}

impl Stack {
    /// Create an empty stack
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            registry: Registry::new(),
            depends_on: Vec::new(),
            outputs: IndexMap::new(),
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare a resource
    ///
    /// # Errors
    ///
    /// Returns `DuplicateIdentifier` if the logical id is already declared
    pub fn add_resource(&mut self, resource: Resource) -> SynthResult<()> {
        self.registry.register(resource)
    }

    /// Declare that `dependent` must be created after `dependency`
    ///
    /// Unknown ids are reported when the dependency graph is built.
    pub fn add_dependency(&mut self, dependent: LogicalId, dependency: LogicalId) {
        self.depends_on.push(DependsOn {
            dependent,
            dependency,
        });
    }

    /// Declare a named output
    ///
    /// # Errors
    ///
    /// Returns `DuplicateOutput` if the name is already used, or `Encoding` if
    /// a literal map in the value looks like a reference or join
    pub fn add_output(&mut self, name: impl Into<String>, output: Output) -> SynthResult<()> {
        let name = name.into();
        if self.outputs.contains_key(&name) {
            return Err(SynthError::DuplicateOutput { name });
        }
        output.value.ensure_unambiguous(&name)?;
        self.outputs.insert(name, output);
        Ok(())
    }

    /// Declared resources
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Explicit ordering hints in declaration order
    #[must_use]
    pub fn depends_on(&self) -> &[DependsOn] {
        &self.depends_on
    }

    /// Outputs in declaration order
    #[must_use]
    pub fn outputs(&self) -> &IndexMap<String, Output> {
        &self.outputs
    }

    /// Build a stack from a parsed document
    ///
    /// Resources are registered in document order.
    ///
    /// # Errors
    ///
    /// Returns the first registration error in document order
    pub fn from_document(doc: StackDocument) -> SynthResult<Self> {
        let mut stack = Self::new(doc.name);
        stack.description = doc.description;

        for decl in doc.resources {
            for dependency in decl.depends_on {
                stack.add_dependency(decl.id.clone(), dependency);
            }
            stack.add_resource(Resource {
                id: decl.id,
                resource_type: decl.resource_type,
                properties: decl.properties,
            })?;
        }

        for decl in doc.outputs {
            stack.add_output(
                decl.name,
                Output {
                    value: decl.value,
                    description: decl.description,
                },
            )?;
        }

        Ok(stack)
    }

    /// Parse a stack from a JSON document
    ///
    /// # Errors
    ///
    /// Returns `Encoding` for malformed JSON, or any registration error
    pub fn from_json(json: &str) -> SynthResult<Self> {
        let doc: StackDocument = serde_json::from_str(json)?;
        Self::from_document(doc)
    }

    /// Read a stack from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise as [`Stack::from_json`]
    pub fn load(path: impl AsRef<Path>) -> SynthResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Serialized form of a stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StackDocument {
    /// Stack name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Resources in registration order
    #[serde(default)]
    pub resources: Vec<ResourceDecl>,
    /// Outputs in declaration order
    #[serde(default)]
    pub outputs: Vec<OutputDecl>,
}

/// Serialized resource declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourceDecl {
    /// Logical id
    pub id: LogicalId,
    /// Type tag
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Properties
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    /// Explicit ordering hints
    #[serde(default)]
    pub depends_on: Vec<LogicalId>,
}

/// Serialized output declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputDecl {
    /// Output name
    pub name: String,
    /// Output value
    pub value: PropertyValue,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

//! Template emitter.
//!
//! Serializes declarations and the plan into a stable document. Every map in
//! the template is key-sorted, so identical input always yields identical
//! bytes. References are kept as `{ref, attribute}` placeholders; concrete
//! values only exist after deployment.

use crate::config::SynthConfig;
use crate::graph::DependencyGraph;
use crate::planner::Plan;
use crate::stack::{Output, Stack};
use keystone_core::{Hash, LogicalId, PropertyValue, ResourceType, SynthResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Synthesized template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Template format version
    pub format_version: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Resources by logical id
    pub resources: BTreeMap<LogicalId, TemplateResource>,
    /// Creation order
    pub order: Vec<LogicalId>,
    /// Outputs by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

/// A resource as written into the template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResource {
    /// Type tag
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Properties with reference placeholders
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertyValue>,
    /// Explicit ordering hints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<LogicalId>,
}

impl Template {
    /// Serialize to JSON
    ///
    /// # Errors
    ///
    /// Returns `Encoding` if serialization fails
    pub fn to_json(&self, pretty: bool) -> SynthResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Parse a template from JSON
    ///
    /// # Errors
    ///
    /// Returns `Encoding` if the document is malformed
    pub fn from_json(json: &str) -> SynthResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// BLAKE3 hash of the compact JSON form
    ///
    /// # Errors
    ///
    /// Returns `Encoding` if serialization fails
    pub fn fingerprint(&self) -> SynthResult<Hash> {
        Ok(Hash::compute(self.to_json(false)?.as_bytes()))
    }
}

/// Writes templates from planned stacks
pub struct Emitter<'a> {
    config: &'a SynthConfig,
}

impl<'a> Emitter<'a> {
    /// Create an emitter
    #[must_use]
    pub fn new(config: &'a SynthConfig) -> Self {
        Self { config }
    }

    /// Build the template for a planned stack
    #[must_use]
    pub fn emit(&self, stack: &Stack, graph: &DependencyGraph, plan: &Plan) -> Template {
        let resources = stack
            .registry()
            .iter()
            .map(|resource| {
                let depends_on = graph
                    .explicit_dependencies(&resource.id)
                    .into_iter()
                    .cloned()
                    .collect();
                (
                    resource.id.clone(),
                    TemplateResource {
                        resource_type: resource.resource_type.clone(),
                        properties: resource.properties.clone(),
                        depends_on,
                    },
                )
            })
            .collect();

        let outputs = stack
            .outputs()
            .iter()
            .map(|(name, output)| (name.clone(), output.clone()))
            .collect();

        Template {
            format_version: self.config.format_version.clone(),
            description: self
                .config
                .description
                .clone()
                .or_else(|| stack.description.clone()),
            resources,
            order: plan.creation_order().to_vec(),
            outputs,
        }
    }
}

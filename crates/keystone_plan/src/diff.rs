//! Diff engine for comparing synthesized templates.

use crate::emitter::Template;
use keystone_core::LogicalId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Type of resource change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceChangeType {
    /// Resource only exists in the new template
    Added,
    /// Resource only exists in the old template
    Removed,
    /// Properties or ordering hints changed
    Modified,
    /// Type tag changed; the resource must be recreated
    Replaced,
}

/// Change to a specific resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceChange {
    /// Logical id
    pub id: LogicalId,
    /// Type of change
    pub change_type: ResourceChangeType,
    /// Names of changed properties (for `Modified`)
    pub properties: Vec<String>,
}

/// Change to a specific output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputChange {
    /// Output name
    pub name: String,
    /// Type of change
    pub change_type: ResourceChangeType,
}

/// Summary of diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Number of resources added
    pub added_count: usize,
    /// Number of resources removed
    pub removed_count: usize,
    /// Number of resources modified
    pub modified_count: usize,
    /// Number of resources replaced
    pub replaced_count: usize,
}

/// Difference between two templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDiff {
    /// Resource changes, sorted by logical id
    pub resources: Vec<ResourceChange>,
    /// Output changes, sorted by name
    pub outputs: Vec<OutputChange>,
    /// Whether the creation order differs
    pub order_changed: bool,
}

impl TemplateDiff {
    /// Compare `old` against `new`
    #[must_use]
    pub fn between(old: &Template, new: &Template) -> Self {
        let ids: BTreeSet<&LogicalId> = old.resources.keys().chain(new.resources.keys()).collect();
        let mut resources = Vec::new();

        for id in ids {
            let change = match (old.resources.get(id), new.resources.get(id)) {
                (None, Some(_)) => Some((ResourceChangeType::Added, Vec::new())),
                (Some(_), None) => Some((ResourceChangeType::Removed, Vec::new())),
                (Some(a), Some(b)) if a.resource_type != b.resource_type => {
                    Some((ResourceChangeType::Replaced, Vec::new()))
                }
                (Some(a), Some(b)) => {
                    let names: BTreeSet<&String> =
                        a.properties.keys().chain(b.properties.keys()).collect();
                    let changed: Vec<String> = names
                        .into_iter()
                        .filter(|name| a.properties.get(*name) != b.properties.get(*name))
                        .cloned()
                        .collect();
                    if changed.is_empty() && a.depends_on == b.depends_on {
                        None
                    } else {
                        Some((ResourceChangeType::Modified, changed))
                    }
                }
                (None, None) => None,
            };

            if let Some((change_type, properties)) = change {
                resources.push(ResourceChange {
                    id: id.clone(),
                    change_type,
                    properties,
                });
            }
        }

        let names: BTreeSet<&String> = old.outputs.keys().chain(new.outputs.keys()).collect();
        let outputs = names
            .into_iter()
            .filter_map(|name| {
                let change_type = match (old.outputs.get(name), new.outputs.get(name)) {
                    (None, Some(_)) => ResourceChangeType::Added,
                    (Some(_), None) => ResourceChangeType::Removed,
                    (Some(a), Some(b)) if a != b => ResourceChangeType::Modified,
                    _ => return None,
                };
                Some(OutputChange {
                    name: name.clone(),
                    change_type,
                })
            })
            .collect();

        Self {
            resources,
            outputs,
            order_changed: old.order != new.order,
        }
    }

    /// Whether the templates are equivalent
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.outputs.is_empty() && !self.order_changed
    }

    /// Count resource changes by type
    #[must_use]
    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary::default();
        for change in &self.resources {
            match change.change_type {
                ResourceChangeType::Added => summary.added_count += 1,
                ResourceChangeType::Removed => summary.removed_count += 1,
                ResourceChangeType::Modified => summary.modified_count += 1,
                ResourceChangeType::Replaced => summary.replaced_count += 1,
            }
        }
        summary
    }
}

impl std::fmt::Display for TemplateDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for change in &self.resources {
            let sign = match change.change_type {
                ResourceChangeType::Added => "+",
                ResourceChangeType::Removed => "-",
                ResourceChangeType::Modified => "~",
                ResourceChangeType::Replaced => "!",
            };
            if change.properties.is_empty() {
                writeln!(f, "{} {}", sign, change.id)?;
            } else {
                writeln!(f, "{} {} ({})", sign, change.id, change.properties.join(", "))?;
            }
        }
        for change in &self.outputs {
            writeln!(f, "output {:?}: {}", change.change_type, change.name)?;
        }
        if self.order_changed {
            writeln!(f, "creation order changed")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::TemplateResource;
    use crate::stack::Output;
    use keystone_core::{PropertyValue, ResourceType};
    use std::collections::BTreeMap;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    fn res(ty: &str, props: &[(&str, &str)]) -> TemplateResource {
        TemplateResource {
            resource_type: ResourceType::new(ty).unwrap(),
            properties: props
                .iter()
                .map(|(k, v)| (k.to_string(), PropertyValue::string(*v)))
                .collect(),
            depends_on: Vec::new(),
        }
    }

    fn template(resources: Vec<(&str, TemplateResource)>) -> Template {
        Template {
            format_version: "2010-09-09".to_string(),
            description: None,
            order: resources.iter().map(|(n, _)| id(n)).collect(),
            resources: resources.into_iter().map(|(n, r)| (id(n), r)).collect(),
            outputs: BTreeMap::new(),
        }
    }

    #[test]
    fn test_identical_templates() {
        let t = template(vec![("Vpc", res("AWS::EC2::VPC", &[("CidrBlock", "10.0.0.0/16")]))]);
        let diff = TemplateDiff::between(&t, &t.clone());
        assert!(diff.is_empty());
        assert_eq!(diff.summary(), DiffSummary::default());
    }

    #[test]
    fn test_added_removed_modified_replaced() {
        let old = template(vec![
            ("Vpc", res("AWS::EC2::VPC", &[("CidrBlock", "10.0.0.0/16")])),
            ("Old", res("AWS::EC2::Subnet", &[])),
            ("Sg", res("AWS::EC2::SecurityGroup", &[])),
        ]);
        let new = template(vec![
            ("Vpc", res("AWS::EC2::VPC", &[("CidrBlock", "10.1.0.0/16")])),
            ("Sg", res("AWS::EC2::Instance", &[])),
            ("New", res("AWS::EC2::Subnet", &[])),
        ]);

        let diff = TemplateDiff::between(&old, &new);
        let changes: Vec<(&str, ResourceChangeType)> = diff
            .resources
            .iter()
            .map(|c| (c.id.as_str(), c.change_type))
            .collect();
        assert_eq!(
            changes,
            vec![
                ("New", ResourceChangeType::Added),
                ("Old", ResourceChangeType::Removed),
                ("Sg", ResourceChangeType::Replaced),
                ("Vpc", ResourceChangeType::Modified),
            ]
        );
        assert_eq!(diff.resources[3].properties, vec!["CidrBlock".to_string()]);
        assert!(diff.order_changed);

        let summary = diff.summary();
        assert_eq!(summary.added_count, 1);
        assert_eq!(summary.removed_count, 1);
        assert_eq!(summary.modified_count, 1);
        assert_eq!(summary.replaced_count, 1);
    }

    #[test]
    fn test_depends_on_change_is_modification() {
        let old = template(vec![("A", res("T", &[])), ("B", res("T", &[]))]);
        let mut new = old.clone();
        if let Some(b) = new.resources.get_mut(&id("B")) {
            b.depends_on.push(id("A"));
        }

        let diff = TemplateDiff::between(&old, &new);
        assert_eq!(diff.resources.len(), 1);
        assert_eq!(diff.resources[0].change_type, ResourceChangeType::Modified);
        assert!(diff.resources[0].properties.is_empty());
        assert!(!diff.order_changed);
    }

    #[test]
    fn test_output_changes() {
        let old = template(vec![]);
        let mut new = old.clone();
        new.outputs.insert("InstanceId".to_string(), Output::new("i-123"));

        let diff = TemplateDiff::between(&old, &new);
        assert_eq!(
            diff.outputs,
            vec![OutputChange {
                name: "InstanceId".to_string(),
                change_type: ResourceChangeType::Added,
            }]
        );
        assert!(!diff.is_empty());
    }

    #[test]
    fn test_display() {
        let old = template(vec![("Vpc", res("AWS::EC2::VPC", &[]))]);
        let new = template(vec![]);
        let text = TemplateDiff::between(&old, &new).to_string();
        assert!(text.contains("- Vpc"));
        assert!(text.contains("creation order changed"));
    }
}

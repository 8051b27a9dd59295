//! Reference resolver.
//!
//! Turns symbolic references inside property values into the set of
//! resources each resource points at. Pure function of the registry.

use crate::registry::Registry;
use crate::stack::Output;
use indexmap::{IndexMap, IndexSet};
use keystone_core::{LogicalId, PropertyValue, SynthError, SynthResult};

/// Resource id to the ids it references, both in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    targets: IndexMap<LogicalId, IndexSet<LogicalId>>,
}

impl References {
    /// Ids referenced by `id`
    #[must_use]
    pub fn targets_of(&self, id: &LogicalId) -> Option<&IndexSet<LogicalId>> {
        self.targets.get(id)
    }

    /// Every (resource, referenced ids) pair in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&LogicalId, &IndexSet<LogicalId>)> {
        self.targets.iter()
    }

    /// Number of distinct (resource, target) pairs
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.targets.values().map(IndexSet::len).sum()
    }
}

/// Resolves references against a registry
pub struct Resolver<'a> {
    registry: &'a Registry,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a registry
    #[must_use]
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Resolve every reference held by every resource
    ///
    /// Every registered resource gets an entry, possibly empty.
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedReference` for the first reference, in registration
    /// and document order, whose target is not registered
    pub fn resolve(&self) -> SynthResult<References> {
        let mut targets = IndexMap::with_capacity(self.registry.len());

        for resource in self.registry.iter() {
            let mut referenced = IndexSet::new();
            for value in resource.properties.values() {
                self.check_value(resource.id.as_str(), value, &mut referenced)?;
            }
            targets.insert(resource.id.clone(), referenced);
        }

        Ok(References { targets })
    }

    /// Check that every reference held by the outputs resolves
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedReference` naming the output
    pub fn check_outputs<'o>(
        &self,
        outputs: impl IntoIterator<Item = (&'o String, &'o Output)>,
    ) -> SynthResult<()> {
        for (name, output) in outputs {
            let mut ignored = IndexSet::new();
            self.check_value(name, &output.value, &mut ignored)?;
        }
        Ok(())
    }

    fn check_value(
        &self,
        holder: &str,
        value: &PropertyValue,
        referenced: &mut IndexSet<LogicalId>,
    ) -> SynthResult<()> {
        for reference in value.references() {
            if !self.registry.contains(&reference.target) {
                return Err(SynthError::UnresolvedReference {
                    resource: holder.to_string(),
                    target: reference.target.clone(),
                    attribute: reference.attribute.clone(),
                });
            }
            referenced.insert(reference.target.clone());
        }
        Ok(())
    }
}

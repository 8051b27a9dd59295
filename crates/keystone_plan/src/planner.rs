//! Topological planner.
//!
//! Among the resources whose dependencies are already placed, the one
//! registered first is always placed next. The plan for a given graph is
//! therefore unique.

use crate::graph::DependencyGraph;
use keystone_core::{LogicalId, SynthError, SynthResult};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Deterministic creation order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    order: Vec<LogicalId>,
}

impl Plan {
    /// Creation order: dependencies before dependents
    #[must_use]
    pub fn creation_order(&self) -> &[LogicalId] {
        &self.order
    }

    /// Deletion order: dependents before dependencies
    #[must_use]
    pub fn deletion_order(&self) -> Vec<LogicalId> {
        self.order.iter().rev().cloned().collect()
    }

    /// Position of a resource in the creation order
    #[must_use]
    pub fn position(&self, id: &LogicalId) -> Option<usize> {
        self.order.iter().position(|x| x == id)
    }

    /// Number of planned resources
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if plan is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether every node of `graph` is planned exactly once after all of
    /// its dependencies
    #[must_use]
    pub fn is_valid_for(&self, graph: &DependencyGraph) -> bool {
        if self.order.len() != graph.node_count() {
            return false;
        }
        graph.edges().iter().all(|edge| {
            match (self.position(&edge.dependency), self.position(&edge.dependent)) {
                (Some(dependency), Some(dependent)) => dependency < dependent,
                _ => false,
            }
        })
    }
}

/// Produces plans from dependency graphs
#[derive(Debug, Clone, Copy, Default)]
pub struct Planner;

impl Planner {
    /// Create a planner
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Order every node so dependencies precede dependents
    ///
    /// Ties are broken by registration order.
    ///
    /// # Errors
    ///
    /// Returns `CyclicDependency` if the graph is not acyclic
    pub fn plan(&self, graph: &DependencyGraph) -> SynthResult<Plan> {
        let n = graph.node_count();
        let mut pending: Vec<usize> = (0..n).map(|i| graph.dependency_indices(i).len()).collect();
        let mut ready: BinaryHeap<Reverse<usize>> = pending
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(next)) = ready.pop() {
            if let Some(id) = graph.node(next) {
                order.push(id.clone());
            }
            for &dependent in graph.dependent_indices(next) {
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        if order.len() != n {
            let cycle = graph.find_cycle().unwrap_or_default();
            return Err(SynthError::CyclicDependency { cycle });
        }

        tracing::debug!(resources = order.len(), "plan computed");
        Ok(Plan { order })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::registry::{Registry, Resource};
    use crate::resolver::Resolver;
    use crate::stack::DependsOn;
    use keystone_core::{PropertyValue, ResourceType};
    use proptest::prelude::*;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    fn resource(name: &str) -> Resource {
        Resource::new(id(name), ResourceType::new("Test::Resource").unwrap())
    }

    fn registry_of(resources: Vec<Resource>) -> Registry {
        let mut registry = Registry::new();
        for r in resources {
            registry.register(r).unwrap();
        }
        registry
    }

    fn graph_of(registry: &Registry, hints: &[DependsOn]) -> DependencyGraph {
        let refs = Resolver::new(registry).resolve().unwrap();
        let mut builder = GraphBuilder::new(registry);
        builder.add_references(&refs).unwrap();
        builder.add_explicit(hints).unwrap();
        builder.build().unwrap()
    }

    fn names(plan: &Plan) -> Vec<&str> {
        plan.creation_order().iter().map(LogicalId::as_str).collect()
    }

    #[test]
    fn test_reference_then_explicit_chain() {
        let registry = registry_of(vec![
            resource("A"),
            resource("B").with_property("Parent", PropertyValue::reference(id("A"), "Id")),
            resource("C"),
        ]);
        let graph = graph_of(
            &registry,
            &[DependsOn {
                dependent: id("C"),
                dependency: id("B"),
            }],
        );

        let plan = Planner::new().plan(&graph).unwrap();
        assert_eq!(names(&plan), vec!["A", "B", "C"]);
        assert!(plan.is_valid_for(&graph));
    }

    #[test]
    fn test_independent_resources_keep_registration_order() {
        let registry = registry_of(vec![resource("X"), resource("Y")]);
        let plan = Planner::new().plan(&graph_of(&registry, &[])).unwrap();
        assert_eq!(names(&plan), vec!["X", "Y"]);
    }

    #[test]
    fn test_dependency_registered_late_moves_forward() {
        let registry = registry_of(vec![
            resource("Instance").with_property("SubnetId", PropertyValue::reference(id("Subnet"), "SubnetId")),
            resource("Unrelated"),
            resource("Subnet"),
        ]);
        let plan = Planner::new().plan(&graph_of(&registry, &[])).unwrap();
        // Unrelated is ready from the start and registered before Subnet
        assert_eq!(names(&plan), vec!["Unrelated", "Subnet", "Instance"]);
    }

    #[test]
    fn test_deletion_order_is_reverse() {
        let registry = registry_of(vec![
            resource("Vpc"),
            resource("Subnet").with_property("VpcId", PropertyValue::reference(id("Vpc"), "VpcId")),
        ]);
        let plan = Planner::new().plan(&graph_of(&registry, &[])).unwrap();
        assert_eq!(plan.deletion_order(), vec![id("Subnet"), id("Vpc")]);
        assert_eq!(plan.position(&id("Subnet")), Some(1));
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_plan_empty_graph() {
        let registry = Registry::new();
        let plan = Planner::new().plan(&graph_of(&registry, &[])).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_rejects_cyclic_graph() {
        let registry = registry_of(vec![
            resource("A").with_property("B", PropertyValue::reference(id("B"), "Id")),
            resource("B").with_property("A", PropertyValue::reference(id("A"), "Id")),
        ]);
        let refs = Resolver::new(&registry).resolve().unwrap();
        let mut builder = GraphBuilder::new(&registry);
        builder.add_references(&refs).unwrap();
        let graph = builder.build_unchecked();

        assert_eq!(
            Planner::new().plan(&graph),
            Err(SynthError::CyclicDependency {
                cycle: vec![id("A"), id("B"), id("A")],
            })
        );
    }

    #[test]
    fn test_is_valid_for_rejects_wrong_order() {
        let registry = registry_of(vec![
            resource("Vpc"),
            resource("Subnet").with_property("VpcId", PropertyValue::reference(id("Vpc"), "VpcId")),
        ]);
        let graph = graph_of(&registry, &[]);
        let wrong = Plan {
            order: vec![id("Subnet"), id("Vpc")],
        };
        assert!(!wrong.is_valid_for(&graph));
        let short = Plan { order: vec![id("Vpc")] };
        assert!(!short.is_valid_for(&graph));
    }

    /// Random DAG: node i may only depend on nodes registered at a lower
    /// index in `perm`, which keeps the graph acyclic regardless of the
    /// registration order.
    fn arb_dag() -> impl Strategy<Value = (Vec<usize>, Vec<(usize, usize)>)> {
        (1usize..12).prop_flat_map(|n| {
            let perm = Just((0..n).collect::<Vec<_>>()).prop_shuffle();
            let edges = proptest::collection::vec((0..n, 0..n), 0..(n * 2));
            (perm, edges)
        })
    }

    proptest! {
        #[test]
        fn prop_plan_is_topological((perm, raw_edges) in arb_dag()) {
            let n = perm.len();
            let registry = registry_of(
                (0..n).map(|i| resource(&format!("R{}", i))).collect(),
            );
            // Rank of each node in the hidden topological order
            let mut rank = vec![0; n];
            for (r, &node) in perm.iter().enumerate() {
                rank[node] = r;
            }
            let hints: Vec<DependsOn> = raw_edges
                .into_iter()
                .filter(|&(a, b)| rank[a] > rank[b])
                .map(|(a, b)| DependsOn {
                    dependent: id(&format!("R{}", a)),
                    dependency: id(&format!("R{}", b)),
                })
                .collect();

            let graph = graph_of(&registry, &hints);
            let plan = Planner::new().plan(&graph).unwrap();
            prop_assert!(plan.is_valid_for(&graph));

            let again = Planner::new().plan(&graph).unwrap();
            prop_assert_eq!(plan, again);
        }
    }
}

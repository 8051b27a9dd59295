//! Dependency graph.
//!
//! Edges point from a dependent to its dependency. They come from resolved
//! references and from explicit ordering hints, and are deduplicated on the
//! (dependent, dependency) pair. The built graph is always acyclic.

use crate::registry::Registry;
use crate::resolver::References;
use crate::stack::DependsOn;
use indexmap::IndexSet;
use keystone_core::{LogicalId, SynthError, SynthResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Where an edge came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeOrigin {
    /// A property of the dependent references the dependency
    Reference,
    /// Caller-supplied ordering hint
    Explicit,
}

/// A dependency edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Resource that waits
    pub dependent: LogicalId,
    /// Resource waited on
    pub dependency: LogicalId,
    /// Source of the edge
    pub origin: EdgeOrigin,
}

/// An acyclic dependency graph over registered resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    /// Nodes in registration order
    nodes: IndexSet<LogicalId>,
    /// Edges in insertion order
    edges: Vec<Edge>,
    /// Per node, dependency indices sorted by registration order
    dependencies: Vec<Vec<usize>>,
    /// Per node, dependent indices sorted by registration order
    dependents: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Get total node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get total edge count
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check if graph is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in registration order
    pub fn nodes(&self) -> impl Iterator<Item = &LogicalId> {
        self.nodes.iter()
    }

    /// All edges
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Registration index of a node
    #[must_use]
    pub fn index_of(&self, id: &LogicalId) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    /// Node at a registration index
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&LogicalId> {
        self.nodes.get_index(index)
    }

    /// Nodes that the given node depends on, in registration order
    #[must_use]
    pub fn dependencies(&self, id: &LogicalId) -> Vec<&LogicalId> {
        self.neighbours(id, &self.dependencies)
    }

    /// Nodes that depend on the given node, in registration order
    #[must_use]
    pub fn dependents(&self, id: &LogicalId) -> Vec<&LogicalId> {
        self.neighbours(id, &self.dependents)
    }

    /// Explicit ordering hints of a node, in registration order
    ///
    /// Hints that duplicate a reference edge are not listed.
    #[must_use]
    pub fn explicit_dependencies(&self, id: &LogicalId) -> Vec<&LogicalId> {
        let mut out: Vec<(usize, &LogicalId)> = self
            .edges
            .iter()
            .filter(|e| e.origin == EdgeOrigin::Explicit && &e.dependent == id)
            .filter_map(|e| self.index_of(&e.dependency).map(|i| (i, &e.dependency)))
            .collect();
        out.sort_by_key(|(i, _)| *i);
        out.into_iter().map(|(_, d)| d).collect()
    }

    pub(crate) fn dependency_indices(&self, index: usize) -> &[usize] {
        self.dependencies.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn dependent_indices(&self, index: usize) -> &[usize] {
        self.dependents.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    fn neighbours<'a>(&'a self, id: &LogicalId, adjacency: &'a [Vec<usize>]) -> Vec<&'a LogicalId> {
        self.index_of(id)
            .and_then(|i| adjacency.get(i))
            .map(|list| list.iter().filter_map(|&j| self.nodes.get_index(j)).collect())
            .unwrap_or_default()
    }

    /// Find a dependency cycle
    ///
    /// Depth-first traversal with white/grey/black colouring, starting from
    /// nodes in registration order. The returned path starts and ends with
    /// the node that closed the cycle.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<LogicalId>> {
        let mut colour = vec![Colour::White; self.nodes.len()];
        // (node, next dependency to visit); the grey nodes form the current path
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for start in 0..self.nodes.len() {
            if colour[start] != Colour::White {
                continue;
            }
            colour[start] = Colour::Grey;
            stack.push((start, 0));

            while let Some(frame) = stack.last_mut() {
                let (node, next) = *frame;
                frame.1 += 1;

                let Some(&dep) = self.dependency_indices(node).get(next) else {
                    colour[node] = Colour::Black;
                    stack.pop();
                    continue;
                };
                match colour[dep] {
                    Colour::Grey => {
                        let from = stack.iter().position(|&(n, _)| n == dep).unwrap_or(0);
                        return Some(
                            stack[from..]
                                .iter()
                                .map(|&(n, _)| n)
                                .chain(std::iter::once(dep))
                                .filter_map(|i| self.nodes.get_index(i).cloned())
                                .collect(),
                        );
                    }
                    Colour::White => {
                        colour[dep] = Colour::Grey;
                        stack.push((dep, 0));
                    }
                    Colour::Black => {}
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Grey,
    Black,
}

/// Builds a [`DependencyGraph`] from resolved references and ordering hints
pub struct GraphBuilder<'a> {
    registry: &'a Registry,
    edges: Vec<Edge>,
    seen: HashSet<(usize, usize)>,
}

impl<'a> GraphBuilder<'a> {
    /// Create a builder over a registry
    #[must_use]
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            edges: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Add one edge per (resource, referenced resource) pair
    ///
    /// # Errors
    ///
    /// Returns `UnknownResource` if either end is not registered
    pub fn add_references(&mut self, references: &References) -> SynthResult<()> {
        for (dependent, targets) in references.iter() {
            for dependency in targets {
                self.add_edge(dependent, dependency, EdgeOrigin::Reference)?;
            }
        }
        Ok(())
    }

    /// Add explicit ordering hints
    ///
    /// # Errors
    ///
    /// Returns `UnknownResource` if either end is not registered
    pub fn add_explicit(&mut self, hints: &[DependsOn]) -> SynthResult<()> {
        for hint in hints {
            self.add_edge(&hint.dependent, &hint.dependency, EdgeOrigin::Explicit)?;
        }
        Ok(())
    }

    fn add_edge(
        &mut self,
        dependent: &LogicalId,
        dependency: &LogicalId,
        origin: EdgeOrigin,
    ) -> SynthResult<()> {
        let from = self.index(dependent)?;
        let to = self.index(dependency)?;
        if self.seen.insert((from, to)) {
            self.edges.push(Edge {
                dependent: dependent.clone(),
                dependency: dependency.clone(),
                origin,
            });
        }
        Ok(())
    }

    fn index(&self, id: &LogicalId) -> SynthResult<usize> {
        self.registry
            .index_of(id)
            .ok_or_else(|| SynthError::UnknownResource { id: id.clone() })
    }

    /// Build the graph and check it is acyclic
    ///
    /// # Errors
    ///
    /// Returns `CyclicDependency` with the cycle path
    pub fn build(self) -> SynthResult<DependencyGraph> {
        let graph = self.build_unchecked();
        if let Some(cycle) = graph.find_cycle() {
            return Err(SynthError::CyclicDependency { cycle });
        }
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "dependency graph built"
        );
        Ok(graph)
    }

    pub(crate) fn build_unchecked(self) -> DependencyGraph {
        let nodes: IndexSet<LogicalId> = self.registry.ids().cloned().collect();
        let mut dependencies = vec![Vec::new(); nodes.len()];
        let mut dependents = vec![Vec::new(); nodes.len()];

        for &(from, to) in &self.seen {
            dependencies[from].push(to);
            dependents[to].push(from);
        }
        for list in dependencies.iter_mut().chain(dependents.iter_mut()) {
            list.sort_unstable();
        }

        DependencyGraph {
            nodes,
            edges: self.edges,
            dependencies,
            dependents,
        }
    }
}

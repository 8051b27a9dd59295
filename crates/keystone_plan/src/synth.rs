//! Synthesis pipeline.
//!
//! Registry -> Resolver -> Graph builder -> Planner -> Emitter, each stage
//! run to completion on the previous stage's output. The first error aborts
//! the whole pass; nothing partial is returned.

use crate::config::SynthConfig;
use crate::emitter::{Emitter, Template};
use crate::graph::{DependencyGraph, GraphBuilder};
use crate::planner::{Plan, Planner};
use crate::resolver::Resolver;
use crate::stack::Stack;
use keystone_core::SynthResult;

/// Everything produced by one synthesis pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    /// Dependency graph
    pub graph: DependencyGraph,
    /// Creation plan
    pub plan: Plan,
    /// Emitted template
    pub template: Template,
}

/// Runs the synthesis pipeline
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    config: SynthConfig,
}

impl Synthesizer {
    /// Create a synthesizer
    #[must_use]
    pub fn new(config: SynthConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Synthesize a stack
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedReference`, `UnknownResource` or
    /// `CyclicDependency` for malformed declarations
    pub fn synthesize(&self, stack: &Stack) -> SynthResult<Synthesis> {
        let registry = stack.registry();
        tracing::debug!(stack = %stack.name, resources = registry.len(), "synthesizing");

        let resolver = Resolver::new(registry);
        let references = resolver.resolve()?;
        resolver.check_outputs(stack.outputs())?;
        tracing::debug!(references = references.pair_count(), "references resolved");

        let mut builder = GraphBuilder::new(registry);
        builder.add_references(&references)?;
        builder.add_explicit(stack.depends_on())?;
        let graph = builder.build()?;

        let plan = Planner::new().plan(&graph)?;
        let template = Emitter::new(&self.config).emit(stack, &graph, &plan);

        let fingerprint = template.fingerprint()?;
        tracing::info!(
            stack = %stack.name,
            resources = plan.len(),
            %fingerprint,
            "stack synthesized"
        );

        Ok(Synthesis {
            graph,
            plan,
            template,
        })
    }

    /// Synthesize a stack and serialize the template
    ///
    /// # Errors
    ///
    /// As [`Synthesizer::synthesize`], plus `Encoding`
    pub fn synthesize_json(&self, stack: &Stack) -> SynthResult<String> {
        self.synthesize(stack)?.template.to_json(self.config.pretty)
    }
}

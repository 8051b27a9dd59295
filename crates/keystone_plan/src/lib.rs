//! KEYSTONE Planner
//!
//! Declarative resource graph synthesizer: resolves cross-resource
//! references into a dependency graph, orders it deterministically and
//! emits a stable template.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod diff;
pub mod emitter;
pub mod graph;
pub mod planner;
pub mod registry;
pub mod resolver;
pub mod stack;
pub mod synth;

pub use config::SynthConfig;
pub use diff::{DiffSummary, ResourceChange, ResourceChangeType, TemplateDiff};
pub use emitter::{Emitter, Template, TemplateResource};
pub use graph::{DependencyGraph, Edge, EdgeOrigin, GraphBuilder};
pub use planner::{Plan, Planner};
pub use registry::{Registry, Resource};
pub use resolver::{References, Resolver};
pub use stack::{DependsOn, Output, Stack, StackDocument};
pub use synth::{Synthesis, Synthesizer};

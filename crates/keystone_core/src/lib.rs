//! KEYSTONE Core Types
//!
//! This crate contains pure types and logic with no I/O.
//! All types are serializable with stable, cross-platform encoding.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod hash;
pub mod id;
pub mod value;

// Re-exports
pub use error::{SynthError, SynthResult};
pub use hash::Hash;
pub use id::{LogicalId, ResourceType};
pub use value::{PropertyValue, Reference};

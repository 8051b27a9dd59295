//! Core error types for KEYSTONE.
//!
//! Every failure is a deterministic validation error raised during synthesis.
//! Nothing is retried and nothing is partially emitted.

use crate::id::LogicalId;

/// Synthesis result type
pub type SynthResult<T> = Result<T, SynthError>;

/// Synthesis error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthError {
    /// The same logical id was registered twice
    #[error("duplicate logical id: {id}")]
    DuplicateIdentifier {
        /// The repeated id
        id: LogicalId,
    },

    /// A lookup named a resource that is not registered
    #[error("unknown resource: {id}")]
    UnknownResource {
        /// The missing id
        id: LogicalId,
    },

    /// A property reference points at a resource that is not registered
    #[error("{resource} references unknown resource {target} (attribute {attribute})")]
    UnresolvedReference {
        /// Resource (or output) holding the reference
        resource: String,
        /// Referenced logical id
        target: LogicalId,
        /// Referenced attribute
        attribute: String,
    },

    /// The dependency graph contains a cycle
    #[error("dependency cycle: {}", format_cycle(.cycle))]
    CyclicDependency {
        /// Cycle path; the first id is repeated at the end
        cycle: Vec<LogicalId>,
    },

    /// Malformed logical id
    #[error("invalid logical id: {reason}")]
    InvalidId {
        /// Why the id was rejected
        reason: String,
    },

    /// Malformed resource type tag
    #[error("invalid resource type: {reason}")]
    InvalidType {
        /// Why the type was rejected
        reason: String,
    },

    /// Two outputs share a name
    #[error("duplicate output: {name}")]
    DuplicateOutput {
        /// The repeated output name
        name: String,
    },

    /// Document (de)serialization failed
    #[error("encoding error: {message}")]
    Encoding {
        /// Underlying error message
        message: String,
    },

    /// File access failed
    #[error("IO error: {message}")]
    Io {
        /// Underlying error message
        message: String,
    },
}

fn format_cycle(cycle: &[LogicalId]) -> String {
    cycle
        .iter()
        .map(LogicalId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl From<serde_json::Error> for SynthError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for SynthError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = SynthError::DuplicateIdentifier { id: id("Vpc") };
        assert_eq!(format!("{}", err), "duplicate logical id: Vpc");

        let err = SynthError::UnknownResource { id: id("Instance") };
        assert_eq!(format!("{}", err), "unknown resource: Instance");
    }

    #[test]
    fn test_unresolved_reference_names_both_ids() {
        let err = SynthError::UnresolvedReference {
            resource: "Endpoint".to_string(),
            target: id("Subnet"),
            attribute: "SubnetId".to_string(),
        };
        let s = format!("{}", err);
        assert!(s.contains("Endpoint"));
        assert!(s.contains("Subnet"));
        assert!(s.contains("SubnetId"));
    }

    #[test]
    fn test_cycle_display() {
        let err = SynthError::CyclicDependency {
            cycle: vec![id("A"), id("B"), id("A")],
        };
        assert_eq!(format!("{}", err), "dependency cycle: A -> B -> A");
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(SynthError::from(err), SynthError::Encoding { .. }));
    }

    #[test]
    fn test_error_equality() {
        let err1 = SynthError::UnknownResource { id: id("A") };
        let err2 = SynthError::UnknownResource { id: id("A") };
        assert_eq!(err1, err2);

        let err3 = SynthError::DuplicateIdentifier { id: id("A") };
        assert_ne!(err1, err3);
    }
}

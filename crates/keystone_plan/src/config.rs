//! Synthesis configuration.

use keystone_core::SynthResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default template format version
pub const DEFAULT_FORMAT_VERSION: &str = "2010-09-09";

/// Configuration for the synthesizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SynthConfig {
    /// Format version written into every template
    pub format_version: String,
    /// Template description; overrides the stack's own description
    pub description: Option<String>,
    /// Pretty-print emitted JSON
    pub pretty: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            format_version: DEFAULT_FORMAT_VERSION.to_string(),
            description: None,
            pretty: false,
        }
    }
}

impl SynthConfig {
    /// Read configuration from a JSON file; absent fields take defaults
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `Encoding` if it is not
    /// valid JSON
    pub fn load(path: impl AsRef<Path>) -> SynthResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Set pretty printing
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Set the description override
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

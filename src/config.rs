//! Configuration for rendering and literal reconstruction

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Bounds on what the literal reconstructor will attempt to parse
///
/// Input beyond either bound is treated as "not a literal" and the joined
/// text is kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiteralLimits {
    /// Maximum input length in bytes
    pub max_len: usize,

    /// Maximum bracket nesting
    pub max_depth: usize,
}

impl Default for LiteralLimits {
    fn default() -> Self {
        Self {
            max_len: 100_000,
            max_depth: 100,
        }
    }
}

impl LiteralLimits {
    /// Create limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum input length
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Set the maximum nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Configuration for the complete render pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Literal reconstructor bounds
    pub limits: LiteralLimits,

    /// Keep the original quoting when a nested unit (macro call) reconstructs
    /// to a string, so it can be re-embedded in an enclosing literal
    pub preserve_nested_quoting: bool,
}

impl RenderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the literal reconstructor bounds
    pub fn with_limits(mut self, limits: LiteralLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Enable or disable quote preservation for nested units
    pub fn with_preserve_nested_quoting(mut self, preserve: bool) -> Self {
        self.preserve_nested_quoting = preserve;
        self
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

//! Engine configuration.

use crate::analyzer::DEFAULT_MAX_DEPTH;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;

/// Settings shared by the analyzer, the evaluator and the flow runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Treat literal tokens and built-in namespace names as keywords during analysis.
    pub reserved_keywords: bool,
    /// Upper bound on executed statements, loop iterations and calls. `None` is unbounded.
    pub max_steps: Option<u64>,
    /// Parser nesting limit.
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reserved_keywords: true,
            max_steps: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EngineConfig {
    pub fn with_reserved_keywords(mut self, reserved: bool) -> Self {
        self.reserved_keywords = reserved;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        Ok(())
    }

    /// Parses and validates a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = EngineConfig::from_json(r#"{ "max_steps": 500 }"#).unwrap();
        assert_eq!(config.max_steps, Some(500));
        assert!(config.reserved_keywords);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn zero_depth_is_rejected() {
        let err = EngineConfig::from_json(r#"{ "max_depth": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroDepth));
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = EngineConfig::from_file("does/not/exist.json").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}

use super::consts::{DEFAULT_MARKER, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};
use crate::error::{Result, TransformError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options fixed at transformer construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Key that turns a JSON map into a rule
    #[serde(default = "default_marker")]
    pub marker: String,
    /// Maximum nesting of `include` evaluations
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Layout of a TOML options file
///
/// ```toml
/// [transform]
/// marker = "$"
/// max_depth = 64
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionsFile {
    #[serde(default)]
    pub transform: TransformOptions,
}

impl TransformOptions {
    /// Parse options from the `[transform]` table of a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: OptionsFile = toml::from_str(text)?;
        file.transform.validate()?;
        Ok(file.transform)
    }

    /// Load options from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            TransformError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Check option values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.marker.is_empty() {
            return Err(TransformError::Config("marker must not be empty".to_string()));
        }
        if self.max_depth == 0 {
            return Err(TransformError::Config(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(TransformError::Config(format!(
                "max_depth must be at most {}, got {}",
                MAX_DEPTH_LIMIT, self.max_depth
            )));
        }
        Ok(())
    }
}

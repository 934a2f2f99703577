//! Preprocessor configuration as supplied by the host build tool.

use serde::{Deserialize, Serialize};

use crate::validate::PreprocessError;

pub const DEFAULT_EXTENSION: &str = ".md";
pub const DEFAULT_DEBOUNCE_MS: u32 = 200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PreprocessOptions {
    /// Forwarded to generation; no generation decision depends on it yet.
    pub component_development_mode: bool,
    /// Only files whose name ends with this suffix are processed.
    pub extension: String,
    /// Quiescence window of the generated query executors.
    pub debounce_ms: u32,
    /// Parse the generated preamble before handing it back to the host.
    pub verify_output: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        PreprocessOptions {
            component_development_mode: false,
            extension: DEFAULT_EXTENSION.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            verify_output: false,
        }
    }
}

impl PreprocessOptions {
    pub fn new(component_development_mode: bool) -> Self {
        PreprocessOptions {
            component_development_mode,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PreprocessError> {
        let options: PreprocessOptions =
            serde_json::from_str(json).map_err(|e| PreprocessError::InvalidOptions {
                reason: e.to_string(),
            })?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), PreprocessError> {
        if self.extension.is_empty() {
            return Err(PreprocessError::InvalidOptions {
                reason: "extension must not be empty".to_string(),
            });
        }
        if self.debounce_ms == 0 {
            return Err(PreprocessError::InvalidOptions {
                reason: "debounceMs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn manages(&self, filename: &str) -> bool {
        filename.ends_with(&self.extension)
    }
}

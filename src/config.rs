//! Generator configuration.
//!
//! Every knob has a default matching the conventions in `handlegen_core::conventions`, so most callers only ever use
//! [`GeneratorConfig::default`]. The CLI can also read overrides from a JSON file.

use std::path::Path;

use handlegen_core::conventions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generators::GeneratorId;

/// Settings shared by every generator in a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Path of the runtime support crate the generated code refers to.
    pub runtime_path: String,
    /// Return type (last path segment) marking native status-code methods.
    pub status_type: String,
    /// Representation used when an annotation or row names no primitive one.
    pub raw_type: String,
    /// Data files whose name ends with this suffix are read as handle files.
    pub handles_file_suffix: String,
    /// Appended to the snake_case name of an adapted method.
    pub adapted_suffix: String,
    /// Appended to a trait name to name its extension trait.
    pub extension_trait_suffix: String,
    /// Generators run by the driver, in order.
    pub generators: Vec<GeneratorId>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            runtime_path: conventions::DEFAULT_RUNTIME_PATH.to_string(),
            status_type: conventions::DEFAULT_STATUS_TYPE.to_string(),
            raw_type: conventions::DEFAULT_RAW_TYPE.to_string(),
            handles_file_suffix: conventions::DEFAULT_HANDLES_FILE_SUFFIX.to_string(),
            adapted_suffix: conventions::DEFAULT_ADAPTED_SUFFIX.to_string(),
            extension_trait_suffix: conventions::DEFAULT_EXTENSION_TRAIT_SUFFIX.to_string(),
            generators: GeneratorId::ALL.to_vec(),
        }
    }
}

/// Error loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("`{field}` must be a Rust path, found `{value}`")]
    InvalidPath { field: &'static str, value: String },
    #[error("`raw_type` must be a primitive integer type, found `{0}`")]
    InvalidRawType(String),
    #[error("`{field}` must not be empty")]
    Empty { field: &'static str },
}

impl GeneratorConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the runtime crate path
    pub fn with_runtime_path(mut self, path: impl Into<String>) -> Self {
        self.runtime_path = path.into();
        self
    }

    /// Set the status type name
    pub fn with_status_type(mut self, name: impl Into<String>) -> Self {
        self.status_type = name.into();
        self
    }

    /// Set the default handle representation
    pub fn with_raw_type(mut self, name: impl Into<String>) -> Self {
        self.raw_type = name.into();
        self
    }

    /// Set the handle file suffix
    pub fn with_handles_file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.handles_file_suffix = suffix.into();
        self
    }

    /// Set the adapted method suffix
    pub fn with_adapted_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.adapted_suffix = suffix.into();
        self
    }

    /// Set the extension trait suffix
    pub fn with_extension_trait_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.extension_trait_suffix = suffix.into();
        self
    }

    /// Restrict the generators that run
    pub fn with_generators(mut self, generators: impl IntoIterator<Item = GeneratorId>) -> Self {
        self.generators = generators.into_iter().collect();
        self
    }

    /// Whether a generator is enabled.
    pub fn is_enabled(&self, id: GeneratorId) -> bool {
        self.generators.contains(&id)
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let config: GeneratorConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Json { path: display, source })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings that end up spliced into generated code.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if syn::parse_str::<syn::Path>(&self.runtime_path).is_err() {
            return Err(ConfigError::InvalidPath {
                field: "runtime_path",
                value: self.runtime_path.clone(),
            });
        }
        if syn::parse_str::<syn::Ident>(&self.status_type).is_err() {
            return Err(ConfigError::InvalidPath {
                field: "status_type",
                value: self.status_type.clone(),
            });
        }
        if !conventions::is_primitive_repr(&self.raw_type) {
            return Err(ConfigError::InvalidRawType(self.raw_type.clone()));
        }
        if self.handles_file_suffix.is_empty() {
            return Err(ConfigError::Empty {
                field: "handles_file_suffix",
            });
        }
        if self.adapted_suffix.is_empty() && self.extension_trait_suffix.is_empty() {
            // Both empty would make adapted items collide with the declarations they extend.
            return Err(ConfigError::Empty {
                field: "adapted_suffix",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_conventions() {
        let config = GeneratorConfig::default();
        assert_eq!(config.runtime_path, "::handlegen_runtime");
        assert_eq!(config.status_type, "HRESULT");
        assert_eq!(config.raw_type, "isize");
        assert_eq!(config.handles_file_suffix, "handles.csv");
        assert_eq!(config.generators, GeneratorId::ALL.to_vec());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = GeneratorConfig::new()
            .with_runtime_path("crate::rt")
            .with_raw_type("u32")
            .with_generators([GeneratorId::AutoHandle]);
        assert_eq!(config.runtime_path, "crate::rt");
        assert!(config.is_enabled(GeneratorId::AutoHandle));
        assert!(!config.is_enabled(GeneratorId::Interop));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{ "runtime_path": "crate::native", "generators": ["handles_file"] }"#)
                .expect("valid config");
        assert_eq!(config.runtime_path, "crate::native");
        assert_eq!(config.status_type, "HRESULT");
        assert_eq!(config.generators, vec![GeneratorId::HandlesFile]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed = serde_json::from_str::<GeneratorConfig>(r#"{ "runtime": "x" }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let bad_path = GeneratorConfig::new().with_runtime_path("not a path");
        assert!(matches!(bad_path.validate(), Err(ConfigError::InvalidPath { .. })));
        let bad_raw = GeneratorConfig::new().with_raw_type("f32");
        assert!(matches!(bad_raw.validate(), Err(ConfigError::InvalidRawType(_))));
        let empty = GeneratorConfig::new().with_handles_file_suffix("");
        assert!(matches!(empty.validate(), Err(ConfigError::Empty { .. })));
    }
}

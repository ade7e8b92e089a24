//! Configuration module
//!
//! Loads serialization environment settings from serium.toml or serium.json.

pub mod model;

use anyhow::{Context, bail};
use serium_core::{
    DeserializationContext, JsonCodec, SerializationContext, SeriumEnv, fixed_version,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub use self::model::*;

impl SeriumConfig {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        // Detect format based on extension
        let config = match path.extension() {
            Some(ext) if ext == "json" => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
        .with_context(|| format!("invalid configuration in {}", path.display()))?;

        info!(path = %path.display(), "loaded serium configuration");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Build the environment these settings describe.
    pub fn to_env(&self) -> crate::Result<SeriumEnv> {
        let serialization = SerializationContext {
            force_unversioned_serialization: self.serialization.force_unversioned_serialization,
            max_depth: self.serialization.max_depth,
        };

        let de = &self.deserialization;
        let mut deserialization = DeserializationContext::default()
            .with_fail_on_unversioned_data(de.fail_on_unversioned_data)
            .with_fail_on_incompatible_types(de.fail_on_incompatible_types)
            .with_fail_on_null_subtypes(de.fail_on_null_subtypes)
            .with_max_depth(de.max_depth);
        match de.default_version {
            Some(0) => bail!("default_version must be at least 1"),
            Some(version) => {
                deserialization = deserialization.with_version_provider(fixed_version(version));
            }
            None => {}
        }

        let mut codec =
            JsonCodec::new(self.codec.style.into()).with_max_nesting(self.codec.max_nesting);
        if let Some(sort_keys) = self.codec.sort_keys {
            codec = codec.with_sort_keys(sort_keys);
        }

        Ok(SeriumEnv::new(serialization, deserialization, Arc::new(codec)))
    }
}

/// JSON Schema of the configuration file.
pub fn config_schema() -> serde_json::Value {
    schemars::schema_for!(SeriumConfig).to_value()
}

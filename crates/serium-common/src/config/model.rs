use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serium_core::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_NESTING, JsonStyle};

/// Root configuration from serium.toml
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SeriumConfig {
    /// Output tagging policy
    pub serialization: SerializationSection,

    /// Input strictness and version fallback
    pub deserialization: DeserializationSection,

    /// Text encoding settings
    pub codec: CodecSection,
}

/// [serialization] section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SerializationSection {
    /// Omit the `_ccvt` tag from every written mapping
    pub force_unversioned_serialization: bool,
    /// Deepest record nesting written
    pub max_depth: usize,
}

impl Default for SerializationSection {
    fn default() -> Self {
        Self {
            force_unversioned_serialization: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// [deserialization] section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DeserializationSection {
    pub fail_on_unversioned_data: bool,
    pub fail_on_incompatible_types: bool,
    pub fail_on_null_subtypes: bool,
    /// Deepest record nesting read
    pub max_depth: usize,
    /// Version assumed for untagged data of any type
    pub default_version: Option<u32>,
}

impl Default for DeserializationSection {
    fn default() -> Self {
        Self {
            fail_on_unversioned_data: true,
            fail_on_incompatible_types: true,
            fail_on_null_subtypes: false,
            max_depth: DEFAULT_MAX_DEPTH,
            default_version: None,
        }
    }
}

/// [codec] section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CodecSection {
    pub style: CodecStyle,
    /// Sort mapping keys; unset means sorted only for the pretty style
    pub sort_keys: Option<bool>,
    /// Deepest array/object nesting decoded
    pub max_nesting: usize,
}

impl Default for CodecSection {
    fn default() -> Self {
        Self {
            style: CodecStyle::default(),
            sort_keys: None,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CodecStyle {
    Compact,
    #[default]
    Standard,
    Pretty,
}

impl From<CodecStyle> for JsonStyle {
    fn from(style: CodecStyle) -> Self {
        match style {
            CodecStyle::Compact => JsonStyle::Compact,
            CodecStyle::Standard => JsonStyle::Standard,
            CodecStyle::Pretty => JsonStyle::Pretty,
        }
    }
}

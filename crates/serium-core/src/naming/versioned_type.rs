use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::normalize_type_name;
use crate::error::{Result, SeriumError};

/// VersionedType identifies the shape that produced a piece of wire data:
/// the normalized type name plus a version number (`TypeName/version`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionedType {
    type_name: String,
    version: u32,
}

impl VersionedType {
    /// The name is normalized, so `A__v1` and `A` share an identity.
    pub fn new(type_name: &str, version: u32) -> Self {
        Self {
            type_name: normalize_type_name(type_name).to_string(),
            version,
        }
    }

    /// Parse from the wire format: `TypeName/version`, version a positive integer.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || SeriumError::InvalidVersionedType(s.to_string());

        let (name, version) = s.split_once('/').ok_or_else(invalid)?;
        if name.is_empty() {
            return Err(invalid());
        }
        let version: u32 = version.parse().map_err(|_| invalid())?;
        if version == 0 {
            return Err(invalid());
        }
        Ok(Self::new(name, version))
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Whether both identities name the same logical type, ignoring version.
    pub fn same_type(&self, other: &VersionedType) -> bool {
        self.type_name == other.type_name
    }
}

impl fmt::Display for VersionedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_name, self.version)
    }
}

impl FromStr for VersionedType {
    type Err = SeriumError;

    fn from_str(s: &str) -> Result<Self> {
        VersionedType::parse(s)
    }
}

impl From<VersionedType> for String {
    fn from(vt: VersionedType) -> String {
        vt.to_string()
    }
}

impl TryFrom<String> for VersionedType {
    type Error = SeriumError;
    fn try_from(s: String) -> Result<Self> {
        VersionedType::parse(&s)
    }
}

//! Serialization and deserialization policies.

use std::fmt;
use std::sync::Arc;

use crate::codec::WireMap;
use crate::naming::VersionedType;
use crate::schema::RecordType;

/// Records nested deeper than this are rejected instead of exhausting the
/// stack.
pub const DEFAULT_MAX_DEPTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializationContext {
    /// Omit the `_ccvt` tag from every mapping.
    pub force_unversioned_serialization: bool,
    pub max_depth: usize,
}

impl Default for SerializationContext {
    fn default() -> Self {
        Self::versioned()
    }
}

impl SerializationContext {
    /// The tagging policy, whatever the environment says.
    pub fn versioned() -> Self {
        Self {
            force_unversioned_serialization: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn unversioned() -> Self {
        Self {
            force_unversioned_serialization: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Version reported by a [`VersionProvider`] for untagged data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvidedVersion {
    /// A version of the target type.
    Version(u32),
    /// A full identity, possibly of another type.
    Versioned(VersionedType),
}

impl From<u32> for ProvidedVersion {
    fn from(version: u32) -> Self {
        ProvidedVersion::Version(version)
    }
}

impl From<VersionedType> for ProvidedVersion {
    fn from(ccvt: VersionedType) -> Self {
        ProvidedVersion::Versioned(ccvt)
    }
}

/// Decides the version of data that carries no `_ccvt` tag.
pub type VersionProvider = Arc<
    dyn Fn(&RecordType, &WireMap) -> anyhow::Result<Option<ProvidedVersion>> + Send + Sync,
>;

/// A provider reporting `version` for every type.
pub fn fixed_version(version: u32) -> VersionProvider {
    Arc::new(move |_, _| Ok(Some(ProvidedVersion::Version(version))))
}

#[derive(Clone)]
pub struct DeserializationContext {
    /// Untagged data with no provided version is an error.
    pub fail_on_unversioned_data: bool,
    /// Data of another type is an error. When relaxed, the mapping is used as-is.
    pub fail_on_incompatible_types: bool,
    /// A null subtype value is an error.
    pub fail_on_null_subtypes: bool,
    /// Deepest record nesting accepted, the top-level record being depth 1.
    pub max_depth: usize,
    pub external_version_provider: Option<VersionProvider>,
}

impl Default for DeserializationContext {
    fn default() -> Self {
        Self {
            fail_on_unversioned_data: true,
            fail_on_incompatible_types: true,
            fail_on_null_subtypes: false,
            max_depth: DEFAULT_MAX_DEPTH,
            external_version_provider: None,
        }
    }
}

impl DeserializationContext {
    pub fn with_fail_on_unversioned_data(mut self, fail: bool) -> Self {
        self.fail_on_unversioned_data = fail;
        self
    }

    pub fn with_fail_on_incompatible_types(mut self, fail: bool) -> Self {
        self.fail_on_incompatible_types = fail;
        self
    }

    pub fn with_fail_on_null_subtypes(mut self, fail: bool) -> Self {
        self.fail_on_null_subtypes = fail;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_version_provider(mut self, provider: VersionProvider) -> Self {
        self.external_version_provider = Some(provider);
        self
    }

    pub fn with_version_provider_fn<F>(self, f: F) -> Self
    where
        F: Fn(&RecordType, &WireMap) -> anyhow::Result<Option<ProvidedVersion>>
            + Send
            + Sync
            + 'static,
    {
        self.with_version_provider(Arc::new(f))
    }
}

impl fmt::Debug for DeserializationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeserializationContext")
            .field("fail_on_unversioned_data", &self.fail_on_unversioned_data)
            .field("fail_on_incompatible_types", &self.fail_on_incompatible_types)
            .field("fail_on_null_subtypes", &self.fail_on_null_subtypes)
            .field("max_depth", &self.max_depth)
            .field(
                "external_version_provider",
                &self.external_version_provider.as_ref().map(|_| "<fn>"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDescriptor;

    #[test]
    fn test_defaults() {
        let ctx = DeserializationContext::default();
        assert!(ctx.fail_on_unversioned_data);
        assert!(ctx.fail_on_incompatible_types);
        assert!(!ctx.fail_on_null_subtypes);
        assert!(ctx.external_version_provider.is_none());
        assert_eq!(ctx.max_depth, DEFAULT_MAX_DEPTH);
        assert!(!SerializationContext::default().force_unversioned_serialization);
        assert_eq!(SerializationContext::default().max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_fixed_version() {
        let ty = RecordType::builder("A")
            .field("a", FieldDescriptor::int())
            .build()
            .unwrap();
        let provider = fixed_version(1);
        let got = provider(&ty, &WireMap::new()).unwrap();
        assert_eq!(got, Some(ProvidedVersion::Version(1)));
    }
}

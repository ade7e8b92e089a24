use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use super::descriptor::{FieldDescriptor, FieldSpec};
use crate::error::{Result, SeriumError};
use crate::migration::MigrationContext;
use crate::naming::{VersionedType, normalize_type_name};
use crate::record::Record;
use crate::value::Value;

/// Single-step migration, registered on the target type keyed by source version.
pub type MigrationFn =
    Arc<dyn Fn(&Record, &MigrationContext<'_>) -> anyhow::Result<Record> + Send + Sync>;

/// A named, versioned schema.
///
/// Built with [`RecordType::builder`] and validated by [`RecordTypeBuilder::build`].
#[derive(Clone)]
pub struct RecordType {
    name: String,
    normalized: String,
    version: u32,
    fields: IndexMap<String, FieldSpec>,
    migrations: IndexMap<u32, MigrationFn>,
}

impl RecordType {
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder::new(name)
    }

    /// Declared name, possibly carrying a `__v<N>` suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn normalized_name(&self) -> &str {
        &self.normalized
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn versioned_type(&self) -> VersionedType {
        VersionedType::new(&self.normalized, self.version)
    }

    pub fn fields(&self) -> &IndexMap<String, FieldSpec> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.get_index_of(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Migration producing this version from `from_version`.
    pub fn migration(&self, from_version: u32) -> Option<&MigrationFn> {
        self.migrations.get(&from_version)
    }

    /// Source versions with a registered migration, in registration order.
    pub fn migration_sources(&self) -> impl Iterator<Item = u32> + '_ {
        self.migrations.keys().copied()
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("fields", &self.fields)
            .field("migrations", &self.migrations.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Builder for [`RecordType`].
pub struct RecordTypeBuilder {
    name: String,
    version: u32,
    fields: IndexMap<String, FieldSpec>,
    migrations: IndexMap<u32, MigrationFn>,
    duplicates: Vec<String>,
}

impl RecordTypeBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            fields: IndexMap::new(),
            migrations: IndexMap::new(),
            duplicates: Vec::new(),
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn field(self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.field_spec(name, FieldSpec::new(descriptor))
    }

    pub fn field_with_default(
        self,
        name: impl Into<String>,
        descriptor: FieldDescriptor,
        default: impl Into<Value>,
    ) -> Self {
        self.field_spec(name, FieldSpec::with_default(descriptor, default))
    }

    pub fn field_spec(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        let name = name.into();
        if self.fields.contains_key(&name) {
            self.duplicates.push(name);
        } else {
            self.fields.insert(name, spec);
        }
        self
    }

    /// Register the migration from `from_version` to the version being built.
    pub fn migration<F>(mut self, from_version: u32, f: F) -> Self
    where
        F: Fn(&Record, &MigrationContext<'_>) -> anyhow::Result<Record> + Send + Sync + 'static,
    {
        self.migrations.insert(from_version, Arc::new(f));
        self
    }

    pub fn build(self) -> Result<RecordType> {
        let name = self.name;
        if name.is_empty() {
            return Err(SeriumError::definition("record type name cannot be empty"));
        }
        if self.fields.is_empty() {
            return Err(SeriumError::definition(format!(
                "record type {name} must declare at least one field"
            )));
        }
        if self.version == 0 {
            return Err(SeriumError::definition(format!(
                "record type {name} has version 0, versions start at 1"
            )));
        }
        if let Some(dup) = self.duplicates.first() {
            return Err(SeriumError::definition(format!(
                "record type {name} declares field {dup} more than once"
            )));
        }
        if self.migrations.contains_key(&self.version) {
            return Err(SeriumError::definition(format!(
                "record type {name} registers a migration from its own version {}",
                self.version
            )));
        }

        for (field, spec) in &self.fields {
            match &spec.descriptor {
                FieldDescriptor::SubtypeKey(value_field) => {
                    let paired = self.fields.get(value_field).map(|s| &s.descriptor);
                    if !matches!(paired, Some(FieldDescriptor::SubtypeValue(k)) if k == field) {
                        return Err(SeriumError::definition(format!(
                            "subtype key {field} of {name} must pair with a subtype value field {value_field} pointing back to it"
                        )));
                    }
                }
                FieldDescriptor::SubtypeValue(key_field) => {
                    let paired = self.fields.get(key_field).map(|s| &s.descriptor);
                    if !matches!(paired, Some(FieldDescriptor::SubtypeKey(v)) if v == field) {
                        return Err(SeriumError::definition(format!(
                            "subtype value {field} of {name} must pair with a subtype key field {key_field} pointing back to it"
                        )));
                    }
                }
                _ => {}
            }
        }

        Ok(RecordType {
            normalized: normalize_type_name(&name).to_string(),
            name,
            version: self.version,
            fields: self.fields,
            migrations: self.migrations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let ty = RecordType::builder("Book__v1")
            .field("title", FieldDescriptor::string())
            .build()
            .unwrap();
        assert_eq!(ty.name(), "Book__v1");
        assert_eq!(ty.normalized_name(), "Book");
        assert_eq!(ty.version(), 1);
        assert_eq!(ty.versioned_type().to_string(), "Book/1");
    }

    #[test]
    fn test_debug_lists_migration_sources() {
        let ty = RecordType::builder("Book")
            .version(3)
            .field("title", FieldDescriptor::string())
            .migration(2, |old, _| Ok(old.clone()))
            .migration(1, |old, _| Ok(old.clone()))
            .build()
            .unwrap();
        let debug = format!("{ty:?}");
        assert!(debug.contains("version: 3"));
        assert!(debug.contains("migrations: [2, 1]"));
    }

    #[test]
    fn test_empty_schema_rejected() {
        let err = RecordType::builder("Empty").build().unwrap_err();
        assert!(matches!(err, SeriumError::Definition(_)));
    }

    #[test]
    fn test_version_zero_rejected() {
        let err = RecordType::builder("A")
            .version(0)
            .field("a", FieldDescriptor::int())
            .build()
            .unwrap_err();
        assert!(matches!(err, SeriumError::Definition(_)));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = RecordType::builder("A")
            .field("a", FieldDescriptor::int())
            .field("a", FieldDescriptor::long())
            .build()
            .unwrap_err();
        assert!(matches!(err, SeriumError::Definition(m) if m.contains("more than once")));
    }

    #[test]
    fn test_migration_from_own_version_rejected() {
        let err = RecordType::builder("A")
            .version(2)
            .field("a", FieldDescriptor::int())
            .migration(2, |old, _| Ok(old.clone()))
            .build()
            .unwrap_err();
        assert!(matches!(err, SeriumError::Definition(_)));
    }

    #[test]
    fn test_subtype_pairing() {
        let ok = RecordType::builder("Holder")
            .field("kind", FieldDescriptor::subtype_key("data"))
            .field("data", FieldDescriptor::subtype_value("kind"))
            .build();
        assert!(ok.is_ok());

        let missing_value = RecordType::builder("Holder")
            .field("kind", FieldDescriptor::subtype_key("data"))
            .build();
        assert!(matches!(missing_value, Err(SeriumError::Definition(_))));

        let wrong_kind = RecordType::builder("Holder")
            .field("kind", FieldDescriptor::string())
            .field("data", FieldDescriptor::subtype_value("kind"))
            .build();
        assert!(matches!(wrong_kind, Err(SeriumError::Definition(_))));
    }

    #[test]
    fn test_migration_sources_keep_registration_order() {
        let ty = RecordType::builder("A")
            .version(4)
            .field("a", FieldDescriptor::int())
            .migration(3, |old, _| Ok(old.clone()))
            .migration(1, |old, _| Ok(old.clone()))
            .build()
            .unwrap();
        assert_eq!(ty.migration_sources().collect::<Vec<_>>(), vec![3, 1]);
        assert!(ty.migration(1).is_some());
        assert!(ty.migration(2).is_none());
    }
}

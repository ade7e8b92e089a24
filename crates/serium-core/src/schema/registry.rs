use indexmap::IndexMap;
use std::sync::Arc;
use tracing::trace;

use super::descriptor::FieldDescriptor;
use super::record_type::RecordType;
use crate::error::{Result, SeriumError};
use crate::naming::{VersionedType, historical_type_name};
use crate::record::{Record, RecordArgs, RecordBuilder};
use crate::value::Value;

/// The namespace of record types, keyed by declared name.
///
/// Populated at startup and then shared read-only, usually behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, Arc<RecordType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record type. Declared names are unique.
    pub fn register(&mut self, record_type: RecordType) -> Result<Arc<RecordType>> {
        let name = record_type.name().to_string();
        if self.types.contains_key(&name) {
            return Err(SeriumError::definition(format!(
                "record type {name} is already registered"
            )));
        }
        let record_type = Arc::new(record_type);
        self.types.insert(name, Arc::clone(&record_type));
        Ok(record_type)
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<RecordType>> {
        self.types.get(name).cloned()
    }

    pub fn get(&self, name: &str) -> Result<Arc<RecordType>> {
        self.lookup(name).ok_or_else(|| SeriumError::TypeNotFound {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RecordType>> {
        self.types.values()
    }

    /// Find the definition describing `version` of the same logical type.
    ///
    /// The type itself wins if its version matches. Otherwise the historical
    /// definition `<Name>__v<version>` is tried, then the plain `<Name>` entry
    /// if it happens to carry the requested version.
    pub fn resolve_version(
        &self,
        record_type: &Arc<RecordType>,
        version: u32,
    ) -> Result<Arc<RecordType>> {
        if record_type.version() == version {
            return Ok(Arc::clone(record_type));
        }

        let normalized = record_type.normalized_name();
        let historical = historical_type_name(normalized, version);
        if let Some(found) = self.lookup(&historical) {
            trace!(name = %historical, "resolved historical definition");
            return Ok(found);
        }

        match self.lookup(normalized) {
            Some(found) if found.version() == version => Ok(found),
            _ => Err(SeriumError::VersionNotFound {
                ccvt: VersionedType::new(normalized, version),
            }),
        }
    }

    /// Construct an instance of `name` from positional values.
    pub fn create(&self, name: &str, positional: Vec<Value>) -> Result<Record> {
        let record_type = self.get(name)?;
        Record::new(self, record_type, RecordArgs::positional(positional))
    }

    /// Start a named construction of `name`.
    pub fn build(&self, name: &str) -> Result<RecordBuilder<'_>> {
        Ok(RecordBuilder::new(self, self.get(name)?))
    }

    /// Check that every `Record(name)` descriptor refers to a registered type.
    pub fn check_references(&self) -> Result<()> {
        for record_type in self.types.values() {
            for (field, spec) in record_type.fields() {
                if let Some(missing) = self.first_unknown_reference(&spec.descriptor) {
                    return Err(SeriumError::definition(format!(
                        "field {field} of {} refers to unregistered record type {missing}",
                        record_type.name()
                    )));
                }
            }
        }
        Ok(())
    }

    fn first_unknown_reference<'d>(&self, descriptor: &'d FieldDescriptor) -> Option<&'d str> {
        match descriptor {
            FieldDescriptor::Record(name) if !self.contains(name) => Some(name.as_str()),
            FieldDescriptor::ListOf(inner) => self.first_unknown_reference(inner),
            FieldDescriptor::DictOf(k, v) => self
                .first_unknown_reference(k)
                .or_else(|| self.first_unknown_reference(v)),
            _ => None,
        }
    }
}

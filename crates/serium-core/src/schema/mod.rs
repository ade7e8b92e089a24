//! Record type definitions and the registry that names them.

pub mod descriptor;
pub mod record_type;
pub mod registry;

pub use descriptor::{CoercibleType, FieldDescriptor, FieldSpec, ScalarType};
pub use record_type::{MigrationFn, RecordType, RecordTypeBuilder};
pub use registry::TypeRegistry;

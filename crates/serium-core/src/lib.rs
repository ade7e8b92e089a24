//! Versioned serialization for immutable records.
//!
//! Record types are declared at startup into a [`TypeRegistry`]. Instances
//! serialize to an ordered wire mapping tagged with a `_ccvt` entry
//! (`"<TypeName>/<version>"`) at every nesting level. On the way back, data
//! written by an older shape of a type is detected and brought forward through
//! the chain of migrations registered on the newer definitions.
//!
//! ```rust,ignore
//! use serium_core::{FieldDescriptor, RecordType, SeriumEnv, TypeRegistry, Value};
//!
//! let mut registry = TypeRegistry::new();
//! registry.register(
//!     RecordType::builder("Author")
//!         .field("author_id", FieldDescriptor::int())
//!         .field("name", FieldDescriptor::string())
//!         .build()?,
//! )?;
//!
//! let env = SeriumEnv::default();
//! let author = registry.create("Author", vec![Value::Int(500), "Amos Oz".into()])?;
//! let json = env.cc_to_json_str(&author)?;
//! let back = env.cc_from_json_str(&registry, &json, "Author")?;
//! assert_eq!(author, back);
//! ```

pub mod codec;
pub mod context;
pub mod de;
pub mod env;
pub mod error;
pub mod migration;
pub mod naming;
pub mod record;
pub mod schema;
pub mod ser;
pub mod value;

pub use codec::{
    DEFAULT_MAX_NESTING, EncodeOptions, JsonCodec, JsonStyle, WireCodec, WireMap, WireValue,
};
pub use context::{
    DEFAULT_MAX_DEPTH, DeserializationContext, ProvidedVersion, SerializationContext,
    VersionProvider, fixed_version,
};
pub use env::{
    SeriumEnv, cc_check, cc_from_dict, cc_from_json_str, cc_to_dict, cc_to_json_str, default_env,
    values_to_wire,
};
pub use error::{Result, SeriumError};
pub use migration::{MigrationContext, find_migration_path, migrate};
pub use naming::{CCVT_KEY, VersionedType, normalize_type_name};
pub use record::{Record, RecordArgs, RecordBuilder};
pub use schema::{
    CoercibleType, FieldDescriptor, FieldSpec, MigrationFn, RecordType, RecordTypeBuilder,
    ScalarType, TypeRegistry,
};
pub use value::Value;

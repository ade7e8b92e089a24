//! Error types for serium
//!
//! Every failure of a serialize, deserialize or migrate call is a distinct
//! variant so callers can match on the condition instead of parsing messages.

use thiserror::Error;

use crate::naming::VersionedType;

/// Result type alias for serium operations
pub type Result<T> = std::result::Result<T, SeriumError>;

/// Main error type for serium operations
#[derive(Error, Debug)]
pub enum SeriumError {
    // ---- definition -------------------------------------------------------
    #[error("Invalid record type definition: {0}")]
    Definition(String),

    #[error("Record type {name} is not registered")]
    TypeNotFound { name: String },

    // ---- construction -----------------------------------------------------
    #[error(
        "Missing/extra arguments provided for record type {type_name}. Extra fields are {extra:?} Missing fields are {missing:?}"
    )]
    FieldMismatch {
        type_name: String,
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("Could not create record: {0}")]
    Creation(String),

    #[error(
        "For record type {type_name} - expected type for field {field} is {expected}. Got {actual}"
    )]
    UnexpectedFieldType {
        type_name: String,
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Field {field} doesn't exist in record type {type_name}")]
    UnknownField { type_name: String, field: String },

    #[error("Field {field} is not part of record type {type_name}")]
    UnexpectedField { type_name: String, field: String },

    #[error("Object is not of type {expected}. Object: {actual}")]
    TypeCheck { expected: String, actual: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    // ---- versioning -------------------------------------------------------
    #[error("Invalid versioned type: '{0}'")]
    InvalidVersionedType(String),

    #[error("Could not find version info in data when deserializing type {ccvt}")]
    MissingVersionData { ccvt: VersionedType },

    #[error("Trying to deserialize incompatible types: {found} vs {expected}")]
    IncompatibleTypes {
        found: VersionedType,
        expected: VersionedType,
    },

    #[error("Could not find record type definition for {ccvt}")]
    VersionNotFound { ccvt: VersionedType },

    #[error("Could not find a migration path from {from} to {to}")]
    MigrationPathNotFound {
        from: VersionedType,
        to: VersionedType,
    },

    #[error(
        "Migration function failed on instance {instance} from version {from_version} to version {to_version}: {source}"
    )]
    MigrationFunction {
        instance: String,
        from_version: u32,
        to_version: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("External version provider failed: {0}")]
    ExternalVersionProvider(String),

    // ---- subtypes ---------------------------------------------------------
    #[error("Could not find record type {name} for subtype key {key_field}")]
    SubtypeNotFound { name: String, key_field: String },

    #[error("Subtype value {field} cannot be null")]
    SubtypeCannotBeNull { field: String },

    // ---- coercion ---------------------------------------------------------
    #[error("Could not convert the value {value} to the expected type {expected}: {reason}")]
    TypeAsString {
        value: String,
        expected: String,
        reason: String,
    },

    #[error("Value of field {field} is {actual} while expected type is {expected}")]
    FieldType {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Unexpected value while serializing: {0}")]
    UnexpectedType(String),

    #[error("Data is nested deeper than {limit} levels")]
    DepthLimit { limit: usize },

    // ---- codec ------------------------------------------------------------
    #[error("JSON error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl SeriumError {
    pub fn definition(msg: impl Into<String>) -> Self {
        SeriumError::Definition(msg.into())
    }

    pub fn creation(msg: impl Into<String>) -> Self {
        SeriumError::Creation(msg.into())
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        SeriumError::InvalidParameter(msg.into())
    }
}

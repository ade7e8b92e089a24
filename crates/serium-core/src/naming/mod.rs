pub mod versioned_type;

pub use versioned_type::VersionedType;

/// Wire key carrying the versioned type of a serialized record.
pub const CCVT_KEY: &str = "_ccvt";

/// Marker separating a logical type name from its historical version.
///
/// `Book__v1` is the definition kept around to describe version 1 of `Book`.
pub const HISTORICAL_MARKER: &str = "__v";

/// Strip the historical-version suffix from a declared type name.
pub fn normalize_type_name(name: &str) -> &str {
    match name.find(HISTORICAL_MARKER) {
        Some(pos) => &name[..pos],
        None => name,
    }
}

/// Declared name of the historical definition of `name` at `version`.
pub fn historical_type_name(name: &str, version: u32) -> String {
    format!(
        "{}{}{}",
        normalize_type_name(name),
        HISTORICAL_MARKER,
        version
    )
}

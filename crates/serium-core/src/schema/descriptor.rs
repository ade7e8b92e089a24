//! Field descriptors: the closed set of shapes a record field can take.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use uuid::Uuid;

use crate::value::Value;

/// Native scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    Float,
    Str,
    /// Untyped. Accepts only values that read back unchanged without a
    /// descriptor: null, bool, numbers, strings, and lists or string-keyed
    /// dicts of those. Integers read back as `Int` when they fit 32 bits.
    Any,
}

impl ScalarType {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int => "int",
            ScalarType::Long => "long",
            ScalarType::Float => "float",
            ScalarType::Str => "str",
            ScalarType::Any => "any",
        }
    }

    /// Whether `value` is exactly of this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ScalarType::Any, v) => untyped_round_trips(v),
            (ScalarType::Bool, Value::Bool(_))
            | (ScalarType::Int, Value::Int(_))
            | (ScalarType::Long, Value::Long(_))
            | (ScalarType::Float, Value::Float(_))
            | (ScalarType::Str, Value::Str(_)) => true,
            _ => false,
        }
    }
}

fn untyped_round_trips(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) => true,
        Value::Long(n) => i32::try_from(*n).is_err(),
        Value::List(items) => items.iter().all(untyped_round_trips),
        Value::Dict(entries) => entries
            .iter()
            .all(|(k, v)| matches!(k, Value::Str(_)) && untyped_round_trips(v)),
        Value::Uuid(_) | Value::Timestamp(_) | Value::Date(_) | Value::Record(_) => false,
    }
}

/// Rich types that travel as their string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoercibleType {
    Uuid,
    /// RFC 3339 timestamp in UTC
    Timestamp,
    /// ISO 8601 calendar date
    Date,
}

impl CoercibleType {
    pub fn name(&self) -> &'static str {
        match self {
            CoercibleType::Uuid => "uuid",
            CoercibleType::Timestamp => "timestamp",
            CoercibleType::Date => "date",
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (CoercibleType::Uuid, Value::Uuid(_))
                | (CoercibleType::Timestamp, Value::Timestamp(_))
                | (CoercibleType::Date, Value::Date(_))
        )
    }

    /// Parse the string form. The error is the parser's message.
    pub fn parse(&self, s: &str) -> std::result::Result<Value, String> {
        match self {
            CoercibleType::Uuid => Uuid::parse_str(s)
                .map(Value::Uuid)
                .map_err(|e| e.to_string()),
            CoercibleType::Timestamp => DateTime::parse_from_rfc3339(s)
                .map(|t| Value::Timestamp(t.with_timezone(&Utc)))
                .map_err(|e| e.to_string()),
            CoercibleType::Date => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|e| e.to_string()),
        }
    }

    /// String form of a value of this kind, `None` if the value is of another kind.
    pub fn render(&self, value: &Value) -> Option<String> {
        match (self, value) {
            (CoercibleType::Uuid, Value::Uuid(u)) => Some(u.to_string()),
            (CoercibleType::Timestamp, Value::Timestamp(t)) => Some(t.to_rfc3339()),
            (CoercibleType::Date, Value::Date(d)) => Some(d.format("%Y-%m-%d").to_string()),
            _ => None,
        }
    }
}

/// Describes the shape of a single field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldDescriptor {
    Scalar(ScalarType),
    /// Nested record of the named type. Any record whose normalized type
    /// name matches is accepted, so historical variants can stand in.
    Record(String),
    ListOf(Box<FieldDescriptor>),
    DictOf(Box<FieldDescriptor>, Box<FieldDescriptor>),
    /// The enclosing record type.
    SelfRef,
    StringCoercible(CoercibleType),
    /// String naming the concrete type of the paired value field.
    SubtypeKey(String),
    /// Record whose type is named by the paired key field.
    SubtypeValue(String),
}

impl FieldDescriptor {
    pub fn boolean() -> Self {
        FieldDescriptor::Scalar(ScalarType::Bool)
    }

    pub fn int() -> Self {
        FieldDescriptor::Scalar(ScalarType::Int)
    }

    pub fn long() -> Self {
        FieldDescriptor::Scalar(ScalarType::Long)
    }

    pub fn float() -> Self {
        FieldDescriptor::Scalar(ScalarType::Float)
    }

    pub fn string() -> Self {
        FieldDescriptor::Scalar(ScalarType::Str)
    }

    pub fn any() -> Self {
        FieldDescriptor::Scalar(ScalarType::Any)
    }

    pub fn record(type_name: impl Into<String>) -> Self {
        FieldDescriptor::Record(type_name.into())
    }

    pub fn list(element: FieldDescriptor) -> Self {
        FieldDescriptor::ListOf(Box::new(element))
    }

    pub fn dict(key: FieldDescriptor, value: FieldDescriptor) -> Self {
        FieldDescriptor::DictOf(Box::new(key), Box::new(value))
    }

    pub fn self_ref() -> Self {
        FieldDescriptor::SelfRef
    }

    pub fn uuid() -> Self {
        FieldDescriptor::StringCoercible(CoercibleType::Uuid)
    }

    pub fn timestamp() -> Self {
        FieldDescriptor::StringCoercible(CoercibleType::Timestamp)
    }

    pub fn date() -> Self {
        FieldDescriptor::StringCoercible(CoercibleType::Date)
    }

    pub fn subtype_key(value_field: impl Into<String>) -> Self {
        FieldDescriptor::SubtypeKey(value_field.into())
    }

    pub fn subtype_value(key_field: impl Into<String>) -> Self {
        FieldDescriptor::SubtypeValue(key_field.into())
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDescriptor::Scalar(s) => write!(f, "{}", s.name()),
            FieldDescriptor::Record(name) => write!(f, "{name}"),
            FieldDescriptor::ListOf(d) => write!(f, "List[{d}]"),
            FieldDescriptor::DictOf(k, v) => write!(f, "Dict[{k}, {v}]"),
            FieldDescriptor::SelfRef => write!(f, "Self"),
            FieldDescriptor::StringCoercible(c) => write!(f, "{}", c.name()),
            FieldDescriptor::SubtypeKey(other) => write!(f, "SubtypeKey({other})"),
            FieldDescriptor::SubtypeValue(other) => write!(f, "SubtypeValue({other})"),
        }
    }
}

/// A field's descriptor and its optional default.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub descriptor: FieldDescriptor,
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn new(descriptor: FieldDescriptor) -> Self {
        Self {
            descriptor,
            default: None,
        }
    }

    pub fn with_default(descriptor: FieldDescriptor, default: impl Into<Value>) -> Self {
        Self {
            descriptor,
            default: Some(default.into()),
        }
    }
}

impl From<FieldDescriptor> for FieldSpec {
    fn from(descriptor: FieldDescriptor) -> Self {
        FieldSpec::new(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ScalarType::Int, Value::Int(3), true)]
    #[case(ScalarType::Int, Value::Long(3), false)]
    #[case(ScalarType::Long, Value::Long(3), true)]
    #[case(ScalarType::Float, Value::Int(3), false)]
    #[case(ScalarType::Str, Value::Str("x".into()), true)]
    #[case(ScalarType::Any, Value::List(vec![]), true)]
    #[case(ScalarType::Any, Value::Int(5), true)]
    #[case(ScalarType::Any, Value::Long(5), false)]
    #[case(ScalarType::Any, Value::Long(5_000_000_000), true)]
    #[case(ScalarType::Any, Value::Uuid(Uuid::nil()), false)]
    #[case(ScalarType::Any, Value::Date(NaiveDate::MIN), false)]
    #[case(ScalarType::Any, Value::List(vec![Value::Int(1), Value::Uuid(Uuid::nil())]), false)]
    #[case(ScalarType::Any, Value::dict([("a", Value::Int(1))]), true)]
    #[case(ScalarType::Any, Value::dict([(1_i32, Value::Int(1))]), false)]
    fn test_scalar_accepts(#[case] ty: ScalarType, #[case] value: Value, #[case] expected: bool) {
        assert_eq!(ty.accepts(&value), expected);
    }

    #[test]
    fn test_uuid_parse_and_render() {
        let s = "c1b9d6a2-4a3f-4b8e-9c51-3f2b6b1f0a7e";
        let v = CoercibleType::Uuid.parse(s).unwrap();
        assert!(CoercibleType::Uuid.accepts(&v));
        assert_eq!(CoercibleType::Uuid.render(&v).as_deref(), Some(s));
        assert!(CoercibleType::Uuid.parse("2000").is_err());
    }

    #[test]
    fn test_date_and_timestamp() {
        let d = CoercibleType::Date.parse("2024-02-29").unwrap();
        assert_eq!(CoercibleType::Date.render(&d).as_deref(), Some("2024-02-29"));

        let t = CoercibleType::Timestamp
            .parse("2024-01-01T10:00:00+02:00")
            .unwrap();
        assert_eq!(
            CoercibleType::Timestamp.render(&t).as_deref(),
            Some("2024-01-01T08:00:00+00:00")
        );
    }

    #[test]
    fn test_descriptor_display() {
        let d = FieldDescriptor::dict(
            FieldDescriptor::string(),
            FieldDescriptor::list(FieldDescriptor::record("Book")),
        );
        assert_eq!(d.to_string(), "Dict[str, List[Book]]");
    }
}

//! Record to wire mapping.

use indexmap::IndexMap;
use serde_json::Number;

use crate::codec::{WireMap, WireValue};
use crate::context::SerializationContext;
use crate::error::{Result, SeriumError};
use crate::naming::CCVT_KEY;
use crate::record::Record;
use crate::schema::CoercibleType;
use crate::value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct Serializer {
    ctx: SerializationContext,
}

impl Serializer {
    pub fn new(ctx: SerializationContext) -> Self {
        Self { ctx }
    }

    /// Serialize a record. Nested records are written with their own type,
    /// and each mapping gets a trailing `_ccvt` unless tagging is disabled.
    pub fn serialize(&self, record: &Record) -> Result<WireMap> {
        self.record_at(record, 1)
    }

    fn record_at(&self, record: &Record, depth: usize) -> Result<WireMap> {
        if depth > self.ctx.max_depth {
            return Err(SeriumError::DepthLimit {
                limit: self.ctx.max_depth,
            });
        }

        let mut map = WireMap::new();
        for (name, value) in record.fields() {
            map.insert(name.to_string(), self.value_at(value, depth + 1)?);
        }
        if !self.ctx.force_unversioned_serialization {
            map.insert(
                CCVT_KEY.to_string(),
                WireValue::String(record.versioned_type().to_string()),
            );
        }
        Ok(map)
    }

    pub fn serialize_list(&self, records: &[Record]) -> Result<Vec<WireValue>> {
        records
            .iter()
            .map(|r| self.serialize(r).map(WireValue::Object))
            .collect()
    }

    /// Serialize a free-form map; records inside are serialized, other
    /// values are written as their wire form.
    pub fn serialize_values(&self, values: &IndexMap<String, Value>) -> Result<WireMap> {
        values
            .iter()
            .map(|(k, v)| -> Result<(String, WireValue)> {
                Ok((k.clone(), self.to_wire(v)?))
            })
            .collect()
    }

    pub fn to_wire(&self, value: &Value) -> Result<WireValue> {
        self.value_at(value, 1)
    }

    /// `depth` is the level a record found in `value` sits at.
    fn value_at(&self, value: &Value, depth: usize) -> Result<WireValue> {
        Ok(match value {
            Value::Null => WireValue::Null,
            Value::Bool(b) => WireValue::Bool(*b),
            Value::Int(n) => WireValue::Number((*n).into()),
            Value::Long(n) => WireValue::Number((*n).into()),
            Value::Float(x) => Number::from_f64(*x)
                .map(WireValue::Number)
                .ok_or_else(|| SeriumError::UnexpectedType(format!("float {x} is not finite")))?,
            Value::Str(s) => WireValue::String(s.clone()),
            Value::Uuid(_) | Value::Timestamp(_) | Value::Date(_) => {
                WireValue::String(coerced_string(value)?)
            }
            Value::List(items) => WireValue::Array(
                items
                    .iter()
                    .map(|item| self.value_at(item, depth))
                    .collect::<Result<_>>()?,
            ),
            Value::Dict(entries) => WireValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| -> Result<(String, WireValue)> {
                        Ok((dict_key(k)?, self.value_at(v, depth)?))
                    })
                    .collect::<Result<_>>()?,
            ),
            Value::Record(r) => WireValue::Object(self.record_at(r, depth)?),
        })
    }
}

fn coerced_string(value: &Value) -> Result<String> {
    [
        CoercibleType::Uuid,
        CoercibleType::Timestamp,
        CoercibleType::Date,
    ]
    .iter()
    .find_map(|c| c.render(value))
    .ok_or_else(|| SeriumError::UnexpectedType(format!("{value} has no string form")))
}

/// Wire keys are strings.
fn dict_key(key: &Value) -> Result<String> {
    match key {
        Value::Str(s) => Ok(s.clone()),
        Value::Int(n) => Ok(n.to_string()),
        Value::Long(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Uuid(_) | Value::Timestamp(_) | Value::Date(_) => coerced_string(key),
        other => Err(SeriumError::UnexpectedType(format!(
            "{} cannot be used as a dict key",
            other.kind_name()
        ))),
    }
}

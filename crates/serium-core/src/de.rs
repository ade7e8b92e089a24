//! Wire mapping to record, migrating old data on the way.
//!
//! Deserializing a mapping runs in four steps: find out which version wrote
//! it, check that it is the expected type, migrate it when the version
//! differs, then rebuild each field from its descriptor and hand the result
//! to the validating constructor.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::codec::{WireMap, WireValue};
use crate::context::{DeserializationContext, ProvidedVersion, SerializationContext};
use crate::error::{Result, SeriumError};
use crate::migration::migrate;
use crate::naming::{CCVT_KEY, VersionedType};
use crate::record::{Record, RecordArgs};
use crate::schema::{FieldDescriptor, RecordType, ScalarType, TypeRegistry};
use crate::ser::Serializer;
use crate::value::Value;

pub struct Deserializer<'a> {
    registry: &'a TypeRegistry,
    ctx: &'a DeserializationContext,
}

impl<'a> Deserializer<'a> {
    pub fn new(registry: &'a TypeRegistry, ctx: &'a DeserializationContext) -> Self {
        Self { registry, ctx }
    }

    pub fn deserialize(&self, wire: WireMap, target: &Arc<RecordType>) -> Result<Record> {
        self.deserialize_at(wire, target, 1)
    }

    fn deserialize_at(
        &self,
        mut wire: WireMap,
        target: &Arc<RecordType>,
        depth: usize,
    ) -> Result<Record> {
        if depth > self.ctx.max_depth {
            return Err(SeriumError::DepthLimit {
                limit: self.ctx.max_depth,
            });
        }

        let found = self.detect_version(&mut wire, target)?;
        let expected = target.versioned_type();

        if !found.same_type(&expected) {
            if self.ctx.fail_on_incompatible_types {
                return Err(SeriumError::IncompatibleTypes { found, expected });
            }
            debug!(%found, %expected, "incompatible types, using data as is");
            return self.construct(wire, target, depth);
        }

        if found.version() == expected.version() {
            return self.construct(wire, target, depth);
        }

        debug!(%found, %expected, "version mismatch, migrating");
        let historical = self.registry.resolve_version(target, found.version())?;
        wire.insert(CCVT_KEY.to_string(), WireValue::String(found.to_string()));
        let old = self.deserialize_at(wire, &historical, depth)?;
        let migrated = migrate(self.registry, target, old, &found)?;

        // the migrated instance is rebuilt through the target's own schema
        let ser_ctx = SerializationContext::versioned().with_max_depth(self.ctx.max_depth);
        let mut wire = Serializer::new(ser_ctx).serialize(&migrated)?;
        wire.remove(CCVT_KEY);
        self.construct(wire, target, depth)
    }

    /// Remove and parse the tag, or ask the version provider.
    fn detect_version(&self, wire: &mut WireMap, target: &RecordType) -> Result<VersionedType> {
        match wire.remove(CCVT_KEY) {
            Some(WireValue::String(s)) => return VersionedType::parse(&s),
            Some(other) => return Err(SeriumError::InvalidVersionedType(other.to_string())),
            None => {}
        }

        debug!(record_type = %target, "no version tag in data");
        if let Some(provider) = &self.ctx.external_version_provider {
            let provided = provider(target, &*wire).map_err(|e| {
                SeriumError::ExternalVersionProvider(format!(
                    "provider failed for record type {target}: {e:#}"
                ))
            })?;
            let ccvt = match provided {
                Some(ProvidedVersion::Version(v)) => {
                    Some(VersionedType::new(target.normalized_name(), v))
                }
                Some(ProvidedVersion::Versioned(ccvt)) => Some(ccvt),
                None => None,
            };
            if let Some(ccvt) = ccvt {
                if ccvt.version() == 0 {
                    return Err(SeriumError::ExternalVersionProvider(format!(
                        "provider returned version 0 for record type {target}"
                    )));
                }
                debug!(record_type = %target, %ccvt, "version set by external provider");
                return Ok(ccvt);
            }
        }

        if self.ctx.fail_on_unversioned_data {
            return Err(SeriumError::MissingVersionData {
                ccvt: target.versioned_type(),
            });
        }
        debug!(record_type = %target, "assuming current version for unversioned data");
        Ok(target.versioned_type())
    }

    fn construct(&self, mut wire: WireMap, ty: &Arc<RecordType>, depth: usize) -> Result<Record> {
        if let Some(unknown) = wire.keys().find(|k| ty.field(k).is_none()) {
            return Err(SeriumError::UnexpectedField {
                type_name: ty.name().to_string(),
                field: unknown.clone(),
            });
        }

        // subtype keys are read before the fields are consumed
        let subtype_keys: HashMap<&str, WireValue> = ty
            .fields()
            .values()
            .filter_map(|spec| match &spec.descriptor {
                FieldDescriptor::SubtypeValue(key_field) => wire
                    .get(key_field)
                    .map(|v| (key_field.as_str(), v.clone())),
                _ => None,
            })
            .collect();

        let mut named = Vec::with_capacity(ty.fields().len());
        for (name, spec) in ty.fields() {
            match wire.remove(name) {
                Some(raw) => {
                    let value =
                        self.reconstruct(ty, name, &spec.descriptor, raw, &subtype_keys, depth)?;
                    named.push((name.clone(), value));
                }
                None if spec.default.is_some() => {}
                None => {
                    return Err(SeriumError::creation(format!(
                        "no value for field {name} of {} and no default declared",
                        ty.name()
                    )));
                }
            }
        }

        Record::new(
            self.registry,
            Arc::clone(ty),
            RecordArgs {
                positional: Vec::new(),
                named,
            },
        )
    }

    fn reconstruct(
        &self,
        owner: &Arc<RecordType>,
        field: &str,
        descriptor: &FieldDescriptor,
        raw: WireValue,
        subtype_keys: &HashMap<&str, WireValue>,
        depth: usize,
    ) -> Result<Value> {
        if raw.is_null() {
            if self.ctx.fail_on_null_subtypes
                && matches!(descriptor, FieldDescriptor::SubtypeValue(_))
            {
                return Err(SeriumError::SubtypeCannotBeNull {
                    field: field.to_string(),
                });
            }
            return Ok(Value::Null);
        }

        match descriptor {
            FieldDescriptor::Scalar(scalar) => coerce_scalar(field, *scalar, raw),
            FieldDescriptor::SubtypeKey(_) => coerce_scalar(field, ScalarType::Str, raw),
            FieldDescriptor::StringCoercible(coercible) => match raw {
                WireValue::String(s) => {
                    coercible
                        .parse(&s)
                        .map_err(|reason| SeriumError::TypeAsString {
                            value: s.clone(),
                            expected: coercible.name().to_string(),
                            reason,
                        })
                }
                other => Err(SeriumError::TypeAsString {
                    value: other.to_string(),
                    expected: coercible.name().to_string(),
                    reason: "expected a string".to_string(),
                }),
            },
            FieldDescriptor::Record(name) => {
                let nested = self.registry.get(name)?;
                self.nested(field, raw, &nested, depth)
            }
            FieldDescriptor::SelfRef => self.nested(field, raw, owner, depth),
            FieldDescriptor::SubtypeValue(key_field) => {
                let key = subtype_keys.get(key_field.as_str());
                let Some(WireValue::String(name)) = key else {
                    return Err(SeriumError::SubtypeNotFound {
                        name: key.map_or_else(|| "null".to_string(), |k| k.to_string()),
                        key_field: key_field.clone(),
                    });
                };
                let subtype = self
                    .registry
                    .lookup(name)
                    .ok_or_else(|| SeriumError::SubtypeNotFound {
                        name: name.clone(),
                        key_field: key_field.clone(),
                    })?;
                self.nested(field, raw, &subtype, depth)
            }
            FieldDescriptor::ListOf(element) => match raw {
                WireValue::Array(items) => Ok(Value::List(
                    items
                        .into_iter()
                        .map(|item| {
                            self.reconstruct(owner, field, element, item, subtype_keys, depth)
                        })
                        .collect::<Result<_>>()?,
                )),
                other => Err(field_type(field, descriptor, &other)),
            },
            FieldDescriptor::DictOf(key_desc, value_desc) => match raw {
                WireValue::Object(entries) => {
                    let mut dict = IndexMap::with_capacity(entries.len());
                    for (k, v) in entries {
                        let key = self.reconstruct(
                            owner,
                            field,
                            key_desc,
                            WireValue::String(k),
                            subtype_keys,
                            depth,
                        )?;
                        let value =
                            self.reconstruct(owner, field, value_desc, v, subtype_keys, depth)?;
                        dict.insert(key, value);
                    }
                    Ok(Value::Dict(dict))
                }
                other => Err(field_type(field, descriptor, &other)),
            },
        }
    }

    /// Rebuild a record held by a field of a record at `depth`.
    fn nested(
        &self,
        field: &str,
        raw: WireValue,
        ty: &Arc<RecordType>,
        depth: usize,
    ) -> Result<Value> {
        match raw {
            WireValue::Object(map) => {
                Ok(Value::Record(self.deserialize_at(map, ty, depth + 1)?))
            }
            other => Err(SeriumError::FieldType {
                field: field.to_string(),
                expected: ty.name().to_string(),
                actual: other.to_string(),
            }),
        }
    }
}

fn field_type(field: &str, expected: impl ToString, actual: &WireValue) -> SeriumError {
    SeriumError::FieldType {
        field: field.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

/// Accept a wire value as a scalar kind, converting between number kinds and
/// from strings where the conversion is unambiguous.
fn coerce_scalar(field: &str, scalar: ScalarType, raw: WireValue) -> Result<Value> {
    let fail = |raw: &WireValue| field_type(field, scalar.name(), raw);

    match scalar {
        ScalarType::Any => Ok(untyped(raw)),
        ScalarType::Bool => match &raw {
            WireValue::Bool(b) => Ok(Value::Bool(*b)),
            WireValue::String(s) if s == "true" => Ok(Value::Bool(true)),
            WireValue::String(s) if s == "false" => Ok(Value::Bool(false)),
            _ => Err(fail(&raw)),
        },
        ScalarType::Int => integer(&raw)
            .and_then(|n| i32::try_from(n).ok())
            .map(Value::Int)
            .ok_or_else(|| fail(&raw)),
        ScalarType::Long => integer(&raw).map(Value::Long).ok_or_else(|| fail(&raw)),
        ScalarType::Float => match &raw {
            WireValue::Number(n) => n.as_f64().map(Value::Float).ok_or_else(|| fail(&raw)),
            WireValue::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| fail(&raw)),
            _ => Err(fail(&raw)),
        },
        ScalarType::Str => match raw {
            WireValue::String(s) => Ok(Value::Str(s)),
            WireValue::Number(n) => Ok(Value::Str(n.to_string())),
            WireValue::Bool(b) => Ok(Value::Str(b.to_string())),
            other => Err(fail(&other)),
        },
    }
}

/// Integer content of a wire value. Floats are truncated toward zero.
fn integer(raw: &WireValue) -> Option<i64> {
    match raw {
        WireValue::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .map(f64::trunc)
                .filter(|x| *x >= i64::MIN as f64 && *x <= i64::MAX as f64)
                .map(|x| x as i64)
        }),
        WireValue::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Wire value as an untyped value: integers that fit 32 bits become `Int`.
fn untyped(raw: WireValue) -> Value {
    match raw {
        WireValue::Null => Value::Null,
        WireValue::Bool(b) => Value::Bool(b),
        WireValue::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).map_or(Value::Long(i), Value::Int),
            None => n.as_f64().map_or(Value::Null, Value::Float),
        },
        WireValue::String(s) => Value::Str(s),
        WireValue::Array(items) => Value::List(items.into_iter().map(untyped).collect()),
        WireValue::Object(map) => Value::Dict(
            map.into_iter()
                .map(|(k, v)| (Value::Str(k), untyped(v)))
                .collect(),
        ),
    }
}

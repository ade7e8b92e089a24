//! Immutable, validated record instances.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{Result, SeriumError};
use crate::naming::{VersionedType, normalize_type_name};
use crate::schema::{FieldDescriptor, RecordType, TypeRegistry};
use crate::value::Value;

/// Arguments for the validating constructor: positional values first, in
/// schema order, then named values.
#[derive(Debug, Clone, Default)]
pub struct RecordArgs {
    pub positional: Vec<Value>,
    pub named: Vec<(String, Value)>,
}

impl RecordArgs {
    pub fn positional(values: Vec<Value>) -> Self {
        Self {
            positional: values,
            named: Vec::new(),
        }
    }

    pub fn named<S, V, I>(values: I) -> Self
    where
        S: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (S, V)>,
    {
        Self {
            positional: Vec::new(),
            named: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }
}

/// An instance of a [`RecordType`].
///
/// Instances are fully populated and type-checked at construction and cannot
/// be changed afterwards. [`Record::copy_with`] builds a modified copy through
/// the same validating constructor.
#[derive(Clone)]
pub struct Record {
    ty: Arc<RecordType>,
    values: Arc<[Value]>,
}

impl Record {
    /// The validating constructor.
    pub fn new(registry: &TypeRegistry, ty: Arc<RecordType>, args: RecordArgs) -> Result<Self> {
        let field_count = ty.fields().len();
        if args.positional.len() > field_count {
            return Err(SeriumError::creation(format!(
                "{} takes {} fields but {} positional values were given",
                ty.name(),
                field_count,
                args.positional.len()
            )));
        }

        let mut slots: Vec<Option<Value>> = vec![None; field_count];
        for (slot, value) in slots.iter_mut().zip(args.positional) {
            *slot = Some(value);
        }

        let mut extra = Vec::new();
        for (name, value) in args.named {
            match ty.field_index(&name) {
                Some(idx) if slots[idx].is_some() => {
                    return Err(SeriumError::creation(format!(
                        "{} got multiple values for field {name}",
                        ty.name()
                    )));
                }
                Some(idx) => slots[idx] = Some(value),
                None => extra.push(name),
            }
        }

        let mut missing = Vec::new();
        let mut values = Vec::with_capacity(field_count);
        for (slot, (name, spec)) in slots.into_iter().zip(ty.fields()) {
            match slot.or_else(|| spec.default.clone()) {
                Some(value) => values.push(value),
                None => missing.push(name.clone()),
            }
        }

        if !missing.is_empty() || !extra.is_empty() {
            return Err(SeriumError::FieldMismatch {
                type_name: ty.name().to_string(),
                missing,
                extra,
            });
        }

        for ((name, spec), value) in ty.fields().iter().zip(&values) {
            check_value(registry, &ty, name, &spec.descriptor, value, &values)?;
        }

        Ok(Self {
            ty,
            values: values.into(),
        })
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.ty
    }

    /// Declared type name.
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    pub fn versioned_type(&self) -> VersionedType {
        self.ty.versioned_type()
    }

    pub fn get(&self, field: &str) -> Result<&Value> {
        self.ty
            .field_index(field)
            .map(|idx| &self.values[idx])
            .ok_or_else(|| SeriumError::UnexpectedField {
                type_name: self.ty.name().to_string(),
                field: field.to_string(),
            })
    }

    /// Values in schema order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.ty.field_names().zip(self.values.iter())
    }

    /// A copy with some fields replaced, validated like a fresh construction.
    pub fn copy_with<S, V, I>(&self, registry: &TypeRegistry, overrides: I) -> Result<Self>
    where
        S: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (S, V)>,
    {
        let mut values = self.values.to_vec();
        for (name, value) in overrides {
            let name = name.into();
            let idx = self
                .ty
                .field_index(&name)
                .ok_or_else(|| SeriumError::UnknownField {
                    type_name: self.ty.name().to_string(),
                    field: name,
                })?;
            values[idx] = value.into();
        }
        Record::new(registry, Arc::clone(&self.ty), RecordArgs::positional(values))
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.ty.name() == other.ty.name() && self.values == other.values
    }
}

impl Eq for Record {}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ty.name().hash(state);
        self.values.hash(state);
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.ty.name())?;
        for (i, (name, value)) in self.fields().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.ty.name());
        for (name, value) in self.fields() {
            s.field(name, value);
        }
        s.finish()
    }
}

/// Named construction against a registry.
pub struct RecordBuilder<'r> {
    registry: &'r TypeRegistry,
    ty: Arc<RecordType>,
    args: RecordArgs,
}

impl<'r> RecordBuilder<'r> {
    pub fn new(registry: &'r TypeRegistry, ty: Arc<RecordType>) -> Self {
        Self {
            registry,
            ty,
            args: RecordArgs::default(),
        }
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args = self.args.arg(value);
        self
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args = self.args.set(name, value);
        self
    }

    pub fn build(self) -> Result<Record> {
        Record::new(self.registry, self.ty, self.args)
    }
}

/// Short description of a value for error messages: the declared type name
/// for records, the kind otherwise.
fn describe(value: &Value) -> String {
    match value {
        Value::Record(r) => r.type_name().to_string(),
        other => other.kind_name().to_string(),
    }
}

fn check_value(
    registry: &TypeRegistry,
    owner: &RecordType,
    field: &str,
    descriptor: &FieldDescriptor,
    value: &Value,
    siblings: &[Value],
) -> Result<()> {
    if value.is_null() {
        return Ok(());
    }

    let mismatch = |expected: String| SeriumError::UnexpectedFieldType {
        type_name: owner.name().to_string(),
        field: field.to_string(),
        expected,
        actual: describe(value),
    };

    match (descriptor, value) {
        (FieldDescriptor::Scalar(s), v) if s.accepts(v) => Ok(()),
        (FieldDescriptor::StringCoercible(c), v) if c.accepts(v) => Ok(()),
        (FieldDescriptor::SubtypeKey(_), Value::Str(_)) => Ok(()),
        (FieldDescriptor::Record(name), Value::Record(r))
            if r.record_type().normalized_name() == normalize_type_name(name) =>
        {
            Ok(())
        }
        (FieldDescriptor::SelfRef, Value::Record(r))
            if r.record_type().normalized_name() == owner.normalized_name() =>
        {
            Ok(())
        }
        (FieldDescriptor::ListOf(inner), Value::List(items)) => {
            for item in items {
                check_value(registry, owner, field, inner, item, siblings)?;
            }
            Ok(())
        }
        (FieldDescriptor::DictOf(k, v), Value::Dict(entries)) => {
            for (key, val) in entries {
                check_value(registry, owner, field, k, key, siblings)?;
                check_value(registry, owner, field, v, val, siblings)?;
            }
            Ok(())
        }
        (FieldDescriptor::SubtypeValue(key_field), v) => {
            let key = owner
                .field_index(key_field)
                .and_then(|idx| siblings.get(idx))
                .unwrap_or(&Value::Null);
            let Some(name) = key.as_str() else {
                return Err(SeriumError::SubtypeNotFound {
                    name: key.to_string(),
                    key_field: key_field.clone(),
                });
            };
            let subtype = registry
                .lookup(name)
                .ok_or_else(|| SeriumError::SubtypeNotFound {
                    name: name.to_string(),
                    key_field: key_field.clone(),
                })?;
            match v {
                Value::Record(r)
                    if r.record_type().normalized_name() == subtype.normalized_name() =>
                {
                    Ok(())
                }
                _ => Err(mismatch(subtype.name().to_string())),
            }
        }
        (FieldDescriptor::SelfRef, _) => Err(mismatch(owner.name().to_string())),
        (d, _) => Err(mismatch(d.to_string())),
    }
}

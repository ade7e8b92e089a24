//! Serialization environments.
//!
//! A [`SeriumEnv`] bundles the serialization policy, the deserialization
//! policy and the text codec. Environments are immutable and cheap to clone;
//! any number can coexist. [`default_env`] is a process-wide instance with
//! default settings, backing the free functions of this module.

use indexmap::IndexMap;
use std::sync::{Arc, OnceLock};

use crate::codec::{EncodeOptions, JsonCodec, WireCodec, WireMap, WireValue};
use crate::context::{DeserializationContext, SerializationContext};
use crate::de::Deserializer;
use crate::error::{Result, SeriumError};
use crate::record::Record;
use crate::schema::TypeRegistry;
use crate::ser::Serializer;
use crate::value::Value;

#[derive(Clone, Debug)]
pub struct SeriumEnv {
    serialization: SerializationContext,
    deserialization: DeserializationContext,
    codec: Arc<dyn WireCodec>,
}

impl Default for SeriumEnv {
    fn default() -> Self {
        Self::new(
            SerializationContext::default(),
            DeserializationContext::default(),
            Arc::new(JsonCodec::default()),
        )
    }
}

impl SeriumEnv {
    pub fn new(
        serialization: SerializationContext,
        deserialization: DeserializationContext,
        codec: Arc<dyn WireCodec>,
    ) -> Self {
        Self {
            serialization,
            deserialization,
            codec,
        }
    }

    pub fn with_serialization(mut self, serialization: SerializationContext) -> Self {
        self.serialization = serialization;
        self
    }

    pub fn with_deserialization(mut self, deserialization: DeserializationContext) -> Self {
        self.deserialization = deserialization;
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn WireCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn serialization(&self) -> &SerializationContext {
        &self.serialization
    }

    pub fn deserialization(&self) -> &DeserializationContext {
        &self.deserialization
    }

    pub fn codec(&self) -> &Arc<dyn WireCodec> {
        &self.codec
    }

    fn serializer(&self) -> Serializer {
        Serializer::new(self.serialization)
    }

    pub fn cc_to_dict(&self, record: &Record) -> Result<WireMap> {
        self.serializer().serialize(record)
    }

    pub fn cc_list_to_wire(&self, records: &[Record]) -> Result<Vec<WireValue>> {
        self.serializer().serialize_list(records)
    }

    /// Serialize a free-form map whose values may include records. One way
    /// only: there is no schema to read such a map back.
    pub fn values_to_wire(&self, values: &IndexMap<String, Value>) -> Result<WireMap> {
        self.serializer().serialize_values(values)
    }

    pub fn cc_to_json_str(&self, record: &Record) -> Result<String> {
        self.cc_to_json_str_with(record, EncodeOptions::default())
    }

    pub fn cc_to_json_str_with(&self, record: &Record, options: EncodeOptions) -> Result<String> {
        let wire = WireValue::Object(self.cc_to_dict(record)?);
        self.codec.encode(&wire, &options)
    }

    pub fn cc_list_to_json_str(&self, records: &[Record]) -> Result<String> {
        let wire = WireValue::Array(self.cc_list_to_wire(records)?);
        self.codec.encode(&wire, &EncodeOptions::default())
    }

    pub fn cc_from_dict(
        &self,
        registry: &TypeRegistry,
        wire: WireMap,
        type_name: &str,
    ) -> Result<Record> {
        let target = registry.get(type_name)?;
        Deserializer::new(registry, &self.deserialization).deserialize(wire, &target)
    }

    /// Deserialize an optional wire value. Missing input is an error when
    /// `raise_on_empty` is set, otherwise `Ok(None)`.
    pub fn cc_from_value(
        &self,
        registry: &TypeRegistry,
        wire: Option<WireValue>,
        type_name: &str,
        raise_on_empty: bool,
    ) -> Result<Option<Record>> {
        match wire {
            None | Some(WireValue::Null) if raise_on_empty => Err(SeriumError::invalid_parameter(
                format!("no data given for record type {type_name}"),
            )),
            None | Some(WireValue::Null) => Ok(None),
            Some(WireValue::Object(map)) => self.cc_from_dict(registry, map, type_name).map(Some),
            Some(other) => Err(SeriumError::invalid_parameter(format!(
                "expected a mapping for record type {type_name}, got {other}"
            ))),
        }
    }

    pub fn cc_from_json_str(
        &self,
        registry: &TypeRegistry,
        text: &str,
        type_name: &str,
    ) -> Result<Record> {
        let wire = self.codec.decode(text)?;
        self.cc_from_value(registry, Some(wire), type_name, true)?
            .ok_or_else(|| {
                SeriumError::invalid_parameter(format!("no data given for record type {type_name}"))
            })
    }

    /// Deserialize a JSON array of records of one type.
    pub fn cc_list_from_json_str(
        &self,
        registry: &TypeRegistry,
        text: &str,
        type_name: &str,
    ) -> Result<Vec<Record>> {
        match self.codec.decode(text)? {
            WireValue::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    WireValue::Object(map) => self.cc_from_dict(registry, map, type_name),
                    other => Err(SeriumError::invalid_parameter(format!(
                        "expected a mapping for record type {type_name}, got {other}"
                    ))),
                })
                .collect(),
            other => Err(SeriumError::invalid_parameter(format!(
                "expected a list of {type_name}, got {other}"
            ))),
        }
    }

    /// Fail unless `record` is declared as `type_name`.
    pub fn cc_check(&self, record: &Record, type_name: &str) -> Result<()> {
        if record.type_name() == type_name {
            Ok(())
        } else {
            Err(SeriumError::TypeCheck {
                expected: type_name.to_string(),
                actual: record.to_string(),
            })
        }
    }
}

static DEFAULT_ENV: OnceLock<SeriumEnv> = OnceLock::new();

/// The process-wide environment with default settings.
pub fn default_env() -> &'static SeriumEnv {
    DEFAULT_ENV.get_or_init(SeriumEnv::default)
}

pub fn cc_to_dict(record: &Record) -> Result<WireMap> {
    default_env().cc_to_dict(record)
}

pub fn values_to_wire(values: &IndexMap<String, Value>) -> Result<WireMap> {
    default_env().values_to_wire(values)
}

pub fn cc_to_json_str(record: &Record) -> Result<String> {
    default_env().cc_to_json_str(record)
}

pub fn cc_from_dict(registry: &TypeRegistry, wire: WireMap, type_name: &str) -> Result<Record> {
    default_env().cc_from_dict(registry, wire, type_name)
}

pub fn cc_from_json_str(registry: &TypeRegistry, text: &str, type_name: &str) -> Result<Record> {
    default_env().cc_from_json_str(registry, text, type_name)
}

pub fn cc_check(record: &Record, type_name: &str) -> Result<()> {
    default_env().cc_check(record, type_name)
}

//! Wire mappings and their text encoding.

use serde::{Deserialize, Serialize};
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use std::fmt;
use std::io;

use crate::error::{Result, SeriumError};

/// A wire-level value. Maps keep insertion order.
pub type WireValue = serde_json::Value;

/// A serialized record: field name to wire value, `_ccvt` last.
pub type WireMap = serde_json::Map<String, WireValue>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonStyle {
    /// `,` and `:` with no whitespace
    Compact,
    /// `,` and `: `
    #[default]
    Standard,
    /// Two-space indentation, keys sorted.
    Pretty,
}

/// Per-call overrides of a codec's settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    pub style: Option<JsonStyle>,
    pub sort_keys: Option<bool>,
}

impl EncodeOptions {
    pub fn style(style: JsonStyle) -> Self {
        Self {
            style: Some(style),
            sort_keys: None,
        }
    }

    pub fn sorted(mut self, sort_keys: bool) -> Self {
        self.sort_keys = Some(sort_keys);
        self
    }
}

/// Converts wire values to text and back.
pub trait WireCodec: Send + Sync + fmt::Debug {
    fn encode(&self, value: &WireValue, options: &EncodeOptions) -> Result<String>;
    fn decode(&self, text: &str) -> Result<WireValue>;
}

/// Deepest array/object nesting `JsonCodec` decodes. A record nests two
/// levels per self-referencing list, so this leaves room for
/// [`DEFAULT_MAX_DEPTH`](crate::context::DEFAULT_MAX_DEPTH) records.
pub const DEFAULT_MAX_NESTING: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonCodec {
    style: JsonStyle,
    sort_keys: bool,
    max_nesting: usize,
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new(JsonStyle::default())
    }
}

impl JsonCodec {
    pub fn new(style: JsonStyle) -> Self {
        Self {
            style,
            sort_keys: style == JsonStyle::Pretty,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }

    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }

    pub fn style(&self) -> JsonStyle {
        self.style
    }
}

impl WireCodec for JsonCodec {
    fn encode(&self, value: &WireValue, options: &EncodeOptions) -> Result<String> {
        let style = options.style.unwrap_or(self.style);
        let sort_keys = options
            .sort_keys
            .unwrap_or(self.sort_keys || style == JsonStyle::Pretty);

        let sorted;
        let value = if sort_keys {
            sorted = sort_keys_recursive(value);
            &sorted
        } else {
            value
        };

        let mut buf = Vec::new();
        match style {
            JsonStyle::Compact => write_with(&mut buf, value, CompactFormatter)?,
            JsonStyle::Standard => write_with(&mut buf, value, StandardFormatter)?,
            JsonStyle::Pretty => {
                write_with(&mut buf, value, PrettyFormatter::with_indent(b"  "))?
            }
        }
        String::from_utf8(buf).map_err(|e| SeriumError::UnexpectedType(e.to_string()))
    }

    fn decode(&self, text: &str) -> Result<WireValue> {
        if nesting_depth(text) > self.max_nesting {
            return Err(SeriumError::DepthLimit {
                limit: self.max_nesting,
            });
        }

        // depth is bounded above, so serde_json's fixed limit of 128 is lifted
        let mut de = serde_json::Deserializer::from_str(text);
        de.disable_recursion_limit();
        let value = WireValue::deserialize(&mut de)?;
        de.end()?;
        Ok(value)
    }
}

/// Deepest bracket nesting in `text`, ignoring brackets inside strings.
fn nesting_depth(text: &str) -> usize {
    let (mut depth, mut deepest) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);
    for b in text.bytes() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

fn write_with<F: Formatter>(buf: &mut Vec<u8>, value: &WireValue, formatter: F) -> Result<()> {
    let mut ser = serde_json::Serializer::with_formatter(buf, formatter);
    value.serialize(&mut ser)?;
    Ok(())
}

fn sort_keys_recursive(value: &WireValue) -> WireValue {
    match value {
        WireValue::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            WireValue::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_keys_recursive(v)))
                    .collect(),
            )
        }
        WireValue::Array(items) => {
            WireValue::Array(items.iter().map(sort_keys_recursive).collect())
        }
        other => other.clone(),
    }
}

/// Single-line output with a space after each `:`.
struct StandardFormatter;

impl Formatter for StandardFormatter {
    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

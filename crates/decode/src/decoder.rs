//! Content-type decoders.

use hydrate_core::value::json_type_name;
use hydrate_core::{sub_path, DataTree};
use serde_json::Value;

/// Errors raised while decoding a payload.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unsupported content type: '{content_type}'")]
    UnsupportedContentType { content_type: String },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// The payload decoded fine but is not a key/value object at the top.
    #[error("'{content_type}' payload must be an object, got {actual}")]
    NotAnObject {
        content_type: String,
        actual: &'static str,
    },

    /// JSON has no representation for NaN or infinity.
    #[error("non-finite number '{value}' at path '{path}'")]
    NonFiniteNumber { path: String, value: String },
}

/// Decodes one content type into a data tree.
pub trait TypeDecoder {
    fn content_type(&self) -> &str;

    fn decode(&self, data: &str) -> Result<DataTree, DecodeError>;
}

/// `application/json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTypeDecoder;

impl TypeDecoder for JsonTypeDecoder {
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn decode(&self, data: &str) -> Result<DataTree, DecodeError> {
        match serde_json::from_str::<Value>(data)? {
            Value::Object(tree) => Ok(tree),
            other => Err(DecodeError::NotAnObject {
                content_type: self.content_type().to_string(),
                actual: json_type_name(&other),
            }),
        }
    }
}

/// `application/toml`. Datetimes are kept as their TOML text form.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlTypeDecoder;

impl TypeDecoder for TomlTypeDecoder {
    fn content_type(&self) -> &str {
        "application/toml"
    }

    fn decode(&self, data: &str) -> Result<DataTree, DecodeError> {
        let table: toml::Table = toml::from_str(data)?;
        table_to_tree(table, "")
    }
}

fn table_to_tree(table: toml::Table, path: &str) -> Result<DataTree, DecodeError> {
    table
        .into_iter()
        .map(|(key, value)| {
            let value = toml_to_json(value, &sub_path(path, &key))?;
            Ok((key, value))
        })
        .collect()
}

fn toml_to_json(value: toml::Value, path: &str) -> Result<Value, DecodeError> {
    Ok(match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => match serde_json::Number::from_f64(f) {
            Some(n) => Value::Number(n),
            None => {
                return Err(DecodeError::NonFiniteNumber {
                    path: path.to_string(),
                    value: f.to_string(),
                })
            }
        },
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| toml_to_json(item, &sub_path(path, &i.to_string())))
                .collect::<Result<_, _>>()?,
        ),
        toml::Value::Table(table) => Value::Object(table_to_tree(table, path)?),
    })
}

/// Strip parameters such as `; charset=utf-8` and normalise case.
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Type decoders indexed by content type.
///
/// [`Decoder::default`] knows JSON and TOML.
pub struct Decoder {
    decoders: Vec<Box<dyn TypeDecoder>>,
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::empty()
            .with(JsonTypeDecoder)
            .with(TomlTypeDecoder)
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A decoder with no content types registered.
    pub fn empty() -> Self {
        Decoder {
            decoders: Vec::new(),
        }
    }

    /// Register `decoder`, replacing any earlier one for the same content type.
    pub fn register(&mut self, decoder: impl TypeDecoder + 'static) -> &mut Self {
        let content_type = media_type(decoder.content_type());
        self.decoders
            .retain(|existing| media_type(existing.content_type()) != content_type);
        self.decoders.push(Box::new(decoder));
        self
    }

    pub fn with(mut self, decoder: impl TypeDecoder + 'static) -> Self {
        self.register(decoder);
        self
    }

    pub fn content_types(&self) -> Vec<&str> {
        self.decoders.iter().map(|d| d.content_type()).collect()
    }

    pub fn supports(&self, content_type: &str) -> bool {
        self.find(content_type).is_some()
    }

    fn find(&self, content_type: &str) -> Option<&dyn TypeDecoder> {
        let wanted = media_type(content_type);
        self.decoders
            .iter()
            .find(|d| media_type(d.content_type()) == wanted)
            .map(|d| d.as_ref())
    }

    /// Decode `data` with the decoder registered for `content_type`.
    pub fn decode(&self, data: &str, content_type: &str) -> Result<DataTree, DecodeError> {
        let decoder = self.find(content_type).ok_or_else(|| {
            tracing::warn!(content_type, "decode: unsupported content type");
            DecodeError::UnsupportedContentType {
                content_type: content_type.to_string(),
            }
        })?;
        tracing::debug!(content_type = decoder.content_type(), "decode: {} bytes", data.len());
        decoder.decode(data)
    }
}

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::accessor::Accessor;
use crate::context::Context;
use crate::denormalizer::Denormalize;
use crate::error::DenormError;
use crate::object::ObjectRef;
use crate::value::{json_type_name, FieldValue};

use super::{FieldConverter, ScalarFieldConverter};

/// Accepted textual representation of a temporal field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalFormat {
    /// RFC 3339 date-time with offset, stored as [`FieldValue::DateTime`].
    DateTime,
    /// `YYYY-MM-DD`, stored as [`FieldValue::Date`].
    Date,
}

impl TemporalFormat {
    pub fn description(self) -> &'static str {
        match self {
            TemporalFormat::DateTime => "an RFC 3339 date-time (e.g. 2024-01-31T12:00:00Z)",
            TemporalFormat::Date => "a date formatted as YYYY-MM-DD",
        }
    }

    fn parse(self, s: &str) -> Option<FieldValue> {
        match self {
            TemporalFormat::DateTime => OffsetDateTime::parse(s, &Rfc3339)
                .ok()
                .map(FieldValue::DateTime),
            TemporalFormat::Date => Date::parse(s, format_description!("[year]-[month]-[day]"))
                .ok()
                .map(FieldValue::Date),
        }
    }
}

/// Parses a string into a date or date-time and stores it through the
/// wrapped scalar converter.
///
/// The wrapped converter is only the write target: the parsed value goes
/// through its accessor as is, and its [`Coercion`](super::Coercion) is
/// never applied. Null and blank strings are stored as null.
pub struct TemporalFieldConverter {
    inner: ScalarFieldConverter,
    format: TemporalFormat,
}

impl TemporalFieldConverter {
    pub fn new(inner: ScalarFieldConverter, format: TemporalFormat) -> Self {
        TemporalFieldConverter { inner, format }
    }

    pub fn format(&self) -> TemporalFormat {
        self.format
    }
}

impl FieldConverter for TemporalFieldConverter {
    fn convert_field(
        &self,
        path: &str,
        object: &ObjectRef,
        value: serde_json::Value,
        _context: &Context,
        _denormalizer: Option<&dyn Denormalize>,
    ) -> Result<(), DenormError> {
        let parsed = match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::String(s) if s.trim().is_empty() => FieldValue::Null,
            serde_json::Value::String(s) => match self.format.parse(s.trim()) {
                Some(parsed) => parsed,
                None => {
                    return Err(DenormError::InvalidTemporal {
                        path: path.to_string(),
                        value: s,
                        expected: self.format.description(),
                    }
                    .logged())
                }
            },
            other => {
                return Err(
                    DenormError::invalid_data_type(path, json_type_name(&other), "string").logged(),
                )
            }
        };
        self.inner.assign(path, object, parsed)
    }

    fn accessor(&self) -> Option<&dyn Accessor> {
        self.inner.accessor()
    }
}

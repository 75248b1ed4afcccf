use crate::accessor::Accessor;
use crate::context::Context;
use crate::denormalizer::Denormalize;
use crate::error::DenormError;
use crate::object::ObjectRef;
use crate::value::FieldValue;

use super::{access_error, FieldConverter};

/// Optional type coercion applied by [`ScalarFieldConverter`].
///
/// Values that cannot be coerced are passed through unchanged, leaving it to
/// the target field to accept or reject them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// `"true"` / `"false"` strings to booleans.
    Bool,
    /// Integral strings and whole floats to integers.
    Int,
    /// Numeric strings and integers to floats.
    Float,
    /// Booleans and numbers to strings.
    Text,
}

impl Coercion {
    fn apply(self, value: serde_json::Value) -> FieldValue {
        use serde_json::Value;

        match (self, value) {
            (Coercion::Bool, Value::String(s)) if s == "true" => FieldValue::Bool(true),
            (Coercion::Bool, Value::String(s)) if s == "false" => FieldValue::Bool(false),
            (Coercion::Int, Value::String(s)) => match s.trim().parse::<i64>() {
                Ok(i) => FieldValue::Int(i),
                Err(_) => FieldValue::Text(s),
            },
            (Coercion::Int, Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => FieldValue::Int(i),
                (None, Some(f))
                    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 =>
                {
                    FieldValue::Int(f as i64)
                }
                _ => FieldValue::from_json(Value::Number(n)),
            },
            (Coercion::Float, Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => FieldValue::Float(f),
                _ => FieldValue::Text(s),
            },
            (Coercion::Float, Value::Number(n)) => match n.as_f64() {
                Some(f) => FieldValue::Float(f),
                None => FieldValue::from_json(Value::Number(n)),
            },
            (Coercion::Text, Value::Bool(b)) => FieldValue::Text(b.to_string()),
            (Coercion::Text, Value::Number(n)) => FieldValue::Text(n.to_string()),
            (_, other) => FieldValue::from_json(other),
        }
    }
}

/// Stores the raw value as is, or after a [`Coercion`].
pub struct ScalarFieldConverter {
    accessor: Box<dyn Accessor>,
    coercion: Option<Coercion>,
}

impl ScalarFieldConverter {
    pub fn new(accessor: impl Accessor + 'static) -> Self {
        ScalarFieldConverter {
            accessor: Box::new(accessor),
            coercion: None,
        }
    }

    pub fn with_coercion(mut self, coercion: Coercion) -> Self {
        self.coercion = Some(coercion);
        self
    }

    /// Write an already converted value.
    pub fn assign(&self, path: &str, object: &ObjectRef, value: FieldValue) -> Result<(), DenormError> {
        self.accessor
            .set_value(object, value)
            .map_err(access_error(path))
    }
}

impl FieldConverter for ScalarFieldConverter {
    fn convert_field(
        &self,
        path: &str,
        object: &ObjectRef,
        value: serde_json::Value,
        _context: &Context,
        _denormalizer: Option<&dyn Denormalize>,
    ) -> Result<(), DenormError> {
        let value = match self.coercion {
            Some(coercion) => coercion.apply(value),
            None => FieldValue::from_json(value),
        };
        self.assign(path, object, value)
    }

    fn accessor(&self) -> Option<&dyn Accessor> {
        Some(self.accessor.as_ref())
    }
}

//! Value types flowing through the engine.
//!
//! Input arrives as a [`DataTree`] (a decoded JSON-like object). Converted
//! values are written onto target objects as [`FieldValue`]s, which can also
//! carry object references and shared collections.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use time::{Date, OffsetDateTime};

use crate::object::{FieldError, ObjectRef};

/// An ordered mapping from keys to raw values; the unit of input.
///
/// Ownership moves into the denormalizer for the duration of a call, and
/// keys are removed as they are consumed.
pub type DataTree = serde_json::Map<String, serde_json::Value>;

/// A value stored in (or read from) a field of a target object.
#[derive(Clone, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(Date),
    DateTime(OffsetDateTime),
    /// Raw nested data passed through without interpretation.
    Data(serde_json::Value),
    Object(ObjectRef),
    Collection(Collection),
}

impl FieldValue {
    /// Map a raw input value onto the closest field value.
    ///
    /// Arrays, objects and integers beyond the `i64` range are kept as
    /// [`FieldValue::Data`].
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => FieldValue::Int(i),
                (None, Some(f)) if n.is_f64() => FieldValue::Float(f),
                _ => FieldValue::Data(serde_json::Value::Number(n)),
            },
            serde_json::Value::String(s) => FieldValue::Text(s),
            other => FieldValue::Data(other),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "text",
            FieldValue::Date(_) => "date",
            FieldValue::DateTime(_) => "datetime",
            FieldValue::Data(_) => "data",
            FieldValue::Object(_) => "object",
            FieldValue::Collection(_) => "collection",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    fn incompatible(&self, expected: &'static str) -> FieldError {
        FieldError::Incompatible {
            expected,
            actual: self.type_name(),
        }
    }

    // ── Conversions used by `Object::set_field` implementations ──────

    pub fn into_bool(self) -> Result<Option<bool>, FieldError> {
        match self {
            FieldValue::Null => Ok(None),
            FieldValue::Bool(b) => Ok(Some(b)),
            other => Err(other.incompatible("bool")),
        }
    }

    pub fn into_int(self) -> Result<Option<i64>, FieldError> {
        match self {
            FieldValue::Null => Ok(None),
            FieldValue::Int(i) => Ok(Some(i)),
            other => Err(other.incompatible("int")),
        }
    }

    /// Integers are widened to floats.
    pub fn into_float(self) -> Result<Option<f64>, FieldError> {
        match self {
            FieldValue::Null => Ok(None),
            FieldValue::Float(f) => Ok(Some(f)),
            FieldValue::Int(i) => Ok(Some(i as f64)),
            other => Err(other.incompatible("float")),
        }
    }

    pub fn into_text(self) -> Result<Option<String>, FieldError> {
        match self {
            FieldValue::Null => Ok(None),
            FieldValue::Text(s) => Ok(Some(s)),
            other => Err(other.incompatible("text")),
        }
    }

    pub fn into_date(self) -> Result<Option<Date>, FieldError> {
        match self {
            FieldValue::Null => Ok(None),
            FieldValue::Date(d) => Ok(Some(d)),
            other => Err(other.incompatible("date")),
        }
    }

    pub fn into_date_time(self) -> Result<Option<OffsetDateTime>, FieldError> {
        match self {
            FieldValue::Null => Ok(None),
            FieldValue::DateTime(dt) => Ok(Some(dt)),
            other => Err(other.incompatible("datetime")),
        }
    }

    pub fn into_object(self) -> Result<Option<ObjectRef>, FieldError> {
        match self {
            FieldValue::Null => Ok(None),
            FieldValue::Object(o) => Ok(Some(o)),
            other => Err(other.incompatible("object")),
        }
    }

    /// Collections are never null; a null value is rejected.
    pub fn into_collection(self) -> Result<Collection, FieldError> {
        match self {
            FieldValue::Collection(c) => Ok(c),
            other => Err(other.incompatible("collection")),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => true,
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::Int(a), FieldValue::Int(b)) => a == b,
            (FieldValue::Float(a), FieldValue::Float(b)) => a == b,
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::Date(a), FieldValue::Date(b)) => a == b,
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => a == b,
            (FieldValue::Data(a), FieldValue::Data(b)) => a == b,
            (FieldValue::Object(a), FieldValue::Object(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            (FieldValue::Collection(a), FieldValue::Collection(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "Null"),
            FieldValue::Bool(b) => write!(f, "Bool({})", b),
            FieldValue::Int(i) => write!(f, "Int({})", i),
            FieldValue::Float(x) => write!(f, "Float({})", x),
            FieldValue::Text(s) => write!(f, "Text({:?})", s),
            FieldValue::Date(d) => write!(f, "Date({})", d),
            FieldValue::DateTime(dt) => write!(f, "DateTime({})", dt),
            FieldValue::Data(v) => write!(f, "Data({})", v),
            FieldValue::Object(o) => match o.try_borrow() {
                Ok(object) => write!(f, "Object({})", object.class()),
                Err(_) => write!(f, "Object(<borrowed>)"),
            },
            FieldValue::Collection(c) => f.debug_tuple("Collection").field(c).finish(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<ObjectRef> for FieldValue {
    fn from(o: ObjectRef) -> Self {
        FieldValue::Object(o)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

// ──────────────────────────────────────────────
// Collection
// ──────────────────────────────────────────────

/// A shared, mutable list of field values.
///
/// Cloning a `Collection` clones the handle, not the items, so clearing or
/// refilling through any clone is visible through every other one.
#[derive(Clone, Default)]
pub struct Collection(Rc<RefCell<Vec<FieldValue>>>);

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<FieldValue>) -> Self {
        Collection(Rc::new(RefCell::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<FieldValue> {
        self.0.borrow().get(index).cloned()
    }

    /// Snapshot of the current items.
    pub fn items(&self) -> Vec<FieldValue> {
        self.0.borrow().clone()
    }

    pub fn push(&self, value: FieldValue) {
        self.0.borrow_mut().push(value);
    }

    /// Remove every item, keeping this collection's identity.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Swap in a new item list, keeping this collection's identity.
    pub fn replace(&self, items: Vec<FieldValue>) {
        *self.0.borrow_mut() = items;
    }

    /// Whether both handles point at the same underlying list.
    pub fn ptr_eq(&self, other: &Collection) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(items) => f.debug_list().entries(items.iter()).finish(),
            Err(_) => write!(f, "[<borrowed>]"),
        }
    }
}

/// Return a descriptive type name for a raw value (for error messages).
pub fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

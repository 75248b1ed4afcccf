//! Field accessors: read and write one named field on any target object.
//!
//! Three storage strategies are provided, picked when a field mapping is
//! declared:
//!
//! - [`PropertyAccessor`] goes through [`Object::field`] / [`Object::set_field`]
//! - [`MethodAccessor`] calls a typed getter/setter pair on a concrete type
//! - [`MapEntryAccessor`] reads and writes an entry of a [`Record`]
//!
//! Every accessor loads lazy surrogates before touching them.

use std::any::type_name;
use std::marker::PhantomData;

use crate::error::ErrorKind;
use crate::object::{materialize, FieldError, Object, ObjectRef, Record};
use crate::value::FieldValue;

/// Errors raised by an [`Accessor`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("there is no property '{property}' on class '{class}'")]
    MissingProperty { class: String, property: String },

    #[error("accessor for '{property}' needs an object of type '{expected}', got class '{actual}'")]
    WrongClass {
        property: String,
        expected: String,
        actual: String,
    },

    #[error("property '{property}' on class '{class}' needs a value of type '{expected}', got '{actual}'")]
    IncompatibleValue {
        class: String,
        property: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl AccessError {
    /// A value the field cannot hold is bad input; anything else is a
    /// mapping mistake.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::MissingProperty { .. } | AccessError::WrongClass { .. } => {
                ErrorKind::Configuration
            }
            AccessError::IncompatibleValue { .. } => ErrorKind::Data,
        }
    }

    fn from_field_error(class: &str, property: &str, err: FieldError) -> Self {
        match err {
            FieldError::Missing => AccessError::MissingProperty {
                class: class.to_string(),
                property: property.to_string(),
            },
            FieldError::Incompatible { expected, actual } => AccessError::IncompatibleValue {
                class: class.to_string(),
                property: property.to_string(),
                expected,
                actual,
            },
        }
    }
}

/// Reads and writes one field, bound at construction.
pub trait Accessor {
    fn get_value(&self, object: &ObjectRef) -> Result<FieldValue, AccessError>;

    fn set_value(&self, object: &ObjectRef, value: FieldValue) -> Result<(), AccessError>;
}

// ──────────────────────────────────────────────
// PropertyAccessor
// ──────────────────────────────────────────────

/// Direct field access through the [`Object`] trait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyAccessor {
    property: String,
}

impl PropertyAccessor {
    pub fn new(property: impl Into<String>) -> Self {
        PropertyAccessor {
            property: property.into(),
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }
}

impl Accessor for PropertyAccessor {
    fn get_value(&self, object: &ObjectRef) -> Result<FieldValue, AccessError> {
        materialize(object);
        let borrowed = object.borrow();
        borrowed
            .field(&self.property)
            .ok_or_else(|| AccessError::MissingProperty {
                class: borrowed.class().to_string(),
                property: self.property.clone(),
            })
    }

    fn set_value(&self, object: &ObjectRef, value: FieldValue) -> Result<(), AccessError> {
        materialize(object);
        let mut borrowed = object.borrow_mut();
        borrowed
            .set_field(&self.property, value)
            .map_err(|err| AccessError::from_field_error(borrowed.class(), &self.property, err))
    }
}

// ──────────────────────────────────────────────
// MethodAccessor
// ──────────────────────────────────────────────

pub type Getter<T> = fn(&T) -> FieldValue;
pub type Setter<T> = fn(&mut T, FieldValue) -> Result<(), FieldError>;

/// A getter/setter pair on a concrete object type.
///
/// The object must be a `T` once loaded; surrogate types that wrap a `T`
/// need a [`PropertyAccessor`] instead.
pub struct MethodAccessor<T> {
    property: String,
    getter: Getter<T>,
    setter: Setter<T>,
    _marker: PhantomData<fn(&mut T)>,
}

impl<T: Object> MethodAccessor<T> {
    pub fn new(property: impl Into<String>, getter: Getter<T>, setter: Setter<T>) -> Self {
        MethodAccessor {
            property: property.into(),
            getter,
            setter,
            _marker: PhantomData,
        }
    }

    fn wrong_class(&self, actual: &str) -> AccessError {
        AccessError::WrongClass {
            property: self.property.clone(),
            expected: type_name::<T>().to_string(),
            actual: actual.to_string(),
        }
    }
}

impl<T: Object> Accessor for MethodAccessor<T> {
    fn get_value(&self, object: &ObjectRef) -> Result<FieldValue, AccessError> {
        materialize(object);
        let borrowed = object.borrow();
        match borrowed.as_any().downcast_ref::<T>() {
            Some(typed) => Ok((self.getter)(typed)),
            None => Err(self.wrong_class(borrowed.class())),
        }
    }

    fn set_value(&self, object: &ObjectRef, value: FieldValue) -> Result<(), AccessError> {
        materialize(object);
        let mut borrowed = object.borrow_mut();
        let result = match borrowed.as_any_mut().downcast_mut::<T>() {
            Some(typed) => (self.setter)(typed, value),
            None => return Err(self.wrong_class(borrowed.class())),
        };
        result.map_err(|err| AccessError::from_field_error(borrowed.class(), &self.property, err))
    }
}

// ──────────────────────────────────────────────
// MapEntryAccessor
// ──────────────────────────────────────────────

/// An entry of a [`Record`]. Absent entries read as null; writes insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntryAccessor {
    key: String,
}

impl MapEntryAccessor {
    pub fn new(key: impl Into<String>) -> Self {
        MapEntryAccessor { key: key.into() }
    }

    fn wrong_class(&self, actual: &str) -> AccessError {
        AccessError::WrongClass {
            property: self.key.clone(),
            expected: type_name::<Record>().to_string(),
            actual: actual.to_string(),
        }
    }
}

impl Accessor for MapEntryAccessor {
    fn get_value(&self, object: &ObjectRef) -> Result<FieldValue, AccessError> {
        materialize(object);
        let borrowed = object.borrow();
        match borrowed.as_any().downcast_ref::<Record>() {
            Some(record) => Ok(record.get(&self.key).cloned().unwrap_or_default()),
            None => Err(self.wrong_class(borrowed.class())),
        }
    }

    fn set_value(&self, object: &ObjectRef, value: FieldValue) -> Result<(), AccessError> {
        materialize(object);
        let mut borrowed = object.borrow_mut();
        if let Some(record) = borrowed.as_any_mut().downcast_mut::<Record>() {
            record.insert(self.key.clone(), value);
            return Ok(());
        }
        Err(self.wrong_class(borrowed.class()))
    }
}

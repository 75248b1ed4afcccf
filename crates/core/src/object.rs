//! Target objects and the capabilities the engine needs from them.
//!
//! There is no runtime reflection: a type takes part in denormalization by
//! implementing [`Object`], which exposes its class name and named field
//! access. Lazy-loading surrogates additionally expose [`LazyLoad`] through
//! [`Object::lazy`].

use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::value::FieldValue;

/// A shared handle to a target object. Identity is pointer identity.
pub type ObjectRef = Rc<RefCell<dyn Object>>;

/// Wrap a value into a fresh [`ObjectRef`].
pub fn object_ref<T: Object>(object: T) -> ObjectRef {
    Rc::new(RefCell::new(object))
}

/// Why an [`Object`] refused a field read or write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The class has no field with that name.
    Missing,
    /// The field exists but cannot hold a value of this type.
    Incompatible {
        expected: &'static str,
        actual: &'static str,
    },
}

/// A surrogate that must be loaded before its fields can be used.
pub trait LazyLoad {
    fn is_initialized(&self) -> bool;
    fn initialize(&mut self);
}

/// A denormalization target.
pub trait Object: Any {
    /// The resolved class name used to look up the object mapping.
    ///
    /// Surrogates report the class of the object they stand in for.
    fn class(&self) -> &str;

    /// Read a field. `None` means the class has no such field.
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Write a field.
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The lazy-loading capability, if this object is a surrogate.
    fn lazy(&mut self) -> Option<&mut dyn LazyLoad> {
        None
    }
}

/// Load `object` if it is a surrogate that has not been loaded yet.
pub fn materialize(object: &ObjectRef) {
    let mut borrowed = object.borrow_mut();
    if let Some(lazy) = borrowed.lazy() {
        if !lazy.is_initialized() {
            tracing::debug!("deserialize: initializing lazy object");
            lazy.initialize();
        }
    }
}

/// Borrow `object` as a concrete type, if it is one.
pub fn with_object<T: Object, R>(object: &ObjectRef, f: impl FnOnce(&T) -> R) -> Option<R> {
    let borrowed = object.borrow();
    borrowed.as_any().downcast_ref::<T>().map(f)
}

/// The class name of `object`.
pub fn class_of(object: &ObjectRef) -> String {
    object.borrow().class().to_string()
}

/// What to denormalize into: a class to instantiate, or an existing object
/// to update in place.
#[derive(Clone)]
pub enum Target {
    Class(String),
    Object(ObjectRef),
}

impl From<&str> for Target {
    fn from(class: &str) -> Self {
        Target::Class(class.to_string())
    }
}

impl From<String> for Target {
    fn from(class: String) -> Self {
        Target::Class(class)
    }
}

impl From<ObjectRef> for Target {
    fn from(object: ObjectRef) -> Self {
        Target::Object(object)
    }
}

impl From<&ObjectRef> for Target {
    fn from(object: &ObjectRef) -> Self {
        Target::Object(object.clone())
    }
}

// ──────────────────────────────────────────────
// Record
// ──────────────────────────────────────────────

/// A map-backed object with a declared set of fields.
///
/// Declared fields behave like struct fields: they start out null and can
/// be read or written through a property accessor. Undeclared names are
/// rejected, except through a map entry accessor, which writes any key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    class: String,
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new<I, S>(class: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Record {
            class: class.into(),
            fields: fields
                .into_iter()
                .map(|name| (name.into(), FieldValue::Null))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Insert or overwrite an entry, declaring it if needed.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }
}

impl Object for Record {
    fn class(&self) -> &str {
        &self.class
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        self.fields.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        match self.fields.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(FieldError::Missing),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Proxy {
        loaded: bool,
        inner: Record,
    }

    impl LazyLoad for Proxy {
        fn is_initialized(&self) -> bool {
            self.loaded
        }

        fn initialize(&mut self) {
            self.loaded = true;
            self.inner.insert("name", FieldValue::from("loaded"));
        }
    }

    impl Object for Proxy {
        fn class(&self) -> &str {
            self.inner.class()
        }

        fn field(&self, name: &str) -> Option<FieldValue> {
            self.inner.field(name)
        }

        fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
            self.inner.set_field(name, value)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn lazy(&mut self) -> Option<&mut dyn LazyLoad> {
            Some(self)
        }
    }

    #[test]
    fn record_rejects_undeclared_field() {
        let mut record = Record::new("Order", ["id"]);
        assert_eq!(record.set_field("id", FieldValue::from("o1")), Ok(()));
        assert_eq!(
            record.set_field("extra", FieldValue::Null),
            Err(FieldError::Missing)
        );
        assert_eq!(record.field("id"), Some(FieldValue::from("o1")));
        assert_eq!(record.field("extra"), None);
    }

    #[test]
    fn materialize_loads_once() {
        let proxy = object_ref(Proxy {
            loaded: false,
            inner: Record::new("Customer", ["name"]),
        });
        materialize(&proxy);
        assert_eq!(
            proxy.borrow().field("name"),
            Some(FieldValue::from("loaded"))
        );

        proxy
            .borrow_mut()
            .set_field("name", FieldValue::from("changed"))
            .unwrap();
        materialize(&proxy);
        assert_eq!(
            proxy.borrow().field("name"),
            Some(FieldValue::from("changed"))
        );
    }

    #[test]
    fn materialize_ignores_plain_objects() {
        let record = object_ref(Record::new("Customer", ["name"]));
        materialize(&record);
        assert_eq!(record.borrow().field("name"), Some(FieldValue::Null));
    }

    #[test]
    fn with_object_downcasts() {
        let record = object_ref(Record::new("Customer", ["name"]));
        assert_eq!(
            with_object(&record, |r: &Record| r.class().to_string()),
            Some("Customer".to_string())
        );
        assert_eq!(class_of(&record), "Customer");
    }
}

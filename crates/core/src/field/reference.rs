use crate::accessor::Accessor;
use crate::context::Context;
use crate::denormalizer::Denormalize;
use crate::error::DenormError;
use crate::object::ObjectRef;
use crate::value::{json_type_name, FieldValue};

use super::{access_error, FieldConverter};

/// Looks up an already existing object by id.
pub type ReferenceResolver = Box<dyn Fn(&str) -> Option<ObjectRef>>;

/// Stores a reference to an existing object, given its id.
///
/// String and numeric ids are accepted. Unknown ids and null store null.
pub struct ReferenceOneFieldConverter {
    accessor: Box<dyn Accessor>,
    resolver: ReferenceResolver,
}

impl ReferenceOneFieldConverter {
    pub fn new(
        accessor: impl Accessor + 'static,
        resolver: impl Fn(&str) -> Option<ObjectRef> + 'static,
    ) -> Self {
        ReferenceOneFieldConverter {
            accessor: Box::new(accessor),
            resolver: Box::new(resolver),
        }
    }
}

impl FieldConverter for ReferenceOneFieldConverter {
    fn convert_field(
        &self,
        path: &str,
        object: &ObjectRef,
        value: serde_json::Value,
        _context: &Context,
        _denormalizer: Option<&dyn Denormalize>,
    ) -> Result<(), DenormError> {
        let id = match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            other => {
                return Err(
                    DenormError::invalid_data_type(path, json_type_name(&other), "string").logged(),
                )
            }
        };

        let referenced = match id {
            Some(id) => {
                let found = (self.resolver)(&id);
                if found.is_none() {
                    tracing::debug!(path, id = %id, "deserialize: unknown reference");
                }
                found.map(FieldValue::Object).unwrap_or_default()
            }
            None => FieldValue::Null,
        };

        self.accessor
            .set_value(object, referenced)
            .map_err(access_error(path))
    }

    fn accessor(&self) -> Option<&dyn Accessor> {
        Some(self.accessor.as_ref())
    }
}

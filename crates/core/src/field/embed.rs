use crate::accessor::{Accessor, PropertyAccessor};
use crate::context::Context;
use crate::denormalizer::{sub_path, Denormalize};
use crate::error::DenormError;
use crate::object::{materialize, ObjectRef, Target};
use crate::value::{json_type_name, Collection, FieldValue};

use super::{access_error, FieldConverter};

fn require_denormalizer<'a>(
    path: &str,
    denormalizer: Option<&'a dyn Denormalize>,
) -> Result<&'a dyn Denormalize, DenormError> {
    denormalizer.ok_or_else(|| DenormError::missing_denormalizer(path).logged())
}

/// Reuse an existing nested object as the target, loading it first.
fn existing_target(existing: ObjectRef) -> Target {
    materialize(&existing);
    Target::Object(existing)
}

// ──────────────────────────────────────────────
// EmbedOne
// ──────────────────────────────────────────────

/// Denormalizes a nested object into the field.
///
/// An object already held by the field is updated in place; otherwise a new
/// instance of `class` is created by its mapping.
pub struct EmbedOneFieldConverter {
    class: String,
    accessor: Box<dyn Accessor>,
}

impl EmbedOneFieldConverter {
    pub fn new(class: impl Into<String>, accessor: impl Accessor + 'static) -> Self {
        EmbedOneFieldConverter {
            class: class.into(),
            accessor: Box::new(accessor),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }
}

impl FieldConverter for EmbedOneFieldConverter {
    fn convert_field(
        &self,
        path: &str,
        object: &ObjectRef,
        value: serde_json::Value,
        context: &Context,
        denormalizer: Option<&dyn Denormalize>,
    ) -> Result<(), DenormError> {
        if value.is_null() {
            return self
                .accessor
                .set_value(object, FieldValue::Null)
                .map_err(access_error(path));
        }

        let denormalizer = require_denormalizer(path, denormalizer)?;

        let data = match value {
            serde_json::Value::Object(data) => data,
            other => {
                return Err(
                    DenormError::invalid_data_type(path, json_type_name(&other), "object").logged(),
                )
            }
        };

        let target = match self.accessor.get_value(object).map_err(access_error(path))? {
            FieldValue::Object(existing) => existing_target(existing),
            _ => Target::Class(self.class.clone()),
        };

        let embedded = denormalizer.denormalize_at(target, data, context, path)?;

        self.accessor
            .set_value(object, FieldValue::Object(embedded))
            .map_err(access_error(path))
    }

    fn accessor(&self) -> Option<&dyn Accessor> {
        Some(self.accessor.as_ref())
    }
}

// ──────────────────────────────────────────────
// EmbedMany
// ──────────────────────────────────────────────

/// Denormalizes an array of nested objects into a collection field.
///
/// Each element is matched against the current members, by position or by
/// an identifying key (see [`EmbedManyFieldConverter::match_by`]). Matched
/// members are updated in place, unmatched elements create new instances,
/// and members with no counterpart in the input are dropped. A collection
/// already held by the field is refilled rather than replaced.
pub struct EmbedManyFieldConverter {
    class: String,
    accessor: Box<dyn Accessor>,
    key: Option<PropertyAccessor>,
}

impl EmbedManyFieldConverter {
    pub fn new(class: impl Into<String>, accessor: impl Accessor + 'static) -> Self {
        EmbedManyFieldConverter {
            class: class.into(),
            accessor: Box::new(accessor),
            key: None,
        }
    }

    /// Match elements to members whose `key` field equals the element's
    /// `key` entry, instead of by position.
    pub fn match_by(mut self, key: impl Into<String>) -> Self {
        self.key = Some(PropertyAccessor::new(key));
        self
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    fn find_member(
        &self,
        members: &[FieldValue],
        index: usize,
        element: &serde_json::Map<String, serde_json::Value>,
    ) -> Option<ObjectRef> {
        let Some(key) = &self.key else {
            return match members.get(index) {
                Some(FieldValue::Object(member)) => Some(member.clone()),
                _ => None,
            };
        };

        let wanted = match element.get(key.property()) {
            None | Some(serde_json::Value::Null) => return None,
            Some(raw) => FieldValue::from_json(raw.clone()),
        };

        members.iter().find_map(|member| match member {
            FieldValue::Object(object) => match key.get_value(object) {
                Ok(current) if current == wanted => Some(object.clone()),
                _ => None,
            },
            _ => None,
        })
    }
}

impl FieldConverter for EmbedManyFieldConverter {
    fn convert_field(
        &self,
        path: &str,
        object: &ObjectRef,
        value: serde_json::Value,
        context: &Context,
        denormalizer: Option<&dyn Denormalize>,
    ) -> Result<(), DenormError> {
        let existing = match self.accessor.get_value(object).map_err(access_error(path))? {
            FieldValue::Collection(collection) => Some(collection),
            _ => None,
        };

        let elements = match value {
            serde_json::Value::Null => Vec::new(),
            serde_json::Value::Array(elements) => elements,
            other => {
                return Err(
                    DenormError::invalid_data_type(path, json_type_name(&other), "array").logged(),
                )
            }
        };

        let mut refreshed = Vec::with_capacity(elements.len());
        if !elements.is_empty() {
            let denormalizer = require_denormalizer(path, denormalizer)?;
            let members = existing.as_ref().map(Collection::items).unwrap_or_default();

            for (index, element) in elements.into_iter().enumerate() {
                let element_path = sub_path(path, &index.to_string());
                let data = match element {
                    serde_json::Value::Object(data) => data,
                    other => {
                        return Err(DenormError::invalid_data_type(
                            &element_path,
                            json_type_name(&other),
                            "object",
                        )
                        .logged())
                    }
                };

                let target = match self.find_member(&members, index, &data) {
                    Some(member) => existing_target(member),
                    None => Target::Class(self.class.clone()),
                };

                let item = denormalizer.denormalize_at(target, data, context, &element_path)?;
                refreshed.push(FieldValue::Object(item));
            }
        }

        let collection = existing.unwrap_or_default();
        collection.replace(refreshed);

        self.accessor
            .set_value(object, FieldValue::Collection(collection))
            .map_err(access_error(path))
    }

    fn accessor(&self) -> Option<&dyn Accessor> {
        Some(self.accessor.as_ref())
    }
}

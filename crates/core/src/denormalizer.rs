//! The denormalization engine.
//!
//! [`Denormalizer`] walks an object mapping and a data tree in lockstep:
//!
//! 1. resolve the mapping for the target's class
//! 2. take the `_type` discriminator out of the data
//! 3. create the target through the mapping's factory (class targets only)
//! 4. convert every mapped key present in the data, subject to the group
//!    policy, recursing for embedded objects
//! 5. reject leftover keys the context does not allow
//! 6. optionally reset mapped fields that were absent from the data

use serde_json::Value;

use crate::accessor::{Accessor, PropertyAccessor};
use crate::context::Context;
use crate::error::DenormError;
use crate::mapping::{FieldMapping, ObjectMapping, ObjectMappingResolver};
use crate::object::{class_of, ObjectRef, Target};
use crate::value::{json_type_name, DataTree, FieldValue};

/// Reserved input key selecting a mapping variant.
pub const DISCRIMINATOR_FIELD: &str = "_type";

/// Join a field name onto a dotted path. The root path adds no dot.
pub fn sub_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

/// Recursive entry point handed to field converters.
pub trait Denormalize {
    /// Populate `target` from `data` at `path`, returning the populated object.
    ///
    /// `data` is consumed. An object target is updated in place and returned.
    fn denormalize_at(
        &self,
        target: Target,
        data: DataTree,
        context: &Context,
        path: &str,
    ) -> Result<ObjectRef, DenormError>;
}

/// Builds and updates objects from data trees using resolved mappings.
pub struct Denormalizer<R> {
    resolver: R,
}

impl<R: ObjectMappingResolver> Denormalizer<R> {
    pub fn new(resolver: R) -> Self {
        Denormalizer { resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Denormalize at the root path. Without a context, the unrestricted
    /// default applies.
    pub fn denormalize(
        &self,
        target: impl Into<Target>,
        data: DataTree,
        context: Option<&Context>,
    ) -> Result<ObjectRef, DenormError> {
        let default_context;
        let context = match context {
            Some(context) => context,
            None => {
                default_context = Context::default();
                &default_context
            }
        };
        self.denormalize_at(target.into(), data, context, "")
    }

    fn object_mapping(&self, class: &str, path: &str) -> Result<&dyn ObjectMapping, DenormError> {
        self.resolver
            .object_mapping(class)
            .map_err(|err| err.at_path(path).logged())
    }

    /// Remove the discriminator unconditionally; only a string selects a variant.
    fn take_discriminator(data: &mut DataTree, path: &str) -> Result<Option<String>, DenormError> {
        match data.shift_remove(DISCRIMINATOR_FIELD) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(discriminator)) => Ok(Some(discriminator)),
            Some(other) => Err(DenormError::invalid_data_type(
                &sub_path(path, DISCRIMINATOR_FIELD),
                json_type_name(&other),
                "string",
            )
            .logged()),
        }
    }

    fn create_new_object(
        mapping: &dyn ObjectMapping,
        class: &str,
        path: &str,
        discriminator: Option<&str>,
    ) -> Result<ObjectRef, DenormError> {
        let factory = mapping.factory(path, discriminator);
        factory().ok_or_else(|| {
            DenormError::FactoryDidNotReturnObject {
                class: class.to_string(),
                path: path.to_string(),
                discriminator: discriminator.map(str::to_string),
            }
            .logged()
        })
    }

    fn denormalize_field(
        &self,
        field: &FieldMapping,
        object: &ObjectRef,
        value: Value,
        context: &Context,
        path: &str,
    ) -> Result<(), DenormError> {
        if !field.is_compliant(context, object) {
            return Ok(());
        }

        let field_path = sub_path(path, field.name());
        tracing::info!(path = %field_path, "deserialize: path {}", field_path);

        field
            .converter()
            .convert_field(&field_path, object, value, context, Some(self as &dyn Denormalize))
    }

    fn check_additional_fields(
        data: &DataTree,
        context: &Context,
        path: &str,
    ) -> Result<(), DenormError> {
        let Some(allowed) = context.allowed_additional_fields() else {
            return Ok(());
        };

        let paths: Vec<String> = data
            .keys()
            .filter(|key| !allowed.contains(key.as_str()))
            .map(|key| sub_path(path, key))
            .collect();

        if paths.is_empty() {
            return Ok(());
        }
        Err(DenormError::NotAllowedAdditionalFields { paths }.logged())
    }

    fn reset_missing_fields(
        object: &ObjectRef,
        missing: &[&FieldMapping],
        path: &str,
    ) -> Result<(), DenormError> {
        for field in missing {
            let field_path = sub_path(path, field.name());
            let fallback;
            let accessor: &dyn Accessor = match field.converter().accessor() {
                Some(accessor) => accessor,
                None => {
                    fallback = PropertyAccessor::new(field.name());
                    &fallback
                }
            };

            let current = accessor
                .get_value(object)
                .map_err(|err| DenormError::access(&field_path, err).logged())?;
            let reset = match current {
                FieldValue::Collection(collection) => {
                    collection.clear();
                    FieldValue::Collection(collection)
                }
                FieldValue::Data(Value::Array(_)) => FieldValue::Data(Value::Array(Vec::new())),
                _ => FieldValue::Null,
            };
            tracing::debug!(path = %field_path, "deserialize: reset missing field");

            accessor
                .set_value(object, reset)
                .map_err(|err| DenormError::access(&field_path, err).logged())?;
        }
        Ok(())
    }
}

impl<R: ObjectMappingResolver> Denormalize for Denormalizer<R> {
    fn denormalize_at(
        &self,
        target: Target,
        mut data: DataTree,
        context: &Context,
        path: &str,
    ) -> Result<ObjectRef, DenormError> {
        let class = match &target {
            Target::Class(class) => class.clone(),
            Target::Object(object) => class_of(object),
        };
        let mapping = self.object_mapping(&class, path)?;

        let discriminator = Self::take_discriminator(&mut data, path)?;

        let object = match target {
            Target::Object(object) => object,
            Target::Class(_) => {
                Self::create_new_object(mapping, &class, path, discriminator.as_deref())?
            }
        };

        let mut missing = Vec::new();
        for field in mapping.field_mappings(path, discriminator.as_deref()) {
            match data.shift_remove(field.name()) {
                Some(value) => self.denormalize_field(field, &object, value, context, path)?,
                None => missing.push(field),
            }
        }

        Self::check_additional_fields(&data, context, path)?;

        if context.reset_missing_fields() {
            Self::reset_missing_fields(&object, &missing, path)?;
        }

        Ok(object)
    }
}

//! hydrate-core: populates typed object graphs from decoded data trees.
//!
//! A [`Denormalizer`] takes a target (a class name or an existing object), a
//! [`DataTree`] and a [`Context`], and fills the target field by field as
//! described by its [`ObjectMapping`]. Nested objects and collections are
//! handled by recursing through the same engine with the same context.
//!
//! # Public API
//!
//! - [`Denormalizer`] / [`Denormalize`] -- the engine and its recursive entry point
//! - [`Context`] / [`ContextBuilder`] / [`ContextConfig`] -- per-call settings
//! - [`MappingRegistry`], [`DeclaredMapping`], [`FieldMapping`] -- mapping declaration
//! - [`field`] -- the field converters
//! - [`Accessor`] and its strategies -- field storage access
//! - [`Object`], [`ObjectRef`], [`Record`], [`FieldValue`] -- the object model
//! - [`DenormError`] -- everything a call can fail with

pub mod accessor;
pub mod config;
pub mod context;
pub mod denormalizer;
pub mod error;
pub mod field;
pub mod mapping;
pub mod object;
pub mod policy;
pub mod value;

// ── Convenience re-exports ───────────────────────────────────────────

pub use accessor::{AccessError, Accessor, MapEntryAccessor, MethodAccessor, PropertyAccessor};
pub use config::{ConfigError, ContextConfig};
pub use context::{Context, ContextBuilder};
pub use denormalizer::{sub_path, Denormalize, Denormalizer, DISCRIMINATOR_FIELD};
pub use error::{DenormError, ErrorKind};
pub use field::FieldConverter;
pub use mapping::{
    DeclaredMapping, DeclaredMappingBuilder, Factory, FieldMapping, FieldMappingBuilder,
    MappingRegistry, ObjectMapping, ObjectMappingResolver,
};
pub use object::{
    class_of, materialize, object_ref, with_object, FieldError, LazyLoad, Object, ObjectRef,
    Record, Target,
};
pub use policy::{is_group_compliant, CallbackPolicy, GroupPolicy, Policy};
pub use value::{Collection, DataTree, FieldValue};

//! Object and field mappings, and the registry that resolves them.
//!
//! The engine only consumes mappings through [`ObjectMappingResolver`] and
//! [`ObjectMapping`]. [`MappingRegistry`] and [`DeclaredMapping`] are the
//! in-memory implementations used to declare mappings in code.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::accessor::PropertyAccessor;
use crate::context::Context;
use crate::denormalizer::Denormalize;
use crate::error::DenormError;
use crate::field::{
    CallbackFieldConverter, Coercion, EmbedManyFieldConverter, EmbedOneFieldConverter,
    FieldConverter, ReferenceOneFieldConverter, ScalarFieldConverter, TemporalFieldConverter,
    TemporalFormat,
};
use crate::object::{object_ref, ObjectRef, Record};
use crate::policy::{is_group_compliant, Policy};

/// Creates a new, empty target object. `None` means no object could be made.
pub type Factory = Rc<dyn Fn() -> Option<ObjectRef>>;

// ──────────────────────────────────────────────
// Field mappings
// ──────────────────────────────────────────────

/// How one input key maps onto one field of the target.
pub struct FieldMapping {
    name: String,
    groups: BTreeSet<String>,
    converter: Box<dyn FieldConverter>,
    policy: Option<Box<dyn Policy>>,
}

impl FieldMapping {
    pub fn builder(name: impl Into<String>) -> FieldMappingBuilder {
        FieldMappingBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    pub fn converter(&self) -> &dyn FieldConverter {
        self.converter.as_ref()
    }

    pub fn policy(&self) -> Option<&dyn Policy> {
        self.policy.as_deref()
    }

    /// Group check, then the optional extra policy.
    pub fn is_compliant(&self, context: &Context, object: &ObjectRef) -> bool {
        is_group_compliant(context, &self.groups)
            && self
                .policy
                .as_ref()
                .map_or(true, |policy| policy.is_compliant(context, object))
    }
}

impl fmt::Debug for FieldMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMapping")
            .field("name", &self.name)
            .field("groups", &self.groups)
            .field("policy", &self.policy.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`FieldMapping`].
///
/// The shortcut constructors bind the converter to a [`PropertyAccessor`] for
/// the field name; use [`FieldMappingBuilder::converter`] for other accessors.
/// Without a converter, the field is a plain scalar.
pub struct FieldMappingBuilder {
    name: String,
    groups: BTreeSet<String>,
    converter: Option<Box<dyn FieldConverter>>,
    policy: Option<Box<dyn Policy>>,
}

impl FieldMappingBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        FieldMappingBuilder {
            name: name.into(),
            groups: BTreeSet::new(),
            converter: None,
            policy: None,
        }
    }

    fn property(&self) -> PropertyAccessor {
        PropertyAccessor::new(self.name.clone())
    }

    pub fn scalar(name: impl Into<String>) -> Self {
        let builder = Self::new(name);
        let converter = ScalarFieldConverter::new(builder.property());
        builder.converter(converter)
    }

    pub fn coerced(name: impl Into<String>, coercion: Coercion) -> Self {
        let builder = Self::new(name);
        let converter = ScalarFieldConverter::new(builder.property()).with_coercion(coercion);
        builder.converter(converter)
    }

    pub fn temporal(name: impl Into<String>, format: TemporalFormat) -> Self {
        let builder = Self::new(name);
        let converter =
            TemporalFieldConverter::new(ScalarFieldConverter::new(builder.property()), format);
        builder.converter(converter)
    }

    pub fn embed_one(name: impl Into<String>, class: impl Into<String>) -> Self {
        let builder = Self::new(name);
        let converter = EmbedOneFieldConverter::new(class, builder.property());
        builder.converter(converter)
    }

    pub fn embed_many(name: impl Into<String>, class: impl Into<String>) -> Self {
        let builder = Self::new(name);
        let converter = EmbedManyFieldConverter::new(class, builder.property());
        builder.converter(converter)
    }

    pub fn reference_one(
        name: impl Into<String>,
        resolver: impl Fn(&str) -> Option<ObjectRef> + 'static,
    ) -> Self {
        let builder = Self::new(name);
        let converter = ReferenceOneFieldConverter::new(builder.property(), resolver);
        builder.converter(converter)
    }

    pub fn callback(
        name: impl Into<String>,
        callback: impl Fn(
                &str,
                &ObjectRef,
                serde_json::Value,
                &Context,
                Option<&dyn Denormalize>,
            ) -> Result<(), DenormError>
            + 'static,
    ) -> Self {
        Self::new(name).converter(CallbackFieldConverter::new(callback))
    }

    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn converter(mut self, converter: impl FieldConverter + 'static) -> Self {
        self.converter = Some(Box::new(converter));
        self
    }

    pub fn policy(mut self, policy: impl Policy + 'static) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    pub fn build(self) -> FieldMapping {
        let converter = match self.converter {
            Some(converter) => converter,
            None => Box::new(ScalarFieldConverter::new(PropertyAccessor::new(
                self.name.clone(),
            ))),
        };
        FieldMapping {
            name: self.name,
            groups: self.groups,
            converter,
            policy: self.policy,
        }
    }
}

// ──────────────────────────────────────────────
// Object mappings
// ──────────────────────────────────────────────

/// Everything the engine needs to know about one class.
pub trait ObjectMapping {
    fn class(&self) -> &str;

    /// The factory for new instances at `path`, given the input's
    /// discriminator.
    fn factory(&self, path: &str, discriminator: Option<&str>) -> Factory;

    /// Field mappings in processing order. Names are unique.
    fn field_mappings(&self, path: &str, discriminator: Option<&str>) -> &[FieldMapping];
}

/// Resolves the mapping for a class.
pub trait ObjectMappingResolver {
    fn object_mapping(&self, class: &str) -> Result<&dyn ObjectMapping, DenormError>;
}

struct Variant {
    factory: Factory,
    fields: Vec<FieldMapping>,
}

/// An object mapping declared in code.
///
/// A mapping may declare discriminator variants, each with its own factory
/// and fields. Without variants the discriminator is ignored. With variants,
/// an absent discriminator selects the base declaration and an unknown one
/// selects a factory that creates nothing.
pub struct DeclaredMapping {
    class: String,
    factory: Factory,
    fields: Vec<FieldMapping>,
    variants: BTreeMap<String, Variant>,
}

impl DeclaredMapping {
    pub fn builder(class: impl Into<String>) -> DeclaredMappingBuilder {
        DeclaredMappingBuilder {
            class: class.into(),
            factory: None,
            fields: Vec::new(),
            variants: BTreeMap::new(),
        }
    }

    /// A mapping whose instances are [`Record`]s declaring every mapped field.
    pub fn record(class: impl Into<String>, fields: Vec<FieldMapping>) -> Self {
        let class = class.into();
        let names: Vec<String> = fields.iter().map(|f| f.name().to_string()).collect();
        let record_class = class.clone();
        DeclaredMapping::builder(class)
            .factory(move || object_ref(Record::new(record_class.clone(), names.clone())))
            .fields(fields)
            .build()
    }

    fn variant(&self, discriminator: Option<&str>) -> Option<&Variant> {
        discriminator.and_then(|name| self.variants.get(name))
    }
}

impl ObjectMapping for DeclaredMapping {
    fn class(&self) -> &str {
        &self.class
    }

    fn factory(&self, _path: &str, discriminator: Option<&str>) -> Factory {
        if let Some(variant) = self.variant(discriminator) {
            return variant.factory.clone();
        }
        if discriminator.is_some() && !self.variants.is_empty() {
            return Rc::new(|| None);
        }
        self.factory.clone()
    }

    fn field_mappings(&self, _path: &str, discriminator: Option<&str>) -> &[FieldMapping] {
        match self.variant(discriminator) {
            Some(variant) => &variant.fields,
            None => &self.fields,
        }
    }
}

/// Builder for [`DeclaredMapping`].
pub struct DeclaredMappingBuilder {
    class: String,
    factory: Option<Factory>,
    fields: Vec<FieldMapping>,
    variants: BTreeMap<String, Variant>,
}

impl DeclaredMappingBuilder {
    pub fn factory(mut self, factory: impl Fn() -> ObjectRef + 'static) -> Self {
        self.factory = Some(Rc::new(move || Some(factory())));
        self
    }

    /// A factory that may decline to create an object.
    pub fn fallible_factory(mut self, factory: impl Fn() -> Option<ObjectRef> + 'static) -> Self {
        self.factory = Some(Rc::new(factory));
        self
    }

    pub fn field(mut self, field: FieldMapping) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldMapping>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Declare the variant selected by discriminator value `name`.
    pub fn variant(
        mut self,
        name: impl Into<String>,
        factory: impl Fn() -> ObjectRef + 'static,
        fields: Vec<FieldMapping>,
    ) -> Self {
        self.variants.insert(
            name.into(),
            Variant {
                factory: Rc::new(move || Some(factory())),
                fields,
            },
        );
        self
    }

    /// Without a factory, the mapping can only update existing objects.
    pub fn build(self) -> DeclaredMapping {
        DeclaredMapping {
            class: self.class,
            factory: self.factory.unwrap_or_else(|| Rc::new(|| None)),
            fields: self.fields,
            variants: self.variants,
        }
    }
}

// ──────────────────────────────────────────────
// Registry
// ──────────────────────────────────────────────

/// Object mappings indexed by class name.
#[derive(Default)]
pub struct MappingRegistry {
    mappings: HashMap<String, Box<dyn ObjectMapping>>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `mapping` under its class, replacing any earlier one.
    pub fn register(&mut self, mapping: impl ObjectMapping + 'static) -> &mut Self {
        self.mappings
            .insert(mapping.class().to_string(), Box::new(mapping));
        self
    }

    pub fn with(mut self, mapping: impl ObjectMapping + 'static) -> Self {
        self.register(mapping);
        self
    }

    pub fn contains(&self, class: &str) -> bool {
        self.mappings.contains_key(class)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl ObjectMappingResolver for MappingRegistry {
    fn object_mapping(&self, class: &str) -> Result<&dyn ObjectMapping, DenormError> {
        self.mappings
            .get(class)
            .map(|mapping| mapping.as_ref())
            .ok_or_else(|| DenormError::missing_mapping(class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::class_of;

    fn animal_mapping() -> DeclaredMapping {
        DeclaredMapping::builder("Animal")
            .factory(|| object_ref(Record::new("Animal", ["name"])))
            .field(FieldMappingBuilder::scalar("name").build())
            .variant(
                "Dog",
                || object_ref(Record::new("Dog", ["name", "breed"])),
                vec![
                    FieldMappingBuilder::scalar("name").build(),
                    FieldMappingBuilder::scalar("breed").build(),
                ],
            )
            .build()
    }

    fn names(fields: &[FieldMapping]) -> Vec<&str> {
        fields.iter().map(FieldMapping::name).collect()
    }

    #[test]
    fn variant_selects_factory_and_fields() {
        let mapping = animal_mapping();
        let dog = (mapping.factory("", Some("Dog")))().unwrap();
        assert_eq!(class_of(&dog), "Dog");
        assert_eq!(names(mapping.field_mappings("", Some("Dog"))), ["name", "breed"]);
    }

    #[test]
    fn absent_discriminator_uses_base() {
        let mapping = animal_mapping();
        let animal = (mapping.factory("", None))().unwrap();
        assert_eq!(class_of(&animal), "Animal");
        assert_eq!(names(mapping.field_mappings("", None)), ["name"]);
    }

    #[test]
    fn unknown_discriminator_creates_nothing() {
        let mapping = animal_mapping();
        assert!((mapping.factory("", Some("Cat")))().is_none());
        assert_eq!(names(mapping.field_mappings("", Some("Cat"))), ["name"]);
    }

    #[test]
    fn mapping_without_variants_ignores_discriminator() {
        let mapping = DeclaredMapping::record("Order", vec![FieldMapping::builder("id").build()]);
        let order = (mapping.factory("", Some("Whatever")))().unwrap();
        assert_eq!(class_of(&order), "Order");
        assert_eq!(order.borrow().field("id"), Some(crate::value::FieldValue::Null));
    }

    #[test]
    fn field_mapping_defaults() {
        let field = FieldMapping::builder("id").build();
        assert_eq!(field.name(), "id");
        assert!(field.groups().is_empty());
        assert!(field.policy().is_none());
        assert!(field.converter().accessor().is_some());
    }

    #[test]
    fn extra_policy_narrows_group_compliance() {
        use crate::policy::CallbackPolicy;

        let object = object_ref(Record::new("Order", ["id"]));
        let field = FieldMapping::builder("id")
            .groups(["admin"])
            .policy(CallbackPolicy::new(|context: &Context, _: &ObjectRef| {
                context.attribute("frozen").is_none()
            }))
            .build();

        let admin = Context::builder().groups(["admin"]).build();
        assert!(field.is_compliant(&admin, &object));

        let frozen = Context::builder()
            .groups(["admin"])
            .attribute("frozen", serde_json::json!(true))
            .build();
        assert!(!field.is_compliant(&frozen, &object));

        let public = Context::builder().groups(["public"]).build();
        assert!(!field.is_compliant(&public, &object));
    }

    #[test]
    fn registry_reports_missing_mapping() {
        let registry = MappingRegistry::new().with(animal_mapping());
        assert!(registry.contains("Animal"));
        assert_eq!(registry.len(), 1);
        let err = registry.object_mapping("Plant").err().unwrap();
        assert!(matches!(err, DenormError::MissingMapping { class, .. } if class == "Plant"));
    }
}

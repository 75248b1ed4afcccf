//! Shared fixtures: a small order domain with hand-written `Object` impls.

#![allow(dead_code)]

use std::any::Any;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use hydrate_core::{
    object_ref, Collection, DataTree, DeclaredMapping, FieldError, FieldMapping,
    FieldMappingBuilder, FieldValue, LazyLoad, MappingRegistry, Object, ObjectRef,
};
use hydrate_core::field::TemporalFormat;
use time::OffsetDateTime;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::Layer;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

// ──────────────────────────────────────────────
// Log capture
// ──────────────────────────────────────────────

/// One event as seen by [`CaptureLayer`].
#[derive(Debug, Clone)]
pub struct LoggedEvent {
    pub level: Level,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl LoggedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

struct EventVisitor<'a>(&'a mut LoggedEvent);

impl Visit for EventVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record(field, format!("{value:?}"));
    }
}

impl EventVisitor<'_> {
    fn record(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.0.message = value;
        } else {
            self.0.fields.insert(field.name().to_string(), value);
        }
    }
}

/// Records every event into a shared list.
#[derive(Clone, Default)]
pub struct CaptureLayer {
    events: Arc<Mutex<Vec<LoggedEvent>>>,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        let mut logged = LoggedEvent {
            level: *event.metadata().level(),
            message: String::new(),
            fields: BTreeMap::new(),
        };
        event.record(&mut EventVisitor(&mut logged));
        self.events.lock().unwrap().push(logged);
    }
}

/// Run `f` with a capturing subscriber and return what it logged.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<LoggedEvent>) {
    let layer = CaptureLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    let events = layer.events.lock().unwrap().clone();
    (result, events)
}

pub fn data(value: serde_json::Value) -> DataTree {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("fixture is not an object: {other}"),
    }
}

// ──────────────────────────────────────────────
// Domain types
// ──────────────────────────────────────────────

#[derive(Default)]
pub struct Order {
    pub id: Option<String>,
    pub total: Option<i64>,
    pub placed_at: Option<OffsetDateTime>,
    pub note: Option<String>,
    pub customer: Option<ObjectRef>,
    pub lines: Collection,
}

impl Object for Order {
    fn class(&self) -> &str {
        "Order"
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.clone().into()),
            "total" => Some(self.total.into()),
            "placed_at" => Some(self.placed_at.map(FieldValue::DateTime).unwrap_or_default()),
            "note" => Some(self.note.clone().into()),
            "customer" => Some(self.customer.clone().into()),
            "lines" => Some(FieldValue::Collection(self.lines.clone())),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        match name {
            "id" => self.id = value.into_text()?,
            "total" => self.total = value.into_int()?,
            "placed_at" => self.placed_at = value.into_date_time()?,
            "note" => self.note = value.into_text()?,
            "customer" => self.customer = value.into_object()?,
            "lines" => self.lines = value.into_collection()?,
            _ => return Err(FieldError::Missing),
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Default)]
pub struct Customer {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Object for Customer {
    fn class(&self) -> &str {
        "Customer"
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "name" => Some(self.name.clone().into()),
            "email" => Some(self.email.clone().into()),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        match name {
            "name" => self.name = value.into_text()?,
            "email" => self.email = value.into_text()?,
            _ => return Err(FieldError::Missing),
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Stands in for a `Customer` that has not been fetched yet.
pub struct CustomerProxy {
    pub loads: Rc<Cell<usize>>,
    pub loaded: bool,
    pub inner: Customer,
}

impl CustomerProxy {
    pub fn new(loads: Rc<Cell<usize>>) -> Self {
        CustomerProxy {
            loads,
            loaded: false,
            inner: Customer::default(),
        }
    }
}

impl LazyLoad for CustomerProxy {
    fn is_initialized(&self) -> bool {
        self.loaded
    }

    fn initialize(&mut self) {
        self.loads.set(self.loads.get() + 1);
        self.loaded = true;
        self.inner = Customer {
            name: Some("Stored Name".to_string()),
            email: Some("stored@example.com".to_string()),
        };
    }
}

impl Object for CustomerProxy {
    fn class(&self) -> &str {
        "Customer"
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

#[derive(Default)]
pub struct Line {
    pub sku: Option<String>,
    pub quantity: Option<i64>,
}

impl Object for Line {
    fn class(&self) -> &str {
        "Line"
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "sku" => Some(self.sku.clone().into()),
            "quantity" => Some(self.quantity.into()),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        match name {
            "sku" => self.sku = value.into_text()?,
            "quantity" => self.quantity = value.into_int()?,
            _ => return Err(FieldError::Missing),
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ──────────────────────────────────────────────
// Mappings
// ──────────────────────────────────────────────

pub fn order_mapping(lines: FieldMapping) -> DeclaredMapping {
    DeclaredMapping::builder("Order")
        .factory(|| object_ref(Order::default()))
        .field(FieldMappingBuilder::scalar("id").build())
        .field(FieldMappingBuilder::scalar("total").build())
        .field(FieldMappingBuilder::temporal("placed_at", TemporalFormat::DateTime).build())
        .field(FieldMappingBuilder::scalar("note").groups(["admin"]).build())
        .field(FieldMappingBuilder::embed_one("customer", "Customer").build())
        .field(lines)
        .build()
}

pub fn customer_mapping() -> DeclaredMapping {
    DeclaredMapping::builder("Customer")
        .factory(|| object_ref(Customer::default()))
        .field(FieldMappingBuilder::scalar("name").build())
        .field(FieldMappingBuilder::scalar("email").build())
        .build()
}

pub fn line_mapping() -> DeclaredMapping {
    DeclaredMapping::builder("Line")
        .factory(|| object_ref(Line::default()))
        .field(FieldMappingBuilder::scalar("sku").build())
        .field(FieldMappingBuilder::scalar("quantity").build())
        .build()
}

/// Orders whose lines are matched by position.
pub fn registry() -> MappingRegistry {
    MappingRegistry::new()
        .with(order_mapping(
            FieldMappingBuilder::embed_many("lines", "Line").build(),
        ))
        .with(customer_mapping())
        .with(line_mapping())
}

/// Orders whose lines are matched by `sku`.
pub fn keyed_registry() -> MappingRegistry {
    use hydrate_core::field::EmbedManyFieldConverter;
    use hydrate_core::PropertyAccessor;

    let lines = FieldMapping::builder("lines")
        .converter(
            EmbedManyFieldConverter::new("Line", PropertyAccessor::new("lines")).match_by("sku"),
        )
        .build();
    MappingRegistry::new()
        .with(order_mapping(lines))
        .with(customer_mapping())
        .with(line_mapping())
}

pub fn read<T: Object, R>(object: &ObjectRef, f: impl FnOnce(&T) -> R) -> R {
    hydrate_core::with_object(object, f).expect("object has unexpected type")
}

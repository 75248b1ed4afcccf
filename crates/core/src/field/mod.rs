//! Field converters: turn one raw input value into the value stored on one
//! field of the target object.
//!
//! | Converter | Input | Stored as |
//! |-----------|-------|-----------|
//! | [`ScalarFieldConverter`] | any | the value, optionally coerced |
//! | [`TemporalFieldConverter`] | string | `Date` / `DateTime` |
//! | [`EmbedOneFieldConverter`] | object | nested object (recursive) |
//! | [`EmbedManyFieldConverter`] | array of objects | collection of nested objects |
//! | [`ReferenceOneFieldConverter`] | id | object looked up by id |
//! | [`CallbackFieldConverter`] | any | whatever the closure does |

mod callback;
mod embed;
mod reference;
mod scalar;
mod temporal;

pub use callback::{CallbackFieldConverter, FieldCallback};
pub use embed::{EmbedManyFieldConverter, EmbedOneFieldConverter};
pub use reference::{ReferenceOneFieldConverter, ReferenceResolver};
pub use scalar::{Coercion, ScalarFieldConverter};
pub use temporal::{TemporalFieldConverter, TemporalFormat};

use crate::accessor::{AccessError, Accessor};
use crate::context::Context;
use crate::denormalizer::Denormalize;
use crate::error::DenormError;
use crate::object::ObjectRef;

/// Converts a raw value and writes it onto `object`.
///
/// `path` is already extended with the field name. `denormalizer` is the
/// engine driving the call, for converters that recurse into nested objects.
pub trait FieldConverter {
    fn convert_field(
        &self,
        path: &str,
        object: &ObjectRef,
        value: serde_json::Value,
        context: &Context,
        denormalizer: Option<&dyn Denormalize>,
    ) -> Result<(), DenormError>;

    /// The accessor this converter writes through, if it has one.
    ///
    /// Missing-field reset uses it so that a cleared field goes through the
    /// same storage strategy as a converted one.
    fn accessor(&self) -> Option<&dyn Accessor> {
        None
    }
}

/// Wrap an accessor failure at `path` and log it.
pub(crate) fn access_error(path: &str) -> impl FnOnce(AccessError) -> DenormError + '_ {
    move |source| DenormError::access(path, source).logged()
}

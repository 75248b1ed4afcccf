use crate::context::Context;
use crate::denormalizer::Denormalize;
use crate::error::DenormError;
use crate::object::ObjectRef;

use super::FieldConverter;

/// Signature of a [`CallbackFieldConverter`] closure; same arguments as
/// [`FieldConverter::convert_field`].
pub type FieldCallback = Box<
    dyn Fn(
        &str,
        &ObjectRef,
        serde_json::Value,
        &Context,
        Option<&dyn Denormalize>,
    ) -> Result<(), DenormError>,
>;

/// A converter implemented by a closure.
pub struct CallbackFieldConverter {
    callback: FieldCallback,
}

impl CallbackFieldConverter {
    pub fn new(
        callback: impl Fn(
                &str,
                &ObjectRef,
                serde_json::Value,
                &Context,
                Option<&dyn Denormalize>,
            ) -> Result<(), DenormError>
            + 'static,
    ) -> Self {
        CallbackFieldConverter {
            callback: Box::new(callback),
        }
    }
}

impl FieldConverter for CallbackFieldConverter {
    fn convert_field(
        &self,
        path: &str,
        object: &ObjectRef,
        value: serde_json::Value,
        context: &Context,
        denormalizer: Option<&dyn Denormalize>,
    ) -> Result<(), DenormError> {
        (self.callback)(path, object, value, context, denormalizer)
    }
}

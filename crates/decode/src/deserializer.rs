//! Decode-then-denormalize facade.

use hydrate_core::{Context, DenormError, Denormalizer, ObjectMappingResolver, ObjectRef, Target};

use crate::decoder::{DecodeError, Decoder};

/// Either half of [`Deserializer::deserialize`] failed.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Denormalize(#[from] DenormError),
}

/// Populates objects straight from raw payloads.
pub struct Deserializer<R> {
    decoder: Decoder,
    denormalizer: Denormalizer<R>,
}

impl<R: ObjectMappingResolver> Deserializer<R> {
    pub fn new(decoder: Decoder, denormalizer: Denormalizer<R>) -> Self {
        Deserializer {
            decoder,
            denormalizer,
        }
    }

    /// A deserializer with the default JSON and TOML decoders.
    pub fn with_resolver(resolver: R) -> Self {
        Self::new(Decoder::default(), Denormalizer::new(resolver))
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn denormalizer(&self) -> &Denormalizer<R> {
        &self.denormalizer
    }

    /// Decode `data` as `content_type`, then denormalize it into `target`.
    pub fn deserialize(
        &self,
        target: impl Into<Target>,
        data: &str,
        content_type: &str,
        context: Option<&Context>,
    ) -> Result<ObjectRef, DeserializeError> {
        let tree = self.decoder.decode(data, content_type)?;
        Ok(self.denormalizer.denormalize(target, tree, context)?)
    }
}

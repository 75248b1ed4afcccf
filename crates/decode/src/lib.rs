//! hydrate-decode: turns raw payloads into data trees and feeds them to the
//! denormalizer.
//!
//! [`Decoder`] picks a [`TypeDecoder`] by content type. [`Deserializer`]
//! chains a decoder with a [`hydrate_core::Denormalizer`] so callers can go
//! from a request body to a populated object in one call.

pub mod decoder;
pub mod deserializer;

pub use decoder::{DecodeError, Decoder, JsonTypeDecoder, TomlTypeDecoder, TypeDecoder};
pub use deserializer::{DeserializeError, Deserializer};

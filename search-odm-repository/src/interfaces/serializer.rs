//! Serializer trait definition.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::OdmError;

/// Converts request bodies to bytes and response bodies back to values.
///
/// The serializer owns the wire format only. Entities are first turned into
/// `serde_json` documents by the mapping layer, which renames fields through
/// the entity mapping, so a custom serializer sees store documents rather than
/// entity values and cannot change how entity fields are encoded.
pub trait Serializer: Send + Sync {
    fn to_bytes<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, OdmError>;

    fn from_bytes<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, OdmError>;
}

/// JSON serializer backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn to_bytes<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, OdmError> {
        serde_json::to_vec(value).map_err(|e| OdmError::serialization(e.to_string()))
    }

    fn from_bytes<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, OdmError> {
        serde_json::from_slice(bytes).map_err(|e| OdmError::parse(e.to_string()))
    }
}

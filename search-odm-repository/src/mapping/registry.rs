//! Field mapping registry.
//!
//! Resolves and caches the [`EntityMapping`] of each entity type for the
//! lifetime of the registry. The cache is populated once per type: the mapping
//! is built outside the lock and published under the write lock, where the
//! first published value wins and later builders drop theirs. Every caller
//! therefore sees the same `Arc` for a given type.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::OdmError;
use crate::mapping::{EntityMapping, MappingBuilder};

/// A domain type stored as a document.
///
/// The serde field names of the type are its logical field names; the mapping
/// declares how they are stored.
///
/// # Example
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct SampleEntity { id: Option<String>, message: String }
///
/// impl Entity for SampleEntity {
///     fn mapping() -> MappingBuilder {
///         MappingBuilder::new("SampleEntity", "test-index-sample")
///             .id_field(FieldDescriptor::new("id", FieldType::Keyword))
///             .field(FieldDescriptor::new("message", FieldType::Text).stored())
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn mapping() -> MappingBuilder;
}

/// Process-wide cache of entity mappings, shared behind an `Arc`.
#[derive(Debug, Default)]
pub struct MappingRegistry {
    mappings: RwLock<HashMap<TypeId, Arc<EntityMapping>>>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the mapping of `T`, building and caching it on first use.
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<EntityMapping>)` - The cached mapping
    /// * `Err(OdmError::MappingError)` - If `T` declares an invalid mapping;
    ///   nothing is cached in that case
    pub fn resolve<T: Entity>(&self) -> Result<Arc<EntityMapping>, OdmError> {
        let type_id = TypeId::of::<T>();

        if let Some(mapping) = self.mappings.read().get(&type_id) {
            return Ok(Arc::clone(mapping));
        }

        let built = Arc::new(T::mapping().build()?);

        let mut mappings = self.mappings.write();
        let published = mappings.entry(type_id).or_insert(built);
        Ok(Arc::clone(published))
    }

    /// Whether the mapping of `T` has been resolved already.
    pub fn contains<T: Entity>(&self) -> bool {
        self.mappings.read().contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.mappings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.read().is_empty()
    }
}

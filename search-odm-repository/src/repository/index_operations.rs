//! Index management for one entity type.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::errors::OdmError;
use crate::interfaces::{HttpMethod, Serializer, StoreRequest, Transport};
use crate::mapping::{index_settings, mapping_document, Entity, EntityMapping, MappingRegistry};
use crate::repository::expect_success;

/// Creates, inspects and deletes the index of entity type `T`.
pub struct IndexOperations<T, S> {
    transport: Arc<dyn Transport>,
    serializer: S,
    registry: Arc<MappingRegistry>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity, S: Serializer> IndexOperations<T, S> {
    pub fn new(
        transport: Arc<dyn Transport>,
        serializer: S,
        registry: Arc<MappingRegistry>,
    ) -> Self {
        Self {
            transport,
            serializer,
            registry,
            _entity: PhantomData,
        }
    }

    fn mapping(&self) -> Result<Arc<EntityMapping>, OdmError> {
        self.registry.resolve::<T>()
    }

    /// Create the index with the settings and mappings generated from the entity mapping.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the index was created
    /// * `Ok(false)` - If the index already existed
    /// * `Err(OdmError)` - If the store rejected the request
    #[instrument(skip(self))]
    pub async fn create(&self) -> Result<bool, OdmError> {
        let mapping = self.mapping()?;
        let body = self.serializer.to_bytes(&index_settings(&mapping))?;

        let path = format!("/{}", mapping.index_name());
        let request = StoreRequest::new(HttpMethod::Put, path).with_body(body);
        let response = self.transport.execute(request).await?;

        if response.status == 400
            && response.body_text().contains("resource_already_exists_exception")
        {
            debug!(index = mapping.index_name(), "Index already exists");
            return Ok(false);
        }
        expect_success(response)?;

        info!(
            index = mapping.index_name(),
            shards = mapping.shards(),
            replicas = mapping.replicas(),
            "Created index"
        );
        Ok(true)
    }

    /// Delete the index. A missing index is not an error.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the index was deleted
    /// * `Ok(false)` - If there was no index to delete
    #[instrument(skip(self))]
    pub async fn delete(&self) -> Result<bool, OdmError> {
        let mapping = self.mapping()?;
        let response = self
            .transport
            .execute(StoreRequest::new(HttpMethod::Delete, format!("/{}", mapping.index_name())))
            .await?;

        if response.is_not_found() {
            debug!(index = mapping.index_name(), "Index not found, nothing to delete");
            return Ok(false);
        }
        expect_success(response)?;

        info!(index = mapping.index_name(), "Deleted index");
        Ok(true)
    }

    pub async fn exists(&self) -> Result<bool, OdmError> {
        let mapping = self.mapping()?;
        let response = self
            .transport
            .execute(StoreRequest::new(HttpMethod::Head, format!("/{}", mapping.index_name())))
            .await?;

        if response.is_not_found() {
            return Ok(false);
        }
        expect_success(response).map(|_| true)
    }

    /// Make all writes so far visible to search.
    pub async fn refresh(&self) -> Result<(), OdmError> {
        let mapping = self.mapping()?;
        let response = self
            .transport
            .execute(StoreRequest::new(
                HttpMethod::Post,
                format!("/{}/_refresh", mapping.index_name()),
            ))
            .await?;

        expect_success(response).map(|_| ())
    }

    /// The generated `mappings` document.
    pub fn mapping_document(&self) -> Result<Value, OdmError> {
        let mapping = self.mapping()?;
        Ok(mapping_document(&mapping))
    }
}

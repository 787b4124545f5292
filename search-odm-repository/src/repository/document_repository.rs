//! Typed document repository.

use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, instrument};

use search_odm_shared::{PageCursor, Pagination, Query, SearchHits};

use crate::config::OdmConfig;
use crate::errors::OdmError;
use crate::interfaces::{
    EntityRoutingResolver, HttpMethod, JsonSerializer, Operation, RoutingContext, RoutingResolver,
    Serializer, StoreRequest, StoreResponse, Transport,
};
use crate::mapper::{
    PageRequest, RawCountResponse, RawGetResponse, RawSearchResponse, RawWriteResponse,
    ResultMapper,
};
use crate::mapping::{DocumentConverter, Entity, EntityMapping, MappingRegistry};
use crate::repository::{document_path, expect_success, is_missing_document, IndexOperations};
use crate::translator::{as_millis, QueryTranslator};
use crate::types::{BatchOperationResult, BatchOperationSummary, DeleteOutcome};

/// Repository of entities of type `T` identified by `ID`.
///
/// The repository holds no per-entity state: every operation resolves the
/// mapping from the shared registry, asks the routing resolver, and awaits a
/// single transport response (streams issue one request per page).
///
/// # Example
///
/// ```ignore
/// let registry = Arc::new(MappingRegistry::new());
/// let transport = Arc::new(OpenSearchTransport::from_env()?);
/// let repository: DocumentRepository<SampleEntity, String> =
///     DocumentRepository::new(transport, registry);
///
/// repository.index_ops().create().await?;
/// let saved = repository.save(&entity).await?;
/// let hits = repository.search(&Query::new(QueryFilter::term("type", "a"))).await?;
/// ```
pub struct DocumentRepository<T, ID, S = JsonSerializer> {
    transport: Arc<dyn Transport>,
    serializer: S,
    registry: Arc<MappingRegistry>,
    routing: Arc<dyn RoutingResolver>,
    config: OdmConfig,
    _marker: PhantomData<fn() -> (T, ID)>,
}

impl<T: Entity, ID: Display> DocumentRepository<T, ID, JsonSerializer> {
    /// Create a repository with JSON serialization, routing by the entity's
    /// routing field and the default configuration.
    pub fn new(transport: Arc<dyn Transport>, registry: Arc<MappingRegistry>) -> Self {
        Self::with_parts(
            transport,
            JsonSerializer,
            registry,
            Arc::new(EntityRoutingResolver),
            OdmConfig::default(),
        )
    }
}

impl<T: Entity, ID: Display, S: Serializer + Clone> DocumentRepository<T, ID, S> {
    /// Create a repository from explicitly wired collaborators.
    pub fn with_parts(
        transport: Arc<dyn Transport>,
        serializer: S,
        registry: Arc<MappingRegistry>,
        routing: Arc<dyn RoutingResolver>,
        config: OdmConfig,
    ) -> Self {
        Self {
            transport,
            serializer,
            registry,
            routing,
            config,
            _marker: PhantomData,
        }
    }

    pub fn with_config(mut self, config: OdmConfig) -> Self {
        self.config = config;
        self
    }

    /// A repository sharing every collaborator except the routing resolver.
    pub fn with_routing(&self, routing: Arc<dyn RoutingResolver>) -> Self {
        Self::with_parts(
            Arc::clone(&self.transport),
            self.serializer.clone(),
            Arc::clone(&self.registry),
            routing,
            self.config.clone(),
        )
    }

    pub fn config(&self) -> &OdmConfig {
        &self.config
    }

    /// Index management for `T`.
    pub fn index_ops(&self) -> IndexOperations<T, S> {
        IndexOperations::new(
            Arc::clone(&self.transport),
            self.serializer.clone(),
            Arc::clone(&self.registry),
        )
    }

    /// The mapping of `T`, resolved through the shared registry.
    pub fn mapping(&self) -> Result<Arc<EntityMapping>, OdmError> {
        self.registry.resolve::<T>()
    }

    /// Save an entity, inserting or replacing it by id.
    ///
    /// An entity without id is indexed under an id generated by the store. When
    /// the mapping declares a version field, the version is incremented and
    /// sent as an external version; the store rejects it if it is not newer
    /// than the stored one. A new entity without id starts at version 1, which
    /// is only written to the document: the store refuses external versions on
    /// generated ids.
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The entity with its id and version applied
    /// * `Err(OdmError::OptimisticLockError)` - If the stored version is newer
    #[instrument(skip(self, entity), fields(entity_type = std::any::type_name::<T>()))]
    pub async fn save(&self, entity: &T) -> Result<T, OdmError> {
        let mapping = self.mapping()?;
        self.save_with(&mapping, entity).await
    }

    async fn save_with(&self, mapping: &EntityMapping, entity: &T) -> Result<T, OdmError> {
        let converter = DocumentConverter::new(mapping);
        let mut document = converter.to_store_document(entity)?;
        let id = converter.id(&document);

        let version = mapping
            .version_field()
            .map(|_| converter.version(&document).map_or(1, |current| current + 1));
        if let Some(version) = version {
            converter.set_version(&mut document, version);
        }

        let routing = self
            .routing
            .resolve(&RoutingContext::new(Operation::Save, mapping).with_document(&document));

        let request = match &id {
            Some(id) => StoreRequest::new(HttpMethod::Put, document_path(mapping.index_name(), id)),
            None => StoreRequest::new(HttpMethod::Post, format!("/{}/_doc", mapping.index_name())),
        };
        let mut request = request
            .with_optional_param("routing", routing)
            .with_optional_param("refresh", self.config.refresh_policy.as_param());
        if let (Some(version), Some(_)) = (version, &id) {
            request = request
                .with_param("version", version.to_string())
                .with_param("version_type", "external");
        }
        let request = request.with_body(self.serializer.to_bytes(&document)?);

        let response = self.transport.execute(request).await?;
        if response.is_conflict() {
            return Err(OdmError::optimistic_lock(
                id.unwrap_or_default(),
                response.body_text(),
            ));
        }
        let written: RawWriteResponse = self.parse(expect_success(response)?)?;

        debug!(
            index = mapping.index_name(),
            doc_id = %written.id,
            version = ?version,
            result = ?written.result,
            "Saved document"
        );

        converter.set_id(&mut document, &written.id);
        converter.to_entity(document)
    }

    /// Save entities one by one, collecting a result per entity.
    ///
    /// The batch size is limited by the configured `max_batch_size` (default: 1000).
    #[instrument(skip(self, entities), fields(count = entities.len()))]
    pub async fn save_all(&self, entities: &[T]) -> Result<BatchOperationSummary, OdmError> {
        if entities.is_empty() {
            return Ok(BatchOperationSummary::default());
        }
        self.validate_batch_size(entities.len())?;
        let mapping = self.mapping()?;

        let mut results = Vec::with_capacity(entities.len());
        for entity in entities {
            let result = match self.save_with(&mapping, entity).await {
                Ok(saved) => {
                    let converter = DocumentConverter::new(&mapping);
                    let id = converter
                        .to_store_document(&saved)
                        .ok()
                        .and_then(|document| converter.id(&document));
                    BatchOperationResult {
                        id,
                        success: true,
                        error: None,
                    }
                }
                Err(err) => {
                    let converter = DocumentConverter::new(&mapping);
                    let id = converter
                        .to_store_document(entity)
                        .ok()
                        .and_then(|document| converter.id(&document));
                    BatchOperationResult::failed(id, err)
                }
            };
            results.push(result);
        }

        let summary = BatchOperationSummary::from_results(results);
        info!(
            index = mapping.index_name(),
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Saved batch"
        );
        Ok(summary)
    }

    /// Fetch an entity by id. A missing document is `None`, not an error.
    #[instrument(skip(self, id), fields(doc_id = %id))]
    pub async fn find_by_id(&self, id: &ID) -> Result<Option<T>, OdmError> {
        let mapping = self.mapping()?;
        let path = document_path(mapping.index_name(), &id.to_string());
        let request = StoreRequest::new(HttpMethod::Get, path)
            .with_optional_param("routing", self.resolve_routing(&mapping, Operation::Get));

        let response = self.transport.execute(request).await?;
        if is_missing_document(&response) {
            debug!(index = mapping.index_name(), "Document not found");
            return Ok(None);
        }
        let raw: RawGetResponse = self.parse(expect_success(response)?)?;

        ResultMapper::new(&mapping, self.config.incomplete_hit_policy).map_document(raw)
    }

    #[instrument(skip(self, id), fields(doc_id = %id))]
    pub async fn exists_by_id(&self, id: &ID) -> Result<bool, OdmError> {
        let mapping = self.mapping()?;
        let path = document_path(mapping.index_name(), &id.to_string());
        let request = StoreRequest::new(HttpMethod::Head, path)
            .with_optional_param("routing", self.resolve_routing(&mapping, Operation::Exists));

        let response = self.transport.execute(request).await?;
        if response.is_not_found() {
            return Ok(false);
        }
        expect_success(response).map(|_| true)
    }

    /// Delete a document by id.
    ///
    /// # Returns
    ///
    /// * `Ok(DeleteOutcome::Deleted)` - If the document existed
    /// * `Ok(DeleteOutcome::NotFound)` - If there was nothing to delete
    #[instrument(skip(self, id), fields(doc_id = %id))]
    pub async fn delete_by_id(&self, id: &ID) -> Result<DeleteOutcome, OdmError> {
        let mapping = self.mapping()?;
        self.delete_with(&mapping, id.to_string()).await
    }

    async fn delete_with(
        &self,
        mapping: &EntityMapping,
        id: String,
    ) -> Result<DeleteOutcome, OdmError> {
        let path = document_path(mapping.index_name(), &id);
        let request = StoreRequest::new(HttpMethod::Delete, path)
            .with_optional_param("routing", self.resolve_routing(mapping, Operation::Delete))
            .with_optional_param("refresh", self.config.refresh_policy.as_param());

        let response = self.transport.execute(request).await?;
        if is_missing_document(&response) {
            debug!(
                index = mapping.index_name(),
                doc_id = %id,
                "Document not found, nothing to delete"
            );
            return Ok(DeleteOutcome::NotFound { id });
        }
        expect_success(response)?;

        debug!(index = mapping.index_name(), doc_id = %id, "Deleted document");
        Ok(DeleteOutcome::Deleted { id })
    }

    /// Delete documents one by one. Absent documents count as successes.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_all_by_id(&self, ids: &[ID]) -> Result<BatchOperationSummary, OdmError> {
        if ids.is_empty() {
            return Ok(BatchOperationSummary::default());
        }
        self.validate_batch_size(ids.len())?;
        let mapping = self.mapping()?;

        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.to_string();
            let result = match self.delete_with(&mapping, id.clone()).await {
                Ok(_) => BatchOperationResult::succeeded(id),
                Err(err) => BatchOperationResult::failed(Some(id), err),
            };
            results.push(result);
        }

        let summary = BatchOperationSummary::from_results(results);
        info!(
            index = mapping.index_name(),
            total = summary.total,
            failed = summary.failed,
            "Deleted batch"
        );
        Ok(summary)
    }

    /// Run a query and map the first page of hits.
    ///
    /// The returned page carries a cursor when more hits can be fetched with
    /// [`next_page`](Self::next_page).
    #[instrument(skip(self, query))]
    pub async fn search(&self, query: &Query) -> Result<SearchHits<T>, OdmError> {
        let mapping = self.mapping()?;
        let request = QueryTranslator::new(&mapping, &self.config)
            .translate(query, self.routing.as_ref())?;
        let page = PageRequest {
            page_size: request.page_size,
            scroll_time: request.scroll_time,
            limiting: query.is_limiting(),
        };

        let path = format!("/{}/_search", request.index);
        let store_request = StoreRequest::new(HttpMethod::Post, path)
            .with_body(self.serializer.to_bytes(&request.body)?);
        let store_request = request.params.to_query_pairs().into_iter().fold(
            store_request,
            |store_request, (name, value)| store_request.with_param(name, value),
        );

        let response = self.transport.execute(store_request).await?;
        self.map_page(&mapping, response, page).await
    }

    /// Count the documents matching the query's filter.
    #[instrument(skip(self, query))]
    pub async fn count(&self, query: &Query) -> Result<u64, OdmError> {
        let mapping = self.mapping()?;
        let request = QueryTranslator::new(&mapping, &self.config)
            .translate_count(query, self.routing.as_ref())?;

        let path = format!("/{}/_count", request.index);
        let store_request = StoreRequest::new(HttpMethod::Post, path)
            .with_optional_param("routing", request.params.routing)
            .with_optional_param("preference", request.params.preference)
            .with_body(self.serializer.to_bytes(&request.body)?);

        let response = self.transport.execute(store_request).await?;
        let raw: RawCountResponse = self.parse(expect_success(response)?)?;
        Ok(raw.count)
    }

    /// All entities, up to the configured maximum result window.
    pub async fn find_all(&self) -> Result<Vec<T>, OdmError> {
        let query = Query::find_all().with_pagination(Pagination::Unpaged);
        Ok(self.search(&query).await?.into_contents())
    }

    /// The entities with the given ids. Missing ids are left out.
    pub async fn find_all_by_id(&self, ids: &[ID]) -> Result<Vec<T>, OdmError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::find_all()
            .with_ids(ids.iter().map(ToString::to_string))
            .with_pagination(Pagination::Unpaged);
        Ok(self.search(&query).await?.into_contents())
    }

    /// Fetch the page following the one that produced `cursor`.
    ///
    /// `query` must be the query of the first page. The cursor is consumed.
    pub async fn next_page(
        &self,
        query: &Query,
        cursor: PageCursor,
    ) -> Result<SearchHits<T>, OdmError> {
        match cursor {
            PageCursor::SearchAfter(sort_values) => {
                let pagination = match query.pagination {
                    Pagination::Paged { size, .. } => Pagination::of(0, size),
                    Pagination::Unpaged => Pagination::Unpaged,
                };
                let next = query
                    .clone()
                    .with_pagination(pagination)
                    .with_search_after(sort_values);
                self.search(&next).await
            }
            PageCursor::Scroll {
                scroll_id,
                keep_alive,
            } => self.continue_scroll(query, scroll_id, keep_alive).await,
        }
    }

    #[instrument(skip(self, query, scroll_id))]
    async fn continue_scroll(
        &self,
        query: &Query,
        scroll_id: String,
        keep_alive: Duration,
    ) -> Result<SearchHits<T>, OdmError> {
        let mapping = self.mapping()?;
        let page = PageRequest {
            page_size: query
                .pagination
                .page_size()
                .unwrap_or(self.config.max_result_window),
            scroll_time: Some(keep_alive),
            limiting: query.is_limiting(),
        };

        let body = json!({ "scroll": as_millis(keep_alive), "scroll_id": scroll_id });
        let request = StoreRequest::new(HttpMethod::Post, "/_search/scroll")
            .with_body(self.serializer.to_bytes(&body)?);

        let response = self.transport.execute(request).await?;
        self.map_page(&mapping, response, page).await
    }

    /// Release a scroll context. An already expired context is not an error.
    #[instrument(skip(self, scroll_id))]
    pub async fn clear_scroll(&self, scroll_id: &str) -> Result<(), OdmError> {
        let body = json!({ "scroll_id": [scroll_id] });
        let request = StoreRequest::new(HttpMethod::Delete, "/_search/scroll")
            .with_body(self.serializer.to_bytes(&body)?);

        let response = self.transport.execute(request).await?;
        if response.is_not_found() {
            return Ok(());
        }
        expect_success(response).map(|_| ())
    }

    /// Map a search or scroll response. A scroll that is exhausted, or that
    /// belongs to a limiting query, is released.
    async fn map_page(
        &self,
        mapping: &EntityMapping,
        response: StoreResponse,
        page: PageRequest,
    ) -> Result<SearchHits<T>, OdmError> {
        let raw: RawSearchResponse = self.parse(expect_success(response)?)?;
        if raw.timed_out {
            return Err(OdmError::timeout(format!(
                "search on {} timed out in the store",
                mapping.index_name()
            )));
        }

        let finished_scroll = raw
            .scroll_id
            .clone()
            .filter(|_| page.scroll_time.is_some() && (page.limiting || raw.hits.hits.is_empty()));

        let hits = ResultMapper::new(mapping, self.config.incomplete_hit_policy)
            .map_search(raw, page)?;

        if let Some(scroll_id) = finished_scroll {
            debug!(index = mapping.index_name(), "Scroll finished, clearing context");
            self.clear_scroll(&scroll_id).await?;
        }
        Ok(hits)
    }

    fn resolve_routing(&self, mapping: &EntityMapping, operation: Operation) -> Option<String> {
        self.routing.resolve(&RoutingContext::new(operation, mapping))
    }

    fn validate_batch_size(&self, size: usize) -> Result<(), OdmError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(OdmError::invalid_query(format!(
                    "batch of {} exceeds the maximum of {}",
                    size, max
                )));
            }
        }
        Ok(())
    }

    fn parse<R: serde::de::DeserializeOwned>(
        &self,
        response: StoreResponse,
    ) -> Result<R, OdmError> {
        self.serializer.from_bytes(&response.body)
    }
}

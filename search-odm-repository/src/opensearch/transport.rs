//! OpenSearch transport implementation.
//!
//! Executes store requests through the OpenSearch Rust client. The client
//! only moves bytes: statuses are returned as-is for the repository to
//! interpret, and only network failures become errors.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use opensearch::{
    http::{
        headers::HeaderMap,
        transport::{SingleNodeConnectionPool, TransportBuilder},
        Method,
    },
    OpenSearch,
};
use tracing::{debug, info, instrument};
use url::Url;

use crate::errors::TransportError;
use crate::interfaces::{HttpMethod, StoreRequest, StoreResponse, Transport};

/// Default URL used by [`OpenSearchTransport::from_env`].
pub const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Transport backed by a single OpenSearch node.
///
/// # Example
///
/// ```ignore
/// let transport = OpenSearchTransport::new("http://localhost:9200")?
///     .with_timeout(Duration::from_secs(5));
/// let repository: DocumentRepository<SampleEntity, String> =
///     DocumentRepository::new(Arc::new(transport), registry);
/// ```
pub struct OpenSearchTransport {
    client: OpenSearch,
    timeout: Option<Duration>,
}

impl OpenSearchTransport {
    /// Create a transport connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchTransport)` - A new transport instance
    /// * `Err(TransportError)` - If the URL is invalid or the connection pool cannot be built
    pub fn new(url: &str) -> Result<Self, TransportError> {
        let parsed_url = Url::parse(url).map_err(|e| TransportError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| TransportError::connection(e.to_string()))?;

        info!(url = %url, "Created OpenSearch transport");

        Ok(Self {
            client: OpenSearch::new(transport),
            timeout: None,
        })
    }

    /// Create a transport from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_TIMEOUT_MS`: per-request deadline in milliseconds (default: none)
    pub fn from_env() -> Result<Self, TransportError> {
        let url = env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let transport = Self::new(&url)?;

        match env::var("OPENSEARCH_TIMEOUT_MS").ok().and_then(|ms| ms.parse().ok()) {
            Some(ms) => Ok(transport.with_timeout(Duration::from_millis(ms))),
            None => Ok(transport),
        }
    }

    /// Set the deadline applied to every request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::Get,
        HttpMethod::Put => Method::Put,
        HttpMethod::Post => Method::Post,
        HttpMethod::Delete => Method::Delete,
        HttpMethod::Head => Method::Head,
    }
}

#[async_trait]
impl Transport for OpenSearchTransport {
    #[instrument(skip(self, request), fields(method = ?request.method, path = %request.path))]
    async fn execute(&self, request: StoreRequest) -> Result<StoreResponse, TransportError> {
        let query_string = (!request.params.is_empty()).then_some(&request.params);

        let response = self
            .client
            .send(
                method(request.method),
                &request.path,
                HeaderMap::new(),
                query_string,
                request.body,
                self.timeout,
            )
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::timeout(e.to_string())
                } else {
                    TransportError::connection(e.to_string())
                }
            })?;

        let status = response.status_code().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::other(format!("failed to read response body: {}", e)))?;

        debug!(status, bytes = body.len(), "Store responded");
        Ok(StoreResponse::new(status, body.into_bytes()))
    }
}

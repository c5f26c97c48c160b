//! Back-office API client
//!
//! Typed HTTP client for the back-office upstream. Carries the typed entity
//! endpoints the filters need, plus the raw forwarding primitive the proxy
//! fallback uses for everything else.

use crate::backend::types::NodeSummary;
use crate::config::UpstreamConfig;
use crate::error::{BackendError, BackendResult};
use crate::hierarchy::Hierarchy;
use crate::util::{QueryBuilder, SecretString};
use reqwest::header::{self, HeaderMap, HeaderName};
use reqwest::{Client, Method, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Back-office API client
pub struct BackendClient {
    http: Client,
    /// Upstream root (`scheme://host[:port]`), no trailing slash
    upstream_url: String,
    /// Upstream root plus the back-office API prefix
    api_url: String,
    token: Option<SecretString>,
    max_retries: u32,
}

impl BackendClient {
    /// Create a new client from configuration
    pub fn new(config: &UpstreamConfig) -> BackendResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .user_agent(format!("treegate/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(BackendError::Request)?;

        let upstream_url = config.url.trim_end_matches('/').to_string();
        Ok(Self {
            api_url: format!("{}{}", upstream_url, config.route_prefix),
            upstream_url,
            http,
            token: config.token.as_ref().map(SecretString::new),
            max_retries: config.max_retries,
        })
    }

    /// Build a URL for an API endpoint under the back-office prefix
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Add the upstream service token, when configured
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Execute a request with retries
    async fn execute(&self, request: RequestBuilder) -> BackendResult<Response> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff
                let delay = Duration::from_millis(100 * 2u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
                debug!("Retrying request (attempt {})", attempt + 1);
            }

            let req = request
                .try_clone()
                .ok_or_else(|| BackendError::InvalidResponse("Cannot clone request".to_string()))?;

            match req.send().await {
                Ok(response) => {
                    return Self::handle_response(response).await;
                }
                Err(e) => {
                    warn!("Request failed: {}", e);
                    let retryable = e.is_timeout() || e.is_connect();
                    last_error = Some(BackendError::Request(e));
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| BackendError::InvalidResponse("Unknown error".to_string())))
    }

    /// Map non-success statuses to typed errors
    async fn handle_response(response: Response) -> BackendResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendError::from_response(status.as_u16(), &body))
    }

    /// Make a GET request to an endpoint under the back-office prefix
    #[instrument(skip(self), fields(endpoint = %endpoint))]
    pub async fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> BackendResult<T> {
        let request = self.authenticate(self.http.get(self.url(endpoint)));
        let response = self.execute(request).await?;
        response.json().await.map_err(|e| {
            BackendError::InvalidResponse(format!("Failed to parse response: {}", e))
        })
    }

    /// Make a POST request that carries no meaningful response body
    #[instrument(skip(self), fields(endpoint = %endpoint))]
    pub async fn post_no_content(&self, endpoint: &str) -> BackendResult<()> {
        let request = self.authenticate(self.http.post(self.url(endpoint)));
        self.execute(request).await?;
        Ok(())
    }

    /// Fetch node summaries by id from the host's entity service
    pub async fn entities_by_ids(
        &self,
        hierarchy: Hierarchy,
        ids: &[i64],
    ) -> BackendResult<Vec<NodeSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let query = QueryBuilder::new()
            .param("type", hierarchy.entity_type())
            .param("ids", joined)
            .build();

        self.get(&format!("/entity/getbyids{}", query)).await
    }

    /// Delete a media item, used by the upload guard to roll back a batch
    pub async fn delete_media(&self, id: i64) -> BackendResult<()> {
        let query = QueryBuilder::new().param("id", id).build();
        self.post_no_content(&format!("/media/deletebyid{}", query))
            .await
    }

    /// Forward a raw back-office request to the upstream, preserving the
    /// caller's headers. No retries: proxied calls may not be idempotent.
    pub async fn forward_raw(
        &self,
        method: Method,
        path_and_query: &str,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> BackendResult<Response> {
        let url = format!("{}{}", self.upstream_url, path_and_query);
        let response = self
            .http
            .request(method, url)
            .headers(strip_connection_headers(headers))
            .body(body)
            .send()
            .await?;
        Ok(response)
    }
}

/// Remove headers that must not be forwarded between connections
fn strip_connection_headers(mut headers: HeaderMap) -> HeaderMap {
    const STRIPPED: &[HeaderName] = &[
        header::HOST,
        header::CONTENT_LENGTH,
        header::CONNECTION,
        header::TRANSFER_ENCODING,
        header::TE,
        header::TRAILER,
        header::UPGRADE,
    ];
    for name in STRIPPED {
        headers.remove(name);
    }
    headers
}

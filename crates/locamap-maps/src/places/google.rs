//! Places text search over the Google web service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use locamap_core::{NetworkError, ReqwestErrorExt};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use super::{PlaceResult, PlacesService, PlacesStatus, SearchCallback, TextSearchRequest};

const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    results: Vec<PlaceResult>,
    status: PlacesStatus,
    #[serde(default)]
    error_message: Option<String>,
}

/// Client for `{places_url}/textsearch/json`.
///
/// `text_search` runs the request on the runtime captured at construction
/// and reports through the callback.
#[derive(Debug, Clone)]
pub struct GooglePlacesClient {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
    runtime: tokio::runtime::Handle,
}

impl GooglePlacesClient {
    /// Must be called from inside a tokio runtime.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;
        let runtime = tokio::runtime::Handle::try_current()
            .context("Places client needs a running tokio runtime")?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            runtime,
        })
    }

    /// Run one text search and return the raw result list and status.
    #[instrument(skip(self, request), fields(query = %request.query), level = "debug")]
    pub async fn search(
        &self,
        request: &TextSearchRequest,
    ) -> Result<(Vec<PlaceResult>, PlacesStatus), NetworkError> {
        let url = format!("{}/textsearch/json", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", request.query.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| e.without_url().into_network_error())?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NetworkError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        let body: TextSearchResponse = response
            .json()
            .await
            .map_err(|e| NetworkError::InvalidResponse(e.without_url().to_string()))?;

        if let Some(message) = &body.error_message {
            tracing::warn!("Places service reported {:?}: {}", body.status, message);
        }
        tracing::debug!("Places search returned {} results", body.results.len());
        Ok((body.results, body.status))
    }
}

impl PlacesService for GooglePlacesClient {
    fn text_search(&self, request: TextSearchRequest, callback: SearchCallback) {
        let this = self.clone();
        self.runtime.spawn(async move {
            match this.search(&request).await {
                Ok((results, status)) => callback(results, status),
                Err(e) => {
                    tracing::error!("Places search failed: {}", e);
                    callback(Vec::new(), PlacesStatus::UnknownError);
                }
            }
        });
    }
}

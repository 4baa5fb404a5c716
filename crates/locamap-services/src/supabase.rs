//! PostgREST access to the hosted `locations` table.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use locamap_core::{ReqwestErrorExt, StoreError, SupabaseConfig};
use reqwest::{header, Client, RequestBuilder, Response};
use tracing::instrument;
use url::Url;

use crate::location::Location;
use crate::remote::RemoteStore;
use crate::retry::{with_retry, RetryConfig};

const REQUEST_TIMEOUT_SECS: u64 = 20;

/// Client for `{url}/rest/v1/{table}`
///
/// An unusable database URL does not fail construction; every remote call
/// reports it instead, so the rest of the application still starts.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: Arc<Client>,
    table_url: Result<Url, String>,
    key: String,
    retry: RetryConfig,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        let table_url = Url::parse(&config.url)
            .and_then(|base| base.join(&format!("rest/v1/{}", config.table)))
            .map_err(|e| format!("invalid database URL {:?}: {}", config.url, e));
        if let Err(e) = &table_url {
            tracing::warn!("Database unavailable: {}", e);
        }

        Ok(Self {
            client: Arc::new(client),
            table_url,
            key: config.key.clone(),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn table_url(&self) -> Result<&Url, String> {
        self.table_url.as_ref().map_err(Clone::clone)
    }

    /// Attach the key headers the service expects
    fn build_request(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.key))
            .header(header::ACCEPT, "application/json")
    }

    /// Turn a non-2xx response into an error message carrying the body
    async fn error_text(response: Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        format!("status {}: {}", status, body)
    }

    async fn select(&self, filters: &[(&str, String)]) -> Result<Vec<Location>, StoreError> {
        let table_url = self.table_url().map_err(StoreError::RemoteRead)?;
        let response = with_retry(&self.retry, || {
            self.build_request(
                self.client
                    .get(table_url.clone())
                    .query(&[("select", "*")])
                    .query(filters),
            )
            .send()
        })
        .await
        .map_err(|e| StoreError::RemoteRead(e.into_network_error().to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::RemoteRead(Self::error_text(response).await));
        }

        response
            .json::<Vec<Location>>()
            .await
            .map_err(|e| StoreError::RemoteRead(format!("invalid rows: {}", e)))
    }
}

#[async_trait]
impl RemoteStore for SupabaseClient {
    #[instrument(skip(self), level = "debug")]
    async fn select_all(&self) -> Result<Vec<Location>, StoreError> {
        let rows = self.select(&[]).await?;
        tracing::debug!("Fetched {} locations", rows.len());
        Ok(rows)
    }

    #[instrument(skip(self), level = "debug")]
    async fn select_by_province(&self, province: &str) -> Result<Vec<Location>, StoreError> {
        let rows = self
            .select(&[("province", format!("eq.{}", province))])
            .await?;
        tracing::debug!("Fetched {} locations in {}", rows.len(), province);
        Ok(rows)
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        let table_url = self
            .table_url()
            .map_err(|message| StoreError::RemoteWrite { id, message })?;
        let filter = format!("eq.{}", id);
        let response = with_retry(&self.retry, || {
            self.build_request(
                self.client
                    .delete(table_url.clone())
                    .query(&[("id", filter.as_str())])
                    .header("Prefer", "return=minimal"),
            )
            .send()
        })
        .await
        .map_err(|e| StoreError::RemoteWrite {
            id,
            message: e.into_network_error().to_string(),
        })?;

        if !response.status().is_success() {
            return Err(StoreError::RemoteWrite {
                id,
                message: Self::error_text(response).await,
            });
        }

        tracing::debug!("Deleted location {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url() {
        let config = SupabaseConfig {
            url: "https://demo.supabase.co".to_string(),
            key: "k".to_string(),
            table: "locations".to_string(),
        };
        let client = SupabaseClient::new(&config).unwrap();
        assert_eq!(
            client.table_url().unwrap().as_str(),
            "https://demo.supabase.co/rest/v1/locations"
        );
    }

    #[tokio::test]
    async fn test_missing_url_fails_on_use() {
        let client = SupabaseClient::new(&SupabaseConfig::default()).unwrap();

        let read = client.select_all().await.unwrap_err();
        assert!(matches!(read, StoreError::RemoteRead(ref m) if m.contains("invalid database URL")));

        let write = client.delete_by_id(3).await.unwrap_err();
        assert!(matches!(write, StoreError::RemoteWrite { id: 3, .. }));
    }

    #[test]
    fn test_invalid_url_does_not_block_construction() {
        let config = SupabaseConfig {
            url: "not a url".to_string(),
            ..SupabaseConfig::default()
        };
        let client = SupabaseClient::new(&config).unwrap();
        assert!(client.table_url().is_err());
    }
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use locamap_core::{ReqwestErrorExt, WeatherConfig, WeatherError};
use reqwest::{Client, Response};
use tracing::instrument;

use crate::types::{ForecastEnvelope, MunicipalityForecast, WeatherSnapshot};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Anything that can produce a fresh snapshot
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<WeatherSnapshot, WeatherError>;
}

/// AEMET OpenData daily municipal forecast.
///
/// The index endpoint answers with an envelope whose `datos` field is a
/// one-off URL for the real payload, so every fetch is two requests.
#[derive(Debug, Clone)]
pub struct AemetProvider {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
    municipality_id: String,
}

impl AemetProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        Ok(Self {
            client: Arc::new(client),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            municipality_id: config.municipality_id.clone(),
        })
    }

    fn index_url(&self) -> String {
        format!(
            "{}/prediccion/especifica/municipio/diaria/{}/",
            self.base_url, self.municipality_id
        )
    }

    /// Parse the body as JSON after checking the status of `stage`.
    ///
    /// The payload is read as text first: AEMET labels it with a Latin-1
    /// charset, which `text()` decodes.
    async fn read_json<T: serde::de::DeserializeOwned>(
        response: Response,
        stage: &'static str,
    ) -> Result<T, WeatherError> {
        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status {
                stage,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;
        serde_json::from_str(&body).map_err(|e| WeatherError::Parse(format!("{}: {}", stage, e)))
    }

    /// First stage: the envelope naming the payload URL
    #[instrument(skip(self), fields(municipality = %self.municipality_id))]
    pub async fn fetch_envelope(&self) -> Result<ForecastEnvelope, WeatherError> {
        let response = self
            .client
            .get(self.index_url())
            .query(&[("api_key", &self.api_key)])
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        Self::read_json(response, "index").await
    }

    /// Second stage: the forecast array behind `datos`
    #[instrument(skip(self, datos))]
    pub async fn fetch_forecast(&self, datos: &str) -> Result<Vec<MunicipalityForecast>, WeatherError> {
        let response = self
            .client
            .get(datos)
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        Self::read_json(response, "data").await
    }
}

#[async_trait]
impl ForecastSource for AemetProvider {
    async fn fetch_snapshot(&self) -> Result<WeatherSnapshot, WeatherError> {
        let envelope = self.fetch_envelope().await?;
        let datos = envelope
            .datos
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| {
                tracing::error!(
                    "AEMET did not return a data URL (estado {:?}: {})",
                    envelope.estado,
                    envelope.descripcion.as_deref().unwrap_or("-")
                );
                WeatherError::MissingDataUrl
            })?;

        let forecast = self.fetch_forecast(&datos).await?;
        let today = forecast
            .first()
            .and_then(MunicipalityForecast::today)
            .ok_or(WeatherError::EmptyForecast)?;

        let snapshot = WeatherSnapshot::from_day(today);
        tracing::debug!(?snapshot, "Fetched forecast");
        Ok(snapshot)
    }
}

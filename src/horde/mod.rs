pub mod job_client;

use crate::{
    config::HordeConfig,
    error::{HordeError, Result},
    models::ModelInfo,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::sync::Arc;

pub use job_client::JobClient;

/// HTTP client for the Stable Horde v2 API.
#[derive(Clone)]
pub struct HordeClient {
    http: reqwest::Client,
    config: Arc<HordeConfig>,
}

impl HordeClient {
    /// Build a client whose requests give up after `config.request_timeout`.
    pub fn new(config: HordeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(http, config))
    }

    /// Reuse an existing [`reqwest::Client`], e.g. one shared with image downloads.
    ///
    /// The client's own timeout applies instead of `config.request_timeout`.
    pub fn with_client(http: reqwest::Client, config: HordeConfig) -> Self {
        Self {
            http,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &HordeConfig {
        &self.config
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    pub(crate) fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("apikey"),
            HeaderValue::from_str(self.config.effective_api_key())
                .map_err(|e| HordeError::Config(format!("Invalid API key: {}", e)))?,
        );
        headers.insert(
            HeaderName::from_static("client-agent"),
            HeaderValue::from_str(&self.config.client_agent)
                .map_err(|e| HordeError::Config(format!("Invalid client agent: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Image models that currently have at least one worker, busiest first.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response = self
            .http
            .get(self.endpoint("status/models"))
            .query(&[("type", "image")])
            .headers(self.build_headers()?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HordeError::Response(format!(
                "Model list failed ({}): {}",
                status.as_u16(),
                body
            )));
        }

        let mut models: Vec<ModelInfo> = response
            .json()
            .await
            .map_err(|e| HordeError::Response(e.to_string()))?;
        models.retain(|m| m.count > 0);
        models.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

        log::debug!("Horde reports {} active image models", models.len());
        Ok(models)
    }
}

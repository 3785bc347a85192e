//! reqwest-backed [`MapService`].

use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ConfigError, FetchError};
use crate::geo::{BoundingBox, UserId};
use crate::service::{Endpoint, MapService};
use crate::wire::ServiceResponse;

pub struct HttpMapService {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpMapService {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ConfigError::Invalid {
            field: "http_client",
            message: e.to_string(),
        })?;
        Ok(Self { client, config })
    }

    /// Reuse an existing client (connection pool, custom TLS, ...).
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, endpoint: Endpoint) -> Result<Url, FetchError> {
        let path = match endpoint {
            Endpoint::ClearPins => self.config.clear_pins_path.as_str(),
            other => other.default_path(),
        };
        self.config
            .base_url
            .join(path)
            .map_err(|e| FetchError::failed(format!("invalid endpoint url for {path}: {e}")))
    }

    async fn get(
        &self,
        endpoint: Endpoint,
        query: &[(&str, &str)],
    ) -> Result<ServiceResponse, FetchError> {
        let url = self.url(endpoint)?;
        debug!(%url, ?endpoint, "GET");

        let response = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "request failed");
                FetchError::failed(e)
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            warn!(%url, status, error = %e, "failed to read response body");
            FetchError::failed(e)
        })?;

        debug!(%url, status, bytes = body.len(), "response");
        Ok(ServiceResponse { status, body })
    }
}

impl MapService for HttpMapService {
    async fn get_data(&self, bounds: &BoundingBox) -> Result<ServiceResponse, FetchError> {
        let params = bounds.query_params();
        let query: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        self.get(Endpoint::GetData, &query).await
    }

    async fn get_area(&self, keyword: &str) -> Result<ServiceResponse, FetchError> {
        self.get(Endpoint::GetArea, &[("key", keyword)]).await
    }

    async fn get_pins(&self, user: Option<&UserId>) -> Result<ServiceResponse, FetchError> {
        match user {
            Some(user) => self.get(Endpoint::GetPins, &[("uid", user.as_str())]).await,
            None => self.get(Endpoint::GetPins, &[]).await,
        }
    }

    async fn add_pin(
        &self,
        user: &UserId,
        lat: &str,
        lng: &str,
    ) -> Result<ServiceResponse, FetchError> {
        self.get(
            Endpoint::AddPin,
            &[("uid", user.as_str()), ("ltd", lat), ("lng", lng)],
        )
        .await
    }

    async fn clear_pins(&self, user: &UserId) -> Result<ServiceResponse, FetchError> {
        self.get(Endpoint::ClearPins, &[("uid", user.as_str())]).await
    }
}

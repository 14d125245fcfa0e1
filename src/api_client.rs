// Client for the external prediction / recommendation / catalog API.
//
// One reqwest client is built from Settings at startup and shared. Auth tokens
// come from a TokenProvider so nothing here reads global state.

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::{fmt, sync::Arc, time::Duration};
use tokio::time::sleep;

use crate::{
    config::Settings,
    error::ApiError,
    models::{
        Car, CarListQuery, PredictionFeatureVector, PredictionOutput, RecommendationQuery,
        RecommendationsResponse,
    },
};

const USER_AGENT: &str = concat!("car_advisor/", env!("CARGO_PKG_VERSION"));

// Supplies the bearer token for upstream calls
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

#[derive(Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    // Parsed once so path segments can be appended safely
    base: Url,
    tokens: Arc<dyn TokenProvider>,
    max_retries: u32,
    retry_delay: Duration,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let tokens = Arc::new(StaticTokenProvider::new(settings.api_token.clone()));
        Self::with_token_provider(settings, tokens)
    }

    pub fn with_token_provider(
        settings: &Settings,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        let base_url = settings.api_base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&base_url)
            .with_context(|| format!("Invalid API base URL '{base_url}'"))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("API base URL '{base_url}' cannot carry a path");
        }

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.request_timeout());
        if let Some(proxy_url) = settings.proxy_url.as_deref().filter(|p| !p.is_empty()) {
            let proxy = reqwest::Proxy::all(proxy_url)
                .with_context(|| format!("Invalid proxy URL '{proxy_url}'"))?;
            builder = builder.proxy(proxy);
            tracing::info!("Routing upstream API traffic through configured proxy.");
        }
        let http = builder.build().context("Failed to build reqwest client")?;

        Ok(Self {
            http,
            base_url,
            base,
            tokens,
            max_retries: settings.max_retries,
            retry_delay: settings.retry_delay(),
        })
    }

    // Same client, but calls carry `token` instead of the configured one
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            tokens: Arc::new(StaticTokenProvider::new(Some(token.into()))),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn predict_price(
        &self,
        features: &PredictionFeatureVector,
    ) -> Result<PredictionOutput, ApiError> {
        let url = self.url("/v1/predict/");
        self.send_json(Method::POST, url, |req| req.json(features)).await
    }

    pub async fn list_predictions(&self) -> Result<Vec<serde_json::Value>, ApiError> {
        let url = self.url("/v1/predict/predictions");
        self.send_json(Method::GET, url, |req| req).await
    }

    pub async fn recommend(
        &self,
        query: &RecommendationQuery,
    ) -> Result<RecommendationsResponse, ApiError> {
        let url = self.url(query.endpoint());
        self.send_json(Method::POST, url, |req| req.json(query)).await
    }

    pub async fn get_car(&self, car_id: &str) -> Result<Car, ApiError> {
        let url = self.car_url(car_id)?;
        self.send_json(Method::GET, url, |req| req).await
    }

    pub async fn list_cars(&self, query: &CarListQuery) -> Result<Vec<Car>, ApiError> {
        let url = self.url("/v1/cars");
        self.send_json(Method::GET, url, |req| req.query(query)).await
    }

    // Fixed endpoint paths only, never caller input
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // The id always travels as one percent-encoded segment under /v1/cars
    fn car_url(&self, car_id: &str) -> Result<String, ApiError> {
        if car_id.trim().is_empty() || matches!(car_id, "." | "..") {
            return Err(ApiError::InvalidCarId(car_id.to_string()));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidCarId(car_id.to_string()))?
            .pop_if_empty()
            .extend(["v1", "cars"])
            .push(car_id);
        Ok(url.into())
    }

    async fn send_json<T, F>(&self, method: Method, url: String, build: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let response = self.send_with_retry(&method, &url, build).await?;
        response.json::<T>().await.map_err(|source| ApiError::Decode { url, source })
    }

    // Retries transport failures and 5xx with exponential backoff, like the
    // page fetcher this grew out of. The last error is always returned.
    async fn send_with_retry<F>(
        &self,
        method: &Method,
        url: &str,
        build: F,
    ) -> Result<Response, ApiError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let mut retry_delay = self.retry_delay;
        let mut attempt = 0;
        loop {
            tracing::debug!(%method, url, attempt, "Sending upstream request");
            let result = match self.attempt(method, url, &build).await {
                Ok(response) => Self::check_status(url, response).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    tracing::warn!(
                        %method,
                        url,
                        attempt,
                        error = %e,
                        "Upstream request failed. Retrying..."
                    );
                    sleep(retry_delay).await;
                    retry_delay *= 2;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(%method, url, attempt, error = %e, "Upstream request failed");
                    return Err(e);
                }
            }
        }
    }

    async fn attempt<F>(&self, method: &Method, url: &str, build: &F) -> Result<Response, ApiError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let mut request = build(self.http.request(method.clone(), url));
        if let Some(token) = self.tokens.token() {
            request = request.bearer_auth(token);
        }
        request
            .send()
            .await
            .map_err(|source| ApiError::Request { url: url.to_string(), source })
    }

    async fn check_status(url: &str, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "[Failed to read response body]".to_string());
        tracing::debug!(url, status = %status, response_body = body.as_str(), "HTTP error details");
        Err(ApiError::Status { url: url.to_string(), status, body })
    }
}

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::types::{BuildResponse, ExecuteRequest};
use super::{
    Backend, BackendError, BuildRequest, ExaminerStatsRequest, RangeStatsRequest, ResultSet,
    TotalStats,
};
use crate::export::ExportFormat;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Clone, Debug)]
pub struct HttpOptions {
    pub api_url: String,
    /// No timeout is applied unless one is configured.
    pub timeout_seconds: Option<u64>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: None,
        }
    }
}

/// `Backend` over JSON/HTTP with a single shared reqwest client.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(options: &HttpOptions) -> Result<Self, BackendError> {
        let base_url = options.api_url.trim().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| BackendError::InvalidBaseUrl {
            url: options.api_url.clone(),
            message: e.to_string(),
        })?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(concat!(
                "patentscope/",
                env!("CARGO_PKG_VERSION")
            )),
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(seconds) = options.timeout_seconds.filter(|s| *s > 0) {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::HttpClientBuild { source: e })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn send(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<u8>, BackendError> {
        debug!(endpoint, "sending backend request");
        let response = request.send().await.map_err(|e| BackendError::Transport {
            endpoint: endpoint.to_string(),
            source: e,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport {
                endpoint: endpoint.to_string(),
                source: e,
            })?;
        debug!(endpoint, bytes = body.len(), "backend response received");
        Ok(body.to_vec())
    }

    async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request = self.client.post(self.url(endpoint)).json(body);
        let bytes = self.send(endpoint, request).await?;
        decode(endpoint, &bytes)
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, bytes: &[u8]) -> Result<T, BackendError> {
    serde_json::from_slice(bytes).map_err(|e| BackendError::Decode {
        endpoint: endpoint.to_string(),
        source: e,
    })
}

#[async_trait]
impl Backend for HttpBackend {
    async fn build_query(&self, request: &BuildRequest) -> Result<String, BackendError> {
        let response: BuildResponse = self.post_json(request.endpoint(), request).await?;
        Ok(response.solr_query_url)
    }

    async fn execute_query(&self, locator: &str) -> Result<ResultSet, BackendError> {
        let body = ExecuteRequest {
            solr_query_url: locator,
        };
        self.post_json("/execute-query", &body).await
    }

    async fn total_stats(&self) -> Result<TotalStats, BackendError> {
        let endpoint = "/stats/total";
        let request = self.client.get(self.url(endpoint));
        let bytes = self.send(endpoint, request).await?;
        decode(endpoint, &bytes)
    }

    async fn examiner_stats(&self, request: &ExaminerStatsRequest) -> Result<Value, BackendError> {
        self.post_json("/stats/examiners-by-date", request).await
    }

    async fn range_stats(&self, request: &RangeStatsRequest) -> Result<Value, BackendError> {
        self.post_json("/stats/by-date-range", request).await
    }

    async fn download(
        &self,
        format: ExportFormat,
        results: &ResultSet,
    ) -> Result<Vec<u8>, BackendError> {
        let endpoint = format.endpoint();
        let request = self.client.post(self.url(endpoint)).json(results);
        self.send(endpoint, request).await
    }
}

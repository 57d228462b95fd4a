//! The remote query-building, execution, statistics and export services,
//! consumed only through their request/response contracts.

mod http;
pub mod types;

pub use http::{HttpBackend, HttpOptions, DEFAULT_API_URL};
pub use types::{
    BuildRequest, ExaminerStatsRequest, RangeStatsRequest, Record, ResultSet, TotalStats,
};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::export::ExportFormat;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid API url '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything the console asks of the backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Posts a filter payload and returns the query locator (`solr_query_url`).
    async fn build_query(&self, request: &BuildRequest) -> Result<String, BackendError>;

    async fn execute_query(&self, locator: &str) -> Result<ResultSet, BackendError>;

    async fn total_stats(&self) -> Result<TotalStats, BackendError>;

    /// Raw `/stats/examiners-by-date` payload; decoded by `crate::stats`.
    async fn examiner_stats(&self, request: &ExaminerStatsRequest) -> Result<Value, BackendError>;

    /// Raw `/stats/by-date-range` payload, keyed by `<type>s`.
    async fn range_stats(&self, request: &RangeStatsRequest) -> Result<Value, BackendError>;

    async fn download(
        &self,
        format: ExportFormat,
        results: &ResultSet,
    ) -> Result<Vec<u8>, BackendError>;
}

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::infra::endpoint_url;
use crate::services::MetadataCatalog;

/// Client for the DBS reader API.
pub struct DbsClient {
    http: Client,
    base_url: String,
}

impl DbsClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Any non-empty JSON result means the entry exists.
    async fn has_results(&self, path: &str, param: &str, value: &str) -> AppResult<bool> {
        let url = endpoint_url(&self.base_url, &[path])?;
        let response = self
            .http
            .get(url)
            .query(&[(param, value)])
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| AppError::Catalog(format!("failed to call DBS: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Catalog(format!("DBS responded with {status}")));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| AppError::Catalog(format!("failed to parse DBS response: {err}")))?;
        let found = match &payload {
            Value::Null => false,
            Value::Array(items) => !items.is_empty(),
            Value::Object(fields) => !fields.is_empty(),
            _ => true,
        };
        debug!(path, value, found, "DBS lookup");
        Ok(found)
    }
}

#[async_trait]
impl MetadataCatalog for DbsClient {
    async fn dataset_exists(&self, dataset: &str) -> AppResult<bool> {
        self.has_results("datasets", "dataset", dataset).await
    }

    async fn run_exists(&self, run: &str) -> AppResult<bool> {
        self.has_results("runs", "run_num", run).await
    }
}

use async_trait::async_trait;

use crate::error::AppResult;

/// Dataset and run lookups against the data bookkeeping catalog.
#[async_trait]
pub trait MetadataCatalog: Send + Sync {
    async fn dataset_exists(&self, dataset: &str) -> AppResult<bool>;
    async fn run_exists(&self, run: &str) -> AppResult<bool>;
}

#[async_trait]
pub trait ReleaseCatalog: Send + Sync {
    async fn release_exists(&self, release: &str) -> AppResult<bool>;
}

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::infra::endpoint_url;
use crate::services::ReleaseCatalog;

const CMSSW_OWNER: &str = "cms-sw";
const CMSSW_REPOSITORY: &str = "cmssw";

/// Checks release tags on the GitHub releases API.
pub struct GithubReleases {
    http: Client,
    base_url: String,
}

impl GithubReleases {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn release_endpoint(&self, release: &str) -> AppResult<Url> {
        endpoint_url(
            &self.base_url,
            &["repos", CMSSW_OWNER, CMSSW_REPOSITORY, "releases", "tags", release.trim()],
        )
    }
}

#[async_trait]
impl ReleaseCatalog for GithubReleases {
    async fn release_exists(&self, release: &str) -> AppResult<bool> {
        let response = self
            .http
            .head(self.release_endpoint(release)?)
            .send()
            .await
            .map_err(|err| AppError::Catalog(format!("failed to call GitHub: {err}")))?;

        let status = response.status();
        debug!(release, %status, "release lookup");
        match status {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => Err(AppError::Catalog(format!(
                "GitHub responded with {other} for release {release}"
            ))),
        }
    }
}

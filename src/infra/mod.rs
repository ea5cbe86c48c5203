pub mod dbs;
pub mod github;
pub mod ticket_api;

use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Identity, Url};

use crate::error::{AppError, AppResult};

/// Shared HTTP client settings: a request timeout and, for the data
/// bookkeeping service, an optional grid certificate identity.
pub fn http_client(timeout: Duration, identity: Option<Identity>) -> AppResult<Client> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("relval/", env!("CARGO_PKG_VERSION")));
    if let Some(identity) = identity {
        builder = builder.use_rustls_tls().identity(identity);
    }
    builder
        .build()
        .map_err(|err| AppError::Configuration(format!("failed to build HTTP client: {err}")))
}

/// Loads a PEM certificate and private key into a client identity.
pub fn grid_identity(cert: &Path, key: &Path) -> AppResult<Identity> {
    let mut pem = fs::read(cert)?;
    pem.push(b'\n');
    pem.extend(fs::read(key)?);
    Identity::from_pem(&pem)
        .map_err(|err| AppError::Configuration(format!("invalid grid certificate or key: {err}")))
}

/// Appends path segments to a base URL. Each segment is percent-encoded, so
/// user input such as a prepid or release name stays a single segment.
pub fn endpoint_url(base_url: &str, segments: &[&str]) -> AppResult<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|err| AppError::Configuration(format!("invalid URL {base_url}: {err}")))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Configuration(format!("URL {base_url} cannot take a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AppError, AppResult};

const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_DBS_URL: &str = "https://cmsweb.cern.ch/dbs/prod/global/DBSReader";
const DEFAULT_GITHUB_URL: &str = "https://api.github.com";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub api_user: Option<String>,
    pub api_password: Option<String>,
    pub dbs_url: String,
    pub github_url: String,
    pub grid_cert: Option<PathBuf>,
    pub grid_key: Option<PathBuf>,
    pub check_release: bool,
    pub http_timeout: Duration,
    pub user: String,
}

impl AppConfig {
    /// Stored config file, overridden by `RELVAL_*` environment variables.
    pub fn load() -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Ok(Self::resolve(stored, |name| env::var(name).ok()))
    }

    fn resolve(stored: StoredConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |name: &str, stored: Option<String>| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .or(stored.filter(|value| !value.trim().is_empty()))
        };

        let check_release = pick("RELVAL_CHECK_RELEASE", stored.check_release)
            .map(|value| parse_flag(&value))
            .unwrap_or(true);
        let timeout_secs = pick("RELVAL_HTTP_TIMEOUT_SECS", stored.http_timeout_secs)
            .and_then(|value| match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(secs),
                _ => {
                    warn!(value = %value, "ignoring invalid HTTP timeout");
                    None
                }
            })
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        let user = pick("RELVAL_USER", stored.user)
            .or_else(|| lookup("USER"))
            .unwrap_or_else(|| "anonymous".to_string());

        Self {
            api_url: pick("RELVAL_API_URL", stored.api_url),
            api_token: pick("RELVAL_API_TOKEN", stored.api_token),
            api_user: pick("RELVAL_API_USER", stored.api_user),
            api_password: pick("RELVAL_API_PASSWORD", stored.api_password),
            dbs_url: pick("RELVAL_DBS_URL", stored.dbs_url)
                .unwrap_or_else(|| DEFAULT_DBS_URL.to_string()),
            github_url: pick("RELVAL_GITHUB_URL", stored.github_url)
                .unwrap_or_else(|| DEFAULT_GITHUB_URL.to_string()),
            grid_cert: pick("RELVAL_GRID_CERT", stored.grid_cert).map(PathBuf::from),
            grid_key: pick("RELVAL_GRID_KEY", stored.grid_key).map(PathBuf::from),
            check_release,
            http_timeout: Duration::from_secs(timeout_secs),
            user,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

/// The on-disk configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbs_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_release: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        let path = config_file_path()?;
        match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                AppError::Configuration(format!("invalid config file {}: {err}", path.display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        let path = config_file_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    if let Some(dir) = env::var_os("RELVAL_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(dir).join("relval"));
    }
    env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".config").join("relval"))
        .ok_or_else(|| {
            AppError::Configuration("cannot locate a config directory; set RELVAL_CONFIG_DIR".to_string())
        })
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

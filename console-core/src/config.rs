//! Console configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = concat!("console-core/", env!("CARGO_PKG_VERSION"));

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// The API base URL does not parse or cannot hold a path.
    #[error("invalid API base URL {value:?}: {message}")]
    InvalidBaseUrl {
        /// Configured value.
        value: String,
        /// Why it was rejected.
        message: String,
    },
    /// The request timeout is zero.
    #[error("request timeout must be at least one second")]
    ZeroTimeout,
}

/// Settings for reaching the REST API.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "AREA_CONSOLE")]
pub struct ConsoleSettings {
    /// Base URL the area, camera, report, and user endpoints hang off.
    pub api_base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// User agent sent with every request.
    pub user_agent: Option<String>,
}

impl ConsoleSettings {
    /// Parsed base URL, falling back to the local default.
    ///
    /// # Errors
    ///
    /// [`SettingsError::InvalidBaseUrl`] when the value does not parse or is
    /// not a hierarchical URL.
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        let raw = self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL);
        let invalid = |message: String| SettingsError::InvalidBaseUrl {
            value: raw.to_owned(),
            message,
        };
        let url = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot hold a path".to_owned()));
        }
        Ok(url)
    }

    /// Request timeout, falling back to 30 seconds.
    ///
    /// # Errors
    ///
    /// [`SettingsError::ZeroTimeout`] when configured as zero.
    pub fn request_timeout(&self) -> Result<Duration, SettingsError> {
        match self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS) {
            0 => Err(SettingsError::ZeroTimeout),
            secs => Ok(Duration::from_secs(secs)),
        }
    }

    /// User agent, falling back to the crate name and version.
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}

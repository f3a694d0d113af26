//! Console configuration.
//!
//! Configuration is read from `console.toml` in the platform configuration
//! directory (e.g. `~/.config/jornet-console/console.toml` on Linux). A
//! missing file yields defaults. `JORNET_CONSOLE_URL` overrides the server
//! origin.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::guard::DEFAULT_REDIRECT_DELAY;
use crate::provider::{ProviderConfig, GITHUB_AUTHORIZE_URL};

/// Environment variable overriding [`ConsoleConfig::base_url`].
pub const BASE_URL_ENV: &str = "JORNET_CONSOLE_URL";

const CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Server origin all endpoints are joined onto.
    pub base_url: String,

    /// Delay before an unauthenticated view redirects to the connect form.
    pub redirect_delay_ms: u64,

    /// OAuth provider authorize endpoint.
    pub oauth_authorize_url: String,

    pub user_agent: String,

    /// Logging level.
    pub log_level: String,

    /// Path of the file this configuration was loaded from.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            redirect_delay_ms: DEFAULT_REDIRECT_DELAY.as_millis() as u64,
            oauth_authorize_url: GITHUB_AUTHORIZE_URL.to_string(),
            user_agent: format!("jornet-console/{}", env!("CARGO_PKG_VERSION")),
            log_level: "info".to_string(),
            config_path: None,
        }
    }
}

impl ConsoleConfig {
    /// Parsed server origin.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url).map_err(|source| ConfigError::InvalidUrl {
            field: "base_url",
            source,
        })
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    /// OAuth provider described by this configuration.
    pub fn provider(&self) -> Result<ProviderConfig, ConfigError> {
        Url::parse(&self.oauth_authorize_url).map_err(|source| ConfigError::InvalidUrl {
            field: "oauth_authorize_url",
            source,
        })?;
        Ok(ProviderConfig::github().with_auth_url(self.oauth_authorize_url.clone()))
    }

    /// Check every URL field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        self.provider()?;
        Ok(())
    }

    /// Replace the server origin.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Default configuration file location.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    project_dirs()
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
        .ok_or(ConfigError::DirectoryUnavailable)
}

/// Load configuration from an explicit file, which must exist.
pub fn load_config_from_path(path: &Path) -> Result<ConsoleConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut config: ConsoleConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    config.config_path = Some(path.to_path_buf());
    Ok(config)
}

/// Load configuration from `path`, or from the default location.
///
/// A missing default file yields defaults. The environment override is
/// applied last and the result is validated.
pub fn load_config(path: Option<&Path>) -> Result<ConsoleConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config_from_path(path)?,
        None => match default_config_path() {
            Ok(default_path) if default_path.exists() => load_config_from_path(&default_path)?,
            _ => ConsoleConfig::default(),
        },
    };

    if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
        if !base_url.is_empty() {
            config.base_url = base_url;
        }
    }

    config.validate()?;
    Ok(config)
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "jornet", "jornet-console")
}

//! Server configuration.
//!
//! - `VERIDICTUM_API_URL`: API base URL (default `https://veridictum.legal`)
//! - `VERIDICTUM_API_KEY`: API key, takes priority over the config file
//! - `VERIDICTUM_CONFIG_FILE`: credential file path (default `~/.veridictum/config.json`)
//! - `VERIDICTUM_CREDENTIAL_MODE`: `file` (default) or `env`

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://veridictum.legal";
pub const WEBSITE_URL: &str = "https://veridictum.legal";

pub const API_URL_ENV: &str = "VERIDICTUM_API_URL";
pub const API_KEY_ENV: &str = "VERIDICTUM_API_KEY";
pub const CONFIG_FILE_ENV: &str = "VERIDICTUM_CONFIG_FILE";
pub const CREDENTIAL_MODE_ENV: &str = "VERIDICTUM_CREDENTIAL_MODE";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const SETUP_TIMEOUT: Duration = Duration::from_secs(15);

/// Where API keys may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    /// Environment variable only. No setup tool is exposed.
    EnvOnly,
    /// Environment variable, then the local config file. Exposes `setup_api_key`.
    ConfigFile,
}

impl CredentialMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "env" | "env-only" => Some(Self::EnvOnly),
            "file" | "config" => Some(Self::ConfigFile),
            _ => None,
        }
    }
}

/// Everything the dispatcher needs, passed in at construction.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub api_url: String,
    pub env_api_key: Option<String>,
    pub mode: CredentialMode,
    pub config_file: PathBuf,
    pub request_timeout: Duration,
    pub setup_timeout: Duration,
}

impl ServerConfig {
    /// Config with the given base URL, no env key and file mode at the default path.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: normalize_url(api_url.into()),
            env_api_key: None,
            mode: CredentialMode::ConfigFile,
            config_file: default_config_file(),
            request_timeout: REQUEST_TIMEOUT,
            setup_timeout: SETUP_TIMEOUT,
        }
    }

    /// Build config from the process environment.
    pub fn from_env() -> Self {
        let api_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(api_url);

        config.env_api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());

        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            if !path.trim().is_empty() {
                config.config_file = PathBuf::from(path);
            }
        }

        if let Ok(mode) = std::env::var(CREDENTIAL_MODE_ENV) {
            match CredentialMode::parse(&mode) {
                Some(mode) => config.mode = mode,
                None => tracing::warn!(
                    "[CONFIG] Ignoring unknown {}={:?}, using config-file mode",
                    CREDENTIAL_MODE_ENV,
                    mode
                ),
            }
        }

        config
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.env_api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    pub fn with_mode(mut self, mode: CredentialMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = path.into();
        self
    }

    pub fn setup_enabled(&self) -> bool {
        self.mode == CredentialMode::ConfigFile
    }
}

/// `~/.veridictum/config.json`, or a relative `.veridictum/config.json` when no home is known.
pub fn default_config_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".veridictum")
        .join("config.json")
}

fn normalize_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

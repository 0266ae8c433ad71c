//! API key resolution.
//!
//! Resolution order:
//! 1. `VERIDICTUM_API_KEY` (captured in [`ServerConfig`])
//! 2. The local config file, in config-file mode only
//! 3. Nothing: the caller reports "not configured"
//!
//! Reading never fails. Unreadable or malformed files resolve to no key.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{CredentialMode, ServerConfig};

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("credential file storage is disabled in env-only mode")]
    SetupDisabled,
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode credential file: {0}")]
    Encode(#[from] serde_json::Error),
}

/// On-disk shape of `config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CredentialResolver {
    env_key: Option<String>,
    mode: CredentialMode,
    config_file: PathBuf,
}

impl CredentialResolver {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            env_key: config.env_api_key.clone(),
            mode: config.mode,
            config_file: config.config_file.clone(),
        }
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Resolve the key to use for one call. Re-reads the file each time so a
    /// key saved by `setup_api_key` is picked up without a restart.
    pub fn resolve(&self) -> Option<String> {
        if let Some(key) = self.env_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Some(key.to_string());
        }

        match self.mode {
            CredentialMode::EnvOnly => None,
            CredentialMode::ConfigFile => read_key_file(&self.config_file),
        }
    }

    /// Persist `api_key` with owner-only permissions. Returns the file path.
    pub fn save(&self, api_key: &str, api_url: &str) -> Result<PathBuf, CredentialError> {
        if self.mode == CredentialMode::EnvOnly {
            return Err(CredentialError::SetupDisabled);
        }

        if let Some(dir) = self.config_file.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let stored = StoredCredentials {
            api_key: api_key.to_string(),
            api_url: Some(api_url.to_string()),
        };
        let body = serde_json::to_string_pretty(&stored)?;

        let mut file = open_private(&self.config_file)?;
        file.write_all(body.as_bytes())?;
        file.flush()?;
        drop(file);
        restrict_permissions(&self.config_file)?;

        tracing::info!("[CREDENTIALS] Saved API key to {}", self.config_file.display());
        Ok(self.config_file.clone())
    }
}

fn read_key_file(path: &Path) -> Option<String> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!("[CREDENTIALS] Could not read {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<StoredCredentials>(&raw) {
        Ok(stored) => {
            let key = stored.api_key.trim();
            (!key.is_empty()).then(|| key.to_string())
        }
        Err(e) => {
            tracing::warn!("[CREDENTIALS] Ignoring malformed {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

// `mode` only applies on create, so an existing file is tightened explicitly.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_API_URL;

    fn resolver_for(dir: &tempfile::TempDir) -> CredentialResolver {
        let config = ServerConfig::new(DEFAULT_API_URL)
            .with_config_file(dir.path().join(".veridictum").join("config.json"));
        CredentialResolver::new(&config)
    }

    #[test]
    fn env_key_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_key": "file-key"}"#).unwrap();

        let config = ServerConfig::new(DEFAULT_API_URL)
            .with_api_key("env-key")
            .with_config_file(&path);
        assert_eq!(CredentialResolver::new(&config).resolve().as_deref(), Some("env-key"));
    }

    #[test]
    fn falls_back_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_key": "file-key", "api_url": "https://veridictum.legal"}"#).unwrap();

        let config = ServerConfig::new(DEFAULT_API_URL).with_config_file(&path);
        assert_eq!(CredentialResolver::new(&config).resolve().as_deref(), Some("file-key"));
    }

    #[test]
    fn missing_file_is_unconfigured() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolver_for(&dir).resolve(), None);
    }

    #[test]
    fn malformed_file_is_unconfigured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = ServerConfig::new(DEFAULT_API_URL).with_config_file(&path);
        assert_eq!(CredentialResolver::new(&config).resolve(), None);
    }

    #[test]
    fn empty_key_in_file_is_unconfigured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_key": ""}"#).unwrap();

        let config = ServerConfig::new(DEFAULT_API_URL).with_config_file(&path);
        assert_eq!(CredentialResolver::new(&config).resolve(), None);
    }

    #[test]
    fn env_only_mode_ignores_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_key": "file-key"}"#).unwrap();

        let config = ServerConfig::new(DEFAULT_API_URL)
            .with_config_file(&path)
            .with_mode(CredentialMode::EnvOnly);
        assert_eq!(CredentialResolver::new(&config).resolve(), None);
    }

    #[test]
    fn save_then_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver_for(&dir);

        let path = resolver.save("vd_live_123", DEFAULT_API_URL).unwrap();
        assert!(path.exists());
        assert_eq!(resolver.resolve().as_deref(), Some("vd_live_123"));

        let stored: StoredCredentials =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored.api_url.as_deref(), Some(DEFAULT_API_URL));
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver_for(&dir);
        fs::create_dir_all(resolver.config_file().parent().unwrap()).unwrap();
        fs::write(resolver.config_file(), "{}").unwrap();
        fs::set_permissions(resolver.config_file(), fs::Permissions::from_mode(0o644)).unwrap();

        let path = resolver.save("vd_live_123", DEFAULT_API_URL).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn save_refused_in_env_only_mode() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::new(DEFAULT_API_URL)
            .with_config_file(dir.path().join("config.json"))
            .with_mode(CredentialMode::EnvOnly);

        let err = CredentialResolver::new(&config).save("k", DEFAULT_API_URL).unwrap_err();
        assert!(matches!(err, CredentialError::SetupDisabled));
    }
}

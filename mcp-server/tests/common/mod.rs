//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;
use veridictum_mcp::{CredentialMode, ServerConfig, ToolDispatcher};

pub const TEST_KEY: &str = "vd_test_4f8a";

/// Config pointed at `base_url` with an isolated, initially missing credential file.
pub fn config(base_url: &str, dir: &TempDir) -> ServerConfig {
    ServerConfig::new(base_url).with_config_file(config_path(dir))
}

pub fn config_path(dir: &TempDir) -> PathBuf {
    dir.path().join(".veridictum").join("config.json")
}

pub fn dispatcher_with_key(base_url: &str, dir: &TempDir) -> ToolDispatcher {
    ToolDispatcher::new(config(base_url, dir).with_api_key(TEST_KEY))
}

pub fn unconfigured_dispatcher(base_url: &str, dir: &TempDir, mode: CredentialMode) -> ToolDispatcher {
    ToolDispatcher::new(config(base_url, dir).with_mode(mode))
}

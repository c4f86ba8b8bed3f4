use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional TOML configuration. Every field overrides its CLI counterpart.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub storage: Option<String>,
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub log_dir: Option<String>,
    /// Size in KiB past which the log file is rotated.
    pub log_max_size_kib: Option<u64>,

    pub auth: Option<AuthConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub jwt_refresh_secret: Option<String>,
    pub access_token_ttl_sec: Option<u64>,
    pub refresh_token_ttl_sec: Option<u64>,
    /// Argon2 memory cost in KiB.
    pub hash_memory_kib: Option<u32>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

mod file_config;

pub use file_config::{AuthConfig, FileConfig};

use crate::logging::{
    LogFileSettings, DEFAULT_KEPT_LOG_FILES, DEFAULT_LOG_DIR, DEFAULT_LOG_MAX_SIZE_KIB,
};
use crate::server::{RequestsLoggingLevel, ServerConfig};
use crate::user::TokenSettings;
use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const JWT_SECRET_ENV: &str = "JWT_SECRET_KEY";
pub const JWT_REFRESH_SECRET_ENV: &str = "JWT_SECRET_REFRESH_KEY";
/// Log rotation threshold in KiB.
pub const LOG_MAX_SIZE_ENV: &str = "LOG_MAX_SIZE";

/// Argon2 refuses less than 8 KiB per lane.
const MIN_HASH_MEMORY_KIB: u32 = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    /// Everything is lost on restart.
    #[default]
    Memory,
    /// `library.db` and `user.db` inside `db_dir`.
    Sqlite,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub storage: StorageBackend,
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub log_dir: Option<PathBuf>,
    pub log_max_size_kib: Option<u64>,
    pub jwt_secret: Option<String>,
    pub jwt_refresh_secret: Option<String>,
    pub access_token_ttl_sec: u64,
    pub refresh_token_ttl_sec: u64,
    pub hash_memory_kib: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageBackend,
    /// Only set, and then guaranteed to exist, for SQLite storage.
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub log_files: LogFileSettings,

    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    pub access_token_ttl_sec: u64,
    pub refresh_token_ttl_sec: u64,
    pub hash_memory_kib: u32,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present; secrets missing from
    /// both are read from the environment.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();
        let auth = file.auth.unwrap_or_default();

        let storage = match file.storage {
            Some(s) => StorageBackend::from_str(&s, true)
                .map_err(|_| anyhow!("Unknown storage backend in config file: {}", s))?,
            None => cli.storage,
        };

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone());
        let db_dir = match storage {
            StorageBackend::Memory => None,
            StorageBackend::Sqlite => {
                let db_dir = db_dir.ok_or_else(|| {
                    anyhow!("db_dir must be specified via --db-dir or in config file for sqlite storage")
                })?;
                if !db_dir.exists() {
                    bail!("Database directory does not exist: {:?}", db_dir);
                }
                if !db_dir.is_dir() {
                    bail!("db_dir is not a directory: {:?}", db_dir);
                }
                Some(db_dir)
            }
        };

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let log_files = LogFileSettings {
            dir: file
                .log_dir
                .map(PathBuf::from)
                .or_else(|| cli.log_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            max_size_kib: pick_log_max_size(
                file.log_max_size_kib,
                cli.log_max_size_kib,
                std::env::var(LOG_MAX_SIZE_ENV).ok(),
            )?,
            kept_files: DEFAULT_KEPT_LOG_FILES,
        };

        let jwt_secret = pick_secret(
            auth.jwt_secret,
            cli.jwt_secret.clone(),
            std::env::var(JWT_SECRET_ENV).ok(),
            JWT_SECRET_ENV,
        )?;
        let jwt_refresh_secret = pick_secret(
            auth.jwt_refresh_secret,
            cli.jwt_refresh_secret.clone(),
            std::env::var(JWT_REFRESH_SECRET_ENV).ok(),
            JWT_REFRESH_SECRET_ENV,
        )?;

        let access_token_ttl_sec = auth
            .access_token_ttl_sec
            .unwrap_or(cli.access_token_ttl_sec);
        let refresh_token_ttl_sec = auth
            .refresh_token_ttl_sec
            .unwrap_or(cli.refresh_token_ttl_sec);
        if access_token_ttl_sec == 0 || refresh_token_ttl_sec == 0 {
            bail!("Token lifetimes must be greater than zero");
        }

        let hash_memory_kib = auth.hash_memory_kib.unwrap_or(cli.hash_memory_kib);
        if hash_memory_kib < MIN_HASH_MEMORY_KIB {
            bail!(
                "hash_memory_kib must be at least {}, got {}",
                MIN_HASH_MEMORY_KIB,
                hash_memory_kib
            );
        }

        Ok(Self {
            storage,
            db_dir,
            port,
            metrics_port,
            logging_level,
            log_files,
            jwt_secret,
            jwt_refresh_secret,
            access_token_ttl_sec,
            refresh_token_ttl_sec,
            hash_memory_kib,
        })
    }

    pub fn library_db_path(&self) -> Option<PathBuf> {
        self.db_dir.as_ref().map(|dir| dir.join("library.db"))
    }

    pub fn user_db_path(&self) -> Option<PathBuf> {
        self.db_dir.as_ref().map(|dir| dir.join("user.db"))
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
        }
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            access_secret: self.jwt_secret.clone(),
            refresh_secret: self.jwt_refresh_secret.clone(),
            access_ttl: Duration::from_secs(self.access_token_ttl_sec),
            refresh_ttl: Duration::from_secs(self.refresh_token_ttl_sec),
        }
    }
}

fn pick_secret(
    file: Option<String>,
    cli: Option<String>,
    env: Option<String>,
    env_name: &str,
) -> Result<String> {
    file.or(cli)
        .or(env)
        .filter(|secret| !secret.is_empty())
        .ok_or_else(|| {
            anyhow!(
                "No JWT secret configured: pass it on the command line, in the config file or via {}",
                env_name
            )
        })
}

fn pick_log_max_size(file: Option<u64>, cli: Option<u64>, env: Option<String>) -> Result<u64> {
    let env = match env {
        Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
            anyhow!("{} must be a size in KiB, got {:?}", LOG_MAX_SIZE_ENV, raw)
        })?),
        None => None,
    };
    let size = file.or(cli).or(env).unwrap_or(DEFAULT_LOG_MAX_SIZE_KIB);
    if size == 0 {
        bail!("The log rotation size must be greater than zero");
    }
    Ok(size)
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::info;

use home_library_server::config::{AppConfig, CliConfig, FileConfig, StorageBackend};
use home_library_server::library::{InMemoryLibraryStore, LibraryStore, SqliteLibraryStore};
use home_library_server::logging::init_logging;
use home_library_server::server::config::{DEFAULT_METRICS_PORT, DEFAULT_PORT};
use home_library_server::server::{metrics, run_server, RequestsLoggingLevel};
use home_library_server::user::{
    auth::DEFAULT_HASH_MEMORY_KIB, CredentialsHasher, InMemoryUserStore, SqliteUserStore,
    TokenIssuer, UserManager, UserStore,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Optional TOML config file; its values override the flags below.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    #[clap(long, default_value = "memory")]
    pub storage: StorageBackend,

    /// Directory holding library.db and user.db (sqlite storage only).
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[clap(long, default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Where the rotated JSON log files go, `logs` by default.
    #[clap(long, value_parser = parse_path)]
    pub log_dir: Option<PathBuf>,

    /// Rotation threshold in KiB. Falls back to the LOG_MAX_SIZE environment
    /// variable, then 1024.
    #[clap(long)]
    pub log_max_size_kib: Option<u64>,

    /// Falls back to the JWT_SECRET_KEY environment variable.
    #[clap(long)]
    pub jwt_secret: Option<String>,

    /// Falls back to the JWT_SECRET_REFRESH_KEY environment variable.
    #[clap(long)]
    pub jwt_refresh_secret: Option<String>,

    #[clap(long, default_value_t = 3600)]
    pub access_token_ttl_sec: u64,

    #[clap(long, default_value_t = 86400)]
    pub refresh_token_ttl_sec: u64,

    #[clap(long, default_value_t = DEFAULT_HASH_MEMORY_KIB)]
    pub hash_memory_kib: u32,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            storage: self.storage,
            db_dir: self.db_dir.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            log_dir: self.log_dir.clone(),
            log_max_size_kib: self.log_max_size_kib,
            jwt_secret: self.jwt_secret.clone(),
            jwt_refresh_secret: self.jwt_refresh_secret.clone(),
            access_token_ttl_sec: self.access_token_ttl_sec,
            refresh_token_ttl_sec: self.refresh_token_ttl_sec,
            hash_memory_kib: self.hash_memory_kib,
        }
    }
}

fn open_stores(config: &AppConfig) -> Result<(Arc<dyn LibraryStore>, Box<dyn UserStore>)> {
    match (config.library_db_path(), config.user_db_path()) {
        (Some(library_db), Some(user_db)) if config.storage == StorageBackend::Sqlite => {
            info!("Opening SQLite library database at {:?}...", library_db);
            let library = SqliteLibraryStore::new(&library_db)?;
            info!("Opening SQLite user database at {:?}...", user_db);
            let users = SqliteUserStore::new(&user_db)?;
            Ok((Arc::new(library), Box::new(users)))
        }
        _ => {
            info!("Using volatile in-memory storage, data is lost on restart");
            Ok((
                Arc::new(InMemoryLibraryStore::new()),
                Box::new(InMemoryUserStore::new()),
            ))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let _logging = init_logging(Some(&config.log_files))?;
    if let Some(path) = &cli_args.config {
        info!("Loaded config file {:?}", path);
    }
    info!(
        "Logging to {:?}, rotating every {} KiB",
        config.log_files.dir, config.log_files.max_size_kib
    );
    info!("Storage backend: {}", config.storage);

    let (library, user_store) = open_stores(&config)?;

    info!("Initializing metrics...");
    metrics::init_metrics();
    metrics::refresh_all_library_items(library.as_ref());

    let user_manager = Arc::new(UserManager::new(
        user_store,
        CredentialsHasher::new(config.hash_memory_kib),
        TokenIssuer::new(config.token_settings()),
    ));

    run_server(config.server_config(), library, user_manager).await
}

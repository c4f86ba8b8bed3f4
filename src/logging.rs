//! Process-wide tracing setup.
//!
//! Events go to stdout in the usual human-readable form and, as JSON lines,
//! to `app_rCURRENT.log` inside the log directory. That file is rotated once it
//! grows past the configured size; older files are numbered and only the most
//! recent ones are kept. Panics anywhere in the process, including inside
//! spawned tasks, are logged at error level before the default hook runs.

use anyhow::{Context, Result};
use flexi_logger::writers::{ArcFileLogWriter, FileLogWriter, FileLogWriterHandle};
use flexi_logger::{Cleanup, Criterion, FileSpec, Naming, WriteMode};
use std::any::Any;
use std::path::PathBuf;
use std::sync::Once;
use tracing::{error, level_filters::LevelFilter};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_MAX_SIZE_KIB: u64 = 1024;
pub const DEFAULT_KEPT_LOG_FILES: usize = 10;

const LOG_FILE_BASENAME: &str = "app";

static PANIC_HOOK: Once = Once::new();

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFileSettings {
    pub dir: PathBuf,
    /// The live file is rotated once it holds more than this many KiB.
    pub max_size_kib: u64,
    /// Rotated files kept next to the live one.
    pub kept_files: usize,
}

impl LogFileSettings {
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_kib.saturating_mul(1024)
    }
}

/// Keeps the log file open. Dropping it flushes and closes the file.
pub struct LoggingGuard {
    _file_writer: FileLogWriterHandle,
}

fn rotating_file_writer(
    settings: &LogFileSettings,
) -> Result<(ArcFileLogWriter, FileLogWriterHandle)> {
    std::fs::create_dir_all(&settings.dir)
        .with_context(|| format!("Could not create log directory {:?}", settings.dir))?;

    FileLogWriter::builder(
        FileSpec::default()
            .directory(settings.dir.clone())
            .basename(LOG_FILE_BASENAME),
    )
    .rotate(
        Criterion::Size(settings.max_size_bytes()),
        Naming::Numbers,
        Cleanup::KeepLogFiles(settings.kept_files),
    )
    .write_mode(WriteMode::Direct)
    .append()
    .try_build_with_handle()
    .with_context(|| format!("Could not open a log file in {:?}", settings.dir))
}

/// Installs the global subscriber. The level filter comes from `LOG_LEVEL`
/// and defaults to `info`.
pub fn init_logging(files: Option<&LogFileSettings>) -> Result<Option<LoggingGuard>> {
    let (file_layer, guard) = match files {
        Some(settings) => {
            let (writer, handle) = rotating_file_writer(settings)?;
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(move || writer.clone());
            (
                Some(layer),
                Some(LoggingGuard {
                    _file_writer: handle,
                }),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(file_layer)
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Could not initialize logging")?;

    install_panic_hook();
    Ok(guard)
}

fn panic_payload(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|location| format!("{}:{}", location.file(), location.line()))
                .unwrap_or_else(|| "unknown location".to_string());
            let thread = std::thread::current();
            error!(
                thread = thread.name().unwrap_or("unnamed"),
                location = %location,
                "Uncaught panic: {}",
                panic_payload(info.payload())
            );
            previous(info);
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn settings(dir: &TempDir, max_size_kib: u64) -> LogFileSettings {
        LogFileSettings {
            dir: dir.path().join("logs"),
            max_size_kib,
            kept_files: DEFAULT_KEPT_LOG_FILES,
        }
    }

    fn log_files(settings: &LogFileSettings) -> Vec<PathBuf> {
        std::fs::read_dir(&settings.dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "log"))
            .collect()
    }

    fn write_lines(settings: &LogFileSettings, lines: usize, line_len: usize) {
        let (mut writer, handle) = rotating_file_writer(settings).unwrap();
        let line = format!("{}\n", "x".repeat(line_len - 1));
        for _ in 0..lines {
            writer.write_all(line.as_bytes()).unwrap();
        }
        writer.flush().unwrap();
        drop(writer);
        drop(handle);
    }

    #[test]
    fn max_size_is_given_in_kib() {
        let dir = TempDir::new().unwrap();
        assert_eq!(settings(&dir, 1).max_size_bytes(), 1024);
        assert_eq!(settings(&dir, 64).max_size_bytes(), 64 * 1024);
    }

    #[test]
    fn file_below_the_threshold_is_not_rotated() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, 1);

        write_lines(&settings, 3, 100);

        assert_eq!(log_files(&settings).len(), 1);
    }

    #[test]
    fn file_past_the_threshold_is_rotated() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, 1);

        // 4 KiB through a 1 KiB limit
        write_lines(&settings, 16, 256);

        let files = log_files(&settings);
        assert!(files.len() > 1, "expected rotated files, got {:?}", files);
        let written: u64 = files
            .iter()
            .map(|path| std::fs::metadata(path).unwrap().len())
            .sum();
        assert_eq!(written, 16 * 256);
    }

    #[test]
    fn panic_payloads_are_readable() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_payload(literal.as_ref()), "boom");

        let formatted: Box<dyn Any + Send> = Box::new(format!("bad id {}", 7));
        assert_eq!(panic_payload(formatted.as_ref()), "bad id 7");

        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_payload(other.as_ref()), "non-string panic payload");
    }
}

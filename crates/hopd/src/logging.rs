use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use hop_core::LoggingConfig;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::error::LogError;

/// File the logs go to, if any. `default_file` is set by executables whose
/// log is the only record of what they did.
pub fn log_file_path(config: &LoggingConfig, default_file: bool) -> Option<PathBuf> {
    if config.disable_file {
        return None;
    }
    config
        .file
        .clone()
        .or_else(|| default_file.then(LoggingConfig::default_file))
}

/// Stderr plus an optional append-only file. Initializing twice is a no-op.
///
/// An unopenable file is returned as an error after stderr logging is
/// installed, so callers can report it and carry on.
pub fn init_logging(config: &LoggingConfig, default_file: bool) -> Result<(), LogError> {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let opened = log_file_path(config, default_file).map(|path| open_log_file(&path));
    let (file, file_err) = match opened {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(err)) => (None, Some(err)),
        None => (None, None),
    };
    let file_layer = file.map(|file| {
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .try_init();
    match file_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn open_log_file(path: &Path) -> Result<File, LogError> {
    let open_err = |source| LogError::OpenFile {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(open_err)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(open_err)
}

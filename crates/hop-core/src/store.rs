//! Crash-safe JSON files: write a temporary sibling, then rename it over
//! the target. Readers see the old or the new content, never a mix.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write temporary file for {path}: {source}")]
    Stage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to replace {path}: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// New content fully written to a hidden temporary file next to `target`.
///
/// Dropping a `StagedFile` without calling [`StagedFile::commit`] deletes the
/// temporary file and leaves `target` untouched.
#[derive(Debug)]
pub struct StagedFile {
    target: PathBuf,
    temp: NamedTempFile,
}

impl StagedFile {
    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    pub fn commit(self) -> Result<PathBuf, StoreError> {
        let target = self.target;
        self.temp
            .persist(&target)
            .map_err(|err| StoreError::Replace {
                path: target.clone(),
                source: err.error,
            })?;
        Ok(target)
    }
}

pub fn stage_json<T: Serialize>(target: &Path, value: &T) -> Result<StagedFile, StoreError> {
    let parent = target
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })?;

    let body = serde_json::to_vec(value).map_err(|source| StoreError::Serialize {
        path: target.to_path_buf(),
        source,
    })?;

    let mut temp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|source| StoreError::Stage {
            path: target.to_path_buf(),
            source,
        })?;
    temp.write_all(&body)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|source| StoreError::Stage {
            path: target.to_path_buf(),
            source,
        })?;

    Ok(StagedFile {
        target: target.to_path_buf(),
        temp,
    })
}

pub fn write_json_atomic<T: Serialize>(target: &Path, value: &T) -> Result<PathBuf, StoreError> {
    stage_json(target, value)?.commit()
}

/// `Ok(None)` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let body = match fs::read(path) {
        Ok(body) => body,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_slice(&body)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

//! JSON document persistence
//!
//! Whole-document reads and writes. There is no locking and no
//! read-modify-write protection: two writers racing on the same file end with
//! the last write on disk.

use crate::core::error::StorageError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Read the document at `path`, creating it from `fallback` when missing
///
/// Creation uses `create_new`, so if another writer creates the file first
/// its content is read instead of being overwritten. Any other I/O or parse
/// failure is returned as-is.
pub async fn read_document<T>(path: &Path, fallback: T) -> Result<T, StorageError>
where
    T: Serialize + DeserializeOwned,
{
    match fs::read_to_string(path).await {
        Ok(content) => parse(path, &content),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if init_document(path, &fallback).await? {
                tracing::debug!(path = %path.display(), "initialized JSON document");
                Ok(fallback)
            } else {
                let content = fs::read_to_string(path)
                    .await
                    .map_err(|source| io_error(path, source))?;
                parse(path, &content)
            }
        }
        Err(source) => Err(io_error(path, source)),
    }
}

/// Serialize `value` as pretty JSON and overwrite `path`
pub async fn write_document<T>(path: &Path, value: &T) -> Result<(), StorageError>
where
    T: Serialize,
{
    ensure_parent(path).await?;
    let json = to_pretty(path, value)?;
    fs::write(path, json)
        .await
        .map_err(|source| io_error(path, source))
}

/// Create `path` with `value` unless it already exists; `false` if it did
async fn init_document<T: Serialize>(path: &Path, value: &T) -> Result<bool, StorageError> {
    ensure_parent(path).await?;
    let json = to_pretty(path, value)?;

    let mut file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(source) => return Err(io_error(path, source)),
    };

    file.write_all(json.as_bytes())
        .await
        .map_err(|source| io_error(path, source))?;
    file.flush()
        .await
        .map_err(|source| io_error(path, source))?;
    Ok(true)
}

async fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
            .await
            .map_err(|source| io_error(dir, source)),
        _ => Ok(()),
    }
}

fn parse<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T, StorageError> {
    serde_json::from_str(content).map_err(|source| StorageError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

fn to_pretty<T: Serialize>(path: &Path, value: &T) -> Result<String, StorageError> {
    serde_json::to_string_pretty(value).map_err(|source| StorageError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

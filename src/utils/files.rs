//! JSON document I/O.
//!
//! Every durable artifact in the pipeline (tier collections, checkpoints,
//! facets, run logs, override lists) is a pretty-printed JSON document. Writes
//! go through a temporary file in the destination directory followed by a
//! rename, so readers see either the previous document or the new one.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read and deserialize a JSON document
///
/// # Errors
///
/// Returns `FileError::Read` if the file cannot be read or `FileError::Parse`
/// if it is not valid JSON for `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, FileError> {
    let content = std::fs::read_to_string(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| FileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a JSON document, or return `T::default()` if the file does not exist
///
/// # Errors
///
/// Returns `FileError::Parse` if the file exists but is malformed.
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, FileError> {
    if path.exists() {
        read_json(path)
    } else {
        Ok(T::default())
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
///
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns `FileError::Write` if the directory or temp file cannot be created
/// or the rename fails, or `FileError::Serialize` if serialization fails.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), FileError> {
    let write_err = |source| FileError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut temp = NamedTempFile::new_in(parent).map_err(write_err)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, value).map_err(|source| {
            FileError::Serialize {
                path: path.to_path_buf(),
                source,
            }
        })?;
        writer.write_all(b"\n").map_err(write_err)?;
        writer.flush().map_err(write_err)?;
    }
    temp.as_file().sync_all().map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}

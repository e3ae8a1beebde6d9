use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::utils::files::{write_json, FileError};

/// Identifies one pipeline invocation; every step of the invocation logs under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    /// Hash of the current local time
    pub fn now() -> Self {
        Self::from_time(Local::now())
    }

    /// md5 hex digest of the timestamp, to nanosecond precision
    pub fn from_time(time: DateTime<Local>) -> Self {
        let stamp = time.format("%Y%m%d%H%M%S%.9f").to_string();
        Self(format!("{:x}", md5::compute(stamp.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Writes one raw output document per step invocation to
/// `{root}/steps/{step}/output-{run_id}.json`
#[derive(Debug, Clone)]
pub struct RunLog {
    root: PathBuf,
    run_id: RunId,
}

impl RunLog {
    pub fn new(root: impl Into<PathBuf>, run_id: RunId) -> Self {
        Self {
            root: root.into(),
            run_id,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, step: &str) -> PathBuf {
        self.root
            .join("steps")
            .join(step)
            .join(format!("output-{}.json", self.run_id))
    }

    /// # Errors
    ///
    /// Returns `FileError` if the document cannot be written.
    pub fn write<T: Serialize>(&self, step: &str, output: &T) -> Result<PathBuf, FileError> {
        let path = self.path(step);
        write_json(&path, output)?;
        Ok(path)
    }
}

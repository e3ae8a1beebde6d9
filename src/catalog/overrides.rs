use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::utils::files::{read_json, FileError};
use crate::utils::validation::validate_entity_id;

#[derive(Error, Debug)]
pub enum OverrideError {
    #[error("Failed to list override directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    File(#[from] FileError),
}

/// Manually curated corrections for one pipeline step, keyed by entity id.
///
/// Loaded once per run from `{overrides_root}/{step}/{entity_id}.json`. The
/// pipeline only ever reads these; they are authored out-of-band.
#[derive(Debug, Clone, Default)]
pub struct OverrideSet {
    step: String,
    documents: BTreeMap<String, Value>,
}

impl OverrideSet {
    /// An override set with no documents
    pub fn empty(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            documents: BTreeMap::new(),
        }
    }

    /// Load every override document for `step`. A missing directory is an empty set.
    ///
    /// Files whose stem is not a valid entity id are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `OverrideError` if the directory cannot be listed or a document
    /// cannot be parsed.
    pub fn load(overrides_root: &Path, step: &str) -> Result<Self, OverrideError> {
        let dir = overrides_root.join(step);
        let mut set = Self::empty(step);
        if !dir.is_dir() {
            debug!(step, "No override directory");
            return Ok(set);
        }

        let entries = std::fs::read_dir(&dir).map_err(|source| OverrideError::ReadDir {
            path: dir.clone(),
            source,
        })?;

        for entry in entries {
            let path = entry
                .map_err(|source| OverrideError::ReadDir {
                    path: dir.clone(),
                    source,
                })?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_entity_id(stem).is_err() {
                warn!(path = %path.display(), "Skipping override with invalid entity id");
                continue;
            }
            let document: Value = read_json(&path)?;
            set.documents.insert(stem.to_string(), document);
        }

        debug!(step, overrides = set.documents.len(), "Loaded overrides");
        Ok(set)
    }

    /// Add a document in memory
    pub fn insert(&mut self, entity_id: impl Into<String>, document: Value) {
        self.documents.insert(entity_id.into(), document);
    }

    pub fn step(&self) -> &str {
        &self.step
    }

    pub fn get(&self, entity_id: &str) -> Option<&Value> {
        self.documents.get(entity_id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Merge the override for `entity_id` into `payload`.
    ///
    /// Returns true if an override existed and was applied.
    pub fn apply(&self, entity_id: &str, payload: &mut Value) -> bool {
        match self.documents.get(entity_id) {
            Some(document) => {
                merge_json(payload, document);
                true
            }
            None => false,
        }
    }
}

/// Deep-merge `overlay` into `base`.
///
/// Objects merge key by key; any other overlay value replaces the base value.
pub fn merge_json(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

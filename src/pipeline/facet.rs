use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::utils::files::{read_json, write_json, FileError};
use crate::utils::validation::{validate_entity_id, ValidationError};

/// Domain holding per-structure facets
pub const STRUCTURES_DOMAIN: &str = "structures";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    InvalidEntityId(#[from] ValidationError),

    #[error(transparent)]
    File(#[from] FileError),
}

/// A named output slot, e.g. `structures/chronology`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    pub domain: String,
    pub name: String,
}

impl Facet {
    pub fn new(domain: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            name: name.into(),
        }
    }

    /// A facet in the `structures` domain
    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(STRUCTURES_DOMAIN, name)
    }
}

impl std::fmt::Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.domain, self.name)
    }
}

/// Per-entity JSON documents under `{root}/{domain}/{facet}/{entity_id}.json`.
///
/// The existence of a facet document is what marks an entity as processed.
#[derive(Debug, Clone)]
pub struct FacetStore {
    root: PathBuf,
}

impl FacetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn facet_dir(&self, facet: &Facet) -> PathBuf {
        self.root.join(&facet.domain).join(&facet.name)
    }

    /// Path of one entity's document
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidEntityId` if `entity_id` is not safe to use as a file stem.
    pub fn path(&self, facet: &Facet, entity_id: &str) -> Result<PathBuf, StoreError> {
        let entity_id = validate_entity_id(entity_id)?;
        Ok(self.facet_dir(facet).join(format!("{entity_id}.json")))
    }

    /// # Errors
    ///
    /// Returns `StoreError::InvalidEntityId` for an unsafe id.
    pub fn exists(&self, facet: &Facet, entity_id: &str) -> Result<bool, StoreError> {
        Ok(self.path(facet, entity_id)?.is_file())
    }

    /// Read a document, or None if the entity has no document for this facet
    ///
    /// # Errors
    ///
    /// Returns `StoreError` for an unsafe id or an unreadable document.
    pub fn read(&self, facet: &Facet, entity_id: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path(facet, entity_id)?;
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(read_json(&path)?))
    }

    /// Atomically write a document, returning its path
    ///
    /// # Errors
    ///
    /// Returns `StoreError` for an unsafe id or a failed write.
    pub fn write(&self, facet: &Facet, entity_id: &str, document: &Value) -> Result<PathBuf, StoreError> {
        let path = self.path(facet, entity_id)?;
        write_json(&path, document)?;
        Ok(path)
    }
}

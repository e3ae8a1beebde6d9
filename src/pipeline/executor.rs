//! Idempotent per-entity work runner shared by every facet step.
//!
//! For each work item the executor resolves the item's facet document. An
//! existing document means the item was already processed and it is left
//! alone unless the run is forced. Otherwise the step's [`Action`] runs; a
//! successful payload has any override for the entity merged in and is
//! written, and a failure is recorded against the entity. No single item can
//! abort the batch.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::overrides::OverrideSet;
use crate::core::types::MatchResult;
use crate::pipeline::facet::{Facet, FacetStore};
use crate::pipeline::runlog::RunLog;
use crate::utils::files::FileError;
use crate::utils::validation::validate_entity_id;

/// Why a single item failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Invalid entity id '{0}'")]
    InvalidEntityId(String),

    #[error("Required field '{0}' missing from work item")]
    MissingField(String),

    #[error("{message}")]
    Failed { code: String, message: String },

    #[error("Failed to write facet: {0}")]
    Persist(String),
}

impl ActionError {
    pub fn failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Stable reason code written to the run log
    pub fn code(&self) -> &str {
        match self {
            Self::InvalidEntityId(_) => "invalid_entity_id",
            Self::MissingField(_) => "missing_field",
            Self::Failed { code, .. } => code,
            Self::Persist(_) => "unable_to_write_facet",
        }
    }
}

/// One entity to process, with its step parameters
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub entity_id: String,
    pub params: Map<String, Value>,
}

impl WorkItem {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            params: Map::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// A work item for the structure of a classified chain, carrying the match fields
    pub fn from_match(result: &MatchResult) -> Self {
        let params = match serde_json::to_value(result) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self {
            entity_id: result.pdb_code.clone(),
            params,
        }
    }
}

/// One work item per structure, in first-seen order
pub fn work_items_from_matches<'m>(matches: impl IntoIterator<Item = &'m MatchResult>) -> Vec<WorkItem> {
    let mut seen = BTreeSet::new();
    matches
        .into_iter()
        .filter(|m| seen.insert(m.pdb_code.clone()))
        .map(WorkItem::from_match)
        .collect()
}

/// Everything an action sees for one item
#[derive(Debug)]
pub struct ActionInput<'a> {
    pub entity_id: &'a str,
    /// Item parameters merged over the step's shared context
    pub fields: Map<String, Value>,
    /// Manual correction for this entity, if one exists
    pub override_document: Option<&'a Value>,
    /// The current facet document; only read when the run is forced
    pub existing: Option<Value>,
}

impl ActionInput<'_> {
    /// A string field, or `ActionError::MissingField`
    ///
    /// # Errors
    ///
    /// Returns `ActionError::MissingField` if the field is absent or not a string.
    pub fn str_field(&self, key: &str) -> Result<&str, ActionError> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| ActionError::MissingField(key.to_string()))
    }
}

/// The per-item work of a pipeline step
pub trait Action {
    /// Compute the facet payload for one entity
    ///
    /// # Errors
    ///
    /// Returns `ActionError` if the entity cannot be processed; the executor
    /// records it and moves on.
    fn run(&mut self, input: &ActionInput<'_>) -> Result<Value, ActionError>;

    /// Step-level output added to the run log after the batch
    fn report(&self) -> Map<String, Value> {
        Map::new()
    }
}

/// A failed item as recorded in the run log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub entity_id: String,
    pub errors: Vec<String>,
    pub message: String,
}

/// Counts returned to the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSummary {
    pub successful: usize,
    pub errors: usize,
    pub unchanged: usize,
    pub applied_overrides: usize,
}

/// The raw outcome of one step invocation, as written to the run log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub step: String,
    pub facet: String,
    pub run_id: String,
    pub force: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: WorkSummary,
    pub successful: Vec<String>,
    pub unchanged: Vec<String>,
    pub overrides_applied: Vec<String>,
    pub errors: Vec<ItemFailure>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// Options for one executor run
#[derive(Debug, Clone, Default)]
pub struct ExecutorOptions {
    /// Recompute facets that already exist
    pub force: bool,
    /// Stop after this many items
    pub limit: Option<usize>,
}

/// Runs an [`Action`] over work items against a [`FacetStore`]
pub struct WorkExecutor<'a> {
    store: &'a FacetStore,
    overrides: &'a OverrideSet,
    run_log: &'a RunLog,
    shared: Map<String, Value>,
    options: ExecutorOptions,
}

impl<'a> WorkExecutor<'a> {
    pub fn new(
        store: &'a FacetStore,
        overrides: &'a OverrideSet,
        run_log: &'a RunLog,
        options: ExecutorOptions,
    ) -> Self {
        Self {
            store,
            overrides,
            run_log,
            shared: Map::new(),
            options,
        }
    }

    /// Fields merged into every item's input; item parameters take precedence
    #[must_use]
    pub fn with_shared_context(mut self, shared: Map<String, Value>) -> Self {
        self.shared = shared;
        self
    }

    /// Process `items` and write the run log for `step`
    ///
    /// # Errors
    ///
    /// Returns `FileError` only if the run log cannot be written; item
    /// failures are part of the returned record.
    pub fn run(
        &self,
        step: &str,
        facet: &Facet,
        items: &[WorkItem],
        action: &mut dyn Action,
    ) -> Result<RunRecord, FileError> {
        let started_at = Utc::now();
        let mut record = RunRecord {
            step: step.to_string(),
            facet: facet.to_string(),
            run_id: self.run_log.run_id().to_string(),
            force: self.options.force,
            started_at,
            finished_at: started_at,
            summary: WorkSummary::default(),
            successful: Vec::new(),
            unchanged: Vec::new(),
            overrides_applied: Vec::new(),
            errors: Vec::new(),
            extra: Map::new(),
        };

        let limit = self.options.limit.unwrap_or(usize::MAX);
        for item in items.iter().take(limit) {
            match self.process(facet, item, action) {
                Ok(Processed::Unchanged) => record.unchanged.push(item.entity_id.clone()),
                Ok(Processed::Written { overridden }) => {
                    if overridden {
                        record.overrides_applied.push(item.entity_id.clone());
                    }
                    record.successful.push(item.entity_id.clone());
                }
                Err(e) => {
                    warn!(entity_id = %item.entity_id, step, "{e}");
                    record.errors.push(ItemFailure {
                        entity_id: item.entity_id.clone(),
                        errors: vec![e.code().to_string()],
                        message: e.to_string(),
                    });
                }
            }
        }

        record.summary = WorkSummary {
            successful: record.successful.len(),
            errors: record.errors.len(),
            unchanged: record.unchanged.len(),
            applied_overrides: record.overrides_applied.len(),
        };
        record.extra = action.report();
        record.finished_at = Utc::now();

        let path = self.run_log.write(step, &record)?;
        info!(
            step,
            successful = record.summary.successful,
            errors = record.summary.errors,
            unchanged = record.summary.unchanged,
            log = %path.display(),
            "Step complete"
        );
        Ok(record)
    }

    fn process(
        &self,
        facet: &Facet,
        item: &WorkItem,
        action: &mut dyn Action,
    ) -> Result<Processed, ActionError> {
        let entity_id = validate_entity_id(&item.entity_id)
            .map_err(|_| ActionError::InvalidEntityId(item.entity_id.clone()))?;

        let existing = if self.options.force {
            self.store
                .read(facet, entity_id)
                .map_err(|e| ActionError::Persist(e.to_string()))?
        } else {
            if self
                .store
                .exists(facet, entity_id)
                .map_err(|e| ActionError::Persist(e.to_string()))?
            {
                debug!(entity_id, %facet, "Facet exists");
                return Ok(Processed::Unchanged);
            }
            None
        };

        let mut fields = self.shared.clone();
        fields.extend(item.params.clone());
        let input = ActionInput {
            entity_id,
            fields,
            override_document: self.overrides.get(entity_id),
            existing,
        };

        let mut payload = action.run(&input)?;
        let overridden = self.overrides.apply(entity_id, &mut payload);
        self.store
            .write(facet, entity_id, &payload)
            .map_err(|e| ActionError::Persist(e.to_string()))?;
        Ok(Processed::Written { overridden })
    }
}

enum Processed {
    Unchanged,
    Written { overridden: bool },
}

//! Pipeline steps built on the scan output.
//!
//! `partition` routes the final tier collections into the scan lists; every
//! other step is an [`Action`](crate::pipeline::executor::Action) run by the
//! [`WorkExecutor`](crate::pipeline::executor::WorkExecutor) over `new_work`.

pub mod alike_chains;
pub mod chronology;
pub mod core_records;
pub mod experimental;
pub mod partition;
pub mod publication;
pub mod title;

use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::lists::ScanLists;
use crate::catalog::overrides::{OverrideError, OverrideSet};
use crate::pipeline::executor::{
    work_items_from_matches, Action, ExecutorOptions, RunRecord, WorkExecutor, WorkItem,
};
use crate::pipeline::facet::{Facet, FacetStore};
use crate::pipeline::runlog::RunLog;
use crate::scan::ScanError;
use crate::utils::files::FileError;

#[derive(Error, Debug)]
pub enum StepError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Override(#[from] OverrideError),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Paths and options shared by every facet step of one invocation
#[derive(Debug, Clone)]
pub struct StepContext {
    pub store: FacetStore,
    pub overrides_root: PathBuf,
    pub run_log: RunLog,
    pub options: ExecutorOptions,
    pub family: String,
}

impl StepContext {
    /// The current scan lists
    ///
    /// # Errors
    ///
    /// Returns `FileError` if a list file is malformed.
    pub fn lists(&self) -> Result<ScanLists, FileError> {
        ScanLists::load(&self.overrides_root)
    }

    /// One work item per structure in `new_work`
    ///
    /// # Errors
    ///
    /// Returns `FileError` if a list file is malformed.
    pub fn new_work(&self) -> Result<Vec<WorkItem>, FileError> {
        Ok(work_items_from_matches(&self.lists()?.new_work))
    }

    /// Load the step's overrides and run `action` over `items`
    ///
    /// # Errors
    ///
    /// Returns `StepError` if overrides cannot be loaded or the run log
    /// cannot be written.
    pub fn execute(
        &self,
        step: &str,
        facet: &Facet,
        items: &[WorkItem],
        action: &mut dyn Action,
        options: &ExecutorOptions,
    ) -> Result<RunRecord, StepError> {
        let overrides = OverrideSet::load(&self.overrides_root, step)?;
        let mut shared = serde_json::Map::new();
        shared.insert("family".to_string(), self.family.clone().into());
        let executor = WorkExecutor::new(&self.store, &overrides, &self.run_log, options.clone())
            .with_shared_context(shared);
        Ok(executor.run(step, facet, items, action)?)
    }
}

//! Per-structure curation built on the scan output.
//!
//! Every step reads its work list from the scan lists, runs an action per
//! structure through the [`WorkExecutor`], and writes one facet document per
//! structure under `{output}/structures/{facet}/{pdb_code}.json`. Each
//! invocation also leaves a raw run log under `{logs}/steps/{step}/`.

pub mod executor;
pub mod facet;
pub mod provider;
pub mod runlog;
pub mod steps;

pub use executor::{
    Action, ActionError, ActionInput, ExecutorOptions, ItemFailure, RunRecord, WorkExecutor,
    WorkItem, WorkSummary,
};
pub use facet::{Facet, FacetStore, StoreError};
pub use provider::{MetadataProvider, PdbeProvider, ProviderError};
pub use runlog::{RunId, RunLog};
pub use steps::{StepContext, StepError};

//! Deposition, release and revision dates per structure.
//!
//! The step always recomputes its facet. Before overwriting, it compares the
//! previously cached date with the latest revision; structures revised since
//! they were cached are queued back onto `new_work` so the other steps pick
//! them up again.

use std::collections::HashSet;

use chrono::{Local, NaiveDate};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::pipeline::executor::{
    work_items_from_matches, Action, ActionError, ActionInput, ExecutorOptions, RunRecord,
};
use crate::pipeline::facet::Facet;
use crate::pipeline::provider::MetadataProvider;
use crate::pipeline::steps::{StepContext, StepError};

pub const STEP: &str = "chronology";
pub const FACET: &str = "chronology";

const FAILURE_CODE: &str = "unable_to_fetch_chronology_data";

/// Parse a PDB date (`20050412`); ISO dates are accepted too
pub fn parse_pdb_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

fn date_field(summary: &Value, key: &str) -> Result<NaiveDate, ActionError> {
    summary
        .get(key)
        .and_then(Value::as_str)
        .and_then(parse_pdb_date)
        .ok_or_else(|| ActionError::failed(FAILURE_CODE, format!("Missing or invalid {key}")))
}

pub struct ChronologyAction<'p> {
    provider: &'p dyn MetadataProvider,
    today: NaiveDate,
    needs_updating: Vec<String>,
}

impl<'p> ChronologyAction<'p> {
    pub fn new(provider: &'p dyn MetadataProvider) -> Self {
        Self::on(provider, Local::now().date_naive())
    }

    /// An action that stamps `today` as the cached date
    pub fn on(provider: &'p dyn MetadataProvider, today: NaiveDate) -> Self {
        Self {
            provider,
            today,
            needs_updating: Vec::new(),
        }
    }

    /// Structures whose cached facet predates their latest revision
    pub fn needs_updating(&self) -> &[String] {
        &self.needs_updating
    }
}

impl Action for ChronologyAction<'_> {
    fn run(&mut self, input: &ActionInput<'_>) -> Result<Value, ActionError> {
        let summary = self
            .provider
            .fetch_summary(input.entity_id)
            .map_err(|e| ActionError::failed(FAILURE_CODE, e.to_string()))?;
        let deposition = date_field(&summary, "deposition_date")?;
        let release = date_field(&summary, "release_date")?;
        let revision = date_field(&summary, "revision_date").unwrap_or(release);

        let cached = input
            .existing
            .as_ref()
            .and_then(|doc| doc.get("cached_date"))
            .and_then(Value::as_str)
            .and_then(parse_pdb_date);
        if cached.is_some_and(|cached| cached < revision) {
            self.needs_updating.push(input.entity_id.to_string());
        }

        Ok(json!({
            "deposition_date": deposition.to_string(),
            "release_date": release.to_string(),
            "revision_date": revision.to_string(),
            "cached_date": self.today.to_string(),
        }))
    }

    fn report(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert("needs_updating".to_string(), json!(self.needs_updating));
        extra
    }
}

/// Refresh dates for every known or new structure and requeue revised ones
///
/// # Errors
///
/// Returns `StepError` if the lists, overrides or run log cannot be accessed.
pub fn run(ctx: &StepContext, action: &mut ChronologyAction<'_>) -> Result<RunRecord, StepError> {
    let mut lists = ctx.lists()?;
    let items = work_items_from_matches(lists.known_matches.iter().chain(&lists.new_work));
    let options = ExecutorOptions {
        force: true,
        ..ctx.options.clone()
    };
    let record = ctx.execute(STEP, &Facet::structure(FACET), &items, action, &options)?;

    if !action.needs_updating().is_empty() {
        let stale: HashSet<&str> = action.needs_updating().iter().map(String::as_str).collect();
        let queued: HashSet<(String, Option<String>)> = lists
            .new_work
            .iter()
            .map(|m| (m.pdb_code.clone(), m.structure_id.clone()))
            .collect();
        let requeue: Vec<_> = lists
            .known_matches
            .iter()
            .filter(|m| stale.contains(m.pdb_code.as_str()))
            .filter(|m| !queued.contains(&(m.pdb_code.clone(), m.structure_id.clone())))
            .cloned()
            .collect();
        info!(count = stale.len(), "Requeueing revised structures");
        lists.new_work.extend(requeue);
        lists.save(&ctx.overrides_root)?;
    }
    Ok(record)
}

use serde_json::{json, Value};

use crate::pipeline::executor::{Action, ActionError, ActionInput, RunRecord};
use crate::pipeline::facet::Facet;
use crate::pipeline::provider::MetadataProvider;
use crate::pipeline::steps::{StepContext, StepError};
use crate::utils::text::capitalize;

pub const STEP: &str = "title";
pub const FACET: &str = "title";

const FAILURE_CODE: &str = "unable_to_fetch_title_data";

pub struct TitleAction<'p> {
    provider: &'p dyn MetadataProvider,
}

impl<'p> TitleAction<'p> {
    pub fn new(provider: &'p dyn MetadataProvider) -> Self {
        Self { provider }
    }
}

impl Action for TitleAction<'_> {
    fn run(&mut self, input: &ActionInput<'_>) -> Result<Value, ActionError> {
        let summary = self
            .provider
            .fetch_summary(input.entity_id)
            .map_err(|e| ActionError::failed(FAILURE_CODE, e.to_string()))?;
        let title = summary
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| ActionError::failed(FAILURE_CODE, "Summary has no title"))?;
        Ok(json!({
            "pdb_title_original": title,
            "pdb_title_capitalized": capitalize(title),
        }))
    }
}

/// Fetch titles for every structure in `new_work`
///
/// # Errors
///
/// Returns `StepError` if the lists, overrides or run log cannot be accessed.
pub fn run(ctx: &StepContext, provider: &dyn MetadataProvider) -> Result<RunRecord, StepError> {
    let items = ctx.new_work()?;
    ctx.execute(
        STEP,
        &Facet::structure(FACET),
        &items,
        &mut TitleAction::new(provider),
        &ctx.options,
    )
}

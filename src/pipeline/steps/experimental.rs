use serde_json::{json, Value};

use crate::pipeline::executor::{Action, ActionError, ActionInput, RunRecord};
use crate::pipeline::facet::Facet;
use crate::pipeline::provider::MetadataProvider;
use crate::pipeline::steps::{StepContext, StepError};
use crate::utils::text::slugify;

pub const STEP: &str = "experimental";
pub const FACET: &str = "experimental";

const FAILURE_CODE: &str = "unable_to_fetch_experimental_data";

const X_RAY: &str = "x_ray_diffraction";
const ELECTRON_MICROSCOPY: &str = "electron_microscopy";
const NMR: &str = "nmr";

fn field(record: &Value, key: &str) -> Value {
    record.get(key).cloned().unwrap_or(Value::Null)
}

/// Reduce an experiment record to the fields kept for its method.
///
/// Anything that is neither diffraction nor microscopy is recorded as
/// `nmr` without a resolution.
///
/// # Errors
///
/// Returns `ActionError` if the record names no method.
pub fn experimental_info(experiment: &Value) -> Result<Value, ActionError> {
    let method = experiment
        .get("experimental_method")
        .and_then(Value::as_str)
        .ok_or_else(|| ActionError::failed(FAILURE_CODE, "Experiment has no method"))?;

    Ok(match slugify(method).as_str() {
        X_RAY => json!({
            "experimental_method": X_RAY,
            "resolution": field(experiment, "resolution_high"),
            "spacegroup": field(experiment, "spacegroup"),
            "cell": field(experiment, "cell"),
        }),
        ELECTRON_MICROSCOPY => json!({
            "experimental_method": ELECTRON_MICROSCOPY,
            "resolution": field(experiment, "resolution"),
        }),
        _ => json!({
            "experimental_method": NMR,
            "resolution": Value::Null,
        }),
    })
}

pub struct ExperimentalAction<'p> {
    provider: &'p dyn MetadataProvider,
}

impl<'p> ExperimentalAction<'p> {
    pub fn new(provider: &'p dyn MetadataProvider) -> Self {
        Self { provider }
    }
}

impl Action for ExperimentalAction<'_> {
    fn run(&mut self, input: &ActionInput<'_>) -> Result<Value, ActionError> {
        let experiment = self
            .provider
            .fetch_experiment(input.entity_id)
            .map_err(|e| ActionError::failed(FAILURE_CODE, e.to_string()))?;
        experimental_info(&experiment)
    }
}

/// Fetch experimental method and resolution for every structure in `new_work`
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
        &mut ExperimentalAction::new(provider),
        &ctx.options,
    )
}

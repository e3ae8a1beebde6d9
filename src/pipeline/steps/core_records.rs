use serde_json::{json, Value};

use crate::pipeline::executor::{Action, ActionError, ActionInput, RunRecord};
use crate::pipeline::facet::Facet;
use crate::pipeline::steps::{StepContext, StepError};

pub const STEP: &str = "core_records";
pub const FACET: &str = "core";

/// Empty structure record that later steps fill in
pub fn build_core_record(pdb_code: &str) -> Value {
    json!({
        "accessory_molecules": {},
        "allele": { "alpha": null, "beta": null },
        "assemblies": [],
        "assembly_count": null,
        "chain_count": null,
        "chronology": {
            "deposition_date": null,
            "release_date": null,
            "update_date": null
        },
        "class": null,
        "classical": null,
        "complex_type": null,
        "doi": { "doi": null, "url": null },
        "facets": {},
        "ligands": [],
        "locus": null,
        "manually_edited": {},
        "methodology": null,
        "missing_residues": [],
        "open_access": false,
        "organism": {},
        "pdb_code": pdb_code,
        "pdb_title": null,
        "peptide": {
            "actual_sequence": null,
            "epitope_info": {},
            "features": [],
            "full_sequence": null,
            "gap_info": {},
            "gapped_sequence": null,
            "length": { "numeric": null, "text": null },
            "unnatural_amino_acids": []
        },
        "publication": {},
        "resolution": null,
        "unique_chain_count": null
    })
}

#[derive(Debug, Default)]
pub struct CoreRecordAction;

impl Action for CoreRecordAction {
    fn run(&mut self, input: &ActionInput<'_>) -> Result<Value, ActionError> {
        Ok(build_core_record(input.entity_id))
    }
}

/// Create a core record for every structure in `new_work`
///
/// # Errors
///
/// Returns `StepError` if the lists, overrides or run log cannot be accessed.
pub fn run(ctx: &StepContext) -> Result<RunRecord, StepError> {
    let items = ctx.new_work()?;
    ctx.execute(
        STEP,
        &Facet::structure(FACET),
        &items,
        &mut CoreRecordAction,
        &ctx.options,
    )
}

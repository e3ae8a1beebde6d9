//! Primary citation of each structure as a BibJSON record.
//!
//! The PDBe citation supplies the bibliographic fields. When it carries a
//! DOI the literature database is consulted too, and its open-access flags
//! are kept only if both sources agree on the abstract.

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::matching::similarity::ratio;
use crate::pipeline::executor::{Action, ActionError, ActionInput, RunRecord};
use crate::pipeline::facet::Facet;
use crate::pipeline::provider::MetadataProvider;
use crate::pipeline::steps::{StepContext, StepError};

pub const STEP: &str = "publication";
pub const FACET: &str = "publication";

const FAILURE_CODE: &str = "unable_to_fetch_publication_data";

/// Journal abbreviation PDBe uses for unpublished citations
const UNPUBLISHED: &str = "To be published";

/// Abstracts must be more similar than this to trust the literature record
const ABSTRACT_AGREEMENT: f64 = 0.9;

fn field(record: &Value, key: &str) -> Value {
    record.get(key).cloned().unwrap_or(Value::Null)
}

/// A value worth citing: not null, false or an empty string
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    })
}

fn bibjson_author(author: &Value) -> Value {
    json!({
        "lastname": field(author, "last_name"),
        "name": field(author, "full_name"),
        "initials": field(author, "initials"),
    })
}

/// Convert a PDBe citation into BibJSON
#[must_use]
pub fn to_bibjson(citation: &Value) -> Value {
    let authors: Vec<Value> = citation
        .get("author_list")
        .and_then(Value::as_array)
        .map(|authors| authors.iter().map(bibjson_author).collect())
        .unwrap_or_default();

    let mut bibjson = Map::new();
    bibjson.insert("title".to_string(), field(citation, "title"));
    bibjson.insert("author".to_string(), Value::Array(authors));
    bibjson.insert("type".to_string(), json!("article"));
    bibjson.insert("url".to_string(), json!(""));

    let journal = citation.get("journal_info").unwrap_or(&Value::Null);
    let unpublished = journal.get("pdb_abbreviation").and_then(Value::as_str) == Some(UNPUBLISHED);
    if unpublished {
        bibjson.insert(
            "journal".to_string(),
            json!({"name": "", "iso_abbreviation": UNPUBLISHED}),
        );
    } else {
        bibjson.insert("year".to_string(), field(journal, "year"));
        bibjson.insert(
            "journal".to_string(),
            json!({"name": "", "iso_abbreviation": field(journal, "ISO_abbreviation")}),
        );
        for key in ["volume", "issue", "pages"] {
            bibjson.insert(key.to_string(), field(journal, key));
        }
    }

    let mut identifiers = Vec::new();
    if let Some(doi) = present(citation.get("doi")) {
        identifiers.push(json!({"type": "doi", "id": doi}));
    }
    if let Some(pubmed_id) = present(citation.get("pubmed_id")) {
        identifiers.push(json!({"type": "pubmed", "id": pubmed_id}));
    }
    bibjson.insert("identifier".to_string(), Value::Array(identifiers));

    Value::Object(bibjson)
}

/// `Y`/`N` flags as booleans
fn flag(record: &Value, key: &str) -> Value {
    record
        .get(key)
        .and_then(Value::as_str)
        .map_or(Value::Null, |s| Value::Bool(s.eq_ignore_ascii_case("y")))
}

pub struct PublicationAction<'p> {
    provider: &'p dyn MetadataProvider,
}

impl<'p> PublicationAction<'p> {
    pub fn new(provider: &'p dyn MetadataProvider) -> Self {
        Self { provider }
    }

    /// Copy access flags from the literature record when its abstract agrees
    fn enrich(&self, doi: &str, info: &mut Map<String, Value>) {
        let record = match self.provider.fetch_literature(doi) {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(e) => {
                warn!(doi, "Literature lookup failed: {e}");
                return;
            }
        };
        let ours = info.get("abstract").and_then(Value::as_str);
        let theirs = record.get("abstractText").and_then(Value::as_str);
        let (Some(ours), Some(theirs)) = (ours, theirs) else {
            return;
        };
        if ratio(ours, theirs) <= ABSTRACT_AGREEMENT {
            return;
        }
        info.insert("open_access".to_string(), flag(&record, "isOpenAccess"));
        info.insert("in_pmc".to_string(), flag(&record, "inPMC"));
        info.insert("in_pmce".to_string(), flag(&record, "inEPMC"));
        info.insert("fulltext_urls".to_string(), field(&record, "fullTextUrlList"));
    }
}

impl Action for PublicationAction<'_> {
    fn run(&mut self, input: &ActionInput<'_>) -> Result<Value, ActionError> {
        let citation = self
            .provider
            .fetch_publications(input.entity_id)
            .map_err(|e| ActionError::failed(FAILURE_CODE, e.to_string()))?;

        let mut info = Map::new();
        for key in ["open_access", "in_pmc", "in_pmce", "fulltext_urls"] {
            info.insert(key.to_string(), Value::Null);
        }
        info.insert(
            "abstract".to_string(),
            citation.pointer("/abstract/unassigned").cloned().unwrap_or(Value::Null),
        );
        info.insert("bibjson".to_string(), to_bibjson(&citation));

        if let Some(doi) = present(citation.get("doi")).and_then(Value::as_str) {
            self.enrich(doi, &mut info);
        }
        Ok(Value::Object(info))
    }
}

/// Fetch the primary citation for every structure in `new_work`
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
        &mut PublicationAction::new(provider),
        &ctx.options,
    )
}

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// PDBe entry API; the endpoint and pdb code are appended
pub const PDBE_ENTRY_URL: &str = "https://www.ebi.ac.uk/pdbe/api/pdb/entry";

/// Europe PMC literature search
pub const EUROPE_PMC_SEARCH_URL: &str = "https://www.ebi.ac.uk/europepmc/webservices/rest/search";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("No record for '{0}'")]
    NotFound(String),

    #[error("Unexpected response for '{pdb_code}': {reason}")]
    Malformed { pdb_code: String, reason: String },
}

/// Source of per-structure metadata
pub trait MetadataProvider {
    /// Summary record for one structure: `title`, `deposition_date`,
    /// `release_date`, `revision_date` (dates as `YYYYMMDD`)
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the structure cannot be fetched.
    fn fetch_summary(&self, pdb_code: &str) -> Result<Value, ProviderError>;

    /// Experiment record: `experimental_method` plus the method's resolution,
    /// `spacegroup` and `cell` fields
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the structure cannot be fetched.
    fn fetch_experiment(&self, pdb_code: &str) -> Result<Value, ProviderError>;

    /// Primary citation: `title`, `author_list`, `journal_info`, `doi`,
    /// `pubmed_id`, `abstract`
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the structure cannot be fetched.
    fn fetch_publications(&self, pdb_code: &str) -> Result<Value, ProviderError>;

    /// Literature database record for a DOI, if one exists
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the lookup itself fails.
    fn fetch_literature(&self, _doi: &str) -> Result<Option<Value>, ProviderError> {
        Ok(None)
    }
}

/// Blocking client for the PDBe REST API, with Europe PMC for literature
pub struct PdbeProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    literature_url: String,
}

impl PdbeProvider {
    /// # Errors
    ///
    /// Returns `ProviderError::Http` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(PDBE_ENTRY_URL)
    }

    /// # Errors
    ///
    /// Returns `ProviderError::Http` if the HTTP client cannot be built.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let base_url = base_url.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| ProviderError::Http {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self {
            client,
            base_url,
            literature_url: EUROPE_PMC_SEARCH_URL.to_string(),
        })
    }

    #[must_use]
    pub fn with_literature_url(mut self, url: impl Into<String>) -> Self {
        self.literature_url = url.into();
        self
    }

    pub fn entry_url(&self, endpoint: &str, pdb_code: &str) -> String {
        format!("{}/{endpoint}/{pdb_code}", self.base_url.trim_end_matches('/'))
    }

    fn fetch_entry(&self, endpoint: &str, pdb_code: &str) -> Result<Value, ProviderError> {
        let url = self.entry_url(endpoint, pdb_code);
        debug!(%url, endpoint, "Fetching entry");
        let body = get_json(self.client.get(&url), &url, pdb_code)?;
        first_entry(body, pdb_code)
    }
}

impl MetadataProvider for PdbeProvider {
    fn fetch_summary(&self, pdb_code: &str) -> Result<Value, ProviderError> {
        self.fetch_entry("summary", pdb_code)
    }

    fn fetch_experiment(&self, pdb_code: &str) -> Result<Value, ProviderError> {
        self.fetch_entry("experiment", pdb_code)
    }

    fn fetch_publications(&self, pdb_code: &str) -> Result<Value, ProviderError> {
        self.fetch_entry("publications", pdb_code)
    }

    fn fetch_literature(&self, doi: &str) -> Result<Option<Value>, ProviderError> {
        let url = self.literature_url.as_str();
        debug!(url, doi, "Searching literature");
        let request = self.client.get(url).query(&[
            ("query", format!("DOI:\"{doi}\"")),
            ("format", "json".to_string()),
            ("resultType", "core".to_string()),
        ]);
        let mut body = get_json(request, url, doi)?;
        Ok(body
            .pointer_mut("/resultList/result/0")
            .map(Value::take)
            .filter(Value::is_object))
    }
}

/// Send `request` and decode its JSON body; a 404 means `id` does not exist
fn get_json(
    request: reqwest::blocking::RequestBuilder,
    url: &str,
    id: &str,
) -> Result<Value, ProviderError> {
    let http_err = |source| ProviderError::Http {
        url: url.to_string(),
        source,
    };
    let response = request.send().map_err(http_err)?;
    let status = response.status();
    if status.as_u16() == 404 {
        return Err(ProviderError::NotFound(id.to_string()));
    }
    if !status.is_success() {
        return Err(ProviderError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    response.json().map_err(http_err)
}

/// Pull the first entry out of a `{pdb_code: [entry, ...]}` response
///
/// # Errors
///
/// Returns `ProviderError::NotFound` if the response has no entry for the
/// structure and `ProviderError::Malformed` if the entry is not an object.
pub fn first_entry(mut body: Value, pdb_code: &str) -> Result<Value, ProviderError> {
    let entry = body
        .get_mut(pdb_code)
        .and_then(Value::as_array_mut)
        .filter(|entries| !entries.is_empty())
        .map(|entries| entries.swap_remove(0))
        .ok_or_else(|| ProviderError::NotFound(pdb_code.to_string()))?;
    if entry.is_object() {
        Ok(entry)
    } else {
        Err(ProviderError::Malformed {
            pdb_code: pdb_code.to_string(),
            reason: "entry is not an object".to_string(),
        })
    }
}

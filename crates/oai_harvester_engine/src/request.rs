use oai_harvester_core::HarvestQuery;
use url::Url;

use crate::{FailureKind, FetchError};

/// OAI-PMH request builder over a repository base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OaiRequest {
    base: Url,
}

impl OaiRequest {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let base = Url::parse(base_url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        Ok(Self { base })
    }

    /// `verb=ListRecords[&from=..][&set=..]&metadataPrefix=..`
    pub fn list_records(&self, query: &HarvestQuery) -> Url {
        let mut params = vec![("verb", "ListRecords")];
        if let Some(from) = query.from.as_deref() {
            params.push(("from", from));
        }
        if let Some(set) = query.set.as_deref() {
            params.push(("set", set));
        }
        params.push(("metadataPrefix", query.metadata_prefix.as_str()));
        self.with_params(&params)
    }

    pub fn resume(&self, verb: &str, token: &str) -> Url {
        self.with_params(&[("verb", verb), ("resumptionToken", token)])
    }

    pub fn list_sets(&self) -> Url {
        self.with_params(&[("verb", "ListSets")])
    }

    pub fn list_metadata_formats(&self, identifier: Option<&str>) -> Url {
        let mut params = vec![("verb", "ListMetadataFormats")];
        if let Some(identifier) = identifier {
            params.push(("identifier", identifier));
        }
        self.with_params(&params)
    }

    fn with_params(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut().clear().extend_pairs(params);
        url
    }
}

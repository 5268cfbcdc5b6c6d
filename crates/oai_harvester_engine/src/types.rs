use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use oai_harvester_core::ResumptionInfo;
use thiserror::Error;

/// Raw HTTP response as returned by a [`crate::Fetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// An OAI-PMH response that passed the error-element check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OaiResponse {
    pub url: String,
    /// Body bytes exactly as received; this is what gets stored.
    pub raw: Vec<u8>,
    /// `raw` decoded to text for parsing.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HarvestEvent {
    RequestIssued {
        url: String,
    },
    Backoff {
        wait: Duration,
    },
    PageWritten {
        session_number: u32,
        page_number: u32,
        path: PathBuf,
    },
    Resumption {
        info: ResumptionInfo,
        elapsed: Duration,
    },
    Completed {
        session_number: u32,
        pages: u32,
    },
    Stalled {
        session_number: u32,
        pages: u32,
    },
    DateFallback {
        from: String,
        to: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureKind {
    #[error("invalid url")]
    InvalidUrl,
    /// Non-success status other than 503; the message holds the body.
    #[error("request failed with status {0}")]
    HttpStatus(u16),
    #[error("timeout")]
    Timeout,
    #[error("network error")]
    Network,
}

/// Error codes defined by OAI-PMH v2, section 3.6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OaiErrorCode {
    BadArgument,
    BadResumptionToken,
    BadVerb,
    CannotDisseminateFormat,
    IdDoesNotExist,
    NoRecordsMatch,
    NoMetadataFormats,
    NoSetHierarchy,
    Other(String),
}

impl OaiErrorCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "badArgument" => OaiErrorCode::BadArgument,
            "badResumptionToken" => OaiErrorCode::BadResumptionToken,
            "badVerb" => OaiErrorCode::BadVerb,
            "cannotDisseminateFormat" => OaiErrorCode::CannotDisseminateFormat,
            "idDoesNotExist" => OaiErrorCode::IdDoesNotExist,
            "noRecordsMatch" => OaiErrorCode::NoRecordsMatch,
            "noMetadataFormats" => OaiErrorCode::NoMetadataFormats,
            "noSetHierarchy" => OaiErrorCode::NoSetHierarchy,
            other => OaiErrorCode::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OaiErrorCode::BadArgument => "badArgument",
            OaiErrorCode::BadResumptionToken => "badResumptionToken",
            OaiErrorCode::BadVerb => "badVerb",
            OaiErrorCode::CannotDisseminateFormat => "cannotDisseminateFormat",
            OaiErrorCode::IdDoesNotExist => "idDoesNotExist",
            OaiErrorCode::NoRecordsMatch => "noRecordsMatch",
            OaiErrorCode::NoMetadataFormats => "noMetadataFormats",
            OaiErrorCode::NoSetHierarchy => "noSetHierarchy",
            OaiErrorCode::Other(code) => code,
        }
    }
}

impl fmt::Display for OaiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `<error>` element of an OAI-PMH response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct OaiError {
    pub code: OaiErrorCode,
    pub message: String,
}

impl OaiError {
    pub fn new(code: OaiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The repository rejected the `from` datestamp, typically a full
    /// datetime sent to a repository with day granularity.
    pub fn is_malformed_date(&self) -> bool {
        let message = self.message.to_ascii_lowercase();
        if message.contains("bad date") {
            return true;
        }
        self.code == OaiErrorCode::BadArgument
            && (message.contains("granularity") || message.contains("datestamp"))
    }
}

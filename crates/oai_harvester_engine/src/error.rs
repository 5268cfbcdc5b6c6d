use std::path::PathBuf;

use oai_harvester_core::{ConfigError, TransitionError};
use thiserror::Error;

use crate::decode::DecodeError;
use crate::persist::StoreError;
use crate::resumption::CodecError;
use crate::xml::XmlError;
use crate::{FetchError, OaiError};

#[derive(Debug, Error)]
pub enum HarvestError {
    /// Non-503, non-success HTTP response, or a network failure.
    #[error("transport error: {0}")]
    Transport(#[from] FetchError),
    /// The repository answered with an OAI-PMH `<error>` element.
    #[error("repository responded with an error: {0}")]
    Protocol(#[from] OaiError),
    #[error("no previous session to update from")]
    NoPriorSession,
    #[error("session file {path:?} is missing {missing}")]
    MalformedSessionFile { path: PathBuf, missing: String },
    #[error("verb for the previous session is {verb}, but should be ListRecords")]
    UnsupportedVerb { verb: String },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Xml(#[from] XmlError),
}

impl HarvestError {
    /// The OAI error carried by a protocol failure, if any.
    pub fn as_protocol(&self) -> Option<&OaiError> {
        match self {
            HarvestError::Protocol(err) => Some(err),
            _ => None,
        }
    }
}

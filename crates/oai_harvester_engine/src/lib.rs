//! Harvester engine: OAI-PMH requests, page storage and the session driver.
mod decode;
mod discovery;
mod error;
mod executor;
mod fetch;
mod filename;
mod incremental;
mod persist;
mod request;
mod resumption;
mod runner;
mod session;
mod store;
mod types;
mod xml;

pub use decode::{decode_xml, DecodeError, DecodedXml};
pub use discovery::{
    list_metadata_formats, list_sets, parse_formats, parse_sets, MetadataFormat, SetInfo,
};
pub use error::HarvestError;
pub use executor::{find_oai_error, RequestExecutor};
pub use fetch::{
    ChannelProgressSink, FetchSettings, Fetcher, LogProgressSink, ProgressSink, ReqwestFetcher,
};
pub use filename::{page_filename, parse_page_filename};
pub use incremental::{read_session_header, SessionHeader};
pub use persist::{ensure_output_dir, AtomicFileWriter, StoreError};
pub use request::OaiRequest;
pub use resumption::{parse_token_element, CodecError, ResumptionScan};
pub use runner::{run_default_session, run_session, IncrementalMode};
pub use session::HarvestSession;
pub use store::{FsPageStore, LastSession, PageStore};
pub use types::{
    FailureKind, FetchError, HarvestEvent, OaiError, OaiErrorCode, OaiResponse, RawResponse,
};
pub use xml::XmlError;

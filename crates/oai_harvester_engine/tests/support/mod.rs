#![allow(dead_code)]
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use oai_harvester_core::HarvestConfig;
use oai_harvester_engine::{
    ChannelProgressSink, FetchSettings, FsPageStore, HarvestEvent, HarvestSession,
    RequestExecutor, ReqwestFetcher,
};
use wiremock::{MockServer, ResponseTemplate};

pub const OAI_PATH: &str = "/oai2";

pub fn init_logging() {
    engine_logging::initialize_for_tests();
}

pub fn request_element(attrs: &str) -> String {
    format!("<request {attrs}>http://export.arxiv.org/oai2</request>")
}

/// A ListRecords page with one record and an optional token line.
pub fn list_records_page(request: &str, token_line: Option<&str>) -> String {
    let mut body = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<OAI-PMH xmlns=\"http://www.openarchives.org/OAI/2.0/\">\n<responseDate>2020-01-02T03:04:05Z</responseDate>\n",
    );
    body.push_str(request);
    body.push_str("\n<ListRecords>\n<record><header><identifier>oai:arXiv.org:0704.0001</identifier></header></record>\n");
    if let Some(line) = token_line {
        body.push_str(line);
        body.push('\n');
    }
    body.push_str("</ListRecords>\n</OAI-PMH>\n");
    body
}

pub fn error_page(code: &str, message: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<OAI-PMH xmlns=\"http://www.openarchives.org/OAI/2.0/\">\n<responseDate>2020-01-02T03:04:05Z</responseDate>\n<request verb=\"ListRecords\">http://export.arxiv.org/oai2</request>\n<error code=\"{code}\">{message}</error>\n</OAI-PMH>\n"
    )
}

pub fn xml(body: impl Into<Vec<u8>>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/xml; charset=utf-8")
}

pub fn config_for(server: &MockServer, base_path: PathBuf) -> HarvestConfig {
    HarvestConfig {
        base_url: format!("{}{}", server.uri(), OAI_PATH),
        set: Some("physics:astro-ph".to_string()),
        metadata_prefix: "arXivRaw".to_string(),
        from: None,
        base_path,
        ..HarvestConfig::default()
    }
}

pub fn executor() -> RequestExecutor<ReqwestFetcher> {
    let fetcher = ReqwestFetcher::new(FetchSettings::default()).expect("client");
    RequestExecutor::new(fetcher, Duration::from_millis(10))
}

pub fn session_with_events(
    config: HarvestConfig,
) -> (
    HarvestSession<ReqwestFetcher, FsPageStore>,
    mpsc::Receiver<HarvestEvent>,
) {
    let (tx, rx) = mpsc::channel();
    let store = FsPageStore::new(&config.base_path);
    let session = HarvestSession::new(config, executor(), store)
        .expect("valid config")
        .with_sink(Arc::new(ChannelProgressSink::new(tx)));
    (session, rx)
}

pub fn file_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use url::Url;

use crate::{FailureKind, FetchError, HarvestEvent, RawResponse};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Whole-request timeout. `None` waits as long as the server takes.
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
    /// Wait used when a 503 carries no usable `Retry-After` header.
    pub fallback_retry_after: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: None,
            user_agent: concat!("oai-harvester/", env!("CARGO_PKG_VERSION")).to_string(),
            fallback_retry_after: Duration::from_secs(10),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<HarvestEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<HarvestEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: HarvestEvent) {
        let _ = self.tx.send(event);
    }
}

/// Reports progress through the `engine_*` log macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: HarvestEvent) {
        match event {
            HarvestEvent::RequestIssued { url } => engine_info!("Requesting {}", url),
            HarvestEvent::Backoff { wait } => {
                engine_info!("503: asked to wait {:.1} sec", wait.as_secs_f64())
            }
            HarvestEvent::PageWritten { path, .. } => engine_info!("Wrote page to {:?}", path),
            HarvestEvent::Resumption { info, elapsed } => engine_info!(
                "Token {:?}, cursor at {:?} of {:?}, {:.2} min from start",
                info.token,
                info.cursor,
                info.complete_list_size,
                elapsed.as_secs_f64() / 60.0
            ),
            HarvestEvent::Completed {
                session_number,
                pages,
            } => engine_info!("Completed session {} after {} page(s)", session_number, pages),
            HarvestEvent::Stalled {
                session_number,
                pages,
            } => engine_warn!(
                "Session {} stalled after {} page(s): no resumptionToken found, possibly the request failed",
                session_number,
                pages
            ),
            HarvestEvent::DateFallback { from, to } => {
                engine_warn!("Initial request errored for date {}, trying {}", from, to)
            }
        }
    }
}

/// Issues a single HTTP GET and hands back the raw response, whatever its
/// status.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &Url) -> Result<RawResponse, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .user_agent(settings.user_agent);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn get(&self, url: &Url) -> Result<RawResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(map_reqwest_error)?.to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return FetchError::new(FailureKind::InvalidUrl, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

use std::sync::Arc;
use std::time::Instant;

use engine_logging::{engine_debug, engine_info};
use oai_harvester_core::{
    page_stored, update, HarvestConfig, HarvestQuery, Msg, RequestKind, SessionState, StepOutcome,
};
use url::Url;

use crate::incremental::read_session_header;
use crate::request::OaiRequest;
use crate::resumption::ResumptionScan;
use crate::{
    Fetcher, HarvestError, HarvestEvent, LogProgressSink, PageStore, ProgressSink, RequestExecutor,
};

/// One resumable ListRecords harvest: owns the session number and page
/// cursor, drives the executor and persists every page before parsing it.
pub struct HarvestSession<F, S> {
    config: HarvestConfig,
    query: HarvestQuery,
    state: SessionState,
    request: OaiRequest,
    executor: RequestExecutor<F>,
    store: S,
    scan: ResumptionScan,
    sink: Arc<dyn ProgressSink>,
    current_url: Option<Url>,
    started_at: Option<Instant>,
    pages_written: u32,
    last_session_number: Option<u32>,
    last_outcome: Option<StepOutcome>,
}

impl<F: Fetcher, S: PageStore> HarvestSession<F, S> {
    pub fn new(
        config: HarvestConfig,
        executor: RequestExecutor<F>,
        store: S,
    ) -> Result<Self, HarvestError> {
        config.validate()?;
        let request = OaiRequest::new(&config.base_url)?;
        Ok(Self {
            query: HarvestQuery::from_config(&config),
            scan: ResumptionScan::from_config(&config),
            config,
            state: SessionState::Inactive,
            request,
            executor,
            store,
            sink: Arc::new(LogProgressSink),
            current_url: None,
            started_at: None,
            pages_written: 0,
            last_session_number: None,
            last_outcome: None,
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// The parameters the next initial request will use.
    pub fn query(&self) -> &HarvestQuery {
        &self.query
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// URL of the request in flight or last issued in the active session.
    pub fn current_url(&self) -> Option<&Url> {
        self.current_url.as_ref()
    }

    /// Pages written by the most recently started session.
    pub fn pages_written(&self) -> u32 {
        self.pages_written
    }

    pub fn last_session_number(&self) -> Option<u32> {
        self.last_session_number
    }

    pub fn last_outcome(&self) -> Option<&StepOutcome> {
        self.last_outcome.as_ref()
    }

    /// Forces the session back to inactive, from any state.
    pub fn reset(&mut self) {
        if let Some(session_number) = self.state.session_number() {
            engine_debug!("Resetting session {}", session_number);
        }
        // Reset is accepted from every state.
        if let Ok((state, _)) = update(self.state, Msg::Reset) {
            self.state = state;
        }
        self.current_url = None;
    }

    /// Prepares an incremental harvest on top of `prior_session` (or the most
    /// recent session): the query adopts that session's set and metadata
    /// prefix, and its `responseDate` becomes the new `from`.
    pub fn setup_incremental(&mut self, prior_session: Option<u32>) -> Result<(), HarvestError> {
        self.state.require_inactive()?;
        let session_number = match prior_session {
            Some(number) => number,
            None => self.store.locate_last_session()?.session_number,
        };
        if session_number < 1 {
            return Err(HarvestError::NoPriorSession);
        }

        let (path, source) = self
            .store
            .read_first_page(session_number, self.config.page_padding)?;
        let header = read_session_header(source, &path)?;
        engine_info!(
            "Incremental harvest from session {} ({:?}): from={} set={:?} metadataPrefix={}",
            session_number,
            path,
            header.response_date,
            header.set,
            header.metadata_prefix
        );
        self.query = HarvestQuery {
            set: header.set,
            metadata_prefix: header.metadata_prefix,
            from: Some(header.response_date),
        };
        Ok(())
    }

    /// Claims the next session number and issues the initial request.
    pub async fn start(&mut self) -> Result<StepOutcome, HarvestError> {
        self.state.require_inactive()?;
        let session_number = self.store.locate_last_session()?.session_number + 1;
        let (state, _) = update(self.state, Msg::Begin { session_number })?;
        self.state = state;
        self.pages_written = 0;
        self.last_session_number = Some(session_number);
        self.last_outcome = None;
        self.started_at = Some(Instant::now());

        engine_info!(
            "Starting session {} with initial request to {}",
            session_number,
            self.config.base_url
        );
        let url = self.request.list_records(&self.query);
        self.step(url, RequestKind::Initial).await
    }

    /// Requests the next page with `token`. Only valid while active.
    pub async fn continue_session(&mut self, token: &str) -> Result<StepOutcome, HarvestError> {
        self.state.require_active()?;
        let url = self.request.resume("ListRecords", token);
        self.step(url, RequestKind::Continuation).await
    }

    /// Drops the time part of `from` after the repository rejected it.
    pub fn fallback_to_date_only(&mut self) -> Option<(String, String)> {
        let (from, to) = self.query.truncate_from_to_date()?;
        self.sink.emit(HarvestEvent::DateFallback {
            from: from.clone(),
            to: to.clone(),
        });
        Some((from, to))
    }

    async fn step(&mut self, url: Url, request: RequestKind) -> Result<StepOutcome, HarvestError> {
        let (session_number, page_index) = self.state.require_active()?;
        self.current_url = Some(url.clone());

        let response = self.executor.execute(&url, self.sink.as_ref()).await?;
        let path = self.store.write_page(
            session_number,
            page_index,
            self.config.page_padding,
            &response.raw,
        )?;
        self.pages_written += 1;
        self.sink.emit(HarvestEvent::PageWritten {
            session_number,
            page_number: page_index + 1,
            path,
        });

        let resumption = self.scan.extract(&response.body)?;
        let (state, outcome) = page_stored(self.state, request, resumption)?;
        self.state = state;

        match &outcome {
            StepOutcome::Continue(info) => self.sink.emit(HarvestEvent::Resumption {
                info: info.clone(),
                elapsed: self
                    .started_at
                    .map(|started| started.elapsed())
                    .unwrap_or_default(),
            }),
            StepOutcome::Completed => {
                self.sink.emit(HarvestEvent::Completed {
                    session_number,
                    pages: self.pages_written,
                });
                self.reset();
            }
            StepOutcome::Stalled => self.sink.emit(HarvestEvent::Stalled {
                session_number,
                pages: self.pages_written,
            }),
        }
        self.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }
}

use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use oai_harvester_core::{HarvestConfig, StepOutcome};

use crate::{
    FetchSettings, Fetcher, FsPageStore, HarvestError, HarvestSession, PageStore, ProgressSink,
    RequestExecutor, ReqwestFetcher,
};

/// How a run relates to earlier sessions in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncrementalMode {
    /// A brand new harvest using the configured query.
    #[default]
    Fresh,
    /// Only records newer than the most recent session.
    Latest,
    /// Only records newer than the given session.
    FromSession(u32),
}

/// Runs `session` to completion: optional incremental setup, the initial
/// request (retried once with a date-only `from` if the repository rejects
/// the datetime), then continuation requests until the list completes or
/// stalls. Returns the session for inspection.
pub async fn run_session<F: Fetcher, S: PageStore>(
    mut session: HarvestSession<F, S>,
    mode: IncrementalMode,
) -> Result<HarvestSession<F, S>, HarvestError> {
    match mode {
        IncrementalMode::Fresh => {}
        IncrementalMode::Latest => session.setup_incremental(None)?,
        IncrementalMode::FromSession(number) => session.setup_incremental(Some(number))?,
    }

    let mut outcome = match session.start().await {
        Ok(outcome) => outcome,
        Err(HarvestError::Protocol(err)) if err.is_malformed_date() => {
            if session.fallback_to_date_only().is_none() {
                return Err(HarvestError::Protocol(err));
            }
            session.reset();
            session.start().await?
        }
        Err(err) => return Err(err),
    };

    while let StepOutcome::Continue(info) = &outcome {
        let token = info.token.clone();
        outcome = session.continue_session(&token).await?;
    }

    match outcome {
        StepOutcome::Stalled => engine_warn!(
            "Session {:?} left active after stalling; reset it before harvesting again",
            session.last_session_number()
        ),
        _ => engine_info!(
            "Harvest finished: session {:?}, {} page(s)",
            session.last_session_number(),
            session.pages_written()
        ),
    }
    Ok(session)
}

/// Builds a reqwest-backed session over the filesystem store named by
/// `config.base_path` and runs it.
pub async fn run_default_session(
    config: HarvestConfig,
    settings: FetchSettings,
    mode: IncrementalMode,
    sink: Arc<dyn ProgressSink>,
) -> Result<HarvestSession<ReqwestFetcher, FsPageStore>, HarvestError> {
    let fallback_retry_after = settings.fallback_retry_after;
    let executor = RequestExecutor::new(ReqwestFetcher::new(settings)?, fallback_retry_after);
    let store = FsPageStore::new(&config.base_path);
    let session = HarvestSession::new(config, executor, store)?.with_sink(sink);
    run_session(session, mode).await
}

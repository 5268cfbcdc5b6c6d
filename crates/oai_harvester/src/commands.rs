use std::sync::Arc;

use anyhow::Context;
use engine_logging::engine_warn;
use oai_harvester_core::{HarvestConfig, StepOutcome};
use oai_harvester_engine::{
    list_metadata_formats, list_sets, run_default_session, FetchSettings, FsPageStore,
    IncrementalMode, LogProgressSink, OaiRequest, PageStore, RequestExecutor, ReqwestFetcher,
};

/// `None` without the flag, `Some(None)` for a bare `--incremental`.
fn incremental_mode(incremental: Option<Option<u32>>) -> IncrementalMode {
    match incremental {
        None => IncrementalMode::Fresh,
        Some(None) => IncrementalMode::Latest,
        Some(Some(session)) => IncrementalMode::FromSession(session),
    }
}

fn executor() -> anyhow::Result<RequestExecutor<ReqwestFetcher>> {
    let settings = FetchSettings::default();
    let fallback_retry_after = settings.fallback_retry_after;
    let fetcher = ReqwestFetcher::new(settings).context("building HTTP client")?;
    Ok(RequestExecutor::new(fetcher, fallback_retry_after))
}

pub(crate) async fn harvest(
    config: HarvestConfig,
    incremental: Option<Option<u32>>,
) -> anyhow::Result<()> {
    let session = run_default_session(
        config,
        FetchSettings::default(),
        incremental_mode(incremental),
        Arc::new(LogProgressSink),
    )
    .await
    .context("harvest failed")?;

    let session_number = session.last_session_number().unwrap_or_default();
    match session.last_outcome() {
        Some(StepOutcome::Stalled) => {
            engine_warn!(
                "Session {} stalled; run `oai-harvest clear {}` before retrying",
                session_number,
                session_number
            );
            println!(
                "session {} stalled after {} page(s)",
                session_number,
                session.pages_written()
            );
        }
        _ => println!(
            "session {} complete: {} page(s)",
            session_number,
            session.pages_written()
        ),
    }
    Ok(())
}

pub(crate) async fn sets(config: &HarvestConfig) -> anyhow::Result<()> {
    let request = OaiRequest::new(&config.base_url)?;
    let sets = list_sets(&executor()?, &request, &LogProgressSink)
        .await
        .context("ListSets failed")?;
    for set in sets {
        println!("{}\t{}", set.spec, set.name);
    }
    Ok(())
}

pub(crate) async fn formats(config: &HarvestConfig, identifier: Option<&str>) -> anyhow::Result<()> {
    let request = OaiRequest::new(&config.base_url)?;
    let formats = list_metadata_formats(&executor()?, &request, identifier, &LogProgressSink)
        .await
        .context("ListMetadataFormats failed")?;
    for format in formats {
        println!("{}\t{}\t{}", format.prefix, format.schema, format.namespace);
    }
    Ok(())
}

pub(crate) fn last_session(config: &HarvestConfig) -> anyhow::Result<()> {
    let last = FsPageStore::new(&config.base_path).locate_last_session()?;
    match last.first_page {
        Some(path) => println!("{}\t{}", last.session_number, path.display()),
        None => println!("no sessions under {}", config.base_path.display()),
    }
    Ok(())
}

pub(crate) fn clear(config: &HarvestConfig, session: u32) -> anyhow::Result<()> {
    let deleted = FsPageStore::new(&config.base_path)
        .clear_session(session)
        .with_context(|| format!("clearing session {}", session))?;
    for path in &deleted {
        println!("{}", path.display());
    }
    Ok(())
}

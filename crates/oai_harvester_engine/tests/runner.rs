mod support;

use oai_harvester_core::{SessionState, StepOutcome};
use oai_harvester_engine::{
    run_session, HarvestError, HarvestEvent, IncrementalMode, OaiErrorCode, PageStore,
};
use pretty_assertions::assert_eq;
use support::{
    config_for, error_page, file_names, init_logging, list_records_page, request_element,
    session_with_events, xml, OAI_PATH,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer};

#[tokio::test]
async fn runner_follows_tokens_to_completion() {
    init_logging();
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path(OAI_PATH))
        .and(query_param_is_missing("resumptionToken"))
        .respond_with(xml(list_records_page(
            &request_element(r#"verb="ListRecords" metadataPrefix="arXivRaw""#),
            Some(r#"<resumptionToken cursor="0" completeListSize="3">a</resumptionToken>"#),
        )))
        .expect(1)
        .mount(&server)
        .await;
    for (token, next) in [
        ("a", r#"<resumptionToken cursor="1" completeListSize="3">b</resumptionToken>"#),
        ("b", r#"<resumptionToken cursor="2" completeListSize="3"/>"#),
    ] {
        Mock::given(method("GET"))
            .and(path(OAI_PATH))
            .and(query_param("resumptionToken", token))
            .respond_with(xml(list_records_page(
                &request_element(r#"verb="ListRecords""#),
                Some(next),
            )))
            .expect(1)
            .mount(&server)
            .await;
    }

    let (session, _events) = session_with_events(config_for(&server, temp.path().join("reclist")));
    let session = run_session(session, IncrementalMode::Fresh).await.unwrap();

    assert_eq!(session.state(), SessionState::Inactive);
    assert_eq!(session.pages_written(), 3);
    assert_eq!(
        file_names(temp.path()),
        vec!["reclist1_0001", "reclist1_0002", "reclist1_0003"]
    );
}

#[tokio::test]
async fn bad_date_retries_once_with_date_only_from() {
    init_logging();
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path(OAI_PATH))
        .and(query_param("from", "2020-01-01T00:00:00"))
        .respond_with(xml(error_page("badArgument", "Bad date format")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(OAI_PATH))
        .and(query_param("from", "2020-01-01"))
        .respond_with(xml(list_records_page(
            &request_element(r#"verb="ListRecords" from="2020-01-01" metadataPrefix="arXivRaw""#),
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server, temp.path().join("reclist"));
    config.from = Some("2020-01-01T00:00:00".to_string());
    let (session, events) = session_with_events(config);
    let session = run_session(session, IncrementalMode::Fresh).await.unwrap();

    assert_eq!(session.query().from.as_deref(), Some("2020-01-01"));
    assert_eq!(session.last_session_number(), Some(1));
    // The rejected request wrote nothing, so the retry still uses session 1.
    assert_eq!(file_names(temp.path()), vec!["reclist1_0001"]);
    assert!(events.try_iter().any(|event| event
        == HarvestEvent::DateFallback {
            from: "2020-01-01T00:00:00".to_string(),
            to: "2020-01-01".to_string(),
        }));
}

#[tokio::test]
async fn bad_date_without_time_part_is_returned() {
    init_logging();
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path(OAI_PATH))
        .respond_with(xml(error_page("badArgument", "Bad date format")))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server, temp.path().join("reclist"));
    config.from = Some("2020-01-01".to_string());
    let (session, _events) = session_with_events(config);
    let err = run_session(session, IncrementalMode::Fresh).await.err().unwrap();
    assert_eq!(
        err.as_protocol().map(|oai| oai.code.clone()),
        Some(OaiErrorCode::BadArgument)
    );
}

#[tokio::test]
async fn other_protocol_errors_propagate() {
    init_logging();
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path(OAI_PATH))
        .respond_with(xml(error_page("noRecordsMatch", "Nothing new")))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _events) = session_with_events(config_for(&server, temp.path().join("reclist")));
    let err = run_session(session, IncrementalMode::Fresh).await.err().unwrap();
    assert!(matches!(
        err,
        HarvestError::Protocol(ref oai) if oai.code == OaiErrorCode::NoRecordsMatch
    ));
    assert!(file_names(temp.path()).is_empty());
}

#[tokio::test]
async fn latest_mode_harvests_since_previous_session() {
    init_logging();
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path(OAI_PATH))
        .and(query_param("verb", "ListRecords"))
        .and(query_param("from", "2020-01-02T03:04:05Z"))
        .and(query_param("set", "math"))
        .and(query_param("metadataPrefix", "oai_dc"))
        .respond_with(xml(list_records_page(
            &request_element(r#"verb="ListRecords" set="math" metadataPrefix="oai_dc""#),
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _events) = session_with_events(config_for(&server, temp.path().join("reclist")));
    let previous = list_records_page(
        &request_element(r#"verb="ListRecords" set="math" metadataPrefix="oai_dc""#),
        None,
    );
    session.store().write_page(1, 0, 4, previous.as_bytes()).unwrap();

    let session = run_session(session, IncrementalMode::Latest).await.unwrap();
    assert_eq!(session.last_session_number(), Some(2));
    assert_eq!(
        file_names(temp.path()),
        vec!["reclist1_0001", "reclist2_0001"]
    );
}

#[tokio::test]
async fn incremental_mode_without_sessions_fails_before_any_request() {
    init_logging();
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    let (session, _events) = session_with_events(config_for(&server, temp.path().join("reclist")));
    let err = run_session(session, IncrementalMode::Latest).await.err().unwrap();
    assert!(matches!(err, HarvestError::NoPriorSession));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn runner_returns_stalled_session_still_active() {
    init_logging();
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path(OAI_PATH))
        .and(query_param_is_missing("resumptionToken"))
        .respond_with(xml(list_records_page(
            &request_element(r#"verb="ListRecords" metadataPrefix="arXivRaw""#),
            Some(r#"<resumptionToken cursor="0" completeListSize="200">next</resumptionToken>"#),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(OAI_PATH))
        .and(query_param("resumptionToken", "next"))
        .respond_with(xml(list_records_page(
            &request_element(r#"verb="ListRecords""#),
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _events) = session_with_events(config_for(&server, temp.path().join("reclist")));
    let session = run_session(session, IncrementalMode::Fresh).await.unwrap();

    assert_eq!(session.last_outcome(), Some(&StepOutcome::Stalled));
    assert_eq!(
        session.state(),
        SessionState::Active {
            session_number: 1,
            page_index: 1
        }
    );
    assert_eq!(file_names(temp.path()), vec!["reclist1_0001", "reclist1_0002"]);
}

#[tokio::test]
async fn explicit_session_zero_has_no_prior_session() {
    init_logging();
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    let (session, _events) = session_with_events(config_for(&server, temp.path().join("reclist")));
    let err = run_session(session, IncrementalMode::FromSession(0))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, HarvestError::NoPriorSession));
    assert!(server.received_requests().await.unwrap().is_empty());
}

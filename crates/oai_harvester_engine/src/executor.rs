use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use quick_xml::events::Event;
use url::Url;

use crate::decode::decode_xml;
use crate::xml::{attribute, read_element_text, reader_for, XmlError};
use crate::{
    FailureKind, FetchError, Fetcher, HarvestError, HarvestEvent, OaiError, OaiErrorCode,
    OaiResponse, ProgressSink,
};

const SERVICE_UNAVAILABLE: u16 = 503;
/// OAI `<error>` elements come right after `responseDate` and `request`.
const MAX_SCANNED_ELEMENTS: usize = 6;

/// Wraps a [`Fetcher`] with the OAI-PMH flow control: waits out 503s for as
/// long as the server asks, fails on other error statuses and surfaces
/// `<error>` elements as [`HarvestError::Protocol`].
pub struct RequestExecutor<F> {
    fetcher: F,
    fallback_retry_after: Duration,
}

impl<F: Fetcher> RequestExecutor<F> {
    pub fn new(fetcher: F, fallback_retry_after: Duration) -> Self {
        Self {
            fetcher,
            fallback_retry_after,
        }
    }

    pub async fn execute(
        &self,
        url: &Url,
        sink: &dyn ProgressSink,
    ) -> Result<OaiResponse, HarvestError> {
        sink.emit(HarvestEvent::RequestIssued {
            url: url.to_string(),
        });
        let mut response = self.fetcher.get(url).await?;
        while response.status == SERVICE_UNAVAILABLE {
            let wait = self.retry_after(response.header("retry-after"));
            sink.emit(HarvestEvent::Backoff { wait });
            tokio::time::sleep(wait).await;
            response = self.fetcher.get(url).await?;
        }

        if !response.is_success() {
            let body = String::from_utf8_lossy(&response.body).into_owned();
            return Err(FetchError::new(FailureKind::HttpStatus(response.status), body).into());
        }
        let body = decode_xml(&response.body, response.header("content-type"))?.text;

        if let Some(err) = find_oai_error(&body)? {
            engine_debug!("OAI error for {}: {}", url, err);
            return Err(err.into());
        }

        Ok(OaiResponse {
            url: url.to_string(),
            raw: response.body,
            body,
        })
    }

    fn retry_after(&self, header: Option<&str>) -> Duration {
        let parsed = header
            .and_then(|value| value.trim().parse::<f64>().ok())
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
        parsed.unwrap_or_else(|| {
            engine_warn!(
                "503 without a usable Retry-After ({:?}); waiting {:?}",
                header,
                self.fallback_retry_after
            );
            self.fallback_retry_after
        })
    }
}

/// Looks for an `error` element (any namespace) among the first children of
/// the root element.
pub fn find_oai_error(body: &str) -> Result<Option<OaiError>, XmlError> {
    let mut reader = reader_for(body.as_bytes());
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut seen = 0usize;
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(XmlError::new)? {
            Event::Start(start) => {
                if depth == 1 {
                    seen += 1;
                    if seen > MAX_SCANNED_ELEMENTS {
                        return Ok(None);
                    }
                    if start.local_name().as_ref() == b"error" {
                        let code = attribute(&start, "code")?.unwrap_or_default();
                        let message = read_element_text(&mut reader)?;
                        return Ok(Some(OaiError::new(
                            OaiErrorCode::parse(&code),
                            message.trim(),
                        )));
                    }
                }
                depth += 1;
            }
            Event::Empty(start) if depth == 1 => {
                seen += 1;
                if seen > MAX_SCANNED_ELEMENTS {
                    return Ok(None);
                }
                if start.local_name().as_ref() == b"error" {
                    let code = attribute(&start, "code")?.unwrap_or_default();
                    return Ok(Some(OaiError::new(OaiErrorCode::parse(&code), "")));
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(None);
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaced_error_is_found() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
<responseDate>2020-01-02T00:00:00Z</responseDate>
<request verb="ListRecords">http://export.arxiv.org/oai2</request>
<error code="badArgument">Bad date format</error>
</OAI-PMH>"#;
        let err = find_oai_error(body).unwrap().unwrap();
        assert_eq!(err.code, OaiErrorCode::BadArgument);
        assert_eq!(err.message, "Bad date format");
    }

    #[test]
    fn prefixed_error_is_found() {
        let body = r#"<oai:OAI-PMH xmlns:oai="http://www.openarchives.org/OAI/2.0/"><oai:error code="noRecordsMatch">none</oai:error></oai:OAI-PMH>"#;
        let err = find_oai_error(body).unwrap().unwrap();
        assert_eq!(err.code, OaiErrorCode::NoRecordsMatch);
    }

    #[test]
    fn nested_error_elements_are_not_protocol_errors() {
        let body = r#"<OAI-PMH><responseDate>x</responseDate><ListRecords><record><error code="x">in a record</error></record></ListRecords></OAI-PMH>"#;
        assert_eq!(find_oai_error(body).unwrap(), None);
    }

    #[test]
    fn only_the_first_six_children_are_scanned() {
        let body = format!(
            "<OAI-PMH>{}<error code=\"badVerb\">late</error></OAI-PMH>",
            "<a/>".repeat(6)
        );
        assert_eq!(find_oai_error(&body).unwrap(), None);
    }
}

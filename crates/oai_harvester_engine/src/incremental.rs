use std::io::BufRead;
use std::path::Path;

use quick_xml::events::Event;

use crate::xml::{attribute, read_element_text, reader_for, XmlError};
use crate::HarvestError;

const LIST_RECORDS: &str = "ListRecords";

/// The query echoed by a stored first page: its `responseDate` and the
/// `request` element's attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHeader {
    pub response_date: String,
    pub metadata_prefix: String,
    pub set: Option<String>,
}

/// Streams a stored page until both top-level `responseDate` and `request`
/// elements were seen.
pub fn read_session_header<R: BufRead>(
    source: R,
    path: &Path,
) -> Result<SessionHeader, HarvestError> {
    let mut reader = reader_for(source);
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut response_date: Option<String> = None;
    let mut request: Option<(String, Option<String>)> = None;

    while response_date.is_none() || request.is_none() {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(XmlError::new)? {
            Event::Start(start) if depth == 1 => match start.local_name().as_ref() {
                b"responseDate" => {
                    response_date = Some(read_element_text(&mut reader)?.trim().to_string());
                }
                b"request" => {
                    request = Some(request_attributes(&start, path)?);
                    read_element_text(&mut reader)?;
                }
                _ => depth += 1,
            },
            Event::Empty(start) if depth == 1 && start.local_name().as_ref() == b"request" => {
                request = Some(request_attributes(&start, path)?);
            }
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match (response_date, request) {
        (Some(response_date), Some((metadata_prefix, set))) => Ok(SessionHeader {
            response_date,
            metadata_prefix,
            set,
        }),
        (None, None) => Err(malformed(path, "responseDate and request")),
        (None, Some(_)) => Err(malformed(path, "responseDate")),
        (Some(_), None) => Err(malformed(path, "request")),
    }
}

fn request_attributes(
    start: &quick_xml::events::BytesStart<'_>,
    path: &Path,
) -> Result<(String, Option<String>), HarvestError> {
    let verb = attribute(start, "verb")?.unwrap_or_default();
    if verb != LIST_RECORDS {
        return Err(HarvestError::UnsupportedVerb { verb });
    }
    let metadata_prefix = attribute(start, "metadataPrefix")?
        .ok_or_else(|| malformed(path, "request metadataPrefix"))?;
    let set = attribute(start, "set")?;
    Ok((metadata_prefix, set))
}

fn malformed(path: &Path, missing: &str) -> HarvestError {
    HarvestError::MalformedSessionFile {
        path: path.to_path_buf(),
        missing: missing.to_string(),
    }
}

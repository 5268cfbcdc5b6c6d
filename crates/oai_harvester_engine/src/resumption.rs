//! Resumption token extraction.
//!
//! OAI-PMH places `<resumptionToken>` as the last child of the list element,
//! so by default only the tail of the body is searched, line by line. When
//! the tail holds no token line, an optional full streaming parse covers
//! repositories that do not put the element on its own line.

use oai_harvester_core::{HarvestConfig, ResumptionInfo};
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

use crate::xml::{attribute, read_element_text, reader_for, XmlError};

const TOKEN_TAG: &str = "resumptionToken";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("malformed resumptionToken element: {0}")]
    Malformed(#[from] XmlError),
    #[error("resumptionToken attribute {name} is not an integer: {value:?}")]
    BadAttribute { name: &'static str, value: String },
}

/// Where to look for the resumption token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumptionScan {
    /// Trailing bytes searched line by line; `None` skips the tail search.
    pub tail_window: Option<usize>,
    /// Parse the whole document when the tail search finds nothing.
    pub full_parse_fallback: bool,
}

impl Default for ResumptionScan {
    fn default() -> Self {
        Self::from_config(&HarvestConfig::default())
    }
}

impl ResumptionScan {
    pub fn from_config(config: &HarvestConfig) -> Self {
        Self {
            tail_window: config.tail_window,
            full_parse_fallback: config.full_parse_fallback,
        }
    }

    /// Extracts pagination info from a response body. `Ok(None)` means the
    /// body carries no `resumptionToken` element at all, which is distinct
    /// from an element with an empty token.
    pub fn extract(&self, body: &str) -> Result<Option<ResumptionInfo>, CodecError> {
        if let Some(window) = self.tail_window {
            if let Some(line) = find_token_line(tail(body, window)) {
                return parse_token_element(line).map(Some);
            }
            if !self.full_parse_fallback {
                return Ok(None);
            }
        }
        scan_document(body)
    }
}

fn tail(body: &str, window: usize) -> &str {
    let mut start = body.len().saturating_sub(window);
    while !body.is_char_boundary(start) {
        start += 1;
    }
    &body[start..]
}

fn find_token_line(text: &str) -> Option<&str> {
    text.lines()
        .map(str::trim_start)
        .find(|line| line.starts_with("<resumptionToken"))
}

/// Parses a single line holding a standalone `<resumptionToken>` element.
/// Anything after the element's end tag is ignored.
pub fn parse_token_element(line: &str) -> Result<ResumptionInfo, CodecError> {
    let mut reader = reader_for(line.as_bytes());
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(XmlError::new)? {
            Event::Start(start) => {
                let token = read_element_text(&mut reader)?;
                return build_info(&start, token);
            }
            Event::Empty(start) => {
                return build_info(&start, String::new());
            }
            Event::Eof => {
                return Err(XmlError::new("no resumptionToken element found").into());
            }
            _ => {}
        }
    }
}

fn scan_document(body: &str) -> Result<Option<ResumptionInfo>, CodecError> {
    let mut reader = reader_for(body.as_bytes());
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(XmlError::new)? {
            Event::Start(start) if start.local_name().as_ref() == TOKEN_TAG.as_bytes() => {
                let token = read_element_text(&mut reader)?;
                return build_info(&start, token).map(Some);
            }
            Event::Empty(start) if start.local_name().as_ref() == TOKEN_TAG.as_bytes() => {
                return build_info(&start, String::new()).map(Some);
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn build_info(start: &BytesStart<'_>, token: String) -> Result<ResumptionInfo, CodecError> {
    Ok(ResumptionInfo {
        token: token.trim().to_string(),
        complete_list_size: integer_attribute(start, "completeListSize")?,
        cursor: integer_attribute(start, "cursor")?,
    })
}

fn integer_attribute(start: &BytesStart<'_>, name: &'static str) -> Result<Option<u64>, CodecError> {
    match attribute(start, name)? {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| CodecError::BadAttribute { name, value }),
        None => Ok(None),
    }
}

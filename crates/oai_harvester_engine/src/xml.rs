//! Small quick-xml helpers shared by the response parsers.
use std::fmt;
use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("xml error: {0}")]
pub struct XmlError(String);

impl XmlError {
    pub(crate) fn new(message: impl fmt::Display) -> Self {
        Self(message.to_string())
    }
}

pub(crate) fn reader_for<R: BufRead>(source: R) -> Reader<R> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);
    reader
}

/// Unescaped value of the attribute `name`, if present.
pub(crate) fn attribute(start: &BytesStart<'_>, name: &str) -> Result<Option<String>, XmlError> {
    match start
        .try_get_attribute(name)
        .map_err(XmlError::new)?
    {
        Some(attr) => attr
            .unescape_value()
            .map(|value| Some(value.into_owned()))
            .map_err(XmlError::new),
        None => Ok(None),
    }
}

/// Collects the text content of the element whose start tag was just read,
/// consuming events up to and including its end tag. Uses its own scratch
/// buffer so the caller's start event stays borrowable.
pub(crate) fn read_element_text<R: BufRead>(reader: &mut Reader<R>) -> Result<String, XmlError> {
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut depth = 0usize;
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(XmlError::new)? {
            Event::Text(t) => text.push_str(&t.unescape().map_err(XmlError::new)?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c.into_inner())),
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => return Ok(text),
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(XmlError::new("unexpected end of document")),
            _ => {}
        }
    }
}

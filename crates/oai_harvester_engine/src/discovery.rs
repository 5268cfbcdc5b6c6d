//! `ListSets` and `ListMetadataFormats`, for choosing a set and format
//! before harvesting.

use quick_xml::events::Event;

use crate::request::OaiRequest;
use crate::resumption::ResumptionScan;
use crate::xml::{read_element_text, reader_for, XmlError};
use crate::{Fetcher, HarvestError, ProgressSink, RequestExecutor};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SetInfo {
    /// Specifier usable as the harvest `set`.
    pub spec: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataFormat {
    /// Prefix usable as the harvest metadata format.
    pub prefix: String,
    pub schema: String,
    pub namespace: String,
}

/// All sets of the repository, following resumption tokens.
pub async fn list_sets<F: Fetcher>(
    executor: &RequestExecutor<F>,
    request: &OaiRequest,
    sink: &dyn ProgressSink,
) -> Result<Vec<SetInfo>, HarvestError> {
    let scan = ResumptionScan::default();
    let mut sets = Vec::new();
    let mut url = request.list_sets();
    loop {
        let response = executor.execute(&url, sink).await?;
        sets.extend(parse_sets(&response.body)?);
        match scan.extract(&response.body)? {
            Some(info) if !info.is_final() => url = request.resume("ListSets", &info.token),
            _ => return Ok(sets),
        }
    }
}

/// Metadata formats of the repository, or of one item when `identifier` is
/// given.
pub async fn list_metadata_formats<F: Fetcher>(
    executor: &RequestExecutor<F>,
    request: &OaiRequest,
    identifier: Option<&str>,
    sink: &dyn ProgressSink,
) -> Result<Vec<MetadataFormat>, HarvestError> {
    let response = executor
        .execute(&request.list_metadata_formats(identifier), sink)
        .await?;
    Ok(parse_formats(&response.body)?)
}

pub fn parse_sets(body: &str) -> Result<Vec<SetInfo>, XmlError> {
    let mut reader = reader_for(body.as_bytes());
    let mut buf = Vec::new();
    let mut sets = Vec::new();
    let mut current: Option<SetInfo> = None;
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(XmlError::new)? {
            Event::Start(start) => match start.local_name().as_ref() {
                b"set" => current = Some(SetInfo::default()),
                b"setSpec" => {
                    let text = read_element_text(&mut reader)?;
                    if let Some(set) = current.as_mut() {
                        set.spec = text.trim().to_string();
                    }
                }
                b"setName" => {
                    let text = read_element_text(&mut reader)?;
                    if let Some(set) = current.as_mut() {
                        set.name = text.trim().to_string();
                    }
                }
                // Free-form descriptions may nest arbitrary markup.
                b"setDescription" => {
                    read_element_text(&mut reader)?;
                }
                _ => {}
            },
            Event::End(end) if end.local_name().as_ref() == b"set" => {
                sets.extend(current.take());
            }
            Event::Eof => return Ok(sets),
            _ => {}
        }
    }
}

pub fn parse_formats(body: &str) -> Result<Vec<MetadataFormat>, XmlError> {
    let mut reader = reader_for(body.as_bytes());
    let mut buf = Vec::new();
    let mut formats = Vec::new();
    let mut current: Option<MetadataFormat> = None;
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(XmlError::new)? {
            Event::Start(start) => {
                let field = match start.local_name().as_ref() {
                    b"metadataFormat" => {
                        current = Some(MetadataFormat::default());
                        continue;
                    }
                    b"metadataPrefix" => 0,
                    b"schema" => 1,
                    b"metadataNamespace" => 2,
                    _ => continue,
                };
                let text = read_element_text(&mut reader)?.trim().to_string();
                if let Some(format) = current.as_mut() {
                    match field {
                        0 => format.prefix = text,
                        1 => format.schema = text,
                        _ => format.namespace = text,
                    }
                }
            }
            Event::End(end) if end.local_name().as_ref() == b"metadataFormat" => {
                formats.extend(current.take());
            }
            Event::Eof => return Ok(formats),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sets_pair_spec_with_name() {
        let body = r#"<OAI-PMH><ListSets>
<set><setSpec>cs</setSpec><setName>Computer Science</setName></set>
<set><setSpec>physics:astro-ph</setSpec><setName>Astrophysics</setName>
<setDescription><oai_dc:dc xmlns:oai_dc="x"><dc:description xmlns:dc="y">d</dc:description></oai_dc:dc></setDescription></set>
</ListSets></OAI-PMH>"#;
        assert_eq!(
            parse_sets(body).unwrap(),
            vec![
                SetInfo {
                    spec: "cs".into(),
                    name: "Computer Science".into()
                },
                SetInfo {
                    spec: "physics:astro-ph".into(),
                    name: "Astrophysics".into()
                },
            ]
        );
    }

    #[test]
    fn formats_collect_all_three_fields() {
        let body = r#"<OAI-PMH><ListMetadataFormats>
<metadataFormat><metadataPrefix>oai_dc</metadataPrefix><schema>http://www.openarchives.org/OAI/2.0/oai_dc.xsd</schema><metadataNamespace>http://www.openarchives.org/OAI/2.0/oai_dc/</metadataNamespace></metadataFormat>
<metadataFormat><metadataPrefix>arXivRaw</metadataPrefix><schema>http://arxiv.org/OAI/arXivRaw.xsd</schema><metadataNamespace>http://arxiv.org/OAI/arXivRaw/</metadataNamespace></metadataFormat>
</ListMetadataFormats></OAI-PMH>"#;
        let formats = parse_formats(body).unwrap();
        assert_eq!(formats.len(), 2);
        assert_eq!(formats[1].prefix, "arXivRaw");
        assert_eq!(formats[1].schema, "http://arxiv.org/OAI/arXivRaw.xsd");
        assert_eq!(formats[0].namespace, "http://www.openarchives.org/OAI/2.0/oai_dc/");
    }
}

//! Namespace-agnostic XML helpers shared by the SOAP, capability and
//! discovery parsers.
//!
//! ONVIF devices disagree wildly on namespace prefixes (`tds:`, `tt:`,
//! `ns2:`, none at all), so everything here matches on local names only.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use super::soap::{SoapError, SoapResult};

/// Strips the namespace prefix from a qualified name.
pub(crate) fn local_name(qname: &[u8]) -> &[u8] {
    match qname.iter().rposition(|&b| b == b':') {
        Some(idx) => &qname[idx + 1..],
        None => qname,
    }
}

fn local_name_string(qname: &[u8]) -> String {
    String::from_utf8_lossy(local_name(qname)).into_owned()
}

fn parse_error(reader: &Reader<&[u8]>, err: quick_xml::Error) -> SoapError {
    SoapError::Parse(format!(
        "{} (at byte {})",
        err,
        reader.error_position()
    ))
}

/// A text-bearing element and the local names of its ancestors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextNode {
    /// Local names from the document root down to (and including) the element.
    pub path: Vec<String>,
    /// Entity-decoded, trimmed text content.
    pub text: String,
}

impl TextNode {
    /// Returns true if the path ends with `suffix` (compared by local name).
    pub fn ends_with(&self, suffix: &[&str]) -> bool {
        self.path.len() >= suffix.len()
            && self.path[self.path.len() - suffix.len()..]
                .iter()
                .zip(suffix)
                .all(|(a, b)| a == b)
    }

    /// Local name of the element's parent, if any.
    pub fn parent(&self) -> Option<&str> {
        self.path
            .len()
            .checked_sub(2)
            .map(|idx| self.path[idx].as_str())
    }

    /// Local name of the element itself.
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }
}

/// Walks the whole document and returns every element with non-empty text.
///
/// Fails on any well-formedness error, including elements left open at EOF.
pub(crate) fn text_nodes(xml: &str) -> SoapResult<Vec<TextNode>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut nodes = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                stack.push(local_name_string(e.name().as_ref()));
                text.clear();
            }
            Ok(Event::Text(ref e)) => {
                text.push_str(&html_escape::decode_html_entities(&String::from_utf8_lossy(e)));
            }
            Ok(Event::GeneralRef(ref e)) => {
                let entity = format!("&{};", String::from_utf8_lossy(e));
                text.push_str(&html_escape::decode_html_entities(&entity));
            }
            Ok(Event::CData(ref e)) => {
                text.push_str(&String::from_utf8_lossy(e));
            }
            Ok(Event::End(_)) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    nodes.push(TextNode {
                        path: stack.clone(),
                        text: trimmed.to_string(),
                    });
                }
                text.clear();
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_error(&reader, e)),
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(SoapError::Parse(format!(
            "unexpected end of document inside <{open}>"
        )));
    }

    Ok(nodes)
}

/// The single root element of an XML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RootElement<'a> {
    /// Local name of the root element, e.g. `GetCapabilities`.
    pub local_name: String,
    /// The root element's source text, without any declaration or comments
    /// around it.
    pub fragment: &'a str,
}

/// Checks that `xml` holds exactly one well-formed root element.
pub(crate) fn root_element(xml: &str) -> SoapResult<RootElement<'_>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut span: (Option<usize>, Option<usize>) = (None, None);
    let mut name = String::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event_into(&mut buf);
        let after = reader.buffer_position() as usize;

        match event {
            Ok(Event::Start(ref e)) => {
                if depth == 0 {
                    if span.0.is_some() {
                        return Err(SoapError::Parse("multiple root elements".into()));
                    }
                    span.0 = Some(before);
                    name = local_name_string(e.name().as_ref());
                }
                depth += 1;
            }
            Ok(Event::Empty(ref e)) => {
                if depth == 0 {
                    if span.0.is_some() {
                        return Err(SoapError::Parse("multiple root elements".into()));
                    }
                    span = (Some(before), Some(after));
                    name = local_name_string(e.name().as_ref());
                }
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    span.1 = Some(after);
                }
            }
            Ok(Event::Text(ref e)) if depth == 0 => {
                if e.iter().any(|b| !b.is_ascii_whitespace()) {
                    return Err(SoapError::Parse("text outside of the root element".into()));
                }
            }
            Ok(Event::CData(_)) | Ok(Event::GeneralRef(_)) if depth == 0 => {
                return Err(SoapError::Parse("text outside of the root element".into()));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_error(&reader, e)),
            _ => {}
        }
        buf.clear();
    }

    match span {
        _ if depth > 0 => Err(SoapError::Parse(format!(
            "unexpected end of document inside <{name}>"
        ))),
        (Some(start), Some(end)) => Ok(RootElement {
            local_name: name,
            fragment: &xml[start..end],
        }),
        _ => Err(SoapError::Parse("no root element".into())),
    }
}

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

fn in_field(stack: &[String], fields: &[&str]) -> bool {
    stack
        .last()
        .is_some_and(|current| fields.contains(&current.as_str()))
}

/// Rewrites the raw text of every element whose local name is in `fields`.
///
/// Plain text and CDATA section bodies are both rewritten. Everything
/// outside those spans is copied byte for byte. The document must be
/// well-formed.
pub(crate) fn rewrite_text<F>(xml: &str, fields: &[&str], rewrite: F) -> SoapResult<String>
where
    F: Fn(&str) -> String,
{
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut edits: Vec<(usize, usize, String)> = Vec::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event_into(&mut buf);
        let after = reader.buffer_position() as usize;

        match event {
            Ok(Event::Start(ref e)) => stack.push(local_name_string(e.name().as_ref())),
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(_)) if in_field(&stack, fields) => {
                let raw = &xml[before..after];
                let replaced = rewrite(raw);
                if replaced != raw {
                    edits.push((before, after, replaced));
                }
            }
            Ok(Event::CData(_)) if in_field(&stack, fields) => {
                // Only the section body is rewritten; the markers stay.
                let start = before + CDATA_OPEN.len();
                let end = after.saturating_sub(CDATA_CLOSE.len()).max(start);
                let raw = &xml[start..end];
                let replaced = rewrite(raw);
                if replaced != raw && !replaced.contains(CDATA_CLOSE) {
                    edits.push((start, end, replaced));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_error(&reader, e)),
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(SoapError::Parse(format!(
            "unexpected end of document inside <{open}>"
        )));
    }

    if edits.is_empty() {
        return Ok(xml.to_string());
    }

    let mut out = String::with_capacity(xml.len());
    let mut cursor = 0;
    for (start, end, replacement) in edits {
        out.push_str(&xml[cursor..start]);
        out.push_str(&replacement);
        cursor = end;
    }
    out.push_str(&xml[cursor..]);
    Ok(out)
}

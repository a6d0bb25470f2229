//! WS-Discovery Probe construction and ProbeMatch parsing.

use std::net::SocketAddr;

use super::types::ProbeFilter;
use crate::onvif::address::{authority_of, is_placeholder_host};
use crate::onvif::soap::SoapResult;
use crate::onvif::xml::text_nodes;
use crate::protocol_constants::{
    SOAP_ENVELOPE_NS, SOAP_ENVELOPE_PREFIX, WS_DISCOVERY_ADDRESSING_NS, WS_DISCOVERY_NS,
    WS_DISCOVERY_PROBE_ACTION, WS_DISCOVERY_TO,
};

/// Prefixes the probe envelope declares itself. Filter namespaces using
/// them are ignored.
const RESERVED_PREFIXES: &[&str] = &[SOAP_ENVELOPE_PREFIX, "a", "d"];

const ANONYMOUS_REPLY_TO: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous";

/// Builds a Probe message with the given `MessageID` (a bare UUID).
pub(crate) fn build_probe_message(filter: &ProbeFilter, message_id: &str) -> String {
    let env = SOAP_ENVELOPE_PREFIX;

    let mut declarations = format!(
        r#"xmlns:{env}="{SOAP_ENVELOPE_NS}" xmlns:a="{WS_DISCOVERY_ADDRESSING_NS}" xmlns:d="{WS_DISCOVERY_NS}""#
    );
    for (prefix, uri) in &filter.namespaces {
        if RESERVED_PREFIXES.contains(&prefix.as_str()) {
            log::warn!("[WS-Discovery] Ignoring reserved filter prefix {:?}", prefix);
            continue;
        }
        declarations.push_str(&format!(
            r#" xmlns:{prefix}="{}""#,
            html_escape::encode_double_quoted_attribute(uri)
        ));
    }

    let mut body = String::from("<d:Probe>");
    if !filter.types.is_empty() {
        body.push_str(&format!(
            "<d:Types>{}</d:Types>",
            html_escape::encode_text(&filter.types.join(" "))
        ));
    }
    if !filter.scopes.is_empty() {
        body.push_str(&format!(
            "<d:Scopes>{}</d:Scopes>",
            html_escape::encode_text(&filter.scopes.join(" "))
        ));
    }
    body.push_str("</d:Probe>");

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "<{env}:Envelope {declarations}>",
            "<{env}:Header>",
            r#"<a:Action {env}:mustUnderstand="1">{action}</a:Action>"#,
            "<a:MessageID>urn:uuid:{message_id}</a:MessageID>",
            "<a:ReplyTo><a:Address>{reply_to}</a:Address></a:ReplyTo>",
            r#"<a:To {env}:mustUnderstand="1">{to}</a:To>"#,
            "</{env}:Header>",
            "<{env}:Body>{body}</{env}:Body>",
            "</{env}:Envelope>"
        ),
        env = env,
        declarations = declarations,
        action = WS_DISCOVERY_PROBE_ACTION,
        message_id = message_id,
        reply_to = ANONYMOUS_REPLY_TO,
        to = WS_DISCOVERY_TO,
        body = body,
    )
}

/// Extracts one device address (`host[:port]`) per `ProbeMatch`.
///
/// From each whitespace separated `XAddrs` list the first candidate with a
/// real host wins. If every candidate is a placeholder and the sender is
/// known, the sender's IP is used with the advertised port.
///
/// # Errors
/// Returns `SoapError::Parse` if the reply is not well-formed XML.
pub(crate) fn parse_probe_matches(
    payload: &str,
    from: Option<SocketAddr>,
) -> SoapResult<Vec<String>> {
    let addresses = text_nodes(payload)?
        .into_iter()
        .filter(|node| node.ends_with(&["ProbeMatch", "XAddrs"]))
        .filter_map(|node| select_address(&node.text, from))
        .collect();
    Ok(addresses)
}

fn select_address(xaddrs: &str, from: Option<SocketAddr>) -> Option<String> {
    let candidates: Vec<&str> = xaddrs.split_whitespace().filter_map(authority_of).collect();

    if let Some(real) = candidates.iter().find(|a| !is_placeholder_host(a)) {
        return Some((*real).to_string());
    }

    let sender = from?;
    let first = candidates.first()?;
    log::debug!(
        "[WS-Discovery] {} advertised only placeholder addresses, using sender address",
        sender.ip()
    );
    Some(match port_of(first) {
        Some(port) => format!("{}:{}", sender.ip(), port),
        None => sender.ip().to_string(),
    })
}

/// Port of a non-bracketed `host:port` authority.
fn port_of(authority: &str) -> Option<&str> {
    let (_, port) = authority.rsplit_once(':')?;
    (!port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())).then_some(port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onvif::services::DeviceType;
    use crate::onvif::test_fixtures::{
        PROBE_MATCH_CAMERA_A, PROBE_MATCH_CAMERA_B, PROBE_MATCH_LOCALHOST_ONLY,
    };

    #[test]
    fn probe_message_has_required_headers() {
        let msg = build_probe_message(&ProbeFilter::default(), "1234-abcd");
        assert!(msg.contains("<a:MessageID>urn:uuid:1234-abcd</a:MessageID>"));
        assert!(msg.contains(
            r#"<a:Action soap-env:mustUnderstand="1">http://schemas.xmlsoap.org/ws/2005/04/discovery/Probe</a:Action>"#
        ));
        assert!(msg.contains(
            r#"<a:To soap-env:mustUnderstand="1">urn:schemas-xmlsoap-org:ws:2005:04:discovery</a:To>"#
        ));
        assert!(msg.contains("<d:Types>dn:NetworkVideoTransmitter</d:Types>"));
        assert!(msg.contains(r#"xmlns:dn="http://www.onvif.org/ver10/network/wsdl""#));
        assert!(!msg.contains("<d:Scopes>"));
        assert!(text_nodes(&msg).is_ok());
    }

    #[test]
    fn probe_message_carries_scopes_and_type() {
        let filter = ProbeFilter::for_device_type(DeviceType::Nvs)
            .with_scope("onvif://www.onvif.org/location/lobby");
        let msg = build_probe_message(&filter, "x");
        assert!(msg.contains("<d:Types>dn:NetworkVideoStorage</d:Types>"));
        assert!(msg.contains("<d:Scopes>onvif://www.onvif.org/location/lobby</d:Scopes>"));
    }

    #[test]
    fn reserved_prefixes_are_not_redeclared() {
        let mut filter = ProbeFilter::default();
        filter.namespaces.insert("d".into(), "urn:evil".into());
        let msg = build_probe_message(&filter, "x");
        assert!(!msg.contains("urn:evil"));
    }

    #[test]
    fn first_real_address_is_chosen() {
        assert_eq!(
            parse_probe_matches(PROBE_MATCH_CAMERA_A, None).unwrap(),
            vec!["192.168.1.164:80"]
        );
        assert_eq!(
            parse_probe_matches(PROBE_MATCH_CAMERA_B, None).unwrap(),
            vec!["192.168.1.200:8080"]
        );
    }

    #[test]
    fn placeholder_only_reply_falls_back_to_sender() {
        let from: SocketAddr = "10.1.2.3:3702".parse().unwrap();
        assert_eq!(
            parse_probe_matches(PROBE_MATCH_LOCALHOST_ONLY, Some(from)).unwrap(),
            vec!["10.1.2.3:8000"]
        );
        assert!(parse_probe_matches(PROBE_MATCH_LOCALHOST_ONLY, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn reply_without_matches_yields_nothing() {
        let xml = "<Envelope><Body><Hello/></Body></Envelope>";
        assert!(parse_probe_matches(xml, None).unwrap().is_empty());
    }

    #[test]
    fn garbage_reply_is_an_error() {
        assert!(parse_probe_matches("<Envelope><Body>", None).is_err());
    }

    #[test]
    fn port_extraction() {
        assert_eq!(port_of("localhost:8000"), Some("8000"));
        assert_eq!(port_of("localhost"), None);
        assert_eq!(port_of("[::1]"), None);
    }
}

//! SOAP 1.2 envelope construction and reply handling for ONVIF calls.
//!
//! This module owns the wire format only: building the envelope around a
//! serialized request payload, and turning HTTP replies into either a body or
//! a [`SoapError`]. Service resolution lives in `device.rs`, the HTTP client
//! behind [`SoapTransport`](super::transport::SoapTransport).

use std::collections::BTreeMap;

use thiserror::Error;

use super::security::{Credentials, UsernameToken};
use super::xml::{root_element, text_nodes};
use crate::protocol_constants::{
    SOAP_ENCODING_NS, SOAP_ENCODING_PREFIX, SOAP_ENVELOPE_NS, SOAP_ENVELOPE_PREFIX,
};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during SOAP exchanges with ONVIF devices.
#[derive(Debug, Error)]
pub enum SoapError {
    /// HTTP request to the device failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Device returned a non-success HTTP status without a SOAP fault.
    #[error("HTTP error {0}: {1}")]
    HttpStatus(u16, String),

    /// Device returned a SOAP fault response.
    #[error("SOAP fault: {0}")]
    Fault(String),

    /// XML was not well-formed (request payload or response body).
    #[error("Failed to parse XML: {0}")]
    Parse(String),
}

/// Convenient Result alias for SOAP operations.
pub type SoapResult<T> = Result<T, SoapError>;

impl SoapError {
    /// Returns true if the underlying HTTP request timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, SoapError::Http(e) if e.is_timeout())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Reply
// ─────────────────────────────────────────────────────────────────────────────

/// Raw HTTP reply from a SOAP POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for any 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Converts a non-2xx reply into an error.
    ///
    /// SOAP 1.2 devices report faults with 400/500 statuses, so the body is
    /// searched for a fault reason first. Without one the raw status and body
    /// are kept.
    pub fn into_success(self) -> SoapResult<Self> {
        if self.is_success() {
            return Ok(self);
        }
        match extract_fault_reason(&self.body) {
            Some(reason) => Err(SoapError::Fault(reason)),
            None => Err(SoapError::HttpStatus(self.status, self.body)),
        }
    }
}

/// Extracts the human-readable reason from a SOAP fault body.
///
/// Handles SOAP 1.2 (`Fault/Reason/Text`, falling back to the subcode or code
/// value) and SOAP 1.1 (`faultstring`). Returns `None` if the body is not XML
/// or carries no fault.
pub fn extract_fault_reason(body: &str) -> Option<String> {
    let nodes = text_nodes(body).ok()?;
    let in_fault = |n: &&super::xml::TextNode| n.path.iter().any(|p| p == "Fault");

    nodes
        .iter()
        .filter(in_fault)
        .find(|n| n.ends_with(&["Reason", "Text"]) || n.name() == "faultstring")
        .or_else(|| {
            nodes
                .iter()
                .filter(in_fault)
                .find(|n| n.ends_with(&["Subcode", "Value"]))
        })
        .or_else(|| {
            nodes
                .iter()
                .filter(in_fault)
                .find(|n| n.ends_with(&["Code", "Value"]))
        })
        .map(|n| n.text.clone())
}

// ─────────────────────────────────────────────────────────────────────────────
// Envelope Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for SOAP 1.2 envelopes around an ONVIF request payload.
///
/// # Example
/// ```ignore
/// let envelope = SoapEnvelope::builder("<tds:GetCapabilities/>")
///     .namespaces(ONVIF_NAMESPACES)
///     .action_namespace(OnvifService::Device.wsdl_namespace())
///     .credentials(Some(&creds))
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct SoapEnvelope<'a> {
    payload: &'a str,
    namespaces: BTreeMap<&'a str, &'a str>,
    action_namespace: Option<&'a str>,
    credentials: Option<&'a Credentials>,
    token: Option<UsernameToken>,
}

impl<'a> SoapEnvelope<'a> {
    /// Starts an envelope around `payload`, a single XML element.
    #[must_use]
    pub fn builder(payload: &'a str) -> Self {
        Self {
            payload,
            namespaces: BTreeMap::new(),
            action_namespace: None,
            credentials: None,
            token: None,
        }
    }

    /// Declares every `(prefix, uri)` pair on the envelope root.
    ///
    /// Later declarations of the same prefix replace earlier ones.
    #[must_use]
    pub fn namespaces(mut self, table: &[(&'a str, &'a str)]) -> Self {
        self.namespaces.extend(table.iter().copied());
        self
    }

    /// Sets the namespace the `wsa:Action` header is built from.
    #[must_use]
    pub fn action_namespace(mut self, namespace: &'a str) -> Self {
        self.action_namespace = Some(namespace);
        self
    }

    /// Adds a WS-Security header when credentials are given.
    #[must_use]
    pub fn credentials(mut self, credentials: Option<&'a Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Uses a fixed UsernameToken instead of generating a fresh one.
    #[cfg(test)]
    fn token(mut self, token: UsernameToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Renders the envelope.
    ///
    /// # Errors
    /// Returns `SoapError::Parse` if the payload is not exactly one
    /// well-formed element.
    pub fn build(self) -> SoapResult<String> {
        let root = root_element(self.payload)?;
        let env = SOAP_ENVELOPE_PREFIX;

        let mut xml = String::with_capacity(self.payload.len() + 2048);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push_str(&format!(
            r#"<{env}:Envelope xmlns:{env}="{SOAP_ENVELOPE_NS}" xmlns:{SOAP_ENCODING_PREFIX}="{SOAP_ENCODING_NS}""#
        ));
        for (prefix, uri) in &self.namespaces {
            if *prefix == SOAP_ENVELOPE_PREFIX || *prefix == SOAP_ENCODING_PREFIX {
                continue;
            }
            xml.push_str(&format!(
                r#" xmlns:{prefix}="{}""#,
                html_escape::encode_double_quoted_attribute(uri)
            ));
        }
        xml.push('>');

        xml.push_str(&format!("<{env}:Header>"));
        let action = match self.action_namespace {
            Some(ns) => format!("{}/{}", ns.trim_end_matches('/'), root.local_name),
            None => root.local_name.clone(),
        };
        // wsa must be declared even if the caller's table lacks it
        let wsa_declared = self.namespaces.contains_key("wsa");
        xml.push_str(&format!(
            "<wsa:Action{}>{}</wsa:Action>",
            if wsa_declared {
                String::new()
            } else {
                r#" xmlns:wsa="http://www.w3.org/2005/08/addressing""#.to_string()
            },
            html_escape::encode_text(&action)
        ));

        if let Some(credentials) = self.credentials {
            let token = match self.token {
                Some(token) => token,
                None => UsernameToken::generate(credentials),
            };
            xml.push_str(&token.to_security_header());
        }
        xml.push_str(&format!("</{env}:Header>"));

        xml.push_str(&format!("<{env}:Body>"));
        xml.push_str(root.fragment);
        xml.push_str(&format!("</{env}:Body></{env}:Envelope>"));

        Ok(xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onvif::test_fixtures::{SOAP11_FAULT, SOAP12_FAULT};
    use crate::protocol_constants::ONVIF_NAMESPACES;

    fn envelope(payload: &str) -> String {
        SoapEnvelope::builder(payload)
            .namespaces(ONVIF_NAMESPACES)
            .action_namespace("http://www.onvif.org/ver10/device/wsdl")
            .build()
            .unwrap()
    }

    #[test]
    fn envelope_declares_every_namespace_once() {
        let xml = envelope("<tds:GetCapabilities><tds:Category>All</tds:Category></tds:GetCapabilities>");
        for (prefix, uri) in ONVIF_NAMESPACES {
            let decl = format!(r#"xmlns:{prefix}="{uri}""#);
            assert_eq!(xml.matches(&decl).count(), 1, "{decl}");
        }
        assert_eq!(xml.matches(r#"xmlns:soap-env=""#).count(), 1);
        assert!(xml.contains(r#"xmlns:soap-enc="http://www.w3.org/2003/05/soap-encoding""#));
    }

    #[test]
    fn envelope_carries_action_and_payload() {
        let xml = envelope("<tds:GetCapabilities><tds:Category>All</tds:Category></tds:GetCapabilities>");
        assert!(xml.contains(
            "<wsa:Action>http://www.onvif.org/ver10/device/wsdl/GetCapabilities</wsa:Action>"
        ));
        assert!(xml.contains(
            "<soap-env:Body><tds:GetCapabilities><tds:Category>All</tds:Category></tds:GetCapabilities></soap-env:Body>"
        ));
        assert!(!xml.contains("wsse:Security"));
        // Whole envelope must itself be well-formed
        assert!(text_nodes(&xml).is_ok());
    }

    #[test]
    fn envelope_drops_payload_declaration() {
        let xml = envelope("<?xml version=\"1.0\"?><tds:GetDeviceInformation/>");
        assert_eq!(xml.matches("<?xml").count(), 1);
        assert!(xml.contains("<soap-env:Body><tds:GetDeviceInformation/></soap-env:Body>"));
    }

    #[test]
    fn envelope_rejects_malformed_payload() {
        for payload in ["", "<a><b></a>", "<a/><b/>", "text"] {
            let result = SoapEnvelope::builder(payload).build();
            assert!(matches!(result, Err(SoapError::Parse(_))), "{payload:?}");
        }
    }

    #[test]
    fn envelope_with_credentials_has_security_header() {
        let creds = Credentials::new("admin", "secret");
        let token = UsernameToken::with_parts(&creds, [0u8; 16].to_vec(), "2024-01-02T03:04:05.678Z".into());
        let xml = SoapEnvelope::builder("<tds:GetDeviceInformation/>")
            .namespaces(ONVIF_NAMESPACES)
            .credentials(Some(&creds))
            .token(token)
            .build()
            .unwrap();

        let header_start = xml.find("<soap-env:Header>").unwrap();
        let body_start = xml.find("<soap-env:Body>").unwrap();
        let security = xml.find("<wsse:Security").unwrap();
        assert!(header_start < security && security < body_start);
        assert!(xml.contains("<wsse:Username>admin</wsse:Username>"));
        assert!(xml.contains("<wsu:Created>2024-01-02T03:04:05.678Z</wsu:Created>"));
        assert!(!xml.contains("secret"));
        assert!(text_nodes(&xml).is_ok());
    }

    #[test]
    fn later_namespace_declarations_win() {
        let xml = SoapEnvelope::builder("<x:Op/>")
            .namespaces(&[("x", "urn:one")])
            .namespaces(&[("x", "urn:two")])
            .build()
            .unwrap();
        assert!(xml.contains(r#"xmlns:x="urn:two""#));
        assert!(!xml.contains("urn:one"));
        assert!(xml.contains("<wsa:Action xmlns:wsa="));
    }

    #[test]
    fn reply_success_passes_through() {
        let reply = HttpReply::new(200, "<ok/>");
        assert_eq!(reply.clone().into_success().unwrap(), reply);
    }

    #[test]
    fn soap12_fault_reason_is_extracted() {
        let err = HttpReply::new(400, SOAP12_FAULT).into_success().unwrap_err();
        match err {
            SoapError::Fault(reason) => assert_eq!(reason, "Sender not Authorized"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn soap11_faultstring_is_extracted() {
        assert_eq!(
            extract_fault_reason(SOAP11_FAULT).as_deref(),
            Some("Action not supported")
        );
    }

    #[test]
    fn non_soap_error_body_keeps_status() {
        let err = HttpReply::new(503, "Service Unavailable").into_success().unwrap_err();
        assert!(matches!(err, SoapError::HttpStatus(503, ref body) if body == "Service Unavailable"));
    }
}

//! Media service requests: stream and snapshot URIs.

use serde::Serialize;

use super::address::normalize;
use super::request::{wire_enum, OnvifRequest};
use super::services::OnvifService;
use super::soap::{HttpReply, SoapError, SoapResult};
use super::xml::text_nodes;

/// Stream delivery mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamType {
    #[default]
    RtpUnicast,
    RtpMulticast,
}

impl StreamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RtpUnicast => "RTP-Unicast",
            Self::RtpMulticast => "RTP-Multicast",
        }
    }
}

wire_enum!(StreamType);

/// Transport protocol for the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportProtocol {
    Udp,
    Tcp,
    #[default]
    Rtsp,
    Http,
}

impl TransportProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "UDP",
            Self::Tcp => "TCP",
            Self::Rtsp => "RTSP",
            Self::Http => "HTTP",
        }
    }
}

wire_enum!(TransportProtocol);

impl std::str::FromStr for TransportProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UDP" => Ok(Self::Udp),
            "TCP" => Ok(Self::Tcp),
            "RTSP" => Ok(Self::Rtsp),
            "HTTP" => Ok(Self::Http),
            other => Err(format!("unknown transport protocol: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Transport {
    #[serde(rename = "onvif:Protocol")]
    pub protocol: TransportProtocol,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamSetup {
    #[serde(rename = "onvif:Stream")]
    pub stream: StreamType,
    #[serde(rename = "onvif:Transport")]
    pub transport: Transport,
}

/// `trt:GetStreamUri` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename = "trt:GetStreamUri")]
pub struct GetStreamUri {
    #[serde(rename = "trt:StreamSetup")]
    pub stream_setup: StreamSetup,
    #[serde(rename = "trt:ProfileToken")]
    pub profile_token: String,
}

impl GetStreamUri {
    /// Unicast stream over the given protocol.
    pub fn new(profile_token: impl Into<String>, protocol: TransportProtocol) -> Self {
        Self {
            stream_setup: StreamSetup {
                stream: StreamType::RtpUnicast,
                transport: Transport { protocol },
            },
            profile_token: profile_token.into(),
        }
    }
}

impl OnvifRequest for GetStreamUri {
    const SERVICE: OnvifService = OnvifService::Media;
    const OPERATION: &'static str = "GetStreamUri";
}

/// `trt:GetSnapshotUri` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename = "trt:GetSnapshotUri")]
pub struct GetSnapshotUri {
    #[serde(rename = "trt:ProfileToken")]
    pub profile_token: String,
}

impl GetSnapshotUri {
    pub fn new(profile_token: impl Into<String>) -> Self {
        Self {
            profile_token: profile_token.into(),
        }
    }
}

impl OnvifRequest for GetSnapshotUri {
    const SERVICE: OnvifService = OnvifService::Media;
    const OPERATION: &'static str = "GetSnapshotUri";
}

/// A media URI as returned by the media service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUri {
    pub uri: String,
    pub invalid_after_connect: bool,
    pub invalid_after_reboot: bool,
    /// ISO 8601 duration, e.g. `PT60S`.
    pub timeout: Option<String>,
}

impl MediaUri {
    /// Extracts the `MediaUri` block from a `<container>` response element.
    fn from_body(body: &str, container: &str) -> SoapResult<Self> {
        let mut media = MediaUri::default();
        let mut found = false;

        for node in text_nodes(body)? {
            if !node.path.iter().any(|p| p == container) || node.parent() != Some("MediaUri") {
                continue;
            }
            match node.name() {
                "Uri" => {
                    media.uri = node.text.clone();
                    found = true;
                }
                "InvalidAfterConnect" => media.invalid_after_connect = node.text == "true",
                "InvalidAfterReboot" => media.invalid_after_reboot = node.text == "true",
                "Timeout" => media.timeout = Some(node.text.clone()),
                _ => {}
            }
        }

        if !found {
            return Err(SoapError::Parse(format!("{container} has no MediaUri/Uri")));
        }
        Ok(media)
    }

    /// Rewrites a placeholder host in the URI to `base_address`.
    pub fn fix(&mut self, base_address: &str) {
        self.uri = normalize(&self.uri, base_address);
    }
}

/// Decoded `GetStreamUriResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetStreamUriResponse {
    pub media_uri: MediaUri,
}

impl GetStreamUriResponse {
    pub fn from_reply(reply: &HttpReply) -> SoapResult<Self> {
        Ok(Self {
            media_uri: MediaUri::from_body(&reply.body, "GetStreamUriResponse")?,
        })
    }
}

/// Decoded `GetSnapshotUriResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSnapshotUriResponse {
    pub media_uri: MediaUri,
}

impl GetSnapshotUriResponse {
    pub fn from_reply(reply: &HttpReply) -> SoapResult<Self> {
        Ok(Self {
            media_uri: MediaUri::from_body(&reply.body, "GetSnapshotUriResponse")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onvif::test_fixtures::{SNAPSHOT_URI_RESPONSE, STREAM_URI_RESPONSE};

    #[test]
    fn stream_uri_request_shape() {
        let xml = GetStreamUri::new("Profile_1", TransportProtocol::Rtsp)
            .to_xml()
            .unwrap();
        assert_eq!(
            xml,
            concat!(
                "<trt:GetStreamUri>",
                "<trt:StreamSetup>",
                "<onvif:Stream>RTP-Unicast</onvif:Stream>",
                "<onvif:Transport><onvif:Protocol>RTSP</onvif:Protocol></onvif:Transport>",
                "</trt:StreamSetup>",
                "<trt:ProfileToken>Profile_1</trt:ProfileToken>",
                "</trt:GetStreamUri>"
            )
        );
    }

    #[test]
    fn snapshot_request_escapes_token() {
        let xml = GetSnapshotUri::new("a&b").to_xml().unwrap();
        assert_eq!(
            xml,
            "<trt:GetSnapshotUri><trt:ProfileToken>a&amp;b</trt:ProfileToken></trt:GetSnapshotUri>"
        );
    }

    #[test]
    fn decodes_stream_uri_response() {
        let reply = HttpReply::new(200, STREAM_URI_RESPONSE);
        let media = GetStreamUriResponse::from_reply(&reply).unwrap().media_uri;
        assert_eq!(media.uri, "rtsp://localhost:554/stream1");
        assert!(!media.invalid_after_connect);
        assert_eq!(media.timeout.as_deref(), Some("PT0S"));
    }

    #[test]
    fn decodes_snapshot_uri_with_entities() {
        let reply = HttpReply::new(200, SNAPSHOT_URI_RESPONSE);
        let media = GetSnapshotUriResponse::from_reply(&reply).unwrap().media_uri;
        assert_eq!(media.uri, "http://127.0.0.1/snap.jpg?channel=1&res=hd");
        assert!(media.invalid_after_reboot);
    }

    #[test]
    fn wrong_response_type_is_a_parse_error() {
        let reply = HttpReply::new(200, SNAPSHOT_URI_RESPONSE);
        assert!(matches!(
            GetStreamUriResponse::from_reply(&reply),
            Err(SoapError::Parse(_))
        ));
    }

    #[test]
    fn fix_rewrites_rtsp_placeholder() {
        let mut media = MediaUri {
            uri: "rtsp://localhost:554/stream1".into(),
            ..Default::default()
        };
        media.fix("192.168.1.164:80");
        assert_eq!(media.uri, "rtsp://192.168.1.164:80/stream1");
    }

    #[test]
    fn protocol_parses_case_insensitively() {
        assert_eq!("rtsp".parse::<TransportProtocol>(), Ok(TransportProtocol::Rtsp));
        assert!("smtp".parse::<TransportProtocol>().is_err());
    }
}

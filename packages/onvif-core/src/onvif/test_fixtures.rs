//! XML fixtures and fake transports shared by the ONVIF tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::soap::{HttpReply, SoapError, SoapResult};
use super::transport::SoapTransport;

/// Capability response with placeholder hosts and an extension section.
pub const CAPABILITIES_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://www.w3.org/2003/05/soap-envelope" xmlns:tds="http://www.onvif.org/ver10/device/wsdl" xmlns:tt="http://www.onvif.org/ver10/schema">
  <SOAP-ENV:Body>
    <tds:GetCapabilitiesResponse>
      <tds:Capabilities>
        <tt:Analytics>
          <tt:XAddr>http://127.0.0.1/onvif/analytics_service</tt:XAddr>
          <tt:RuleSupport>true</tt:RuleSupport>
        </tt:Analytics>
        <tt:Device>
          <tt:XAddr>http://localhost/onvif/device_service</tt:XAddr>
          <tt:Network><tt:IPFilter>false</tt:IPFilter></tt:Network>
        </tt:Device>
        <tt:Events>
          <tt:XAddr>http://127.0.0.1/onvif/event_service</tt:XAddr>
          <tt:WSPullPointSupport>true</tt:WSPullPointSupport>
        </tt:Events>
        <tt:Imaging>
          <tt:XAddr>http://127.0.0.1:8080/onvif/imaging_service</tt:XAddr>
        </tt:Imaging>
        <tt:Media>
          <tt:XAddr>http://127.0.0.1/onvif/media_service</tt:XAddr>
          <tt:StreamingCapabilities><tt:RTP_TCP>true</tt:RTP_TCP></tt:StreamingCapabilities>
        </tt:Media>
        <tt:PTZ>
          <tt:XAddr>http://127.0.0.1/onvif/ptz_service</tt:XAddr>
        </tt:PTZ>
        <tt:Extension>
          <tt:DeviceIO>
            <tt:XAddr>http://192.168.1.164/onvif/deviceio_service</tt:XAddr>
            <tt:VideoSources>1</tt:VideoSources>
          </tt:DeviceIO>
          <tt:Recording>
            <tt:XAddr>http://localhost/onvif/recording_service</tt:XAddr>
          </tt:Recording>
        </tt:Extension>
      </tds:Capabilities>
    </tds:GetCapabilitiesResponse>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

/// Capability response from a camera that only reports device management.
pub const CAPABILITIES_RESPONSE_PARTIAL: &str = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body><GetCapabilitiesResponse xmlns="http://www.onvif.org/ver10/device/wsdl"><Capabilities><Device><XAddr>http://192.168.1.164/onvif/device_service</XAddr></Device></Capabilities></GetCapabilitiesResponse></env:Body></env:Envelope>"#;

/// Capability response without a PTZ block.
pub const CAPABILITIES_RESPONSE_NO_PTZ: &str = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body><tds:GetCapabilitiesResponse xmlns:tds="http://www.onvif.org/ver10/device/wsdl"><tds:Capabilities><tt:Device xmlns:tt="http://www.onvif.org/ver10/schema"><tt:XAddr>http://192.168.1.164/onvif/device_service</tt:XAddr></tt:Device><tt:Media xmlns:tt="http://www.onvif.org/ver10/schema"><tt:XAddr>http://127.0.0.1/onvif/media_service</tt:XAddr></tt:Media></tds:Capabilities></tds:GetCapabilitiesResponse></env:Body></env:Envelope>"#;

pub const DEVICE_INFORMATION_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope" xmlns:tds="http://www.onvif.org/ver10/device/wsdl">
  <env:Body>
    <tds:GetDeviceInformationResponse>
      <tds:Manufacturer>Acme &amp; Sons</tds:Manufacturer>
      <tds:Model>IPC-1000</tds:Model>
      <tds:FirmwareVersion>V5.4.0</tds:FirmwareVersion>
      <tds:SerialNumber>SN123456</tds:SerialNumber>
      <tds:HardwareId>HW-1</tds:HardwareId>
    </tds:GetDeviceInformationResponse>
  </env:Body>
</env:Envelope>"#;

/// Stream URI response with a placeholder RTSP host.
pub const STREAM_URI_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope" xmlns:trt="http://www.onvif.org/ver10/media/wsdl" xmlns:tt="http://www.onvif.org/ver10/schema">
  <env:Body>
    <trt:GetStreamUriResponse>
      <trt:MediaUri>
        <tt:Uri>rtsp://localhost:554/stream1</tt:Uri>
        <tt:InvalidAfterConnect>false</tt:InvalidAfterConnect>
        <tt:InvalidAfterReboot>false</tt:InvalidAfterReboot>
        <tt:Timeout>PT0S</tt:Timeout>
      </trt:MediaUri>
    </trt:GetStreamUriResponse>
  </env:Body>
</env:Envelope>"#;

/// Same as [`STREAM_URI_RESPONSE`] with the URI in a CDATA section.
pub const STREAM_URI_RESPONSE_CDATA: &str = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope" xmlns:trt="http://www.onvif.org/ver10/media/wsdl" xmlns:tt="http://www.onvif.org/ver10/schema"><env:Body><trt:GetStreamUriResponse><trt:MediaUri><tt:Uri><![CDATA[rtsp://localhost:554/stream1?user=a&channel=1]]></tt:Uri><tt:InvalidAfterConnect>false</tt:InvalidAfterConnect><tt:InvalidAfterReboot>false</tt:InvalidAfterReboot><tt:Timeout>PT0S</tt:Timeout></trt:MediaUri></trt:GetStreamUriResponse></env:Body></env:Envelope>"#;

pub const SNAPSHOT_URI_RESPONSE: &str = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope" xmlns:trt="http://www.onvif.org/ver10/media/wsdl" xmlns:tt="http://www.onvif.org/ver10/schema"><env:Body><trt:GetSnapshotUriResponse><trt:MediaUri><tt:Uri>http://127.0.0.1/snap.jpg?channel=1&amp;res=hd</tt:Uri><tt:InvalidAfterConnect>false</tt:InvalidAfterConnect><tt:InvalidAfterReboot>true</tt:InvalidAfterReboot><tt:Timeout>PT60S</tt:Timeout></trt:MediaUri></trt:GetSnapshotUriResponse></env:Body></env:Envelope>"#;

pub const SOAP12_FAULT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope" xmlns:ter="http://www.onvif.org/ver10/error">
  <env:Body>
    <env:Fault>
      <env:Code>
        <env:Value>env:Sender</env:Value>
        <env:Subcode><env:Value>ter:NotAuthorized</env:Value></env:Subcode>
      </env:Code>
      <env:Reason><env:Text xml:lang="en">Sender not Authorized</env:Text></env:Reason>
    </env:Fault>
  </env:Body>
</env:Envelope>"#;

pub const SOAP11_FAULT: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>Action not supported</faultstring></s:Fault></s:Body></s:Envelope>"#;

/// WS-Discovery ProbeMatches reply from a camera at 192.168.1.164.
pub const PROBE_MATCH_CAMERA_A: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://www.w3.org/2003/05/soap-envelope" xmlns:wsa="http://schemas.xmlsoap.org/ws/2004/08/addressing" xmlns:d="http://schemas.xmlsoap.org/ws/2005/04/discovery" xmlns:dn="http://www.onvif.org/ver10/network/wsdl">
  <SOAP-ENV:Header>
    <wsa:MessageID>uuid:5c6a0e1c-0000-0000-0000-000000000001</wsa:MessageID>
    <wsa:Action>http://schemas.xmlsoap.org/ws/2005/04/discovery/ProbeMatches</wsa:Action>
  </SOAP-ENV:Header>
  <SOAP-ENV:Body>
    <d:ProbeMatches>
      <d:ProbeMatch>
        <wsa:EndpointReference><wsa:Address>urn:uuid:camera-a</wsa:Address></wsa:EndpointReference>
        <d:Types>dn:NetworkVideoTransmitter</d:Types>
        <d:Scopes>onvif://www.onvif.org/type/video_encoder onvif://www.onvif.org/name/CameraA</d:Scopes>
        <d:XAddrs>http://192.168.1.164:80/onvif/device_service http://[fe80::1]/onvif/device_service</d:XAddrs>
        <d:MetadataVersion>1</d:MetadataVersion>
      </d:ProbeMatch>
    </d:ProbeMatches>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

/// Reply from a second camera that lists a placeholder address first.
pub const PROBE_MATCH_CAMERA_B: &str = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope" xmlns:d="http://schemas.xmlsoap.org/ws/2005/04/discovery"><env:Body><d:ProbeMatches><d:ProbeMatch><d:XAddrs>http://127.0.0.1/onvif/device_service http://192.168.1.200:8080/onvif/device_service</d:XAddrs></d:ProbeMatch></d:ProbeMatches></env:Body></env:Envelope>"#;

/// Reply whose only advertised address is a placeholder.
pub const PROBE_MATCH_LOCALHOST_ONLY: &str = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope" xmlns:d="http://schemas.xmlsoap.org/ws/2005/04/discovery"><env:Body><d:ProbeMatches><d:ProbeMatch><d:XAddrs>http://localhost:8000/onvif/device_service</d:XAddrs></d:ProbeMatch></d:ProbeMatches></env:Body></env:Envelope>"#;

// ─────────────────────────────────────────────────────────────────────────────
// Fake SOAP transport
// ─────────────────────────────────────────────────────────────────────────────

type Responder = dyn Fn(&str, &str) -> SoapResult<HttpReply> + Send + Sync;

/// Records every POST and answers from a closure.
pub struct SpyTransport {
    calls: Mutex<Vec<(String, String)>>,
    respond: Box<Responder>,
}

impl SpyTransport {
    pub fn new<F>(respond: F) -> Arc<Self>
    where
        F: Fn(&str, &str) -> SoapResult<HttpReply> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        })
    }

    /// Answers `GetCapabilities` with `capabilities` and anything else by
    /// operation name from `replies`.
    pub fn camera(capabilities: &'static str, replies: &[(&'static str, &'static str)]) -> Arc<Self> {
        let replies = replies.to_vec();
        Self::new(move |_, envelope| {
            if envelope.contains("GetCapabilities>") || envelope.contains("GetCapabilities/>") {
                return Ok(HttpReply::new(200, capabilities));
            }
            replies
                .iter()
                .find(|(op, _)| envelope.contains(&format!(":{op}")))
                .map(|(_, body)| HttpReply::new(200, *body))
                .ok_or_else(|| SoapError::HttpStatus(404, "no fixture".into()))
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// `(endpoint, envelope)` of every call so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SoapTransport for SpyTransport {
    async fn post(&self, endpoint: &str, envelope: String) -> SoapResult<HttpReply> {
        let reply = (self.respond)(endpoint, &envelope);
        self.calls.lock().push((endpoint.to_string(), envelope));
        reply
    }
}

/// Accepts every POST and never answers within a test's lifetime.
#[derive(Default)]
pub struct StalledTransport {
    calls: AtomicUsize,
}

impl StalledTransport {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SoapTransport for StalledTransport {
    async fn post(&self, _endpoint: &str, _envelope: String) -> SoapResult<HttpReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(HttpReply::new(200, ""))
    }
}

/// Cancels `token` after `delay` on a background task.
pub fn cancel_after(token: &tokio_util::sync::CancellationToken, delay: Duration) {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        token.cancel();
    });
}

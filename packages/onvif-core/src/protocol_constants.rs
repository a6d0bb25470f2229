//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by external specifications (SOAP 1.2, ONVIF,
//! WS-Addressing, WS-Security, WS-Discovery) and changing them would break
//! protocol compliance with real devices.

// ─────────────────────────────────────────────────────────────────────────────
// SOAP 1.2
// ─────────────────────────────────────────────────────────────────────────────

/// SOAP 1.2 envelope namespace.
pub const SOAP_ENVELOPE_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// SOAP 1.2 encoding namespace.
pub const SOAP_ENCODING_NS: &str = "http://www.w3.org/2003/05/soap-encoding";

/// Prefix used for the envelope elements we emit.
pub const SOAP_ENVELOPE_PREFIX: &str = "soap-env";

/// Prefix used for the SOAP encoding namespace declaration.
pub const SOAP_ENCODING_PREFIX: &str = "soap-enc";

/// Content type for every SOAP 1.2 POST.
pub const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

/// Timeout for SOAP HTTP requests (seconds).
///
/// 10 seconds is reasonable for LAN operations.
pub const SOAP_TIMEOUT_SECS: u64 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// ONVIF
// ─────────────────────────────────────────────────────────────────────────────

/// Namespace prefixes declared on every envelope root.
///
/// Request payloads reference these prefixes without declaring them.
pub const ONVIF_NAMESPACES: &[(&str, &str)] = &[
    ("onvif", "http://www.onvif.org/ver10/schema"),
    ("tds", "http://www.onvif.org/ver10/device/wsdl"),
    ("trt", "http://www.onvif.org/ver10/media/wsdl"),
    ("tev", "http://www.onvif.org/ver10/events/wsdl"),
    ("tptz", "http://www.onvif.org/ver20/ptz/wsdl"),
    ("timg", "http://www.onvif.org/ver20/imaging/wsdl"),
    ("tan", "http://www.onvif.org/ver20/analytics/wsdl"),
    ("xmime", "http://www.w3.org/2005/05/xmlmime"),
    ("wsnt", "http://docs.oasis-open.org/wsn/b-2"),
    ("xop", "http://www.w3.org/2004/08/xop/include"),
    ("wsa", "http://www.w3.org/2005/08/addressing"),
    ("wstop", "http://docs.oasis-open.org/wsn/t-1"),
    ("wsntw", "http://docs.oasis-open.org/wsn/bw-2"),
    ("wsrf-rw", "http://docs.oasis-open.org/wsrf/rw-2"),
    ("wsaw", "http://www.w3.org/2006/05/addressing/wsdl"),
];

/// Path of the device management service, seeded before capability discovery.
pub const DEVICE_SERVICE_PATH: &str = "/onvif/device_service";

/// Element local names whose text holds a device address.
///
/// Placeholder hosts inside these are rewritten on every response.
pub const ADDRESS_FIELDS: &[&str] = &["Uri", "XAddr", "XAddrs"];

// ─────────────────────────────────────────────────────────────────────────────
// WS-Security (UsernameToken profile 1.0)
// ─────────────────────────────────────────────────────────────────────────────

pub const WSSE_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";

pub const WSU_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";

pub const WSSE_PASSWORD_DIGEST: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest";

pub const WSSE_BASE64_BINARY: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";

/// Nonce length in bytes.
pub const WSSE_NONCE_LEN: usize = 16;

// ─────────────────────────────────────────────────────────────────────────────
// WS-Discovery (2005/04)
// ─────────────────────────────────────────────────────────────────────────────

/// WS-Discovery multicast group and port.
pub const WS_DISCOVERY_MULTICAST_ADDR: &str = "239.255.255.250:3702";

pub const WS_DISCOVERY_NS: &str = "http://schemas.xmlsoap.org/ws/2005/04/discovery";

/// WS-Addressing version used by WS-Discovery 2005/04.
pub const WS_DISCOVERY_ADDRESSING_NS: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";

pub const WS_DISCOVERY_PROBE_ACTION: &str = "http://schemas.xmlsoap.org/ws/2005/04/discovery/Probe";

pub const WS_DISCOVERY_TO: &str = "urn:schemas-xmlsoap-org:ws:2005:04:discovery";

/// ONVIF network namespace for device type filters (`dn:NetworkVideoTransmitter`).
pub const ONVIF_NETWORK_NS: &str = "http://www.onvif.org/ver10/network/wsdl";

/// Multicast TTL for probes. WS-Discovery recommends 1 (link-local).
pub const WS_DISCOVERY_MULTICAST_TTL: u32 = 1;

/// Receive buffer for probe replies (bytes). ProbeMatches with many scopes can be large.
pub const WS_DISCOVERY_MAX_REPLY_SIZE: usize = 64 * 1024;

/// Default probe collection window (milliseconds).
pub const DEFAULT_PROBE_WINDOW_MS: u64 = 3000;

//! ONVIF Core - client runtime for ONVIF IP cameras.
//!
//! This crate opens sessions with ONVIF devices over SOAP 1.2, discovers
//! their service endpoints, dispatches typed requests and finds devices on
//! the local network with WS-Discovery.
//!
//! # Architecture
//!
//! - [`onvif`]: Device sessions, endpoint registry, SOAP dispatch and discovery
//! - [`protocol_constants`]: Wire-level constants (namespaces, multicast group)
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! - [`SoapTransport`](onvif::SoapTransport): HTTP POST of a SOAP envelope
//! - [`ProbeTransport`](onvif::ProbeTransport): sending a probe and collecting replies
//! - [`OnvifRequest`](onvif::OnvifRequest): typed request payloads
//!
//! Each transport trait has a default implementation (reqwest, UDP multicast).
//! Tests substitute fakes.

#![warn(clippy::all)]

pub mod error;
pub mod onvif;
pub mod protocol_constants;

// Re-export commonly used types at the crate root
pub use error::{DiscoveryResult, ErrorCode, OnvifError, OnvifResult, SoapResult};

// Re-export ONVIF types
pub use onvif::address::{is_placeholder_host, normalize};
pub use onvif::capabilities::{Capabilities, CapabilityBlock, GetCapabilities};
pub use onvif::device_info::{DeviceInfo, GetDeviceInformation};
pub use onvif::discovery::{
    get_available_devices_at_interface, DiscoveryError, ProbeConfig, ProbeFailure, ProbeFilter,
    ProbeOutcome,
};
pub use onvif::endpoints::{EndpointDiagnostic, EndpointRegistry, EndpointStatus};
pub use onvif::media::{GetSnapshotUri, GetStreamUri, MediaUri, TransportProtocol};
pub use onvif::security::Credentials;
pub use onvif::soap::{HttpReply, SoapEnvelope, SoapError};
pub use onvif::{
    Device, DeviceParams, DeviceType, HttpSoapTransport, MulticastProbeTransport, OnvifRequest,
    OnvifService, ProbeTransport, Prober, SoapTransport,
};

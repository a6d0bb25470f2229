//! ONVIF device sessions and discovery.
//!
//! This module provides functionality for discovering ONVIF cameras on the
//! local network and calling their services over SOAP 1.2.
//!
//! # Module Structure
//!
//! - `address` - Placeholder host detection and address normalization
//! - `services` - ONVIF service tags (registry keys, WSDL namespaces) and device types
//! - `endpoints` - Per-device service endpoint registry
//! - `security` - WS-Security UsernameToken digest
//! - `soap` - Envelope construction, reply and fault handling
//! - `transport` - `SoapTransport` trait and the reqwest implementation
//! - `request` - `OnvifRequest` trait, the boundary for typed payloads
//! - `capabilities` - `GetCapabilities` request and response parsing
//! - `device_info` - `GetDeviceInformation` request and response parsing
//! - `media` - Stream and snapshot URI requests
//! - `device` - `Device` session and method dispatcher
//! - `discovery` - WS-Discovery probing
//! - `xml` - Namespace-agnostic XML helpers

pub mod address;
pub mod capabilities;
pub mod device;
pub mod device_info;
pub mod discovery;
pub mod endpoints;
pub mod media;
pub mod request;
pub mod security;
pub mod services;
pub mod soap;
pub mod transport;
pub(crate) mod xml;

#[cfg(test)]
pub(crate) mod test_fixtures;

// Re-export domain types
pub use services::{DeviceType, OnvifService};

// Re-export trait abstractions
pub use discovery::ProbeTransport;
pub use request::OnvifRequest;
pub use transport::SoapTransport;

// Re-export concrete implementations
pub use device::{Device, DeviceParams};
pub use discovery::{MulticastProbeTransport, Prober};
pub use transport::HttpSoapTransport;

//! Shared types for WS-Discovery probing.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::error::OnvifError;
use crate::onvif::device::Device;
use crate::onvif::services::DeviceType;
use crate::protocol_constants::{DEFAULT_PROBE_WINDOW_MS, ONVIF_NETWORK_NS};

/// Errors that can occur while sending a probe or collecting replies.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The named interface does not exist or has no IPv4 address.
    #[error("network interface not found or has no IPv4 address: {0}")]
    InterfaceNotFound(String),

    /// Failed to create or bind the UDP socket.
    #[error("failed to bind UDP socket: {0}")]
    SocketBind(#[source] std::io::Error),

    /// Failed to send the multicast probe.
    #[error("failed to send WS-Discovery probe: {0}")]
    SendProbe(#[source] std::io::Error),

    /// Reading replies failed before the window elapsed.
    #[error("failed to receive probe replies: {0}")]
    Receive(#[source] std::io::Error),
}

/// Convenient Result alias for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// A raw datagram received in reply to a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReply {
    /// Sender of the datagram, when the transport knows it.
    pub from: Option<SocketAddr>,
    pub payload: String,
}

impl ProbeReply {
    pub fn new(from: Option<SocketAddr>, payload: impl Into<String>) -> Self {
        Self {
            from,
            payload: payload.into(),
        }
    }
}

/// `Types` and `Scopes` sent in a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFilter {
    /// Qualified type names, e.g. `dn:NetworkVideoTransmitter`.
    pub types: Vec<String>,
    /// Prefix declarations the type names rely on.
    pub namespaces: BTreeMap<String, String>,
    /// Scope URIs a device must match (empty = any).
    pub scopes: Vec<String>,
}

impl ProbeFilter {
    /// Filter matching a single ONVIF device type.
    pub fn for_device_type(device_type: DeviceType) -> Self {
        Self {
            types: vec![format!("dn:{}", device_type.type_name())],
            namespaces: BTreeMap::from([("dn".to_string(), ONVIF_NETWORK_NS.to_string())]),
            scopes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }
}

impl Default for ProbeFilter {
    fn default() -> Self {
        Self::for_device_type(DeviceType::Nvt)
    }
}

/// Configuration for probing.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// How long replies are collected after the probe is sent.
    pub window: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(DEFAULT_PROBE_WINDOW_MS),
        }
    }
}

/// A reply or address that could not be turned into a session.
#[derive(Debug)]
pub struct ProbeFailure {
    /// Device address, or `reply #<n>` (with sender when known) for replies
    /// that yielded no address.
    pub target: String,
    pub error: OnvifError,
}

/// Result of a probe: connected devices plus everything that went wrong.
#[derive(Debug, Default)]
pub struct ProbeOutcome {
    /// One session per unique address, in first-seen order.
    pub devices: Vec<Device>,
    pub failures: Vec<ProbeFailure>,
}

impl ProbeOutcome {
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty() && self.failures.is_empty()
    }
}

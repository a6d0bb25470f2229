//! Centralized error types for the ONVIF core library.
//!
//! Module-level errors (`SoapError`, `DiscoveryError`) describe a single
//! protocol exchange. `OnvifError` is what session and prober operations
//! return, with enough context (service, endpoint, operation) to tell which
//! step failed.

use thiserror::Error;

use crate::onvif::discovery::DiscoveryError;
use crate::onvif::soap::SoapError;

/// Trait for error types that provide machine-readable error codes.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;
}

impl ErrorCode for DiscoveryError {
    fn code(&self) -> &'static str {
        match self {
            Self::InterfaceNotFound(_) => "interface_not_found",
            Self::SocketBind(_) => "socket_bind_failed",
            Self::SendProbe(_) => "probe_send_failed",
            Self::Receive(_) => "probe_receive_failed",
        }
    }
}

impl ErrorCode for SoapError {
    fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "http_request_failed",
            Self::HttpStatus(_, _) => "http_error_status",
            Self::Fault(_) => "soap_fault",
            Self::Parse(_) => "xml_parse_error",
        }
    }
}

/// Errors returned by device sessions and the discovery prober.
#[derive(Debug, Error)]
pub enum OnvifError {
    /// Session parameters are unusable (empty or malformed base address).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The capability call made during session construction failed.
    #[error("camera is not available at {xaddr} or it does not support ONVIF services: {source}")]
    Unreachable {
        xaddr: String,
        #[source]
        source: Box<OnvifError>,
    },

    /// No registry entry matches the request's service.
    #[error("target endpoint service not found: {service}")]
    ServiceNotFound { service: String },

    /// The resolved endpoint still has a placeholder host.
    #[error("endpoint for service '{service}' has a placeholder host: {endpoint}")]
    PlaceholderEndpoint { service: String, endpoint: String },

    /// The resolved endpoint is not an absolute `scheme://host` URI.
    #[error("endpoint for service '{service}' is not a valid URI: {endpoint}")]
    InvalidEndpoint { service: String, endpoint: String },

    /// Request payload could not be encoded or wrapped in an envelope.
    #[error("failed to encode {operation} request: {reason}")]
    Serialization { operation: String, reason: String },

    /// HTTP exchange failed or returned a non-success status.
    #[error("{service} call to {endpoint} failed: {source}")]
    Transport {
        service: String,
        endpoint: String,
        #[source]
        source: SoapError,
    },

    /// The caller cancelled the operation.
    #[error("{operation} cancelled")]
    Cancelled { operation: String },

    /// A response body could not be parsed.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Socket or interface level discovery failure.
    #[error("Discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),
}

impl ErrorCode for OnvifError {
    fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::Unreachable { .. } => "device_unreachable",
            Self::ServiceNotFound { .. } => "service_not_found",
            Self::PlaceholderEndpoint { .. } => "placeholder_endpoint",
            Self::InvalidEndpoint { .. } => "invalid_endpoint",
            Self::Serialization { .. } => "serialization_error",
            Self::Transport { .. } => "transport_error",
            Self::Cancelled { .. } => "cancelled",
            Self::Parse(_) => "parse_error",
            Self::Discovery(_) => "discovery_failed",
        }
    }
}

impl OnvifError {
    /// Returns true if the error (or the construction failure it wraps) is a
    /// cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled { .. } => true,
            Self::Unreachable { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result Type Aliases
// ─────────────────────────────────────────────────────────────────────────────

pub use crate::onvif::discovery::DiscoveryResult;
pub use crate::onvif::soap::SoapResult;

/// Convenient Result alias for session and prober operations.
pub type OnvifResult<T> = Result<T, OnvifError>;

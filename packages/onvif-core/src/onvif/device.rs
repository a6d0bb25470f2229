//! ONVIF device session and method dispatcher.
//!
//! A [`Device`] is created from a base address, seeds the device management
//! endpoint, discovers every other service endpoint via `GetCapabilities`,
//! and then dispatches typed requests to whichever endpoint serves them.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use super::address::{
    check_base_address, has_placeholder_host, is_placeholder_host, normalize, normalize_list,
};
use super::capabilities::{Capabilities, GetCapabilities};
use super::device_info::{DeviceInfo, GetDeviceInformation};
use super::endpoints::{EndpointDiagnostic, EndpointRegistry};
use super::media::{GetSnapshotUri, GetSnapshotUriResponse, GetStreamUri, GetStreamUriResponse};
use super::media::{MediaUri, TransportProtocol};
use super::request::OnvifRequest;
use super::security::Credentials;
use super::soap::{HttpReply, SoapEnvelope};
use super::transport::{HttpSoapTransport, SoapTransport};
use super::xml::rewrite_text;
use crate::error::{OnvifError, OnvifResult};
use crate::protocol_constants::{ADDRESS_FIELDS, DEVICE_SERVICE_PATH, ONVIF_NAMESPACES};

// ─────────────────────────────────────────────────────────────────────────────
// Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Everything needed to open a session.
#[derive(Clone)]
pub struct DeviceParams {
    /// Device base address, `host[:port]`.
    pub xaddr: String,
    pub credentials: Option<Credentials>,
    /// Shared HTTP transport. A reqwest transport is created when absent.
    pub transport: Option<Arc<dyn SoapTransport>>,
}

impl DeviceParams {
    pub fn new(xaddr: impl Into<String>) -> Self {
        Self {
            xaddr: xaddr.into(),
            credentials: None,
            transport: None,
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn SoapTransport>) -> Self {
        self.transport = Some(transport);
        self
    }
}

impl std::fmt::Debug for DeviceParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceParams")
            .field("xaddr", &self.xaddr)
            .field("credentials", &self.credentials)
            .field("transport", &self.transport.as_ref().map(|_| "<dyn SoapTransport>"))
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Device
// ─────────────────────────────────────────────────────────────────────────────

/// A connected ONVIF device.
///
/// Safe to share across tasks; the endpoint registry and device information
/// are behind locks and every other field is immutable.
pub struct Device {
    xaddr: String,
    credentials: Option<Credentials>,
    transport: Arc<dyn SoapTransport>,
    endpoints: EndpointRegistry,
    info: RwLock<Option<DeviceInfo>>,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("xaddr", &self.xaddr)
            .field("credentials", &self.credentials)
            .field("endpoints", &self.endpoints)
            .field("info", &*self.info.read())
            .finish()
    }
}

impl Device {
    /// Connects to a device and discovers its service endpoints.
    ///
    /// # Errors
    /// - `Configuration` if the base address is empty or malformed
    /// - `Unreachable` if the capability call fails
    /// - `Parse` if the capability response is not well-formed
    pub async fn new(params: DeviceParams) -> OnvifResult<Self> {
        Self::new_cancellable(params, &CancellationToken::new()).await
    }

    /// Like [`Device::new`], but aborts with `Cancelled` when `cancel` fires.
    pub async fn new_cancellable(
        params: DeviceParams,
        cancel: &CancellationToken,
    ) -> OnvifResult<Self> {
        let device = Self::bootstrap(params)?;

        match device.refresh_capabilities_cancellable(cancel).await {
            Ok(()) => {}
            Err(e @ (OnvifError::Cancelled { .. } | OnvifError::Parse(_))) => return Err(e),
            Err(e) => {
                log::warn!("[ONVIF] {} is unreachable: {}", device.xaddr, e);
                return Err(OnvifError::Unreachable {
                    xaddr: device.xaddr.clone(),
                    source: Box::new(e),
                });
            }
        }

        log::info!(
            "[ONVIF] Connected to {} ({} endpoints)",
            device.xaddr,
            device.endpoints.len()
        );
        Ok(device)
    }

    /// Validates parameters and seeds the device management endpoint.
    ///
    /// No I/O happens here.
    pub(crate) fn bootstrap(params: DeviceParams) -> OnvifResult<Self> {
        let xaddr = params.xaddr.trim().to_string();
        check_base_address(&xaddr)
            .map_err(|e| OnvifError::Configuration(format!("invalid xaddr {:?}: {}", xaddr, e)))?;
        if is_placeholder_host(&xaddr) {
            return Err(OnvifError::Configuration(format!(
                "xaddr {xaddr:?} is a placeholder host and cannot be used to reach a device"
            )));
        }

        let transport = match params.transport {
            Some(transport) => transport,
            None => HttpSoapTransport::shared().map_err(|e| {
                OnvifError::Configuration(format!("failed to create HTTP client: {e}"))
            })?,
        };

        // Authentication needs both parts, as with `Credentials::from_parts`
        let credentials = params.credentials.filter(|c| {
            if !c.is_complete() {
                log::warn!(
                    "[ONVIF] Ignoring incomplete credentials for {} (user {:?})",
                    xaddr,
                    c.username()
                );
            }
            c.is_complete()
        });

        let endpoints = EndpointRegistry::new(xaddr.clone());
        endpoints.put("device", &format!("http://{xaddr}{DEVICE_SERVICE_PATH}"));

        Ok(Self {
            xaddr,
            credentials,
            transport,
            endpoints,
            info: RwLock::new(None),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Base address (`host[:port]`).
    pub fn xaddr(&self) -> &str {
        &self.xaddr
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Copy of every known service endpoint.
    pub fn services(&self) -> BTreeMap<String, String> {
        self.endpoints.snapshot()
    }

    /// Endpoint for a service name (exact, then substring match).
    pub fn endpoint(&self, name: &str) -> Option<String> {
        self.endpoints.get(name)
    }

    /// Every registry entry with its placeholder/parse status.
    pub fn debug_endpoints(&self) -> Vec<EndpointDiagnostic> {
        self.endpoints.debug_entries()
    }

    /// Device information from the last [`Device::fetch_device_info`].
    pub fn device_info(&self) -> Option<DeviceInfo> {
        self.info.read().clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Address correction
    // ─────────────────────────────────────────────────────────────────────────

    /// Rewrites a placeholder host in any device-supplied address.
    pub fn fix_xaddr(&self, uri: &str) -> String {
        normalize(uri, &self.xaddr)
    }

    /// Rewrites a placeholder host in a media URI.
    pub fn fix_media_uri(&self, media: &mut MediaUri) {
        media.fix(&self.xaddr);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Capability discovery
    // ─────────────────────────────────────────────────────────────────────────

    /// Re-runs `GetCapabilities` and merges the result into the registry.
    pub async fn refresh_capabilities(&self) -> OnvifResult<()> {
        self.refresh_capabilities_cancellable(&CancellationToken::new())
            .await
    }

    pub async fn refresh_capabilities_cancellable(
        &self,
        cancel: &CancellationToken,
    ) -> OnvifResult<()> {
        let reply = self
            .call_method_cancellable(&GetCapabilities::all(), cancel)
            .await?;
        let capabilities =
            Capabilities::parse(&reply.body).map_err(|e| OnvifError::Parse(e.to_string()))?;

        for block in capabilities.blocks() {
            log::debug!(
                "[ONVIF] {}: {}{} -> {}",
                self.xaddr,
                if block.extension { "Extension/" } else { "" },
                block.name,
                block.xaddr
            );
        }
        self.endpoints.extend(capabilities.into_endpoints());
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Dispatch
    // ─────────────────────────────────────────────────────────────────────────

    /// Sends a request to the endpoint serving `R::SERVICE`.
    ///
    /// Placeholder hosts in `Uri`, `XAddr` and `XAddrs` elements of the reply
    /// are rewritten to the device's base address; nothing else in the body
    /// is touched.
    ///
    /// # Errors
    /// - `ServiceNotFound`, `PlaceholderEndpoint` or `InvalidEndpoint` before
    ///   any I/O
    /// - `Serialization` if the payload can't be encoded
    /// - `Transport` for HTTP failures, faults and non-2xx statuses
    /// - `Parse` if the reply body is not well-formed XML
    pub async fn call_method<R: OnvifRequest>(&self, request: &R) -> OnvifResult<HttpReply> {
        self.call_method_cancellable(request, &CancellationToken::new())
            .await
    }

    /// Like [`Device::call_method`], but aborts with `Cancelled` when
    /// `cancel` fires. An already-cancelled token performs no I/O.
    pub async fn call_method_cancellable<R: OnvifRequest>(
        &self,
        request: &R,
        cancel: &CancellationToken,
    ) -> OnvifResult<HttpReply> {
        let service = R::SERVICE.registry_key();
        let endpoint = self.resolve_endpoint(service)?;

        let payload = request.to_xml().map_err(|e| OnvifError::Serialization {
            operation: R::OPERATION.to_string(),
            reason: e.to_string(),
        })?;
        let envelope = SoapEnvelope::builder(&payload)
            .namespaces(ONVIF_NAMESPACES)
            .action_namespace(R::SERVICE.wsdl_namespace())
            .credentials(self.credentials.as_ref())
            .build()
            .map_err(|e| OnvifError::Serialization {
                operation: R::OPERATION.to_string(),
                reason: e.to_string(),
            })?;

        log::info!(
            "[SOAP] {} -> {} (body: {} bytes)",
            R::OPERATION,
            endpoint,
            envelope.len()
        );
        log::trace!("[SOAP] Request body: {}", envelope);

        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::debug!("[SOAP] {} to {} cancelled", R::OPERATION, endpoint);
                return Err(OnvifError::Cancelled {
                    operation: R::OPERATION.to_string(),
                });
            }
            res = self.transport.post(&endpoint, envelope) => res,
        };

        let transport_error = |source| OnvifError::Transport {
            service: service.to_string(),
            endpoint: endpoint.clone(),
            source,
        };
        let reply = reply.and_then(HttpReply::into_success).map_err(transport_error)?;

        let body = rewrite_text(&reply.body, ADDRESS_FIELDS, |text| {
            normalize_list(text, &self.xaddr)
        })
        .map_err(|e| OnvifError::Parse(format!("{} response: {}", R::OPERATION, e)))?;

        Ok(HttpReply {
            status: reply.status,
            body,
        })
    }

    /// Resolves and validates the endpoint for a registry key.
    fn resolve_endpoint(&self, service: &str) -> OnvifResult<String> {
        let endpoint = self
            .endpoints
            .get(service)
            .ok_or_else(|| OnvifError::ServiceNotFound {
                service: service.to_string(),
            })?;

        match has_placeholder_host(&endpoint) {
            Some(false) => Ok(endpoint),
            Some(true) => Err(OnvifError::PlaceholderEndpoint {
                service: service.to_string(),
                endpoint,
            }),
            None => Err(OnvifError::InvalidEndpoint {
                service: service.to_string(),
                endpoint,
            }),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Typed operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetches manufacturer/model/firmware details and caches them.
    pub async fn fetch_device_info(&self) -> OnvifResult<DeviceInfo> {
        let reply = self.call_method(&GetDeviceInformation::default()).await?;
        let info = DeviceInfo::from_reply(&reply).map_err(|e| OnvifError::Parse(e.to_string()))?;
        *self.info.write() = Some(info.clone());
        Ok(info)
    }

    /// Returns the stream URI for a media profile.
    pub async fn get_stream_uri(
        &self,
        profile_token: &str,
        protocol: TransportProtocol,
    ) -> OnvifResult<MediaUri> {
        let reply = self
            .call_method(&GetStreamUri::new(profile_token, protocol))
            .await?;
        let mut media = GetStreamUriResponse::from_reply(&reply)
            .map_err(|e| OnvifError::Parse(e.to_string()))?
            .media_uri;
        self.fix_media_uri(&mut media);
        Ok(media)
    }

    /// Returns the JPEG snapshot URI for a media profile.
    pub async fn get_snapshot_uri(&self, profile_token: &str) -> OnvifResult<MediaUri> {
        let reply = self.call_method(&GetSnapshotUri::new(profile_token)).await?;
        let mut media = GetSnapshotUriResponse::from_reply(&reply)
            .map_err(|e| OnvifError::Parse(e.to_string()))?
            .media_uri;
        self.fix_media_uri(&mut media);
        Ok(media)
    }
}

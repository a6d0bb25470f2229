//! WS-Discovery device enumeration.
//!
//! # Module Structure
//!
//! - `types` - Errors, filters, configuration and probe outcomes
//! - `probe` - Probe message construction and ProbeMatch parsing
//! - `multicast` - `ProbeTransport` trait and the UDP multicast implementation
//!
//! [`Prober`] ties them together: send a probe on one interface, extract one
//! address per reply, dedup, and open a [`Device`] session for each.

mod multicast;
mod probe;
mod types;

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::error::{OnvifError, OnvifResult};
use crate::onvif::device::{Device, DeviceParams};
use crate::onvif::security::Credentials;
use crate::onvif::transport::{HttpSoapTransport, SoapTransport};

pub use multicast::{interface_ipv4, MulticastProbeTransport, ProbeTransport};
pub use types::{
    DiscoveryError, DiscoveryResult, ProbeConfig, ProbeFailure, ProbeFilter, ProbeOutcome,
    ProbeReply,
};

/// Discovers ONVIF devices on a network interface.
///
/// Sessions opened for discovered devices share the prober's credentials
/// and SOAP transport.
pub struct Prober {
    transport: Arc<dyn ProbeTransport>,
    config: ProbeConfig,
    credentials: Option<Credentials>,
    soap_transport: Option<Arc<dyn SoapTransport>>,
}

impl Prober {
    /// Creates a prober using UDP multicast.
    pub fn new(config: ProbeConfig) -> Self {
        Self::with_transport(Arc::new(MulticastProbeTransport), config)
    }

    /// Creates a prober with a custom probe transport.
    pub fn with_transport(transport: Arc<dyn ProbeTransport>, config: ProbeConfig) -> Self {
        Self {
            transport,
            config,
            credentials: None,
            soap_transport: None,
        }
    }

    /// Credentials for every discovered session.
    #[must_use]
    pub fn credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// SOAP transport shared by every discovered session.
    #[must_use]
    pub fn soap_transport(mut self, transport: Arc<dyn SoapTransport>) -> Self {
        self.soap_transport = Some(transport);
        self
    }

    /// Probes `interface` and connects to every device that replies.
    ///
    /// Zero replies is an empty outcome, not an error. Unparseable replies
    /// and failed connections are recorded in `failures`.
    ///
    /// # Errors
    /// Returns `Discovery` if the probe could not be sent at all.
    pub async fn probe(&self, interface: &str, filter: &ProbeFilter) -> OnvifResult<ProbeOutcome> {
        self.probe_cancellable(interface, filter, &CancellationToken::new())
            .await
    }

    /// Like [`Prober::probe`], but aborts with `Cancelled` when `cancel` fires.
    pub async fn probe_cancellable(
        &self,
        interface: &str,
        filter: &ProbeFilter,
        cancel: &CancellationToken,
    ) -> OnvifResult<ProbeOutcome> {
        let message = probe::build_probe_message(filter, &uuid::Uuid::new_v4().to_string());
        log::info!(
            "[WS-Discovery] Probing {} for {:?} ({}ms window)",
            interface,
            filter.types,
            self.config.window.as_millis()
        );

        let replies = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(OnvifError::Cancelled { operation: "Probe".to_string() });
            }
            res = self.transport.send_probe(interface, &message, self.config.window) => res?,
        };

        let mut outcome = ProbeOutcome::default();
        let mut addresses = Vec::new();

        for (idx, reply) in replies.iter().enumerate() {
            match probe::parse_probe_matches(&reply.payload, reply.from) {
                Ok(found) if found.is_empty() => {
                    log::debug!("[WS-Discovery] Reply #{} carried no usable XAddrs", idx);
                }
                Ok(found) => addresses.extend(found),
                Err(e) => {
                    log::warn!("[WS-Discovery] Unparseable reply #{}: {}", idx, e);
                    outcome.failures.push(ProbeFailure {
                        target: match reply.from {
                            Some(from) => format!("reply #{idx} from {from}"),
                            None => format!("reply #{idx}"),
                        },
                        error: OnvifError::Parse(e.to_string()),
                    });
                }
            }
        }

        // Dedup preserving first-seen order
        let mut seen = HashSet::new();
        addresses.retain(|addr| seen.insert(addr.clone()));

        if addresses.is_empty() {
            log::info!("[WS-Discovery] No devices found on {}", interface);
            return Ok(outcome);
        }

        let soap_transport = match &self.soap_transport {
            Some(transport) => Arc::clone(transport),
            None => HttpSoapTransport::shared().map_err(|e| {
                OnvifError::Configuration(format!("failed to create HTTP client: {e}"))
            })?,
        };

        let connects = addresses.iter().map(|addr| {
            let params = DeviceParams::new(addr.clone())
                .with_credentials(self.credentials.clone())
                .with_transport(Arc::clone(&soap_transport));
            Device::new_cancellable(params, cancel)
        });
        let results = join_all(connects).await;

        for (addr, result) in addresses.into_iter().zip(results) {
            match result {
                Ok(device) => outcome.devices.push(device),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    log::warn!("[WS-Discovery] Could not connect to {}: {}", addr, e);
                    outcome.failures.push(ProbeFailure {
                        target: addr,
                        error: e,
                    });
                }
            }
        }

        log::info!(
            "[WS-Discovery] {} device(s) on {} ({} failure(s))",
            outcome.devices.len(),
            interface,
            outcome.failures.len()
        );
        Ok(outcome)
    }
}

/// Probes `interface` for network video transmitters with default settings.
///
/// Devices that fail to connect are logged and skipped.
pub async fn get_available_devices_at_interface(interface: &str) -> OnvifResult<Vec<Device>> {
    let outcome = Prober::new(ProbeConfig::default())
        .probe(interface, &ProbeFilter::default())
        .await?;
    Ok(outcome.devices)
}
